//! Run colors.

use crate::data_types::{RunColor, RunIndex};
use std::collections::BTreeMap;
use tracing::debug;

/// Color-blind safe palette, in allocation order.
pub const DEFAULT_PALETTE: [RunColor; 8] = [
    RunColor(0x56b4e9), // sky blue
    RunColor(0xe69f00), // orange
    RunColor(0x009e73), // bluish green
    RunColor(0xf0e442), // yellow
    RunColor(0x0072b2), // blue
    RunColor(0xd55e00), // vermilion
    RunColor(0xcc79a7), // reddish purple
    RunColor(0x323232), // black
];

/// Hands out one palette slot per live run.
///
/// A run keeps its color for its whole lifetime. Slots of removed runs are
/// released and reused; when every slot is taken colors cycle by index.
#[derive(Clone, Debug)]
pub struct ColorAllocator {
    palette: Vec<RunColor>,
    assigned: BTreeMap<RunIndex, usize>,
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.to_vec())
    }
}

impl ColorAllocator {
    pub fn new(palette: Vec<RunColor>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            palette
        };
        Self {
            palette,
            assigned: BTreeMap::new(),
        }
    }

    pub fn palette(&self) -> &[RunColor] {
        &self.palette
    }

    fn slot_in_use(&self, slot: usize) -> bool {
        self.assigned.values().any(|s| *s == slot)
    }

    /// Color of `run`, allocating a slot on first use.
    pub fn allocate(&mut self, run: RunIndex) -> RunColor {
        if let Some(slot) = self.assigned.get(&run) {
            return self.palette[*slot];
        }
        let n = self.palette.len();
        let preferred = run.0 % n;
        let slot = if !self.slot_in_use(preferred) {
            preferred
        } else {
            (0..n)
                .map(|i| (preferred + i) % n)
                .find(|s| !self.slot_in_use(*s))
                .unwrap_or(preferred)
        };
        debug!(run = run.0, slot, "allocated run color");
        self.assigned.insert(run, slot);
        self.palette[slot]
    }

    pub fn color_of(&self, run: RunIndex) -> Option<RunColor> {
        self.assigned.get(&run).map(|slot| self.palette[*slot])
    }

    /// Frees the slot of `run`. Unknown runs are ignored.
    pub fn release(&mut self, run: RunIndex) {
        self.assigned.remove(&run);
    }

    pub fn clear(&mut self) {
        self.assigned.clear();
    }

    pub fn in_use(&self) -> usize {
        self.assigned.len()
    }
}
