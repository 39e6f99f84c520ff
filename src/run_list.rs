//! Entries shown in the run list: submissions in flight, failed
//! submissions waiting to expire, and registered runs.

use crate::data_types::{RunColor, RunIndex};
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Identity of one submission, used to route its response back to the
/// entry created when it was sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingRunId(pub u64);

impl fmt::Display for PendingRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKey {
    Pending(PendingRunId),
    Run(RunIndex),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryState {
    Pending,
    Failed { message: String, expires_at: Instant },
    Ready { visible: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunEntry {
    pub key: EntryKey,
    pub name: String,
    pub description: String,
    pub color: Option<RunColor>,
    pub state: EntryState,
}

impl RunEntry {
    pub fn run_index(&self) -> Option<RunIndex> {
        match self.key {
            EntryKey::Run(r) => Some(r),
            EntryKey::Pending(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, EntryState::Failed { .. })
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunList {
    entries: Vec<RunEntry>,
}

impl RunList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: EntryKey) -> Option<&RunEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    fn entry_mut(&mut self, key: EntryKey) -> Option<&mut RunEntry> {
        self.entries.iter_mut().find(|e| e.key == key)
    }

    pub fn add_pending(&mut self, id: PendingRunId, description: impl Into<String>) {
        self.entries.push(RunEntry {
            key: EntryKey::Pending(id),
            name: "Running model...".to_string(),
            description: description.into(),
            color: None,
            state: EntryState::Pending,
        });
    }

    pub fn mark_failed(&mut self, id: PendingRunId, message: impl Into<String>, expires_at: Instant) -> bool {
        let Some(entry) = self.entry_mut(EntryKey::Pending(id)) else {
            return false;
        };
        entry.name = "Model run failed".to_string();
        entry.state = EntryState::Failed {
            message: message.into(),
            expires_at,
        };
        true
    }

    pub fn remove_pending(&mut self, id: PendingRunId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != EntryKey::Pending(id));
        before != self.entries.len()
    }

    pub fn add_ready(&mut self, run: RunIndex, name: &str, color: RunColor, description: impl Into<String>) {
        self.entries.push(RunEntry {
            key: EntryKey::Run(run),
            name: name.to_string(),
            description: description.into(),
            color: Some(color),
            state: EntryState::Ready { visible: true },
        });
    }

    pub fn set_visible(&mut self, run: RunIndex, visible: bool) -> bool {
        match self.entry_mut(EntryKey::Run(run)) {
            Some(e) => {
                e.state = EntryState::Ready { visible };
                true
            }
            None => false,
        }
    }

    pub fn rename(&mut self, run: RunIndex, name: &str) -> bool {
        match self.entry_mut(EntryKey::Run(run)) {
            Some(e) => {
                e.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, run: RunIndex) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != EntryKey::Run(run));
        before != self.entries.len()
    }

    /// Drops failure markers whose display time is over.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| match &e.state {
            EntryState::Failed { expires_at, .. } => *expires_at > now,
            _ => true,
        });
        let expired = before - self.entries.len();
        if expired > 0 {
            debug!(expired, "failure markers expired");
        }
        expired
    }

    /// Removes every registered run, keeping in-flight and failed entries.
    pub fn clear_runs(&mut self) {
        self.entries.retain(|e| matches!(e.key, EntryKey::Pending(_)));
    }
}
