use crate::data_types::{RunColor, RunIndex};
use serde::{Deserialize, Serialize};

/// Legend row above the plot, one entry per run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendConfig {
    pub enabled: bool,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Per-chart boolean switches.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartFlags {
    /// Hover handles are built and tooltips may be shown.
    pub hoverable: bool,
    /// Horizontal grid lines at the y ticks.
    pub h_grid: bool,
    /// Handles are per data point instead of per period.
    pub custom: bool,
    /// A secondary y axis is drawn with its own dashed lines.
    pub twin: bool,
}

impl Default for ChartFlags {
    fn default() -> Self {
        Self {
            hoverable: false,
            h_grid: true,
            custom: false,
            twin: false,
        }
    }
}

/// One run's row in a legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub run_index: RunIndex,
    pub run_name: String,
    pub color: RunColor,
    pub hidden: bool,
}

/// One line of a composed tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipLine {
    pub run_index: RunIndex,
    pub color: RunColor,
    pub label: String,
    pub value: String,
    pub unit: String,
}

impl TooltipLine {
    pub fn text(&self) -> String {
        if self.unit.is_empty() {
            format!("{}: {}", self.label, self.value)
        } else {
            format!("{}: {} {}", self.label, self.value, self.unit)
        }
    }
}

/// Tooltip content plus the plot-area position it is anchored to.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub header: Option<String>,
    pub lines: Vec<TooltipLine>,
    pub anchor: (f32, f32),
}

impl Tooltip {
    pub fn text(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len() + 1);
        if let Some(h) = &self.header {
            out.push(h.clone());
        }
        out.extend(self.lines.iter().map(TooltipLine::text));
        out.join("\n")
    }
}
