use gpui::Hsla;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a simulation run.
///
/// Indices are handed out monotonically and never reused, even after the run
/// is deleted, so they must never be treated as list positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct RunIndex(pub usize);

impl fmt::Display for RunIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display color of a run, kept as a packed `0xRRGGBB` value so it can be
/// written verbatim into exported markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunColor(pub u32);

impl RunColor {
    pub fn to_hsla(self) -> Hsla {
        gpui::rgb(self.0).into()
    }

    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl Default for RunColor {
    fn default() -> Self {
        Self(0x323232)
    }
}

/// One observation. `y == None` is a missing value and breaks the line.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: Option<f64>,
    /// Baseline offset for stacked rendering.
    pub y0: f64,
}

impl Sample {
    pub fn new(x: f64, y: Option<f64>) -> Self {
        Self { x, y, y0: 0.0 }
    }

    /// The plotted value (`y + y0`), if defined and finite.
    pub fn plotted_y(&self) -> Option<f64> {
        self.y.map(|y| y + self.y0).filter(|v| v.is_finite())
    }
}

/// All samples of one variable produced by one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub variable: String,
    pub run_index: RunIndex,
    pub run_name: String,
    pub unit: String,
    pub x_title: String,
    pub y_title: String,
    pub color: RunColor,
    pub visible: bool,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(variable: impl Into<String>, run_index: RunIndex, samples: Vec<Sample>) -> Self {
        let variable = variable.into();
        Self {
            y_title: variable.clone(),
            variable,
            run_index,
            run_name: format!("Run #{}", run_index.0),
            unit: String::new(),
            x_title: "Year".to_string(),
            color: RunColor::default(),
            visible: true,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Defined y values, in sample order.
    pub fn y_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.y).filter(|y| y.is_finite())
    }

    pub fn x_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.x).filter(|x| x.is_finite())
    }

    /// The y value at position `idx`, `None` when missing or out of range.
    pub fn y_at(&self, idx: usize) -> Option<f64> {
        self.samples.get(idx).and_then(|s| s.y)
    }
}
