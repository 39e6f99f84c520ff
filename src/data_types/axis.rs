use crate::data_types::Series;
use serde::{Deserialize, Serialize};

/// Fraction of the data range added on each side of an extent.
pub const DOMAIN_PADDING: f64 = 0.1;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
pub enum AxisFormat {
    #[default]
    Numeric,
    Time(TimeUnit),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScaleKind {
    #[default]
    Linear,
    Log,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// Insets between the chart box and its plot area, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::new(10.0, 10.0, 30.0, 30.0)
    }
}

impl From<[f32; 4]> for Padding {
    fn from(p: [f32; 4]) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }
}

/// Visible data-space window of a chart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxisDomain {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl AxisDomain {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            x_min: x.0,
            x_max: x.1,
            y_min: y.0,
            y_max: y.1,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn x(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn y(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    /// Raw `[min, max]` of the finite values, `None` when there are none.
    pub fn extent(values: &[f64]) -> Option<(f64, f64)> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Padded extent of `values`.
    ///
    /// The range grows by [`DOMAIN_PADDING`] of its width on each side. With
    /// `floor_zero`, a naturally non-negative set never gets a negative lower
    /// bound. Empty or constant input yields a non-empty sentinel range.
    pub fn compute(values: &[f64], floor_zero: bool) -> (f64, f64) {
        let Some((lo, hi)) = Self::extent(values) else {
            return (0.0, 1.0);
        };
        let span = hi - lo;
        let (mut d_min, d_max) = if span <= f64::EPSILON * lo.abs().max(1.0) {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo - span * DOMAIN_PADDING, hi + span * DOMAIN_PADDING)
        };
        if floor_zero && lo >= 0.0 && d_min < 0.0 {
            d_min = 0.0;
        }
        Self::non_degenerate((d_min, d_max))
    }

    /// Widens a zero-width or inverted range so scales never divide by zero.
    pub fn non_degenerate(extent: (f64, f64)) -> (f64, f64) {
        let (lo, hi) = extent;
        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }
        if hi - lo > f64::EPSILON * lo.abs().max(1.0) {
            return (lo, hi);
        }
        if lo >= 0.0 && lo < 1.0 {
            (0.0, lo + 1.0)
        } else {
            (lo - 1.0, hi + 1.0)
        }
    }

    /// Raises the lower bound of an extent to `floor` when it falls below it.
    pub fn clip_lower(extent: (f64, f64), floor: f64) -> (f64, f64) {
        let lo = extent.0.max(floor);
        Self::non_degenerate((lo, extent.1.max(lo)))
    }

    /// Extent usable by a log scale: only strictly positive values count.
    pub fn positive_extent(values: &[f64]) -> Option<(f64, f64)> {
        let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
        Self::extent(&positive)
    }

    /// Concatenated axis values of the given series, skipping hidden runs when
    /// `visible_only` is set.
    pub fn flatten(series: &[Series], axis: Axis, visible_only: bool) -> Vec<f64> {
        let shown = series.iter().filter(|s| !visible_only || s.visible);
        match axis {
            Axis::X => shown.flat_map(|s| s.x_values()).collect(),
            Axis::Y => shown.flat_map(|s| s.y_values()).collect(),
        }
    }
}
