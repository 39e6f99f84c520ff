use crate::data_types::{AxisDomain, AxisFormat, ScaleKind, TimeUnit};
use crate::utils::date_formatter::{determine_date_format, format_timestamp};
use crate::utils::number_format::format_number;
use d3rs::scale::{LinearScale, Scale};

/// Smallest domain bound accepted by a log scale.
const LOG_FLOOR: f64 = 1e-12;

/// Maps data values to pixels along one axis.
///
/// Log scales keep their inner d3 scale in log10 space, so the same linear
/// machinery drives both kinds.
#[derive(Clone)]
pub struct ChartScale {
    kind: ScaleKind,
    domain: (f64, f64),
    range: (f32, f32),
    inner: LinearScale,
}

impl ChartScale {
    pub fn new(kind: ScaleKind, domain: (f64, f64), range: (f32, f32)) -> Self {
        match kind {
            ScaleKind::Linear => Self::new_linear(domain, range),
            ScaleKind::Log => Self::new_log(domain, range),
        }
    }

    pub fn new_linear(domain: (f64, f64), range: (f32, f32)) -> Self {
        let (d_min, d_max) = AxisDomain::non_degenerate(domain);
        let inner = LinearScale::new()
            .domain(d_min, d_max)
            .range(range.0 as f64, range.1 as f64);
        Self {
            kind: ScaleKind::Linear,
            domain: (d_min, d_max),
            range,
            inner,
        }
    }

    pub fn new_log(domain: (f64, f64), range: (f32, f32)) -> Self {
        let mut d_min = domain.0.max(LOG_FLOOR);
        let mut d_max = domain.1.max(LOG_FLOOR);
        if !d_min.is_finite() || !d_max.is_finite() || d_max <= d_min {
            d_min = d_min.min(d_max);
            d_max = d_min * 10.0;
            if !d_max.is_finite() || d_max <= d_min {
                d_min = 1.0;
                d_max = 10.0;
            }
        }
        let inner = LinearScale::new()
            .domain(d_min.log10(), d_max.log10())
            .range(range.0 as f64, range.1 as f64);
        Self {
            kind: ScaleKind::Log,
            domain: (d_min, d_max),
            range,
            inner,
        }
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    /// Pixel position of `value`, or `None` when the scale cannot place it
    /// (non-finite input, or a non-positive value on a log scale).
    pub fn try_map(&self, value: f64) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let res = match self.kind {
            ScaleKind::Linear => self.inner.scale(value),
            ScaleKind::Log if value > 0.0 => self.inner.scale(value.log10()),
            ScaleKind::Log => return None,
        } as f32;
        (!res.is_nan() && !res.is_infinite()).then_some(res)
    }

    pub fn map(&self, value: f64) -> f32 {
        self.try_map(value).unwrap_or(0.0)
    }

    pub fn invert(&self, pixel: f32) -> f64 {
        let raw = self.inner.invert(pixel as f64).unwrap_or(0.0);
        match self.kind {
            ScaleKind::Linear => raw,
            ScaleKind::Log => 10f64.powf(raw),
        }
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn contains_pixel(&self, pixel: f32) -> bool {
        let (a, b) = self.range;
        pixel >= a.min(b) && pixel <= a.max(b)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self.kind {
            ScaleKind::Linear => self.inner.ticks(count),
            ScaleKind::Log => {
                let (lo, hi) = self.domain;
                let decades: Vec<f64> = (lo.log10().floor() as i32..=hi.log10().ceil() as i32)
                    .map(|e| 10f64.powi(e))
                    .filter(|v| *v >= lo && *v <= hi)
                    .collect();
                if decades.len() >= 2 {
                    decades
                } else {
                    self.inner
                        .ticks(count)
                        .into_iter()
                        .map(|t| 10f64.powf(t))
                        .collect()
                }
            }
        }
    }

    pub fn format_tick(&self, value: f64, format: &AxisFormat) -> String {
        match format {
            AxisFormat::Time(unit) => {
                let (d_min, d_max) = self.domain;
                let span = (d_max - d_min).abs();
                let span_sec = match unit {
                    TimeUnit::Seconds => span,
                    TimeUnit::Milliseconds => span / 1000.0,
                };
                format_timestamp(value, determine_date_format(span_sec), *unit)
            }
            AxisFormat::Numeric => format_number(value),
        }
    }
}
