//! Transform helper for coordinate projection

use crate::data_types::Sample;
use crate::scales::ChartScale;

/// Projects data coordinates into plot-area pixels (origin at the top-left
/// corner of the clipped drawing region).
#[derive(Clone)]
pub struct PlotTransform {
    pub x_scale: ChartScale,
    pub y_scale: ChartScale,
}

impl PlotTransform {
    pub fn new(x_scale: ChartScale, y_scale: ChartScale) -> Self {
        Self { x_scale, y_scale }
    }

    pub fn data_to_screen(&self, x: f64, y: f64) -> Option<(f32, f32)> {
        Some((self.x_scale.try_map(x)?, self.y_scale.try_map(y)?))
    }

    /// Screen position of a sample, `None` for missing observations.
    pub fn sample_to_screen(&self, sample: &Sample) -> Option<(f32, f32)> {
        self.data_to_screen(sample.x, sample.plotted_y()?)
    }

    pub fn screen_to_data(&self, point: (f32, f32)) -> (f64, f64) {
        (self.x_scale.invert(point.0), self.y_scale.invert(point.1))
    }

    /// Splits samples into polyline runs, breaking at every sample that cannot
    /// be placed so gaps are never bridged.
    pub fn polyline(&self, samples: &[Sample]) -> Vec<Vec<(f32, f32)>> {
        let mut segments = Vec::new();
        let mut current: Vec<(f32, f32)> = Vec::new();
        for sample in samples {
            match self.sample_to_screen(sample) {
                Some(p) => current.push(p),
                None => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}
