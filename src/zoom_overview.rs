//! Compact brushable overview driving the zoom window of the main charts.

use crate::chart_view::ChartView;
use crate::custom_chart::ExtentRules;
use crate::data_types::{
    Axis, AxisDomain, AxisFormat, ChartFlags, LegendConfig, Metadata, Padding, RunIndex, ScaleKind, Series, TimeUnit,
};
use crate::series_store::SeriesStore;
use crate::theme::ChartTheme;
use gpui::prelude::*;
use gpui::*;
use std::collections::BTreeSet;
use tracing::debug;

/// Brushes narrower than this many pixels count as empty.
const MIN_BRUSH_PX: f32 = 1.0;

/// Linear interpolation of the value at `qx` between `(ax, ay)` and `(bx, by)`.
pub fn interpolate(ax: f64, ay: f64, bx: f64, by: f64, qx: f64) -> f64 {
    if bx == ax {
        return ay;
    }
    ay + (qx - ax) * (by - ay) / (bx - ax)
}

/// Value of `series` at `qx` when `qx` falls strictly between two defined
/// samples.
pub fn boundary_value(series: &Series, qx: f64) -> Option<f64> {
    series.samples.windows(2).find_map(|pair| {
        let (a, b) = (&pair[0], &pair[1]);
        if a.x < qx && qx < b.x {
            Some(interpolate(a.x, a.plotted_y()?, b.x, b.plotted_y()?, qx))
        } else {
            None
        }
    })
}

/// Y values that must fit in a zoomed window: every visible sample inside
/// `[x0, x1]` plus the interpolated values at both edges.
pub fn window_values(series: &[Series], hidden: &BTreeSet<RunIndex>, window: (f64, f64)) -> Vec<f64> {
    let (x0, x1) = (window.0.min(window.1), window.0.max(window.1));
    let mut values = Vec::new();
    for s in series.iter().filter(|s| !hidden.contains(&s.run_index)) {
        values.extend(
            s.samples
                .iter()
                .filter(|p| p.x >= x0 && p.x <= x1)
                .filter_map(|p| p.plotted_y()),
        );
        values.extend(boundary_value(s, x0));
        values.extend(boundary_value(s, x1));
    }
    values
}

/// Y extent of `series` for a zoom `window`; `None` means the full domain.
pub fn zoomed_extent(
    series: &[Series],
    hidden: &BTreeSet<RunIndex>,
    window: Option<(f64, f64)>,
    rules: &ExtentRules,
    variable: &str,
    log: bool,
) -> (f64, f64) {
    let values = match window {
        Some(w) => window_values(series, hidden, w),
        None => series
            .iter()
            .filter(|s| !hidden.contains(&s.run_index))
            .flat_map(|s| s.samples.iter().filter_map(|p| p.plotted_y()))
            .collect(),
    };
    rules.extent(Some(variable), &values, log)
}

#[derive(Clone, Debug)]
pub struct ZoomOverviewView {
    chart: ChartView,
    variable: String,
    brush: Option<(f32, f32)>,
    anchor: Option<f32>,
}

impl ZoomOverviewView {
    pub fn new(id: impl Into<String>, variable: impl Into<String>, padding: Padding, height: f32) -> Self {
        let mut chart = ChartView::new(id)
            .with_flags(ChartFlags {
                hoverable: false,
                h_grid: false,
                custom: false,
                twin: false,
            })
            .with_legend(LegendConfig { enabled: false });
        chart.configure(
            600.0,
            height,
            padding,
            ScaleKind::Linear,
            ScaleKind::Linear,
            AxisFormat::Time(TimeUnit::Milliseconds),
            AxisFormat::Numeric,
        );
        Self {
            chart,
            variable: variable.into(),
            brush: None,
            anchor: None,
        }
    }

    pub fn view(&self) -> &ChartView {
        &self.chart
    }

    pub fn view_mut(&mut self) -> &mut ChartView {
        &mut self.chart
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Follows a new variable; the brush is kept since the time axis is shared.
    pub fn set_variable(&mut self, variable: impl Into<String>) {
        self.variable = variable.into();
    }

    pub fn refresh(&mut self, store: &SeriesStore, metadata: &Metadata, rules: &ExtentRules) {
        let series = store.series(&self.variable).to_vec();
        let values = AxisDomain::flatten(&series, Axis::Y, true);
        let y = rules.extent(Some(self.variable.as_str()), &values, false);
        self.chart.set_data(series);
        self.chart.set_domain(store.time_domain(), y);
        self.chart.set_title(metadata.title(&self.variable), "");
        if self.chart.is_drawn() {
            self.chart.update_data();
        } else {
            self.chart.draw();
        }
    }

    // Brush, in plot-area pixels

    pub fn brush_start(&mut self, px_x: f32) {
        let px_x = self.clamp_px(px_x);
        self.anchor = Some(px_x);
        self.brush = Some((px_x, px_x));
    }

    pub fn brush_move(&mut self, px_x: f32) {
        if let Some(a) = self.anchor {
            let px_x = self.clamp_px(px_x);
            self.brush = Some((a.min(px_x), a.max(px_x)));
        }
    }

    /// Finishes a drag and returns the selected data window.
    pub fn brush_end(&mut self, px_x: f32) -> Option<(f64, f64)> {
        self.brush_move(px_x);
        self.anchor = None;
        if self.selection_px().is_none() {
            self.brush = None;
        }
        let window = self.selected_window();
        debug!(?window, "brush changed");
        window
    }

    pub fn clear_brush(&mut self) {
        self.brush = None;
        self.anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn selection_px(&self) -> Option<(f32, f32)> {
        self.brush.filter(|(a, b)| (b - a).abs() >= MIN_BRUSH_PX)
    }

    fn clamp_px(&self, px_x: f32) -> f32 {
        let (w, _) = self.chart.inner_size();
        px_x.clamp(0.0, w)
    }

    /// Data-space window of the brush, clamped to the data domain. An empty
    /// brush or one outside the data yields `None` (the full domain).
    pub fn selected_window(&self) -> Option<(f64, f64)> {
        let (a, b) = self.selection_px()?;
        let scale = self.chart.x_scale();
        let (d0, d1) = self.chart.domain().x();
        let x0 = scale.invert(a).clamp(d0, d1);
        let x1 = scale.invert(b).clamp(d0, d1);
        (x1 > x0 && x0.is_finite() && x1.is_finite()).then_some((x0, x1))
    }

    /// Brush overlay for the overview canvas.
    pub fn brush_element(&self, theme: &ChartTheme) -> impl IntoElement {
        let selection = self.selection_px();
        let padding = self.chart.padding();
        let (_, h) = self.chart.inner_size();
        let fill_color = theme.brush_fill;
        let border = theme.brush_border;
        canvas(
            |_, _, _| {},
            move |bounds, (), window, _| {
                let Some((a, b)) = selection else {
                    return;
                };
                let origin = bounds.origin + point(px(padding.left + a), px(padding.top));
                let rect = Bounds::new(origin, size(px(b - a), px(h)));
                window.paint_quad(fill(rect, fill_color));
                window.paint_quad(outline(rect, border, BorderStyle::Solid));
            },
        )
        .size_full()
        .absolute()
    }
}
