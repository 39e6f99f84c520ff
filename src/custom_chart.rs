//! The large chart whose axes the user can reassign.
//!
//! X may be time or any variable; Y and the optional twin Y are variables.
//! Series are copies of the store's, with x re-sourced position by position
//! from the same run's x variable.

use crate::chart_view::ChartView;
use crate::data_types::{
    Axis, AxisDomain, AxisFormat, ChartFlags, Metadata, Padding, RunIndex, ScaleKind, Series,
    TimeUnit,
};
use crate::series_store::{AxisSource, SeriesStore};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("log scale is not available on a time axis")]
    LogOnTimeAxis,
    #[error("the twin axis is not shown")]
    TwinDisabled,
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogAxis {
    X,
    Y,
    Twin,
}

/// Lower clipping and zero-flooring rules applied to value extents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtentRules {
    pub floors: BTreeMap<String, f64>,
    pub floor_zero: BTreeSet<String>,
}

impl ExtentRules {
    /// Extent of `values` for `variable` on a linear or log axis.
    pub fn extent(&self, variable: Option<&str>, values: &[f64], log: bool) -> (f64, f64) {
        if log {
            return match AxisDomain::positive_extent(values) {
                Some((lo, hi)) if hi > lo => (lo, hi),
                Some((v, _)) => (v / 10.0, v * 10.0),
                None => (1.0, 10.0),
            };
        }
        let floor_zero = variable.is_some_and(|v| self.floor_zero.contains(v));
        let extent = AxisDomain::compute(values, floor_zero);
        match variable.and_then(|v| self.floors.get(v)) {
            Some(floor) => AxisDomain::clip_lower(extent, *floor),
            None => extent,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CustomChartView {
    chart: ChartView,
    x_source: AxisSource,
    y_variable: String,
    twin_variable: Option<String>,
    x_log: bool,
    y_log: bool,
    twin_log: bool,
    rules: ExtentRules,
    time_domain: (f64, f64),
}

impl CustomChartView {
    pub fn new(
        id: impl Into<String>,
        y_variable: impl Into<String>,
        twin_variable: Option<String>,
        padding: Padding,
        rules: ExtentRules,
    ) -> Self {
        let mut chart = ChartView::new(id).with_flags(ChartFlags {
            hoverable: true,
            h_grid: true,
            custom: true,
            twin: false,
        });
        chart.configure(
            600.0,
            400.0,
            padding,
            ScaleKind::Linear,
            ScaleKind::Linear,
            AxisFormat::Time(TimeUnit::Milliseconds),
            AxisFormat::Numeric,
        );
        Self {
            chart,
            x_source: AxisSource::Time,
            y_variable: y_variable.into(),
            twin_variable,
            x_log: false,
            y_log: false,
            twin_log: false,
            rules,
            time_domain: (0.0, 1.0),
        }
    }

    pub fn view(&self) -> &ChartView {
        &self.chart
    }

    pub fn view_mut(&mut self) -> &mut ChartView {
        &mut self.chart
    }

    pub fn x_source(&self) -> &AxisSource {
        &self.x_source
    }

    pub fn y_variable(&self) -> &str {
        &self.y_variable
    }

    pub fn twin_variable(&self) -> Option<&str> {
        self.twin_variable.as_deref()
    }

    pub fn is_log(&self, axis: LogAxis) -> bool {
        match axis {
            LogAxis::X => self.x_log,
            LogAxis::Y => self.y_log,
            LogAxis::Twin => self.twin_log,
        }
    }

    /// Log toggles only apply to variable axes, and the twin toggle only
    /// while the twin is shown.
    pub fn log_toggle_enabled(&self, axis: LogAxis) -> bool {
        match axis {
            LogAxis::X => !self.x_source.is_time(),
            LogAxis::Y => true,
            LogAxis::Twin => self.twin_variable.is_some(),
        }
    }

    fn check_variable(store: &SeriesStore, metadata: &Metadata, variable: &str) -> Result<(), ChartError> {
        if store.has_variable(variable) || metadata.contains(variable) {
            Ok(())
        } else {
            Err(ChartError::UnknownVariable(variable.to_string()))
        }
    }

    fn sourced_series(&self, store: &SeriesStore, metadata: &Metadata, variable: &str) -> Vec<Series> {
        store
            .series(variable)
            .iter()
            .cloned()
            .map(|mut s| {
                store.resource_x(&mut s, &self.x_source, metadata);
                s
            })
            .collect()
    }

    /// Pulls every series from the store and recomputes domains and titles.
    pub fn sync(&mut self, store: &SeriesStore, metadata: &Metadata) {
        self.time_domain = store.time_domain();
        let primary = self.sourced_series(store, metadata, &self.y_variable);
        self.chart.set_data(primary);
        match self.twin_variable.clone() {
            Some(t) => {
                self.chart.set_twin_enabled(true);
                let twin = self.sourced_series(store, metadata, &t);
                self.chart.set_twin_data(twin);
            }
            None => {
                self.chart.set_twin_enabled(false);
            }
        }
        self.apply_scale_kinds();
        self.recompute_domain();
        self.update_titles(metadata);
    }

    /// [`Self::sync`] followed by the first draw or an incremental update.
    pub fn refresh(&mut self, store: &SeriesStore, metadata: &Metadata) {
        self.sync(store, metadata);
        if self.chart.is_drawn() {
            self.chart.update_data();
        } else {
            self.chart.draw();
        }
    }

    pub fn set_x_axis(
        &mut self,
        source: AxisSource,
        store: &SeriesStore,
        metadata: &Metadata,
    ) -> Result<(), ChartError> {
        if let Some(v) = source.variable() {
            Self::check_variable(store, metadata, v)?;
        }
        debug!(x = ?source, "custom chart x axis reassigned");
        self.x_source = source;
        if self.x_source.is_time() {
            self.x_log = false;
        }
        for s in self.chart.series_mut() {
            store.resource_x(s, &self.x_source, metadata);
        }
        for s in self.chart.twin_series_mut() {
            store.resource_x(s, &self.x_source, metadata);
        }
        // rebuild the per-period index from the re-sourced x values
        let series = self.chart.series().to_vec();
        self.chart.set_data(series);
        self.apply_scale_kinds();
        self.recompute_domain();
        self.update_titles(metadata);
        self.chart.change_x();
        Ok(())
    }

    pub fn set_y_axis(
        &mut self,
        variable: &str,
        store: &SeriesStore,
        metadata: &Metadata,
    ) -> Result<(), ChartError> {
        Self::check_variable(store, metadata, variable)?;
        debug!(y = variable, "custom chart y axis reassigned");
        self.y_variable = variable.to_string();
        let primary = self.sourced_series(store, metadata, variable);
        self.chart.set_data(primary);
        self.recompute_domain();
        self.update_titles(metadata);
        self.chart.change_y();
        Ok(())
    }

    /// Assigns the twin variable; `None` turns the twin axis off.
    pub fn set_twin_axis(
        &mut self,
        variable: Option<&str>,
        store: &SeriesStore,
        metadata: &Metadata,
    ) -> Result<(), ChartError> {
        if let Some(v) = variable {
            Self::check_variable(store, metadata, v)?;
        }
        debug!(twin = ?variable, "custom chart twin axis reassigned");
        self.twin_variable = variable.map(str::to_string);
        match variable {
            Some(v) => {
                self.chart.set_twin_enabled(true);
                let twin = self.sourced_series(store, metadata, v);
                self.chart.set_twin_data(twin);
            }
            None => {
                self.twin_log = false;
                self.chart.set_twin_enabled(false);
            }
        }
        self.apply_scale_kinds();
        self.recompute_domain();
        self.update_titles(metadata);
        if self.chart.is_drawn() {
            self.chart.update_data();
        }
        Ok(())
    }

    pub fn set_log(&mut self, axis: LogAxis, enabled: bool) -> Result<(), ChartError> {
        if enabled && !self.log_toggle_enabled(axis) {
            return Err(match axis {
                LogAxis::Twin => ChartError::TwinDisabled,
                _ => ChartError::LogOnTimeAxis,
            });
        }
        match axis {
            LogAxis::X => self.x_log = enabled,
            LogAxis::Y => self.y_log = enabled,
            LogAxis::Twin => self.twin_log = enabled,
        }
        self.apply_scale_kinds();
        self.recompute_domain();
        match axis {
            LogAxis::X => self.chart.change_x(),
            LogAxis::Y | LogAxis::Twin => self.chart.change_y(),
        }
        Ok(())
    }

    pub fn hide_run(&mut self, run: RunIndex) {
        self.chart.hide_run(run);
        self.rescale_after_visibility();
    }

    pub fn show_run(&mut self, run: RunIndex) {
        self.chart.show_run(run);
        self.rescale_after_visibility();
    }

    fn rescale_after_visibility(&mut self) {
        self.recompute_domain();
        self.chart.change_x();
        self.chart.change_y();
    }

    fn kind(log: bool) -> ScaleKind {
        if log {
            ScaleKind::Log
        } else {
            ScaleKind::Linear
        }
    }

    fn apply_scale_kinds(&mut self) {
        let x_format = if self.x_source.is_time() {
            AxisFormat::Time(TimeUnit::Milliseconds)
        } else {
            AxisFormat::Numeric
        };
        self.chart.set_x_axis(Self::kind(self.x_log), x_format);
        self.chart.set_y_kind(Self::kind(self.y_log));
        self.chart.set_twin_kind(Self::kind(self.twin_log));
    }

    /// Domains from the visible runs only.
    pub fn recompute_domain(&mut self) {
        let hidden = self.chart.hidden_runs().clone();
        let visible = |series: &[Series]| -> Vec<Series> {
            series
                .iter()
                .filter(|s| !hidden.contains(&s.run_index))
                .cloned()
                .collect()
        };
        let primary = visible(self.chart.series());

        let x = match self.x_source.variable() {
            None => self.time_domain,
            Some(v) => self
                .rules
                .extent(Some(v), &AxisDomain::flatten(&primary, Axis::X, false), self.x_log),
        };
        let y = self.rules.extent(
            Some(self.y_variable.as_str()),
            &AxisDomain::flatten(&primary, Axis::Y, false),
            self.y_log,
        );
        self.chart.set_domain(x, y);

        if let Some(t) = &self.twin_variable {
            let twin = visible(self.chart.twin_series());
            let ty = self
                .rules
                .extent(Some(t.as_str()), &AxisDomain::flatten(&twin, Axis::Y, false), self.twin_log);
            self.chart.set_twin_domain(ty);
        }
    }

    /// `"<y> v. <x>"` title and the matching unit subtitle.
    pub fn titles(&self, metadata: &Metadata) -> (String, String) {
        let (x_title, x_unit) = match self.x_source.variable() {
            Some(v) => (metadata.title(v), metadata.title_unit(v)),
            None => ("Time".to_string(), "years".to_string()),
        };
        (
            format!("{} v. {}", metadata.title(&self.y_variable), x_title),
            format!("{} v. {}", metadata.title_unit(&self.y_variable), x_unit),
        )
    }

    fn update_titles(&mut self, metadata: &Metadata) {
        let (title, subtitle) = self.titles(metadata);
        self.chart.set_title(title, subtitle);
        let twin_title = self
            .twin_variable
            .as_deref()
            .map(|t| metadata.title_unit(t))
            .unwrap_or_default();
        self.chart.set_twin_title(twin_title);
    }

    /// Applies a zoom window when x is time; variable x axes are not zoomed.
    pub fn zoom_to(&mut self, window: Option<(f64, f64)>, y: (f64, f64), twin_y: Option<(f64, f64)>) {
        if !self.x_source.is_time() {
            return;
        }
        let x = window.unwrap_or(self.time_domain);
        let twin_y = twin_y.filter(|_| self.twin_variable.is_some());
        self.chart.zoom_to(x, y, twin_y);
    }
}
