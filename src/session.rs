//! State of one charting page: the dataset, run colors, every chart and the
//! run list, owned in one place and handed to collaborators explicitly.

use crate::chart_view::ChartView;
use crate::config::ChartingConfig;
use crate::custom_chart::{ChartError, CustomChartView, ExtentRules, LogAxis};
use crate::data_types::{
    Axis, AxisFormat, ChartFlags, Metadata, Padding, RunIndex, ScaleKind, TimeUnit,
};
use crate::export;
use crate::palette::ColorAllocator;
use crate::parameters::{ParameterDescriptor, ParameterSet};
use crate::payload::RunData;
use crate::run_controller::UnphysicalWarning;
use crate::run_list::RunList;
use crate::series_store::{year_grid, AxisSource, RunInfo, SeriesStore};
use crate::theme::ChartTheme;
use crate::zoom_overview::{zoomed_extent, ZoomOverviewView};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub const CUSTOM_CHART_ID: &str = "custom";
pub const ZOOM_CHART_ID: &str = "zoom";

/// What was submitted to produce a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub index: RunIndex,
    pub parameters: ParameterSet,
    pub description: String,
}

pub struct ChartingSession {
    config: ChartingConfig,
    metadata: Metadata,
    descriptors: Vec<ParameterDescriptor>,
    rules: ExtentRules,

    store: SeriesStore,
    colors: ColorAllocator,
    next_run_index: usize,
    runs: BTreeMap<RunIndex, RunRecord>,

    charts: BTreeMap<String, ChartView>,
    chart_order: Vec<String>,
    custom: CustomChartView,
    zoom: ZoomOverviewView,
    zoom_window: Option<(f64, f64)>,

    run_list: RunList,
    hover_enabled: bool,
    warning: Option<UnphysicalWarning>,
}

impl ChartingSession {
    pub fn new(config: ChartingConfig, metadata: Metadata) -> Self {
        let grid = year_grid(config.start_year, config.period_length, config.graph_periods);
        let rules = ExtentRules {
            floors: config.extent_floors.clone(),
            floor_zero: config.floor_zero_variables.clone(),
        };
        let custom_padding = config.custom_padding();
        let mut custom = CustomChartView::new(
            CUSTOM_CHART_ID,
            config.custom_y_variable.clone(),
            config.twin_variable.clone(),
            custom_padding,
            rules.clone(),
        );
        custom.view_mut().toggle_hover(false);
        let zoom_padding = Padding::new(2.0, custom_padding.right, 2.0, custom_padding.left);
        let zoom = ZoomOverviewView::new(
            ZOOM_CHART_ID,
            config.custom_y_variable.clone(),
            zoom_padding,
            config.zoom_height + zoom_padding.top + zoom_padding.bottom,
        );
        Self {
            colors: ColorAllocator::new(config.palette.clone()),
            store: SeriesStore::new(grid),
            metadata,
            descriptors: Vec::new(),
            rules,
            next_run_index: 0,
            runs: BTreeMap::new(),
            charts: BTreeMap::new(),
            chart_order: Vec::new(),
            custom,
            zoom,
            zoom_window: None,
            run_list: RunList::new(),
            hover_enabled: false,
            warning: None,
            config,
        }
    }

    pub fn with_descriptors(mut self, descriptors: Vec<ParameterDescriptor>) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn config(&self) -> &ChartingConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn colors(&self) -> &ColorAllocator {
        &self.colors
    }

    pub fn run_list(&self) -> &RunList {
        &self.run_list
    }

    pub fn run_list_mut(&mut self) -> &mut RunList {
        &mut self.run_list
    }

    pub fn run(&self, run: RunIndex) -> Option<&RunRecord> {
        self.runs.get(&run)
    }

    pub fn next_run_index(&self) -> RunIndex {
        RunIndex(self.next_run_index)
    }

    pub fn custom(&self) -> &CustomChartView {
        &self.custom
    }

    pub fn zoom(&self) -> &ZoomOverviewView {
        &self.zoom
    }

    pub fn zoom_window(&self) -> Option<(f64, f64)> {
        self.zoom_window
    }

    pub fn hover_enabled(&self) -> bool {
        self.hover_enabled
    }

    pub fn warning(&self) -> Option<&UnphysicalWarning> {
        self.warning.as_ref()
    }

    pub fn set_warning(&mut self, warning: Option<UnphysicalWarning>) {
        self.warning = warning;
    }

    /// Small-multiple charts, in creation order.
    pub fn charts(&self) -> impl Iterator<Item = &ChartView> {
        self.chart_order.iter().filter_map(|v| self.charts.get(v))
    }

    pub fn chart(&self, variable: &str) -> Option<&ChartView> {
        self.charts.get(variable)
    }

    /// Any chart by id: a variable name, [`CUSTOM_CHART_ID`] or
    /// [`ZOOM_CHART_ID`].
    pub fn view(&self, id: &str) -> Option<&ChartView> {
        match id {
            CUSTOM_CHART_ID => Some(self.custom.view()),
            ZOOM_CHART_ID => Some(self.zoom.view()),
            v => self.charts.get(v),
        }
    }

    fn view_mut(&mut self, id: &str) -> Option<&mut ChartView> {
        match id {
            CUSTOM_CHART_ID => Some(self.custom.view_mut()),
            ZOOM_CHART_ID => Some(self.zoom.view_mut()),
            v => self.charts.get_mut(v),
        }
    }

    // Runs

    /// Registers a successful result: allocates the next run index and its
    /// color, appends its series and brings every chart up to date.
    pub fn register_run(&mut self, data: &RunData, parameters: ParameterSet, description: String) -> RunIndex {
        let index = RunIndex(self.next_run_index);
        self.next_run_index += 1;
        let color = self.colors.allocate(index);
        let info = RunInfo::new(index, color);
        self.run_list.add_ready(index, &info.name, color, description.clone());
        self.store.add_run(data, info, &self.metadata);
        self.runs.insert(
            index,
            RunRecord {
                index,
                parameters,
                description,
            },
        );
        info!(run = index.0, runs = self.store.run_count(), "run registered");
        self.ensure_charts();
        self.refresh_all();
        self.sync_hover();
        index
    }

    /// Deletes every series of `run`. Unknown runs are a no-op.
    pub fn remove_run(&mut self, run: RunIndex) -> bool {
        let known = self.store.remove_run(run);
        self.run_list.remove(run);
        if !known {
            return false;
        }
        self.colors.release(run);
        self.runs.remove(&run);
        for id in self.all_chart_ids() {
            if let Some(c) = self.view_mut(&id) {
                c.forget_run(run);
            }
        }
        self.refresh_all();
        self.sync_hover();
        true
    }

    pub fn rename_run(&mut self, run: RunIndex, name: &str) -> bool {
        if !self.store.rename_run(run, name) {
            return false;
        }
        self.run_list.rename(run, name);
        self.refresh_all();
        true
    }

    pub fn hide_run(&mut self, run: RunIndex) -> bool {
        self.set_run_visible(run, false)
    }

    pub fn show_run(&mut self, run: RunIndex) -> bool {
        self.set_run_visible(run, true)
    }

    fn set_run_visible(&mut self, run: RunIndex, visible: bool) -> bool {
        if !self.store.set_visibility(run, visible) {
            return false;
        }
        self.run_list.set_visible(run, visible);
        for chart in self.charts.values_mut() {
            if visible {
                chart.show_run(run);
            } else {
                chart.hide_run(run);
            }
        }
        if visible {
            self.custom.show_run(run);
            self.zoom.view_mut().show_run(run);
        } else {
            self.custom.hide_run(run);
            self.zoom.view_mut().hide_run(run);
        }
        self.apply_zoom();
        self.sync_hover();
        true
    }

    /// Removes every run and frees every color.
    pub fn clear_runs(&mut self) {
        let removed = self.store.run_count();
        for run in self.store.run_indices() {
            for id in self.all_chart_ids() {
                if let Some(c) = self.view_mut(&id) {
                    c.forget_run(run);
                }
            }
        }
        self.store.clear();
        self.colors.clear();
        self.runs.clear();
        self.run_list.clear_runs();
        self.warning = None;
        self.refresh_all();
        self.sync_hover();
        info!(removed, "all runs cleared");
    }

    /// Hover is switched off on every chart once no run is visible, and back
    /// on as soon as one is.
    fn sync_hover(&mut self) {
        let enable = self.store.visible_run_count() > 0;
        if enable == self.hover_enabled {
            return;
        }
        self.hover_enabled = enable;
        for chart in self.charts.values_mut() {
            chart.toggle_hover(enable);
        }
        self.custom.view_mut().toggle_hover(enable);
        debug!(enable, "hover toggled");
    }

    // Charts

    fn small_multiple_variables(&self) -> Vec<String> {
        match &self.config.small_multiples {
            Some(list) => list.clone(),
            None => self.store.variables().map(str::to_string).collect(),
        }
    }

    fn all_chart_ids(&self) -> Vec<String> {
        let mut ids = self.chart_order.clone();
        ids.push(CUSTOM_CHART_ID.to_string());
        ids.push(ZOOM_CHART_ID.to_string());
        ids
    }

    /// Creates the small multiple of every charted variable not yet shown.
    fn ensure_charts(&mut self) {
        for variable in self.small_multiple_variables() {
            if self.charts.contains_key(&variable) {
                continue;
            }
            let mut chart = ChartView::new(variable.clone()).with_flags(ChartFlags {
                hoverable: true,
                ..Default::default()
            });
            chart.configure(
                300.0,
                200.0,
                self.config.small_padding(),
                ScaleKind::Linear,
                ScaleKind::Linear,
                AxisFormat::Time(TimeUnit::Milliseconds),
                AxisFormat::Numeric,
            );
            chart.set_title(self.metadata.title(&variable), self.metadata.unit(&variable));
            chart.toggle_hover(self.hover_enabled);
            debug!(variable = %variable, "small multiple created");
            self.chart_order.push(variable.clone());
            self.charts.insert(variable, chart);
        }
    }

    /// Pushes the store's current content into every chart.
    fn refresh_all(&mut self) {
        let time = self.store.time_domain();
        for (variable, chart) in self.charts.iter_mut() {
            let series = self.store.series(variable).to_vec();
            let y = full_extent(&self.store, &self.rules, variable);
            chart.set_data(series);
            chart.set_domain(time, y);
            if chart.is_drawn() {
                chart.update_data();
            } else {
                chart.draw();
            }
        }
        self.custom.refresh(&self.store, &self.metadata);
        self.zoom.refresh(&self.store, &self.metadata, &self.rules);
        if self.zoom_window.is_some() {
            self.apply_zoom();
        }
    }

    /// Resizes one chart and repositions its nodes. Safe before any run.
    pub fn resize(&mut self, id: &str, width: f32, height: f32) -> bool {
        let Some(chart) = self.view_mut(id) else {
            return false;
        };
        if chart.size() == (width, height) {
            return true;
        }
        chart.set_size(width, height);
        chart.redraw();
        if id == ZOOM_CHART_ID {
            // the brush is in pixels and no longer matches
            self.zoom.clear_brush();
            self.zoom_window = None;
            self.apply_zoom();
        }
        true
    }

    /// Routes a plot-area pointer position on chart `id`. Returns whether a
    /// tooltip is now shown.
    pub fn hover(&mut self, id: &str, pos: (f32, f32)) -> bool {
        self.view_mut(id).is_some_and(|c| c.hover_at(pos).is_some())
    }

    pub fn pointer_leave(&mut self, id: &str) {
        if let Some(c) = self.view_mut(id) {
            c.pointer_leave();
        }
    }

    // Custom chart

    pub fn set_custom_x(&mut self, source: AxisSource) -> Result<(), ChartError> {
        self.custom.set_x_axis(source, &self.store, &self.metadata)?;
        self.apply_zoom();
        Ok(())
    }

    pub fn set_custom_y(&mut self, variable: &str) -> Result<(), ChartError> {
        self.custom.set_y_axis(variable, &self.store, &self.metadata)?;
        self.zoom.set_variable(variable);
        self.zoom.refresh(&self.store, &self.metadata, &self.rules);
        self.apply_zoom();
        Ok(())
    }

    pub fn set_custom_twin(&mut self, variable: Option<&str>) -> Result<(), ChartError> {
        self.custom.set_twin_axis(variable, &self.store, &self.metadata)?;
        self.apply_zoom();
        Ok(())
    }

    pub fn set_custom_log(&mut self, axis: LogAxis, enabled: bool) -> Result<(), ChartError> {
        self.custom.set_log(axis, enabled)?;
        self.apply_zoom();
        Ok(())
    }

    // Zoom

    pub fn brush_start(&mut self, px_x: f32) {
        self.zoom.brush_start(px_x);
    }

    pub fn brush_move(&mut self, px_x: f32) {
        self.zoom.brush_move(px_x);
    }

    pub fn brush_end(&mut self, px_x: f32) -> Option<(f64, f64)> {
        self.zoom_window = self.zoom.brush_end(px_x);
        self.apply_zoom();
        self.zoom_window
    }

    pub fn clear_brush(&mut self) {
        self.zoom.clear_brush();
        self.zoom_window = None;
        self.apply_zoom();
    }

    /// Sets the zoom window directly, in data coordinates.
    pub fn zoom_to(&mut self, window: Option<(f64, f64)>) {
        self.zoom_window = window.filter(|(a, b)| b > a);
        self.apply_zoom();
    }

    /// Recomputes every zoomed chart's domain for the current window and
    /// repositions in place. Inside a window hidden runs do not count;
    /// unzoomed small multiples keep the extent of every stored run.
    fn apply_zoom(&mut self) {
        let window = self.zoom_window;
        let x = window.unwrap_or_else(|| self.store.time_domain());
        for (variable, chart) in self.charts.iter_mut() {
            let y = match window {
                Some(_) => zoomed_extent(chart.series(), chart.hidden_runs(), window, &self.rules, variable, false),
                None => full_extent(&self.store, &self.rules, variable),
            };
            chart.zoom_to(x, y, None);
        }

        if !self.custom.x_source().is_time() {
            return;
        }
        let view = self.custom.view();
        let y = zoomed_extent(
            view.series(),
            view.hidden_runs(),
            window,
            &self.rules,
            self.custom.y_variable(),
            self.custom.is_log(LogAxis::Y),
        );
        let twin_y = self.custom.twin_variable().map(|t| {
            zoomed_extent(
                view.twin_series(),
                view.hidden_runs(),
                window,
                &self.rules,
                t,
                self.custom.is_log(LogAxis::Twin),
            )
        });
        self.custom.zoom_to(window, y, twin_y);
    }

    // Export

    /// CSV text of the visible runs for every charted variable.
    pub fn csv_export(&self) -> String {
        export::csv(&self.store, &self.metadata, &self.chart_order)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        export::write_csv(path, &self.csv_export())
    }

    pub fn svg_export(&self, id: &str, theme: &ChartTheme) -> Option<String> {
        self.view(id).map(|v| export::svg(v, theme))
    }
}

/// Y extent of a small multiple over every stored run, hidden ones included.
fn full_extent(store: &SeriesStore, rules: &ExtentRules, variable: &str) -> (f64, f64) {
    rules.extent(Some(variable), &store.flatten(variable, Axis::Y), false)
}
