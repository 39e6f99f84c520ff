//! One chart: scales, lines, optional twin axis, legend and hover handles.
//!
//! The model is window-independent. Its three update paths differ in what
//! they touch:
//!
//! * [`ChartView::draw`] builds the scene once per chart lifetime,
//! * [`ChartView::update_data`] reconciles nodes with the current series,
//!   keeping the ids of nodes whose run is still present,
//! * [`ChartView::redraw`] only repositions existing nodes after a size
//!   change.
//!
//! [`renderer`] paints the resulting [`ChartScene`] into a gpui window.

pub mod hover;
pub mod renderer;
pub mod scene;

pub use hover::{nest_by_period, NestedSample, PeriodGroup};
pub use renderer::chart_element;
pub use scene::{dash_pieces, ChartScene, HoverSegment, LineNode, NodeId, NodeKey, PointNode, TickMark};

use crate::data_types::{
    AxisDomain, AxisFormat, ChartFlags, LegendConfig, LegendEntry, Padding, RunColor, RunIndex,
    ScaleKind, Series, Tooltip,
};
use crate::scales::ChartScale;
use crate::transform::PlotTransform;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Pixel radius within which a pointer picks a data point.
const POINT_PICK_RADIUS: f32 = 6.0;

/// How often each update path ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub draws: usize,
    pub updates: usize,
    pub redraws: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActiveHandle {
    Segment(usize),
    Point(NodeKey),
}

type Pieces = Vec<Vec<(f32, f32)>>;

#[derive(Clone, Debug)]
pub struct ChartView {
    id: String,
    width: f32,
    height: f32,
    padding: Padding,
    x_kind: ScaleKind,
    y_kind: ScaleKind,
    twin_kind: ScaleKind,
    x_format: AxisFormat,
    y_format: AxisFormat,
    flags: ChartFlags,
    legend: LegendConfig,
    title: String,
    subtitle: String,
    twin_title: String,

    series: Vec<Series>,
    twin_series: Vec<Series>,
    nested: Vec<PeriodGroup>,
    domain: AxisDomain,
    twin_domain: (f64, f64),
    hidden: BTreeSet<RunIndex>,

    hover_attached: bool,
    active: Option<ActiveHandle>,
    tooltip: Option<Tooltip>,

    scene: ChartScene,
    drawn: bool,
    lifecycle: Lifecycle,
}

impl ChartView {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: 300.0,
            height: 200.0,
            padding: Padding::default(),
            x_kind: ScaleKind::Linear,
            y_kind: ScaleKind::Linear,
            twin_kind: ScaleKind::Linear,
            x_format: AxisFormat::Numeric,
            y_format: AxisFormat::Numeric,
            flags: ChartFlags::default(),
            legend: LegendConfig::default(),
            title: String::new(),
            subtitle: String::new(),
            twin_title: String::new(),
            series: Vec::new(),
            twin_series: Vec::new(),
            nested: Vec::new(),
            domain: AxisDomain::new((0.0, 1.0), (0.0, 1.0)),
            twin_domain: (0.0, 1.0),
            hidden: BTreeSet::new(),
            hover_attached: true,
            active: None,
            tooltip: None,
            scene: ChartScene::default(),
            drawn: false,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn with_flags(mut self, flags: ChartFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_legend(mut self, legend: LegendConfig) -> Self {
        self.legend = legend;
        self
    }

    pub fn configure(
        &mut self,
        width: f32,
        height: f32,
        padding: Padding,
        x_kind: ScaleKind,
        y_kind: ScaleKind,
        x_format: AxisFormat,
        y_format: AxisFormat,
    ) -> &mut Self {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.padding = padding;
        self.x_kind = x_kind;
        self.y_kind = y_kind;
        self.x_format = x_format;
        self.y_format = y_format;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn flags(&self) -> ChartFlags {
        self.flags
    }

    pub fn legend_config(&self) -> &LegendConfig {
        &self.legend
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Width and height of the clipped drawing region.
    pub fn inner_size(&self) -> (f32, f32) {
        (
            (self.width - self.padding.left - self.padding.right).max(0.0),
            (self.height - self.padding.top - self.padding.bottom).max(0.0),
        )
    }

    pub fn set_title(&mut self, title: impl Into<String>, subtitle: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self.subtitle = subtitle.into();
        self.scene.title = self.title.clone();
        self.scene.subtitle = self.subtitle.clone();
        self
    }

    pub fn set_twin_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.twin_title = title.into();
        self.scene.twin_title = self.twin_title.clone();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn twin_title(&self) -> &str {
        &self.twin_title
    }

    pub fn x_kind(&self) -> ScaleKind {
        self.x_kind
    }

    pub fn y_kind(&self) -> ScaleKind {
        self.y_kind
    }

    pub fn twin_kind(&self) -> ScaleKind {
        self.twin_kind
    }

    pub fn set_x_axis(&mut self, kind: ScaleKind, format: AxisFormat) -> &mut Self {
        self.x_kind = kind;
        self.x_format = format;
        self
    }

    pub fn set_y_kind(&mut self, kind: ScaleKind) -> &mut Self {
        self.y_kind = kind;
        self
    }

    pub fn set_twin_kind(&mut self, kind: ScaleKind) -> &mut Self {
        self.twin_kind = kind;
        self
    }

    pub fn x_format(&self) -> AxisFormat {
        self.x_format
    }

    // Data

    /// Stores the series to render and rebuilds the per-period hover index.
    pub fn set_data(&mut self, series: Vec<Series>) -> &mut Self {
        self.nested = nest_by_period(&series);
        self.series = series;
        self
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn series_mut(&mut self) -> &mut [Series] {
        &mut self.series
    }

    pub fn nested(&self) -> &[PeriodGroup] {
        &self.nested
    }

    pub fn set_domain(&mut self, x: (f64, f64), y: (f64, f64)) -> &mut Self {
        self.domain = AxisDomain::new(AxisDomain::non_degenerate(x), AxisDomain::non_degenerate(y));
        self
    }

    pub fn domain(&self) -> &AxisDomain {
        &self.domain
    }

    pub fn twin_enabled(&self) -> bool {
        self.flags.twin
    }

    /// Turns the secondary axis on or off. The primary axis is untouched;
    /// disabling drops the twin data so nothing is drawn from it.
    pub fn set_twin_enabled(&mut self, enabled: bool) -> &mut Self {
        if self.flags.twin == enabled {
            return self;
        }
        self.flags.twin = enabled;
        if !enabled {
            self.twin_series.clear();
            self.twin_title.clear();
            self.scene.twin_title.clear();
            self.scene.twin_ticks.clear();
            self.scene.lines.retain(|l| !l.key.twin);
            self.scene.points.retain(|p| !p.key.twin);
        }
        debug!(chart = %self.id, enabled, "twin axis toggled");
        self
    }

    pub fn set_twin_data(&mut self, series: Vec<Series>) -> &mut Self {
        if !self.flags.twin {
            debug!(chart = %self.id, "twin data ignored while twin axis is off");
            return self;
        }
        self.twin_series = series;
        self
    }

    pub fn twin_series(&self) -> &[Series] {
        &self.twin_series
    }

    pub fn twin_series_mut(&mut self) -> &mut [Series] {
        &mut self.twin_series
    }

    pub fn set_twin_domain(&mut self, y: (f64, f64)) -> &mut Self {
        self.twin_domain = AxisDomain::non_degenerate(y);
        self
    }

    pub fn twin_domain(&self) -> (f64, f64) {
        self.twin_domain
    }

    // Scales

    pub fn x_scale(&self) -> ChartScale {
        let (w, _) = self.inner_size();
        ChartScale::new(self.x_kind, self.domain.x(), (0.0, w))
    }

    pub fn y_scale(&self) -> ChartScale {
        let (_, h) = self.inner_size();
        ChartScale::new(self.y_kind, self.domain.y(), (h, 0.0))
    }

    pub fn twin_scale(&self) -> ChartScale {
        let (_, h) = self.inner_size();
        ChartScale::new(self.twin_kind, self.twin_domain, (h, 0.0))
    }

    pub fn transform(&self) -> PlotTransform {
        PlotTransform::new(self.x_scale(), self.y_scale())
    }

    pub fn twin_transform(&self) -> PlotTransform {
        PlotTransform::new(self.x_scale(), self.twin_scale())
    }

    // Lifecycle

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn scene(&self) -> &ChartScene {
        &self.scene
    }

    /// First render. Later calls fall through to [`Self::update_data`].
    pub fn draw(&mut self) {
        if self.drawn {
            warn!(chart = %self.id, "draw called on a drawn chart, updating instead");
            self.update_data();
            return;
        }
        self.drawn = true;
        self.lifecycle.draws += 1;
        self.scene = ChartScene::new(self.width, self.height);
        self.scene.title = self.title.clone();
        self.scene.subtitle = self.subtitle.clone();
        self.scene.twin_title = self.twin_title.clone();
        self.sync_nodes(true);
        self.layout_decorations();
        debug!(chart = %self.id, lines = self.scene.lines.len(), "chart drawn");
    }

    /// Reconciles the scene with the current series: nodes of surviving runs
    /// keep their ids, new runs get new nodes, removed runs lose theirs.
    pub fn update_data(&mut self) {
        if !self.drawn {
            self.draw();
            return;
        }
        self.lifecycle.updates += 1;
        self.sync_nodes(true);
        self.layout_decorations();
        self.refresh_tooltip();
        debug!(chart = %self.id, lines = self.scene.lines.len(), "chart data updated");
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self
    }

    /// Repositions every existing node after a size change.
    pub fn redraw(&mut self) {
        if !self.drawn {
            debug!(chart = %self.id, "redraw before first draw ignored");
            return;
        }
        self.lifecycle.redraws += 1;
        self.scene.width = self.width;
        self.scene.height = self.height;
        self.sync_nodes(false);
        self.layout_decorations();
        self.refresh_tooltip();
    }

    /// Moves existing lines and re-places point handles after the x scale
    /// changed.
    pub fn change_x(&mut self) {
        if !self.drawn {
            return;
        }
        self.sync_nodes(false);
        self.layout_x_ticks();
        self.layout_segments();
        self.refresh_tooltip();
    }

    /// Moves existing lines and re-places point handles after a y scale
    /// changed.
    pub fn change_y(&mut self) {
        if !self.drawn {
            return;
        }
        self.sync_nodes(false);
        self.layout_y_ticks();
        self.refresh_tooltip();
    }

    /// Narrows the visible window and repositions in place.
    pub fn zoom_to(&mut self, x: (f64, f64), y: (f64, f64), twin_y: Option<(f64, f64)>) {
        self.set_domain(x, y);
        if let Some(t) = twin_y {
            self.set_twin_domain(t);
        }
        self.change_x();
        self.change_y();
    }

    // Visibility

    pub fn hide_run(&mut self, run: RunIndex) {
        if self.hidden.insert(run) {
            self.apply_visibility();
        }
    }

    pub fn show_run(&mut self, run: RunIndex) {
        if self.hidden.remove(&run) {
            self.apply_visibility();
        }
    }

    pub fn is_hidden(&self, run: RunIndex) -> bool {
        self.hidden.contains(&run)
    }

    pub fn hidden_runs(&self) -> &BTreeSet<RunIndex> {
        &self.hidden
    }

    /// Forgets a removed run's suppression state.
    pub fn forget_run(&mut self, run: RunIndex) {
        self.hidden.remove(&run);
    }

    fn apply_visibility(&mut self) {
        let hidden = &self.hidden;
        for l in self.scene.lines.iter_mut() {
            l.visible = !hidden.contains(&l.key.run_index);
        }
        for p in self.scene.points.iter_mut() {
            p.visible = !hidden.contains(&p.key.run_index);
        }
        for e in self.scene.legend.iter_mut() {
            e.hidden = hidden.contains(&e.run_index);
        }
        self.refresh_tooltip();
    }

    // Hover

    /// Attaches or detaches pointer handling. Data and scene are untouched.
    pub fn toggle_hover(&mut self, enabled: bool) {
        self.hover_attached = enabled;
        if !enabled {
            self.pointer_leave();
        }
    }

    pub fn hover_enabled(&self) -> bool {
        self.flags.hoverable && self.hover_attached
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn hover_segments(&self) -> &[HoverSegment] {
        &self.scene.segments
    }

    pub fn hover_segment_at(&self, px_x: f32) -> Option<usize> {
        self.scene.segment_at(px_x).map(|s| s.period)
    }

    /// Pointer entered the handle of `period`.
    pub fn pointer_enter(&mut self, period: usize) -> Option<&Tooltip> {
        if !self.hover_enabled() || !self.scene.segments.iter().any(|s| s.period == period) {
            return None;
        }
        self.active = Some(ActiveHandle::Segment(period));
        self.refresh_tooltip();
        self.tooltip.as_ref()
    }

    /// Pointer entered a data point handle (custom mode).
    pub fn pointer_enter_point(&mut self, key: NodeKey) -> Option<&Tooltip> {
        if !self.hover_enabled() || !self.scene.points.iter().any(|p| p.key == key && p.visible) {
            return None;
        }
        self.active = Some(ActiveHandle::Point(key));
        self.refresh_tooltip();
        self.tooltip.as_ref()
    }

    /// Routes a plot-area pointer position to the handle under it.
    pub fn hover_at(&mut self, pos: (f32, f32)) -> Option<&Tooltip> {
        if !self.hover_enabled() {
            return None;
        }
        let target = if self.flags.custom {
            self.scene
                .point_at(pos, POINT_PICK_RADIUS)
                .map(|p| ActiveHandle::Point(p.key))
        } else {
            self.hover_segment_at(pos.0).map(ActiveHandle::Segment)
        };
        match target {
            Some(ActiveHandle::Segment(period)) => self.pointer_enter(period),
            Some(ActiveHandle::Point(key)) => self.pointer_enter_point(key),
            None => {
                self.pointer_leave();
                None
            }
        }
    }

    pub fn pointer_leave(&mut self) {
        self.active = None;
        self.tooltip = None;
    }

    fn refresh_tooltip(&mut self) {
        let Some(active) = self.active else {
            return;
        };
        self.tooltip = match active {
            ActiveHandle::Segment(period) => self.compose_period_tooltip(period),
            ActiveHandle::Point(key) => self.compose_point_tooltip(key),
        };
        if self.tooltip.is_none() {
            self.active = None;
        }
    }

    fn compose_period_tooltip(&self, period: usize) -> Option<Tooltip> {
        let segment = self.scene.segments.iter().find(|s| s.period == period)?;
        let group = self.nested.get(period)?;
        let y_scale = self.y_scale();
        let top = group
            .samples
            .iter()
            .filter(|s| !self.hidden.contains(&s.run_index))
            .filter_map(|s| s.y.and_then(|y| y_scale.try_map(y)))
            .fold(f32::INFINITY, f32::min);
        let anchor = (segment.center, if top.is_finite() { top } else { 0.0 });
        let header = self.x_scale().format_tick(group.x, &self.x_format);
        Some(hover::period_tooltip(group, &self.hidden, Some(header), anchor))
    }

    fn compose_point_tooltip(&self, key: NodeKey) -> Option<Tooltip> {
        let node = self.scene.points.iter().find(|p| p.key == key && p.visible)?;
        let sample = key.sample?;
        let run = self.series.iter().find(|s| s.run_index == key.run_index)?;
        let twin = self
            .flags
            .twin
            .then(|| self.twin_series.iter().find(|s| s.run_index == key.run_index))
            .flatten();
        hover::point_tooltip(run, sample, twin, node.pos)
    }

    // Scene construction

    fn wanted_lines(&self) -> Vec<(NodeKey, RunColor, Pieces)> {
        let primary = self.transform();
        let mut out: Vec<(NodeKey, RunColor, Pieces)> = self
            .series
            .iter()
            .map(|s| (NodeKey::line(s.run_index, false), s.color, primary.polyline(&s.samples)))
            .collect();
        if self.flags.twin {
            let twin = self.twin_transform();
            out.extend(
                self.twin_series
                    .iter()
                    .map(|s| (NodeKey::line(s.run_index, true), s.color, twin.polyline(&s.samples))),
            );
        }
        out
    }

    fn wanted_points(&self) -> Vec<(NodeKey, RunColor, (f64, f64), (f32, f32))> {
        if !self.flags.custom {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut collect = |series: &[Series], transform: &PlotTransform, twin: bool| {
            for s in series {
                for (i, sample) in s.samples.iter().enumerate() {
                    let (Some(y), Some(pos)) = (sample.plotted_y(), transform.sample_to_screen(sample)) else {
                        continue;
                    };
                    out.push((NodeKey::point(s.run_index, twin, i), s.color, (sample.x, y), pos));
                }
            }
        };
        collect(&self.series, &self.transform(), false);
        if self.flags.twin {
            collect(&self.twin_series, &self.twin_transform(), true);
        }
        out
    }

    /// Brings line and point nodes in line with the series. With `create`
    /// unset, only line nodes that already exist are moved. Point handles
    /// always follow the samples that can be placed on the current scales.
    fn sync_nodes(&mut self, create: bool) {
        self.sync_lines(create);
        self.sync_points();
        self.apply_visibility();
    }

    fn sync_lines(&mut self, create: bool) {
        let wanted = self.wanted_lines();
        let mut old: BTreeMap<NodeKey, LineNode> =
            std::mem::take(&mut self.scene.lines).into_iter().map(|n| (n.key, n)).collect();
        let mut lines = Vec::with_capacity(wanted.len());
        for (key, color, pieces) in wanted {
            match old.remove(&key) {
                Some(mut node) => {
                    node.color = color;
                    node.pieces = pieces;
                    lines.push(node);
                }
                None if create => lines.push(LineNode {
                    id: self.scene.allocate_id(),
                    key,
                    color,
                    visible: true,
                    pieces,
                }),
                None => {}
            }
        }
        if !create {
            // nodes whose series vanished stay, but draw nothing
            lines.extend(old.into_values().map(|mut n| {
                n.pieces.clear();
                n
            }));
        }
        self.scene.lines = lines;
    }

    fn sync_points(&mut self) {
        let wanted = self.wanted_points();
        let mut old: BTreeMap<NodeKey, PointNode> =
            std::mem::take(&mut self.scene.points).into_iter().map(|n| (n.key, n)).collect();
        let mut points = Vec::with_capacity(wanted.len());
        for (key, color, data, pos) in wanted {
            match old.remove(&key) {
                Some(mut node) => {
                    node.color = color;
                    node.data = data;
                    node.pos = pos;
                    points.push(node);
                }
                None => points.push(PointNode {
                    id: self.scene.allocate_id(),
                    key,
                    color,
                    visible: true,
                    data,
                    pos,
                }),
            }
        }
        self.scene.points = points;
    }

    fn layout_decorations(&mut self) {
        let (w, h) = self.inner_size();
        self.scene.width = self.width;
        self.scene.height = self.height;
        self.scene.plot_width = w;
        self.scene.plot_height = h;
        self.scene.h_grid = self.flags.h_grid;
        self.layout_x_ticks();
        self.layout_y_ticks();
        self.layout_segments();
        self.layout_legend();
    }

    fn layout_x_ticks(&mut self) {
        let scale = self.x_scale();
        let (w, _) = self.inner_size();
        let count = ((w / 80.0).floor() as usize).clamp(2, 10);
        self.scene.x_ticks = scale
            .ticks(count)
            .into_iter()
            .filter_map(|t| {
                scale.try_map(t).map(|pos| TickMark {
                    pos,
                    label: scale.format_tick(t, &self.x_format),
                })
            })
            .collect();
    }

    fn layout_y_ticks(&mut self) {
        let (_, h) = self.inner_size();
        let count = ((h / 40.0).floor() as usize).clamp(2, 8);
        let ticks = |scale: ChartScale, format: &AxisFormat| -> Vec<TickMark> {
            scale
                .ticks(count)
                .into_iter()
                .filter_map(|t| {
                    scale.try_map(t).map(|pos| TickMark {
                        pos,
                        label: scale.format_tick(t, format),
                    })
                })
                .collect()
        };
        self.scene.y_ticks = ticks(self.y_scale(), &self.y_format);
        self.scene.twin_ticks = if self.flags.twin {
            ticks(self.twin_scale(), &AxisFormat::Numeric)
        } else {
            Vec::new()
        };
    }

    /// One band per period, spanning half the gap to each neighbour. Bands
    /// keep their ids when the period count is unchanged.
    fn layout_segments(&mut self) {
        if !self.flags.hoverable || self.flags.custom {
            self.scene.segments.clear();
            return;
        }
        let scale = self.x_scale();
        let (w, _) = self.inner_size();
        let centers: Vec<(usize, f64, f32)> = self
            .nested
            .iter()
            .enumerate()
            .filter_map(|(i, g)| scale.try_map(g.x).map(|c| (i, g.x, c)))
            .collect();

        let old_ids: Vec<NodeId> = self.scene.segments.iter().map(|s| s.id).collect();
        let mut segments = Vec::with_capacity(centers.len());
        for (n, (period, x_value, center)) in centers.iter().enumerate() {
            let left = match n.checked_sub(1).and_then(|p| centers.get(p)) {
                Some(prev) => (prev.2 + center) / 2.0,
                None => center.min(0.0),
            };
            let right = match centers.get(n + 1) {
                Some(next) => (center + next.2) / 2.0,
                None => center.max(w),
            };
            let id = match old_ids.get(n) {
                Some(id) if old_ids.len() == centers.len() => *id,
                _ => self.scene.allocate_id(),
            };
            segments.push(HoverSegment {
                id,
                period: *period,
                x_value: *x_value,
                center: *center,
                left,
                width: (right - left).max(0.0),
            });
        }
        self.scene.segments = segments;
    }

    fn layout_legend(&mut self) {
        if !self.legend.enabled {
            self.scene.legend.clear();
            return;
        }
        let mut seen = BTreeSet::new();
        self.scene.legend = self
            .series
            .iter()
            .filter(|s| seen.insert(s.run_index))
            .map(|s| LegendEntry {
                run_index: s.run_index,
                run_name: s.run_name.clone(),
                color: s.color,
                hidden: self.hidden.contains(&s.run_index),
            })
            .collect();
    }
}
