//! The charting page as a gpui view: small multiples, the custom chart with
//! its zoom overview, the run list and the model run controls.

use crate::chart_view::chart_element;
use crate::client::{HttpSimulationClient, RunRequest, SimulationClient};
use crate::custom_chart::LogAxis;
use crate::data_types::RunIndex;
use crate::export;
use crate::parameters::{ParameterSet, ParameterValue};
use crate::run_controller::{RunController, RunError};
use crate::run_list::{EntryKey, EntryState, PendingRunId, RunEntry};
use crate::series_store::AxisSource;
use crate::session::{ChartingSession, CUSTOM_CHART_ID, ZOOM_CHART_ID};
use crate::theme::ChartTheme;
use crate::utils::PixelsExt;
use gpui::prelude::*;
use gpui::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const KEY_CONTEXT: &str = "ChartWorkspace";

pub const CSV_EXPORT_FILE: &str = "webdice_runs.csv";

actions!(webdice_chart, [RunModel, ClearRuns, ResetZoom, ExportCsv, ExportSvg]);

pub fn init(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("ctrl-enter", RunModel, Some(KEY_CONTEXT)),
        KeyBinding::new("ctrl-shift-backspace", ClearRuns, Some(KEY_CONTEXT)),
        KeyBinding::new("escape", ResetZoom, Some(KEY_CONTEXT)),
        KeyBinding::new("ctrl-shift-e", ExportCsv, Some(KEY_CONTEXT)),
        KeyBinding::new("ctrl-shift-s", ExportSvg, Some(KEY_CONTEXT)),
    ]);
}

/// A run name being edited in the run list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameDraft {
    pub run: RunIndex,
    pub text: String,
}

type SharedBounds = Arc<Mutex<HashMap<String, Bounds<Pixels>>>>;

pub struct ChartWorkspace {
    session: ChartingSession,
    controller: RunController,
    client: Arc<dyn SimulationClient>,
    parameters: ParameterSet,
    theme: ChartTheme,
    /// Last painted bounds of every chart canvas, keyed by chart id.
    bounds: SharedBounds,
    renaming: Option<RenameDraft>,
    focus_handle: FocusHandle,
}

impl ChartWorkspace {
    pub fn new(session: ChartingSession, client: Arc<dyn SimulationClient>, cx: &mut Context<Self>) -> Self {
        let config = session.config();
        let controller = RunController::new(config.failure_display())
            .with_unphysical_check(config.unphysical_variable.clone(), config.unphysical_threshold);
        let parameters = ParameterSet::defaults(session.descriptors());
        Self {
            session,
            controller,
            client,
            parameters,
            theme: ChartTheme::default(),
            bounds: Arc::new(Mutex::new(HashMap::new())),
            renaming: None,
            focus_handle: cx.focus_handle(),
        }
    }

    /// Workspace submitting to the configured endpoint over HTTP.
    pub fn with_http_client(session: ChartingSession, cx: &mut Context<Self>) -> Self {
        let client = HttpSimulationClient::from_config(session.config());
        Self::new(session, Arc::new(client), cx)
    }

    pub fn with_theme(mut self, theme: ChartTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn session(&self) -> &ChartingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ChartingSession {
        &mut self.session
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Sets one model parameter for the next submission.
    pub fn set_parameter(&mut self, machine_name: &str, value: ParameterValue, cx: &mut Context<Self>) {
        self.parameters.set(self.session.descriptors(), machine_name, value);
        cx.notify();
    }

    /// Submits the current parameters. The request runs on the background
    /// executor and its answer is routed back to this view.
    pub fn run_model(&mut self, cx: &mut Context<Self>) -> PendingRunId {
        let parameters = self.parameters.clone();
        let id = self.controller.begin(&mut self.session, parameters.clone());
        let client = self.client.clone();
        let request = RunRequest::new(parameters);
        let task = cx.background_spawn(async move { client.run(request).await });
        cx.spawn(async move |this, cx| {
            let result = task.await;
            let _ = this.update(cx, |ws, cx| ws.finish_run(id, result, cx));
        })
        .detach();
        cx.notify();
        id
    }

    /// Routes the answer of submission `id`. Failure markers are removed once
    /// their display time has passed.
    pub fn finish_run(&mut self, id: PendingRunId, result: Result<String, RunError>, cx: &mut Context<Self>) {
        match self.controller.complete(&mut self.session, id, result) {
            Ok(outcome) => debug!(run = outcome.run_index.0, "run charted"),
            Err(_) => {
                let delay = self.controller.failure_display();
                cx.spawn(async move |this, cx| {
                    cx.background_executor().timer(delay).await;
                    let _ = this.update(cx, |ws, cx| {
                        ws.controller.expire_failures(&mut ws.session, Instant::now());
                        cx.notify();
                    });
                })
                .detach();
            }
        }
        cx.notify();
    }

    pub fn remove_run(&mut self, run: RunIndex, cx: &mut Context<Self>) {
        if self.renaming.as_ref().is_some_and(|d| d.run == run) {
            self.renaming = None;
        }
        self.session.remove_run(run);
        cx.notify();
    }

    pub fn clear_runs(&mut self, cx: &mut Context<Self>) {
        self.renaming = None;
        self.session.clear_runs();
        cx.notify();
    }

    pub fn rename_run(&mut self, run: RunIndex, name: &str, cx: &mut Context<Self>) {
        self.session.rename_run(run, name);
        cx.notify();
    }

    // Rename

    pub fn rename_draft(&self) -> Option<&RenameDraft> {
        self.renaming.as_ref()
    }

    /// Starts editing the name of `run`, seeded with its current name.
    pub fn begin_rename(&mut self, run: RunIndex, window: &mut Window, cx: &mut Context<Self>) {
        let Some(entry) = self.session.run_list().entry(EntryKey::Run(run)) else {
            return;
        };
        self.renaming = Some(RenameDraft {
            run,
            text: entry.name.clone(),
        });
        window.focus(&self.focus_handle);
        cx.notify();
    }

    pub fn type_rename(&mut self, text: &str, cx: &mut Context<Self>) {
        if let Some(draft) = self.renaming.as_mut() {
            draft.text.push_str(text);
            cx.notify();
        }
    }

    pub fn backspace_rename(&mut self, cx: &mut Context<Self>) {
        if let Some(draft) = self.renaming.as_mut() {
            draft.text.pop();
            cx.notify();
        }
    }

    /// Applies the draft. A blank name leaves the run as it was.
    pub fn commit_rename(&mut self, cx: &mut Context<Self>) {
        let Some(draft) = self.renaming.take() else {
            return;
        };
        let name = draft.text.trim();
        if name.is_empty() {
            debug!(run = draft.run.0, "blank run name ignored");
        } else {
            self.rename_run(draft.run, name, cx);
        }
        cx.notify();
    }

    pub fn cancel_rename(&mut self, cx: &mut Context<Self>) {
        if self.renaming.take().is_some() {
            cx.notify();
        }
    }

    fn handle_key_down(&mut self, event: &KeyDownEvent, _win: &mut Window, cx: &mut Context<Self>) {
        if self.renaming.is_none() {
            return;
        }
        let keystroke = &event.keystroke;
        match keystroke.key.as_str() {
            "enter" => self.commit_rename(cx),
            "escape" => self.cancel_rename(cx),
            "backspace" => self.backspace_rename(cx),
            _ if keystroke.modifiers.control || keystroke.modifiers.platform => return,
            _ => match keystroke.key_char.as_deref() {
                Some(text) => self.type_rename(text, cx),
                None => return,
            },
        }
        cx.stop_propagation();
    }

    // Export

    /// Writes the CSV of the visible runs into the export directory.
    pub fn export_csv(&self) -> eyre::Result<PathBuf> {
        let path = self.session.config().export_dir.join(CSV_EXPORT_FILE);
        self.session.write_csv(&path)?;
        info!(path = %path.display(), "CSV exported");
        Ok(path)
    }

    /// Writes one `<chart id>.svg` per chart into the export directory.
    pub fn export_svgs(&self) -> eyre::Result<Vec<PathBuf>> {
        let dir = &self.session.config().export_dir;
        let mut ids: Vec<String> = self.session.charts().map(|c| c.id().to_string()).collect();
        ids.push(CUSTOM_CHART_ID.to_string());
        let mut written = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(view) = self.session.view(&id) else {
                continue;
            };
            let path = dir.join(format!("{id}.svg"));
            export::write_svg(&path, view, &self.theme)?;
            written.push(path);
        }
        info!(count = written.len(), dir = %dir.display(), "SVG exported");
        Ok(written)
    }

    fn log_export<T>(result: eyre::Result<T>) {
        if let Err(e) = result {
            warn!(error = %e, "export failed");
        }
    }

    pub fn toggle_run(&mut self, run: RunIndex, cx: &mut Context<Self>) {
        if self.session.store().is_visible(run) {
            self.session.hide_run(run);
        } else {
            self.session.show_run(run);
        }
        cx.notify();
    }

    // Actions

    fn handle_run_model(&mut self, _: &RunModel, _win: &mut Window, cx: &mut Context<Self>) {
        self.run_model(cx);
    }

    fn handle_clear_runs(&mut self, _: &ClearRuns, _win: &mut Window, cx: &mut Context<Self>) {
        self.clear_runs(cx);
    }

    fn handle_reset_zoom(&mut self, _: &ResetZoom, _win: &mut Window, cx: &mut Context<Self>) {
        if self.renaming.is_some() {
            self.cancel_rename(cx);
            return;
        }
        self.session.clear_brush();
        cx.notify();
    }

    fn handle_export_csv(&mut self, _: &ExportCsv, _win: &mut Window, _cx: &mut Context<Self>) {
        Self::log_export(self.export_csv());
    }

    fn handle_export_svg(&mut self, _: &ExportSvg, _win: &mut Window, _cx: &mut Context<Self>) {
        Self::log_export(self.export_svgs());
    }

    // Pointer

    /// `position` relative to the plot area of chart `id`.
    fn plot_pos(&self, id: &str, position: Point<Pixels>) -> Option<(f32, f32)> {
        let bounds = *self.bounds.lock().get(id)?;
        let padding = self.session.view(id)?.padding();
        Some((
            (position.x - bounds.origin.x).as_f32() - padding.left,
            (position.y - bounds.origin.y).as_f32() - padding.top,
        ))
    }

    fn handle_brush_down(&mut self, event: &MouseDownEvent, _win: &mut Window, cx: &mut Context<Self>) {
        if let Some((x, _)) = self.plot_pos(ZOOM_CHART_ID, event.position) {
            self.session.brush_start(x);
            cx.notify();
        }
    }

    fn handle_global_mouse_move(&mut self, event: &MouseMoveEvent, _win: &mut Window, cx: &mut Context<Self>) {
        if !self.session.zoom().is_dragging() {
            return;
        }
        if let Some((x, _)) = self.plot_pos(ZOOM_CHART_ID, event.position) {
            self.session.brush_move(x);
            cx.notify();
        }
    }

    fn handle_global_mouse_up(&mut self, event: &MouseUpEvent, _win: &mut Window, cx: &mut Context<Self>) {
        if !self.session.zoom().is_dragging() {
            return;
        }
        if let Some((x, _)) = self.plot_pos(ZOOM_CHART_ID, event.position) {
            let window = self.session.brush_end(x);
            debug!(?window, "zoom window");
            cx.notify();
        }
    }

    /// Applies sizes measured during the last paint.
    fn sync_sizes(&mut self) {
        let measured: Vec<(String, Bounds<Pixels>)> =
            self.bounds.lock().iter().map(|(k, b)| (k.clone(), *b)).collect();
        for (id, b) in measured {
            let (w, h) = (b.size.width.as_f32(), b.size.height.as_f32());
            if w > 0.0 && h > 0.0 {
                self.session.resize(&id, w, h);
            }
        }
    }

    // Rendering

    fn chart_canvas(&self, id: &str, cx: &mut Context<Self>) -> Option<impl IntoElement> {
        let view = self.session.view(id)?;
        let bounds = self.bounds.clone();
        let key = id.to_string();
        let entity = cx.entity().downgrade();
        Some(chart_element(view, &self.theme, move |b, _window, cx| {
            let changed = bounds.lock().insert(key.clone(), b).is_none_or(|old| old.size != b.size);
            if changed {
                let entity = entity.clone();
                cx.defer(move |cx| {
                    let _ = entity.update(cx, |_, cx| cx.notify());
                });
            }
        }))
    }

    fn hoverable_chart(&self, id: String, cx: &mut Context<Self>) -> Option<Stateful<Div>> {
        let canvas = self.chart_canvas(&id, cx)?;
        let move_id = id.clone();
        let leave_id = id.clone();
        Some(
            div()
                .id(SharedString::from(id))
                .relative()
                .child(canvas)
                .on_mouse_move(cx.listener(move |this, event: &MouseMoveEvent, _win, cx| {
                    if let Some(pos) = this.plot_pos(&move_id, event.position) {
                        this.session.hover(&move_id, pos);
                        cx.notify();
                    }
                }))
                .on_hover(cx.listener(move |this, hovered: &bool, _win, cx| {
                    if !*hovered {
                        this.session.pointer_leave(&leave_id);
                        cx.notify();
                    }
                })),
        )
    }

    fn control_button(
        label: impl Into<SharedString>,
        active: bool,
        theme: &ChartTheme,
        on_click: impl Fn(&MouseDownEvent, &mut Window, &mut App) + 'static,
    ) -> impl IntoElement {
        div()
            .px_2()
            .py_1()
            .rounded_md()
            .text_size(px(12.0))
            .border_1()
            .border_color(theme.axis_label.opacity(0.2))
            .text_color(theme.axis_label)
            .when(active, |d| d.bg(theme.axis_label.opacity(0.12)))
            .hover(|s| s.bg(theme.axis_label.opacity(0.08)))
            .cursor_pointer()
            .on_mouse_down(MouseButton::Left, on_click)
            .child(label.into())
    }

    fn render_toolbar(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let status = match self.controller.state() {
            crate::run_controller::ControllerState::Idle => SharedString::from("Idle"),
            crate::run_controller::ControllerState::Submitting(n) => format!("Running {n}...").into(),
        };
        div()
            .flex()
            .gap_2()
            .items_center()
            .child(Self::control_button(
                "Run model",
                false,
                theme,
                cx.listener(|this, _, _, cx| {
                    this.run_model(cx);
                }),
            ))
            .child(Self::control_button(
                "Clear runs",
                false,
                theme,
                cx.listener(|this, _, _, cx| this.clear_runs(cx)),
            ))
            .child(Self::control_button(
                "Reset zoom",
                false,
                theme,
                cx.listener(|this, _, _, cx| {
                    this.session.clear_brush();
                    cx.notify();
                }),
            ))
            .child(Self::control_button(
                "Export CSV",
                false,
                theme,
                cx.listener(|this, _, _, _cx| Self::log_export(this.export_csv())),
            ))
            .child(Self::control_button(
                "Export SVG",
                false,
                theme,
                cx.listener(|this, _, _, _cx| Self::log_export(this.export_svgs())),
            ))
            .child(div().text_size(px(12.0)).text_color(theme.axis_label).child(status))
    }

    fn render_warning(&self, cx: &mut Context<Self>) -> Option<impl IntoElement> {
        let warning = self.session.warning()?;
        Some(
            div()
                .flex()
                .gap_2()
                .items_center()
                .p_2()
                .rounded_md()
                .bg(gpui::yellow().opacity(0.2))
                .text_size(px(12.0))
                .child(warning.message())
                .child(Self::control_button(
                    "Dismiss",
                    false,
                    &self.theme,
                    cx.listener(|this, _, _, cx| {
                        this.session.set_warning(None);
                        cx.notify();
                    }),
                )),
        )
    }

    fn render_entry(&self, entry: &RunEntry, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let swatch = entry.color.map(|c| c.to_hsla()).unwrap_or(theme.axis_label.opacity(0.3));
        let (status, dim) = match &entry.state {
            EntryState::Pending => (Some(SharedString::from("...")), true),
            EntryState::Failed { message, .. } => (Some(SharedString::from(message.clone())), true),
            EntryState::Ready { visible } => (None, !visible),
        };
        let draft = self
            .renaming
            .as_ref()
            .filter(|d| entry.run_index() == Some(d.run))
            .map(|d| format!("{}|", d.text));
        let name = match draft {
            Some(text) => div()
                .px_1()
                .border_1()
                .border_color(theme.axis_label.opacity(0.6))
                .child(text),
            None => div().child(entry.name.clone()),
        };
        let mut row = div()
            .flex()
            .gap_2()
            .items_center()
            .text_size(px(12.0))
            .text_color(if dim { theme.axis_label.opacity(0.5) } else { theme.axis_label })
            .child(div().size_3().rounded_sm().bg(swatch))
            .child(name)
            .child(
                div()
                    .text_color(theme.axis_label.opacity(0.6))
                    .child(entry.description.replace('\n', ", ")),
            )
            .children(status);

        if let Some(run) = entry.run_index() {
            let visible = matches!(entry.state, EntryState::Ready { visible: true });
            row = row
                .child(Self::control_button(
                    if visible { "Hide" } else { "Show" },
                    false,
                    theme,
                    cx.listener(move |this, _, _, cx| this.toggle_run(run, cx)),
                ))
                .child(Self::control_button(
                    "Rename",
                    false,
                    theme,
                    cx.listener(move |this, _, window, cx| this.begin_rename(run, window, cx)),
                ))
                .child(Self::control_button(
                    "Delete",
                    false,
                    theme,
                    cx.listener(move |this, _, _, cx| this.remove_run(run, cx)),
                ));
        }
        row
    }

    fn render_axis_controls(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let custom = self.session.custom();
        let variables: Vec<String> = self.session.store().variables().map(str::to_string).collect();
        let theme = &self.theme;

        let mut x_row = div().flex().flex_wrap().gap_1().items_center().child("x:").child(
            Self::control_button(
                "Time",
                custom.x_source().is_time(),
                theme,
                cx.listener(|this, _, _, cx| {
                    if let Err(e) = this.session.set_custom_x(AxisSource::Time) {
                        warn!(%e, "x axis change rejected");
                    }
                    cx.notify();
                }),
            ),
        );
        let mut y_row = div().flex().flex_wrap().gap_1().items_center().child("y:");
        let mut twin_row = div().flex().flex_wrap().gap_1().items_center().child("y2:").child(
            Self::control_button(
                "None",
                custom.twin_variable().is_none(),
                theme,
                cx.listener(|this, _, _, cx| {
                    if let Err(e) = this.session.set_custom_twin(None) {
                        warn!(%e, "twin axis change rejected");
                    }
                    cx.notify();
                }),
            ),
        );

        for v in &variables {
            let label = self.session.metadata().title(v);
            let x_var = v.clone();
            x_row = x_row.child(Self::control_button(
                label.clone(),
                custom.x_source().variable() == Some(v.as_str()),
                theme,
                cx.listener(move |this, _, _, cx| {
                    if let Err(e) = this.session.set_custom_x(AxisSource::Variable(x_var.clone())) {
                        warn!(%e, "x axis change rejected");
                    }
                    cx.notify();
                }),
            ));
            let y_var = v.clone();
            y_row = y_row.child(Self::control_button(
                label.clone(),
                custom.y_variable() == v,
                theme,
                cx.listener(move |this, _, _, cx| {
                    if let Err(e) = this.session.set_custom_y(&y_var) {
                        warn!(%e, "y axis change rejected");
                    }
                    cx.notify();
                }),
            ));
            let twin_var = v.clone();
            twin_row = twin_row.child(Self::control_button(
                label,
                custom.twin_variable() == Some(v.as_str()),
                theme,
                cx.listener(move |this, _, _, cx| {
                    if let Err(e) = this.session.set_custom_twin(Some(&twin_var)) {
                        warn!(%e, "twin axis change rejected");
                    }
                    cx.notify();
                }),
            ));
        }

        let mut log_row = div().flex().gap_1().items_center().child("log:");
        for (axis, label) in [(LogAxis::X, "x"), (LogAxis::Y, "y"), (LogAxis::Twin, "y2")] {
            if !custom.log_toggle_enabled(axis) {
                continue;
            }
            let enabled = custom.is_log(axis);
            log_row = log_row.child(Self::control_button(
                label,
                enabled,
                theme,
                cx.listener(move |this, _, _, cx| {
                    if let Err(e) = this.session.set_custom_log(axis, !enabled) {
                        warn!(%e, "log scale change rejected");
                    }
                    cx.notify();
                }),
            ));
        }

        div()
            .flex()
            .flex_col()
            .gap_1()
            .text_size(px(12.0))
            .text_color(theme.axis_label)
            .child(x_row)
            .child(y_row)
            .child(twin_row)
            .child(log_row)
    }
}

impl Focusable for ChartWorkspace {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for ChartWorkspace {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.sync_sizes();

        let ids: Vec<String> = self.session.charts().map(|c| c.id().to_string()).collect();
        let small_multiples: Vec<_> = ids
            .into_iter()
            .filter_map(|id| {
                let (_, h) = self.session.view(&id)?.size();
                self.hoverable_chart(id, cx).map(|c| c.w(relative(0.32)).h(px(h)))
            })
            .collect();

        let custom_height = self.session.custom().view().size().1;
        let custom = self
            .hoverable_chart(CUSTOM_CHART_ID.to_string(), cx)
            .map(|c| c.w_full().h(px(custom_height)));

        let zoom_height = self.session.zoom().view().size().1;
        let zoom = self.chart_canvas(ZOOM_CHART_ID, cx).map(|canvas| {
            div()
                .relative()
                .w_full()
                .h(px(zoom_height))
                .child(canvas)
                .child(self.session.zoom().brush_element(&self.theme))
                .on_mouse_down(MouseButton::Left, cx.listener(Self::handle_brush_down))
        });

        let entries: Vec<RunEntry> = self.session.run_list().entries().to_vec();
        let run_list = entries.iter().map(|e| self.render_entry(e, cx)).collect::<Vec<_>>();

        div()
            .track_focus(&self.focus_handle)
            .key_context(KEY_CONTEXT)
            .size_full()
            .flex()
            .flex_col()
            .gap_2()
            .p_2()
            .bg(self.theme.background)
            .child(self.render_toolbar(cx))
            .children(self.render_warning(cx))
            .child(div().flex().flex_col().gap_1().children(run_list))
            .child(div().flex().flex_wrap().gap_2().children(small_multiples))
            .child(self.render_axis_controls(cx))
            .children(custom)
            .children(zoom)
            .on_mouse_move(cx.listener(Self::handle_global_mouse_move))
            .on_mouse_up(MouseButton::Left, cx.listener(Self::handle_global_mouse_up))
            .on_key_down(cx.listener(Self::handle_key_down))
            .on_action(cx.listener(Self::handle_run_model))
            .on_action(cx.listener(Self::handle_clear_runs))
            .on_action(cx.listener(Self::handle_reset_zoom))
            .on_action(cx.listener(Self::handle_export_csv))
            .on_action(cx.listener(Self::handle_export_svg))
    }
}
