use async_trait::async_trait;
use gpui::TestAppContext;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use webdice_chart::client::{HttpSimulationClient, RunRequest, SimulationClient};
use webdice_chart::config::ChartingConfig;
use webdice_chart::data_types::{Metadata, RunIndex};
use webdice_chart::run_controller::{ControllerState, RunError};
use webdice_chart::run_list::{EntryKey, EntryState, PendingRunId};
use webdice_chart::session::{ChartingSession, CUSTOM_CHART_ID};
use webdice_chart::workspace::{RenameDraft, CSV_EXPORT_FILE};
use webdice_chart::ChartWorkspace;

#[derive(Default)]
struct QueueClient {
    answers: Mutex<VecDeque<Result<String, RunError>>>,
}

#[async_trait]
impl SimulationClient for QueueClient {
    async fn run(&self, _request: RunRequest) -> Result<String, RunError> {
        self.answers.lock().pop_front().unwrap_or(Err(RunError::Timeout))
    }
}

const BODY: &str = r#"{"data": {"damages": [1, 2, 3], "temperature": [0.8, 0.9, 1.0]}}"#;

fn session() -> ChartingSession {
    session_exporting_to(Path::new("."))
}

fn session_exporting_to(dir: &Path) -> ChartingSession {
    let config = ChartingConfig {
        graph_periods: 3,
        export_dir: dir.to_path_buf(),
        ..Default::default()
    };
    ChartingSession::new(config, Metadata::default())
}

#[gpui::test]
fn test_workspace_starts_empty(cx: &mut TestAppContext) {
    let client = Arc::new(QueueClient::default());
    let window = cx.add_window(|_window, cx| ChartWorkspace::new(session(), client, cx));

    window
        .update(cx, |ws, _window, _cx| {
            assert!(ws.session().store().is_empty());
            assert!(ws.session().run_list().is_empty());
            assert_eq!(ws.controller().state(), ControllerState::Idle);
        })
        .unwrap();
}

#[gpui::test]
fn test_run_model_charts_the_answer(cx: &mut TestAppContext) {
    let client = Arc::new(QueueClient {
        answers: Mutex::new(VecDeque::from([Ok(BODY.to_string())])),
    });
    let window = cx.add_window(|_window, cx| ChartWorkspace::new(session(), client, cx));

    let id = window
        .update(cx, |ws, _window, cx| {
            let id = ws.run_model(cx);
            assert_eq!(ws.controller().state(), ControllerState::Submitting(1));
            assert_eq!(ws.session().run_list().entries()[0].state, EntryState::Pending);
            id
        })
        .unwrap();

    cx.run_until_parked();

    window
        .update(cx, |ws, _window, _cx| {
            assert!(!ws.controller().is_pending(id));
            assert_eq!(ws.controller().state(), ControllerState::Idle);
            assert_eq!(ws.session().store().run_count(), 1);
            let entries = ws.session().run_list().entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].key, EntryKey::Run(RunIndex(0)));
            assert!(ws.session().chart("damages").is_some_and(|c| c.is_drawn()));
        })
        .unwrap();
}

#[gpui::test]
fn test_failed_run_is_marked(cx: &mut TestAppContext) {
    // an empty queue answers with a timeout
    let client = Arc::new(QueueClient::default());
    let window = cx.add_window(|_window, cx| ChartWorkspace::new(session(), client, cx));

    window
        .update(cx, |ws, _window, cx| {
            ws.run_model(cx);
        })
        .unwrap();
    cx.run_until_parked();

    window
        .update(cx, |ws, _window, _cx| {
            assert!(ws.session().store().is_empty());
            assert_eq!(ws.session().next_run_index(), RunIndex(0));
            let entries = ws.session().run_list().entries();
            assert_eq!(entries.len(), 1);
            assert!(entries[0].is_failed());
        })
        .unwrap();
}

#[gpui::test]
fn test_run_list_operations(cx: &mut TestAppContext) {
    let client = Arc::new(QueueClient::default());
    let window = cx.add_window(|_window, cx| ChartWorkspace::new(session(), client, cx));

    window
        .update(cx, |ws, _window, cx| {
            // a result never submitted still charts
            ws.finish_run(PendingRunId(7), Ok(BODY.to_string()), cx);
            assert_eq!(ws.session().store().run_count(), 1);

            ws.toggle_run(RunIndex(0), cx);
            assert!(!ws.session().store().is_visible(RunIndex(0)));
            ws.toggle_run(RunIndex(0), cx);
            assert!(ws.session().store().is_visible(RunIndex(0)));

            ws.rename_run(RunIndex(0), "Baseline", cx);
            assert_eq!(ws.session().run_list().entries()[0].name, "Baseline");

            ws.remove_run(RunIndex(0), cx);
            assert!(ws.session().store().is_empty());
            assert!(ws.session().run_list().is_empty());
        })
        .unwrap();
}

#[gpui::test]
fn test_rename_from_the_run_list(cx: &mut TestAppContext) {
    let client = Arc::new(QueueClient::default());
    let window = cx.add_window(|_window, cx| ChartWorkspace::new(session(), client, cx));

    window
        .update(cx, |ws, window, cx| {
            ws.finish_run(PendingRunId(0), Ok(BODY.to_string()), cx);
            let original = ws.session().run_list().entries()[0].name.clone();

            ws.begin_rename(RunIndex(0), window, cx);
            assert_eq!(
                ws.rename_draft(),
                Some(&RenameDraft {
                    run: RunIndex(0),
                    text: original.clone()
                })
            );
            for _ in 0..original.len() {
                ws.backspace_rename(cx);
            }
            ws.type_rename("High damages", cx);
            ws.commit_rename(cx);

            assert!(ws.rename_draft().is_none());
            assert_eq!(ws.session().run_list().entries()[0].name, "High damages");
            assert_eq!(ws.session().store().series("damages")[0].run_name, "High damages");

            // cancelling or blanking the draft keeps the name
            ws.begin_rename(RunIndex(0), window, cx);
            ws.type_rename(" (old)", cx);
            ws.cancel_rename(cx);
            ws.begin_rename(RunIndex(0), window, cx);
            for _ in 0.."High damages".len() {
                ws.backspace_rename(cx);
            }
            ws.type_rename("   ", cx);
            ws.commit_rename(cx);
            assert_eq!(ws.session().run_list().entries()[0].name, "High damages");

            // unknown runs have nothing to rename
            ws.begin_rename(RunIndex(9), window, cx);
            assert!(ws.rename_draft().is_none());
        })
        .unwrap();
}

#[gpui::test]
fn test_exports_land_in_the_export_dir(cx: &mut TestAppContext) {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(QueueClient::default());
    let session = session_exporting_to(dir.path());
    let window = cx.add_window(|_window, cx| ChartWorkspace::new(session, client, cx));

    window
        .update(cx, |ws, _window, cx| {
            ws.finish_run(PendingRunId(0), Ok(BODY.to_string()), cx);

            let csv = ws.export_csv().unwrap();
            assert_eq!(csv, dir.path().join(CSV_EXPORT_FILE));
            let text = std::fs::read_to_string(&csv).unwrap();
            assert_eq!(text.lines().count(), 4);
            assert!(text.starts_with("Year,"));

            let svgs = ws.export_svgs().unwrap();
            assert!(svgs.contains(&dir.path().join("damages.svg")));
            assert!(svgs.contains(&dir.path().join(format!("{CUSTOM_CHART_ID}.svg"))));
            for path in &svgs {
                assert!(std::fs::read_to_string(path).unwrap().starts_with("<svg"));
            }
        })
        .unwrap();
}

#[gpui::test]
fn test_http_workspace_starts_idle(cx: &mut TestAppContext) {
    let window = cx.add_window(|_window, cx| ChartWorkspace::with_http_client(session(), cx));

    window
        .update(cx, |ws, _window, _cx| {
            assert_eq!(ws.controller().state(), ControllerState::Idle);
            assert!(ws.session().run_list().is_empty());
        })
        .unwrap();
}

#[test]
fn test_http_client_takes_endpoint_and_timeout_from_config() {
    let config = ChartingConfig {
        endpoint: "http://model.local/run".to_string(),
        request_timeout_secs: 12,
        ..Default::default()
    };
    let client = HttpSimulationClient::from_config(&config);
    assert_eq!(client.endpoint(), "http://model.local/run");
    assert_eq!(client.timeout(), Duration::from_secs(12));
}
