use async_trait::async_trait;
use futures::executor::block_on;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use webdice_chart::client::{RunRequest, SimulationClient};
use webdice_chart::config::ChartingConfig;
use webdice_chart::data_types::{Metadata, RunIndex};
use webdice_chart::parameters::{ParameterDescriptor, ParameterSet, ParameterValue};
use webdice_chart::payload::PayloadError;
use webdice_chart::run_controller::{ControllerState, RunController, RunError};
use webdice_chart::run_list::{EntryKey, EntryState, PendingRunId};
use webdice_chart::session::ChartingSession;

/// Answers requests from a queue and records what it was sent.
#[derive(Default)]
struct ScriptedClient {
    answers: Mutex<VecDeque<Result<String, RunError>>>,
    requests: Mutex<Vec<RunRequest>>,
}

impl ScriptedClient {
    fn new(answers: Vec<Result<String, RunError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SimulationClient for ScriptedClient {
    async fn run(&self, request: RunRequest) -> Result<String, RunError> {
        self.requests.lock().push(request);
        self.answers.lock().pop_front().unwrap_or(Err(RunError::Timeout))
    }
}

fn body(consumption: f64) -> String {
    format!(
        r#"{{"data": {{"damages": [1, 2, 3], "consumption_pc": [{consumption}, 2.0, 3.0]}}}}"#
    )
}

fn session() -> ChartingSession {
    let config = ChartingConfig {
        graph_periods: 3,
        twin_variable: None,
        ..Default::default()
    };
    ChartingSession::new(config, Metadata::default()).with_descriptors(vec![ParameterDescriptor::range(
        "Savings rate",
        "savings",
        0.1,
        0.4,
        0.01,
        0.22,
    )])
}

fn controller() -> RunController {
    RunController::new(Duration::from_secs(5)).with_unphysical_check("consumption_pc", 0.25)
}

#[test]
fn test_successful_run_is_registered() {
    let client = ScriptedClient::new(vec![Ok(body(1.0))]);
    let mut session = session();
    let mut controller = controller();

    let outcome = block_on(controller.submit_and_wait(&client, &mut session, ParameterSet::default())).unwrap();

    assert_eq!(outcome.run_index, RunIndex(0));
    assert_eq!(outcome.warning, None);
    assert_eq!(controller.state(), ControllerState::Idle);
    assert_eq!(session.store().run_count(), 1);
    let entries = session.run_list().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, EntryKey::Run(RunIndex(0)));
    assert_eq!(entries[0].state, EntryState::Ready { visible: true });
    assert_eq!(client.requests.lock().len(), 1);
}

#[test]
fn test_failure_leaves_store_untouched() {
    let client = ScriptedClient::new(vec![Err(RunError::Status(500))]);
    let mut session = session();
    let mut controller = controller();

    let err = block_on(controller.submit_and_wait(&client, &mut session, ParameterSet::default())).unwrap_err();

    assert_eq!(err, RunError::Status(500));
    assert_eq!(session.store().run_count(), 0);
    assert_eq!(session.next_run_index(), RunIndex(0));
    let entries = session.run_list().entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_failed());

    assert_eq!(controller.expire_failures(&mut session, Instant::now()), 0);
    let later = Instant::now() + Duration::from_secs(6);
    assert_eq!(controller.expire_failures(&mut session, later), 1);
    assert!(session.run_list().is_empty());
}

#[test]
fn test_malformed_payload_is_a_failure() {
    let client = ScriptedClient::new(vec![Ok("   ".to_string())]);
    let mut session = session();
    let mut controller = controller();

    let err = block_on(controller.submit_and_wait(&client, &mut session, ParameterSet::default())).unwrap_err();
    assert_eq!(err, RunError::Malformed(PayloadError::Empty));
    assert!(session.store().is_empty());
}

#[test]
fn test_unphysical_result_warns_but_registers() {
    let client = ScriptedClient::new(vec![Ok(body(0.1))]);
    let mut session = session();
    let mut controller = controller();

    let outcome = block_on(controller.submit_and_wait(&client, &mut session, ParameterSet::default())).unwrap();

    let warning = outcome.warning.expect("warning");
    assert_eq!(warning.run_index, RunIndex(0));
    assert_eq!(warning.value, 0.1);
    assert_eq!(session.warning(), Some(&warning));
    assert_eq!(session.store().run_count(), 1);
}

#[test]
fn test_out_of_order_completion() {
    let mut session = session();
    let mut controller = controller();
    let descs = session.descriptors().to_vec();

    let mut changed = ParameterSet::defaults(&descs);
    changed.set(&descs, "savings", ParameterValue::Number(0.3));
    let first = controller.begin(&mut session, ParameterSet::defaults(&descs));
    let second = controller.begin(&mut session, changed.clone());
    assert_eq!(controller.state(), ControllerState::Submitting(2));
    assert_eq!(session.run_list().len(), 2);

    let late = controller.complete(&mut session, second, Ok(body(1.0))).unwrap();
    let early = controller.complete(&mut session, first, Ok(body(1.0))).unwrap();

    // indices follow completion order
    assert_eq!(late.run_index, RunIndex(0));
    assert_eq!(early.run_index, RunIndex(1));
    assert_eq!(controller.state(), ControllerState::Idle);
    let record = session.run(RunIndex(0)).expect("record");
    assert_eq!(record.parameters, changed);
    assert_eq!(record.description, "Savings rate: 0.300 (0.220)");
    assert_eq!(session.run(RunIndex(1)).map(|r| r.description.as_str()), Some("Default model"));
}

#[test]
fn test_result_for_unknown_submission_still_charts() {
    let mut session = session();
    let mut controller = controller();

    let outcome = controller
        .complete(&mut session, PendingRunId(99), Ok(body(1.0)))
        .unwrap();
    assert_eq!(outcome.run_index, RunIndex(0));
    assert_eq!(session.store().run_count(), 1);
    assert!(!controller.is_pending(PendingRunId(99)));
}
