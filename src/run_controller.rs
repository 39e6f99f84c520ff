//! Submission lifecycle: `Idle -> Submitting -> Success | Failure -> Idle`.
//!
//! Each submission is tracked on its own, so several may be in flight at
//! once and complete in any order. The run index is allocated when a result
//! arrives, which means indices follow completion order.

use crate::client::{RunRequest, SimulationClient};
use crate::data_types::RunIndex;
use crate::parameters::ParameterSet;
use crate::payload::{ParsedResult, PayloadError, RunData};
use crate::run_list::PendingRunId;
use crate::session::ChartingSession;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("network error: {0}")]
    Network(String),
    #[error("simulation server answered with HTTP {0}")]
    Status(u16),
    #[error("simulation request timed out")]
    Timeout,
    #[error("malformed simulation result: {0}")]
    Malformed(#[from] PayloadError),
}

impl From<reqwest::Error> for RunError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    /// Number of submissions in flight.
    Submitting(usize),
}

/// A value below the sanity floor of a watched variable. The run is still
/// registered; the warning is only shown.
#[derive(Clone, Debug, PartialEq)]
pub struct UnphysicalWarning {
    pub run_index: RunIndex,
    pub variable: String,
    pub threshold: f64,
    pub value: f64,
}

impl UnphysicalWarning {
    pub fn message(&self) -> String {
        format!(
            "Run #{} produced unphysical results ({} fell to {}); interpret with care.",
            self.run_index, self.variable, self.value
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome {
    pub run_index: RunIndex,
    pub warning: Option<UnphysicalWarning>,
}

#[derive(Clone, Debug)]
struct PendingRun {
    parameters: ParameterSet,
    description: String,
    submitted_at: Instant,
}

#[derive(Clone, Debug)]
pub struct RunController {
    next_pending: u64,
    in_flight: BTreeMap<PendingRunId, PendingRun>,
    failure_display: Duration,
    unphysical: Option<(String, f64)>,
}

impl RunController {
    pub fn new(failure_display: Duration) -> Self {
        Self {
            next_pending: 0,
            in_flight: BTreeMap::new(),
            failure_display,
            unphysical: None,
        }
    }

    /// Watches `variable` for values at or below `threshold`.
    pub fn with_unphysical_check(mut self, variable: impl Into<String>, threshold: f64) -> Self {
        self.unphysical = Some((variable.into(), threshold));
        self
    }

    pub fn state(&self) -> ControllerState {
        match self.in_flight.len() {
            0 => ControllerState::Idle,
            n => ControllerState::Submitting(n),
        }
    }

    pub fn is_pending(&self, id: PendingRunId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Records a submission and shows its pending entry.
    pub fn begin(&mut self, session: &mut ChartingSession, parameters: ParameterSet) -> PendingRunId {
        let id = PendingRunId(self.next_pending);
        self.next_pending += 1;
        let description = parameters.describe_changes(session.descriptors());
        session.run_list_mut().add_pending(id, description.clone());
        self.in_flight.insert(
            id,
            PendingRun {
                parameters,
                description,
                submitted_at: Instant::now(),
            },
        );
        info!(%id, in_flight = self.in_flight.len(), "simulation submitted");
        id
    }

    /// Routes the outcome of submission `id`.
    ///
    /// A success registers the run even if `id` is unknown (a late answer
    /// after the list was cleared). A failure leaves the store untouched and
    /// turns the pending entry into an expiring failure marker.
    pub fn complete(
        &mut self,
        session: &mut ChartingSession,
        id: PendingRunId,
        result: Result<String, RunError>,
    ) -> Result<RunOutcome, RunError> {
        let pending = self.in_flight.remove(&id);
        if pending.is_none() {
            debug!(%id, "result for an unknown or finished submission");
        }
        if let Some(p) = &pending {
            debug!(%id, elapsed_ms = p.submitted_at.elapsed().as_millis() as u64, "simulation answered");
        }

        let parsed = result.and_then(|body| ParsedResult::parse(&body).map_err(RunError::from));
        let data = match parsed {
            Ok(parsed) => parsed.into_run_data(),
            Err(error) => {
                warn!(%id, %error, "simulation failed");
                let expires_at = Instant::now() + self.failure_display;
                session.run_list_mut().mark_failed(id, error.to_string(), expires_at);
                return Err(error);
            }
        };

        session.run_list_mut().remove_pending(id);
        let (parameters, description) = match pending {
            Some(p) => (p.parameters, p.description),
            None => {
                let parameters = ParameterSet::default();
                let description = parameters.describe_changes(session.descriptors());
                (parameters, description)
            }
        };
        let run_index = session.register_run(&data, parameters, description);
        let warning = self.check_unphysical(run_index, &data);
        if let Some(w) = &warning {
            warn!(run = run_index.0, variable = %w.variable, value = w.value, "unphysical result");
            session.set_warning(Some(w.clone()));
        }
        Ok(RunOutcome { run_index, warning })
    }

    /// Smallest watched value at or below the threshold, if any.
    pub fn check_unphysical(&self, run_index: RunIndex, data: &RunData) -> Option<UnphysicalWarning> {
        let (variable, threshold) = self.unphysical.as_ref()?;
        let value = data
            .values(variable)?
            .iter()
            .flatten()
            .copied()
            .filter(|v| *v <= *threshold)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))?;
        Some(UnphysicalWarning {
            run_index,
            variable: variable.clone(),
            threshold: *threshold,
            value,
        })
    }

    /// Removes failure markers whose display time has passed.
    pub fn expire_failures(&self, session: &mut ChartingSession, now: Instant) -> usize {
        session.run_list_mut().expire(now)
    }

    pub fn failure_display(&self) -> Duration {
        self.failure_display
    }

    /// Submits, waits for the answer and routes it.
    pub async fn submit_and_wait(
        &mut self,
        client: &dyn SimulationClient,
        session: &mut ChartingSession,
        parameters: ParameterSet,
    ) -> Result<RunOutcome, RunError> {
        let id = self.begin(session, parameters.clone());
        let result = client.run(RunRequest::new(parameters)).await;
        self.complete(session, id, result)
    }
}
