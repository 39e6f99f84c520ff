//! Transport to the simulation runner.

use crate::config::ChartingConfig;
use crate::parameters::ParameterSet;
use crate::run_controller::RunError;
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Raw simulation length requested from the runner, in periods.
pub const DEFAULT_RAW_PERIODS: usize = 60;

#[derive(Clone, Debug, PartialEq)]
pub struct RunRequest {
    pub parameters: ParameterSet,
    pub periods: usize,
}

impl RunRequest {
    pub fn new(parameters: ParameterSet) -> Self {
        Self {
            parameters,
            periods: DEFAULT_RAW_PERIODS,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("parameters".to_string(), Value::Object(self.parameters.to_json()));
        body.insert("periods".to_string(), Value::from(self.periods));
        Value::Object(body)
    }
}

/// Anything that can turn a parameter set into a raw result payload.
#[async_trait]
pub trait SimulationClient: Send + Sync {
    async fn run(&self, request: RunRequest) -> Result<String, RunError>;
}

/// Posts requests as JSON to an HTTP endpoint.
///
/// The blocking client runs on its own thread and reports back over a
/// oneshot channel, so the returned future works on any executor.
#[derive(Clone, Debug)]
pub struct HttpSimulationClient {
    endpoint: String,
    timeout: Duration,
}

impl HttpSimulationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Client for the endpoint and request timeout of `config`.
    pub fn from_config(config: &ChartingConfig) -> Self {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn post(endpoint: &str, timeout: Duration, body: &Value) -> Result<String, RunError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunError::Network(e.to_string()))?;
        let response = client.post(endpoint).json(body).send().map_err(RunError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RunError::Status(status.as_u16()));
        }
        response.text().map_err(RunError::from)
    }
}

#[async_trait]
impl SimulationClient for HttpSimulationClient {
    async fn run(&self, request: RunRequest) -> Result<String, RunError> {
        let (tx, rx) = oneshot::channel();
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        let body = request.to_json();
        debug!(endpoint = %endpoint, "submitting simulation request");
        std::thread::Builder::new()
            .name("simulation-request".to_string())
            .spawn(move || {
                let _ = tx.send(Self::post(&endpoint, timeout, &body));
            })
            .map_err(|e| RunError::Network(e.to_string()))?;
        rx.await
            .map_err(|_| RunError::Network("request worker dropped".to_string()))?
    }
}
