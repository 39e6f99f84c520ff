//! Simulation result payloads.
//!
//! Two historical response shapes exist: a JSON object
//! `{parameters: {...}, data: {variable: [v0, v1, ...]}}` and a legacy text
//! block with one `variable v0 v1 ...` line per variable (whitespace or comma
//! separated). Both normalize into [`RunData`] before reaching the store.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("empty payload")]
    Empty,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("payload has no `data` object")]
    MissingData,
    #[error("payload contains no variables")]
    NoVariables,
}

/// Canonical in-memory shape of one run's result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunData {
    values: BTreeMap<String, Vec<Option<f64>>>,
    parameters: BTreeMap<String, Value>,
}

impl RunData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values.into_iter().map(Some).collect());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.values.insert(name.into(), values);
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.insert(name.into(), value);
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self, variable: &str) -> Option<&[Option<f64>]> {
        self.values.get(variable).map(Vec::as_slice)
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParsedResult {
    Json(RunData),
    LegacyText(RunData),
}

impl ParsedResult {
    /// Detects the payload shape and parses it. Individual malformed values
    /// become missing samples instead of failing the whole payload.
    pub fn parse(body: &str) -> Result<Self, PayloadError> {
        let trimmed = body.trim_start();
        if trimmed.is_empty() {
            return Err(PayloadError::Empty);
        }
        if trimmed.starts_with('{') {
            parse_json(trimmed).map(Self::Json)
        } else {
            parse_legacy(trimmed).map(Self::LegacyText)
        }
    }

    pub fn into_run_data(self) -> RunData {
        match self {
            Self::Json(d) | Self::LegacyText(d) => d,
        }
    }

    pub fn run_data(&self) -> &RunData {
        match self {
            Self::Json(d) | Self::LegacyText(d) => d,
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_json(body: &str) -> Result<RunData, PayloadError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
    let Some(data) = root.get("data").and_then(Value::as_object) else {
        return Err(PayloadError::MissingData);
    };

    let mut run = RunData::new();
    for (name, values) in data {
        match values.as_array() {
            Some(arr) => run.insert(name.clone(), arr.iter().map(number).collect()),
            None => warn!(variable = %name, "non-array variable skipped"),
        }
    }
    if let Some(params) = root.get("parameters").and_then(Value::as_object) {
        for (k, v) in params {
            run.set_parameter(k.clone(), v.clone());
        }
    }
    if run.is_empty() {
        return Err(PayloadError::NoVariables);
    }
    Ok(run)
}

fn parse_legacy(body: &str) -> Result<RunData, PayloadError> {
    let mut run = RunData::new();
    for line in body.lines() {
        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty());
        let Some(name) = fields.next() else {
            continue;
        };
        let values = fields
            .map(|f| f.parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        run.insert(name.to_string(), values);
    }
    if run.is_empty() {
        return Err(PayloadError::NoVariables);
    }
    Ok(run)
}
