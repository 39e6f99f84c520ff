//! Model parameters submitted with each run.

use crate::utils::number_format::format_number;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterKind {
    Range {
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    },
    Options {
        /// `(key, label)` pairs in display order.
        options: Vec<(String, String)>,
        default: String,
    },
}

/// One input of the parameter form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub machine_name: String,
    #[serde(flatten)]
    pub kind: ParameterKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Choice(String),
}

impl ParameterValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Choice(c) => Value::String(c.clone()),
        }
    }
}

impl ParameterDescriptor {
    pub fn range(name: &str, machine_name: &str, min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            machine_name: machine_name.to_string(),
            kind: ParameterKind::Range { min, max, step, default },
        }
    }

    pub fn options(name: &str, machine_name: &str, options: &[(&str, &str)], default: &str) -> Self {
        Self {
            name: name.to_string(),
            machine_name: machine_name.to_string(),
            kind: ParameterKind::Options {
                options: options
                    .iter()
                    .map(|(k, l)| (k.to_string(), l.to_string()))
                    .collect(),
                default: default.to_string(),
            },
        }
    }

    pub fn default_value(&self) -> ParameterValue {
        match &self.kind {
            ParameterKind::Range { default, .. } => ParameterValue::Number(*default),
            ParameterKind::Options { default, .. } => ParameterValue::Choice(default.clone()),
        }
    }

    /// Clamps `raw` to `[min, max]` and snaps it to `min + k * step`.
    pub fn quantize(&self, raw: f64) -> f64 {
        let ParameterKind::Range { min, max, step, default } = &self.kind else {
            return raw;
        };
        if !raw.is_finite() {
            return *default;
        }
        let (lo, hi) = (min.min(*max), min.max(*max));
        let v = raw.clamp(lo, hi);
        if *step <= 0.0 {
            return v;
        }
        let snapped = lo + ((v - lo) / step).round() * step;
        // keep float noise out of the submitted value
        let digits = (-step.log10().floor()).max(0.0) as i32 + 2;
        let factor = 10f64.powi(digits);
        ((snapped * factor).round() / factor).clamp(lo, hi)
    }

    /// Coerces any value into one this parameter accepts.
    pub fn normalize(&self, value: &ParameterValue) -> ParameterValue {
        match (&self.kind, value) {
            (ParameterKind::Range { .. }, ParameterValue::Number(n)) => ParameterValue::Number(self.quantize(*n)),
            (ParameterKind::Range { .. }, ParameterValue::Choice(s)) => match s.trim().parse::<f64>() {
                Ok(n) => ParameterValue::Number(self.quantize(n)),
                Err(_) => self.default_value(),
            },
            (ParameterKind::Options { options, default }, v) => {
                let key = match v {
                    ParameterValue::Choice(s) => s.clone(),
                    ParameterValue::Number(n) => format_number(*n),
                };
                if options.iter().any(|(k, _)| *k == key) {
                    ParameterValue::Choice(key)
                } else {
                    warn!(parameter = %self.machine_name, key, "unknown option replaced by default");
                    ParameterValue::Choice(default.clone())
                }
            }
        }
    }

    /// Human-readable form of `value`: the option label, or the number.
    pub fn display(&self, value: &ParameterValue) -> String {
        match (&self.kind, value) {
            (ParameterKind::Options { options, .. }, ParameterValue::Choice(k)) => options
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, label)| label.clone())
                .unwrap_or_else(|| k.clone()),
            (_, ParameterValue::Number(n)) => format_number(*n),
            (_, ParameterValue::Choice(c)) => c.clone(),
        }
    }
}

/// Values of every parameter for one submission, keyed by machine name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterSet {
    pub fn defaults(descriptors: &[ParameterDescriptor]) -> Self {
        Self {
            values: descriptors
                .iter()
                .map(|d| (d.machine_name.clone(), d.default_value()))
                .collect(),
        }
    }

    /// Sets a value, normalized by its descriptor when one is known.
    pub fn set(&mut self, descriptors: &[ParameterDescriptor], machine_name: &str, value: ParameterValue) {
        let value = match descriptors.iter().find(|d| d.machine_name == machine_name) {
            Some(d) => d.normalize(&value),
            None => value,
        };
        self.values.insert(machine_name.to_string(), value);
    }

    pub fn get(&self, machine_name: &str) -> Option<&ParameterValue> {
        self.values.get(machine_name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Request body form of the set.
    pub fn to_json(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// One `Name: value (default)` line per parameter differing from its
    /// default, or `Default model` when none do.
    pub fn describe_changes(&self, descriptors: &[ParameterDescriptor]) -> String {
        let lines: Vec<String> = descriptors
            .iter()
            .filter_map(|d| {
                let value = self.values.get(&d.machine_name)?;
                let default = d.default_value();
                (*value != default).then(|| {
                    format!("{}: {} ({})", d.name, d.display(value), d.display(&default))
                })
            })
            .collect();
        if lines.is_empty() {
            "Default model".to_string()
        } else {
            lines.join("\n")
        }
    }
}
