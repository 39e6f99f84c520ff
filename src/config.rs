use crate::data_types::{Padding, RunColor};
use crate::palette::DEFAULT_PALETTE;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings of one charting session. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartingConfig {
    pub graph_periods: usize,
    /// Years per reporting period.
    pub period_length: i32,
    pub start_year: i32,
    /// Insets of the small-multiple charts, `[top, right, bottom, left]`.
    pub small_padding: [f32; 4],
    pub custom_padding: [f32; 4],
    /// Variables given a small-multiple chart; `None` charts every variable.
    pub small_multiples: Option<Vec<String>>,
    pub custom_y_variable: String,
    pub twin_variable: Option<String>,
    pub zoom_height: f32,
    pub extent_floors: BTreeMap<String, f64>,
    pub floor_zero_variables: BTreeSet<String>,
    pub unphysical_variable: String,
    pub unphysical_threshold: f64,
    pub request_timeout_secs: u64,
    pub failure_display_secs: u64,
    pub endpoint: String,
    /// Directory the CSV and SVG exports are written to.
    pub export_dir: PathBuf,
    pub palette: Vec<RunColor>,
}

impl Default for ChartingConfig {
    fn default() -> Self {
        Self {
            graph_periods: 20,
            period_length: 10,
            start_year: 2005,
            small_padding: [45.0, 15.0, 30.0, 60.0],
            custom_padding: [45.0, 60.0, 45.0, 60.0],
            small_multiples: None,
            custom_y_variable: "damages".to_string(),
            twin_variable: Some("backstop".to_string()),
            zoom_height: 30.0,
            extent_floors: BTreeMap::from([
                ("utility".to_string(), -1.0),
                ("utility_discounted".to_string(), -1.0),
            ]),
            floor_zero_variables: BTreeSet::new(),
            unphysical_variable: "consumption_pc".to_string(),
            unphysical_threshold: 0.25,
            request_timeout_secs: 50,
            failure_display_secs: 5,
            endpoint: "http://localhost:8000/run".to_string(),
            export_dir: PathBuf::from("."),
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl ChartingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("invalid charting configuration")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading charting configuration from {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn small_padding(&self) -> Padding {
        self.small_padding.into()
    }

    pub fn custom_padding(&self) -> Padding {
        self.custom_padding.into()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn failure_display(&self) -> Duration {
        Duration::from_secs(self.failure_display_secs)
    }
}
