use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Display information for one simulation variable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub unit: String,
    /// Title with the unit appended, used for subtitles.
    #[serde(default)]
    pub title_unit: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Variable name → display information, loaded once before the first chart
/// is titled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    variables: BTreeMap<String, VariableMeta>,
}

impl Metadata {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("invalid variable metadata document")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading metadata from {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, variable: impl Into<String>, meta: VariableMeta) {
        self.variables.insert(variable.into(), meta);
    }

    pub fn get(&self, variable: &str) -> Option<&VariableMeta> {
        self.variables.get(variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    /// Title of `variable`, falling back to its machine name.
    pub fn title(&self, variable: &str) -> String {
        match self.get(variable) {
            Some(m) if !m.title.is_empty() => m.title.clone(),
            _ => variable.to_string(),
        }
    }

    pub fn unit(&self, variable: &str) -> String {
        self.get(variable).map(|m| m.unit.clone()).unwrap_or_default()
    }

    pub fn title_unit(&self, variable: &str) -> String {
        self.get(variable)
            .and_then(|m| m.title_unit.clone())
            .unwrap_or_else(|| self.title(variable))
    }
}
