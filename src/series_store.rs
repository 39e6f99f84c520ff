//! In-memory dataset shared by every chart.
//!
//! Each variable maps to one [`Series`] per live run, kept in run order.
//! Runs are identified by [`RunIndex`] only; removal filters by identity and
//! never by list position, since indices are not resequenced on delete.

use crate::data_types::{Axis, AxisDomain, Metadata, RunColor, RunIndex, Sample, Series};
use crate::payload::RunData;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Where the x value of a sample comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AxisSource {
    /// The shared reporting-period grid.
    #[default]
    Time,
    /// The y values of another variable from the same run, by position.
    Variable(String),
}

impl AxisSource {
    pub fn is_time(&self) -> bool {
        matches!(self, Self::Time)
    }

    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Time => None,
            Self::Variable(v) => Some(v),
        }
    }
}

/// Identity and display attributes stamped on every series of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunInfo {
    pub index: RunIndex,
    pub name: String,
    pub color: RunColor,
}

impl RunInfo {
    pub fn new(index: RunIndex, color: RunColor) -> Self {
        Self {
            index,
            name: format!("Run #{}", index.0),
            color,
        }
    }
}

/// Timestamps (ms since epoch) of January 1st for each reporting period.
pub fn year_grid(start_year: i32, period_length: i32, periods: usize) -> Vec<f64> {
    (0..periods)
        .map(|i| year_timestamp(start_year + i as i32 * period_length))
        .collect()
}

/// Milliseconds since epoch of January 1st of `year`.
pub fn year_timestamp(year: i32) -> f64 {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
        .unwrap_or(f64::NAN)
}

#[derive(Clone, Debug, Default)]
pub struct SeriesStore {
    time_grid: Vec<f64>,
    runs: Vec<RunInfo>,
    variables: BTreeMap<String, Vec<Series>>,
}

impl SeriesStore {
    pub fn new(time_grid: Vec<f64>) -> Self {
        Self {
            time_grid,
            runs: Vec::new(),
            variables: BTreeMap::new(),
        }
    }

    /// Number of samples kept per series.
    pub fn graph_periods(&self) -> usize {
        self.time_grid.len()
    }

    pub fn time_grid(&self) -> &[f64] {
        &self.time_grid
    }

    pub fn time_domain(&self) -> (f64, f64) {
        match (self.time_grid.first(), self.time_grid.last()) {
            (Some(a), Some(b)) => AxisDomain::non_degenerate((*a, *b)),
            _ => (0.0, 1.0),
        }
    }

    pub fn runs(&self) -> impl Iterator<Item = &RunInfo> {
        self.runs.iter()
    }

    pub fn run_indices(&self) -> Vec<RunIndex> {
        self.runs.iter().map(|r| r.index).collect()
    }

    pub fn run(&self, run: RunIndex) -> Option<&RunInfo> {
        self.runs.iter().find(|r| r.index == run)
    }

    pub fn contains_run(&self, run: RunIndex) -> bool {
        self.run(run).is_some()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    pub fn series(&self, variable: &str) -> &[Series] {
        self.variables.get(variable).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn series_for_run(&self, variable: &str, run: RunIndex) -> Option<&Series> {
        self.series(variable).iter().find(|s| s.run_index == run)
    }

    /// Builds one series of `run` for `variable`, truncated or null-padded to
    /// the period count, with x taken from `x_source`.
    pub fn build_series(
        &self,
        variable: &str,
        values: Option<&[Option<f64>]>,
        run: &RunInfo,
        metadata: &Metadata,
        x_source: &AxisSource,
    ) -> Series {
        let values = values.unwrap_or(&[]);
        if values.len() < self.graph_periods() {
            warn!(
                variable,
                run = run.index.0,
                got = values.len(),
                expected = self.graph_periods(),
                "short series padded with missing values"
            );
        }
        let samples = (0..self.graph_periods())
            .map(|i| {
                let y = values.get(i).copied().flatten().filter(|v| v.is_finite());
                Sample::new(self.x_at(x_source, run.index, i), y)
            })
            .collect();

        let mut series = Series::new(variable, run.index, samples);
        series.run_name = run.name.clone();
        series.color = run.color;
        series.unit = metadata.unit(variable);
        series.y_title = metadata.title(variable);
        series.x_title = match x_source.variable() {
            Some(v) => metadata.title(v),
            None => "Year".to_string(),
        };
        series.visible = self.run_visible(run.index);
        series
    }

    /// Re-sources the x value of `series[i]` from `x_source`.
    pub fn resource_x(&self, series: &mut Series, x_source: &AxisSource, metadata: &Metadata) {
        let run = series.run_index;
        for (i, s) in series.samples.iter_mut().enumerate() {
            s.x = self.x_at(x_source, run, i);
        }
        series.x_title = match x_source.variable() {
            Some(v) => metadata.title(v),
            None => "Year".to_string(),
        };
    }

    fn x_at(&self, x_source: &AxisSource, run: RunIndex, i: usize) -> f64 {
        match x_source {
            AxisSource::Time => self.time_grid.get(i).copied().unwrap_or(f64::NAN),
            AxisSource::Variable(v) => self
                .series_for_run(v, run)
                .and_then(|s| s.y_at(i))
                .unwrap_or(f64::NAN),
        }
    }

    fn run_visible(&self, run: RunIndex) -> bool {
        self.variables
            .values()
            .flat_map(|list| list.iter())
            .find(|s| s.run_index == run)
            .map(|s| s.visible)
            .unwrap_or(true)
    }

    /// Appends one series per variable for a new run.
    ///
    /// Variables already known but absent from `data` get an all-missing
    /// series, and variables first seen now are back-filled for earlier
    /// runs, so every variable always holds exactly one series per live run.
    pub fn add_run(&mut self, data: &RunData, run: RunInfo, metadata: &Metadata) {
        if self.contains_run(run.index) {
            warn!(run = run.index.0, "run already registered, replacing its series");
            self.remove_run(run.index);
        }

        let earlier: Vec<RunInfo> = self.runs.clone();
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        for v in data.variables() {
            if !self.variables.contains_key(v) {
                names.push(v.to_string());
            }
        }

        for name in names {
            if !self.variables.contains_key(&name) {
                let backfill = earlier
                    .iter()
                    .map(|r| self.build_series(&name, None, r, metadata, &AxisSource::Time))
                    .collect();
                self.variables.insert(name.clone(), backfill);
            }
            let values = data.values(&name);
            if values.is_none() {
                warn!(variable = %name, run = run.index.0, "variable missing from run result");
            }
            let series = self.build_series(&name, values, &run, metadata, &AxisSource::Time);
            if let Some(list) = self.variables.get_mut(&name) {
                list.push(series);
            }
        }

        info!(run = run.index.0, variables = self.variables.len(), "run added to series store");
        self.runs.push(run);
    }

    /// Drops every series of `run`. Unknown runs are a no-op.
    pub fn remove_run(&mut self, run: RunIndex) -> bool {
        let known = self.contains_run(run);
        self.runs.retain(|r| r.index != run);
        for list in self.variables.values_mut() {
            list.retain(|s| s.run_index != run);
        }
        if known {
            info!(run = run.0, "run removed from series store");
        } else {
            debug!(run = run.0, "remove of unknown run ignored");
        }
        known
    }

    pub fn rename_run(&mut self, run: RunIndex, name: &str) -> bool {
        let Some(info) = self.runs.iter_mut().find(|r| r.index == run) else {
            return false;
        };
        info.name = name.to_string();
        for s in self
            .variables
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .filter(|s| s.run_index == run)
        {
            s.run_name = name.to_string();
        }
        true
    }

    pub fn set_visibility(&mut self, run: RunIndex, visible: bool) -> bool {
        if !self.contains_run(run) {
            return false;
        }
        for s in self
            .variables
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .filter(|s| s.run_index == run)
        {
            s.visible = visible;
        }
        true
    }

    pub fn is_visible(&self, run: RunIndex) -> bool {
        self.contains_run(run) && self.run_visible(run)
    }

    pub fn visible_run_count(&self) -> usize {
        self.runs.iter().filter(|r| self.run_visible(r.index)).count()
    }

    /// All values of one axis across every run of `variable`; missing values
    /// are skipped.
    pub fn flatten(&self, variable: &str, axis: Axis) -> Vec<f64> {
        AxisDomain::flatten(self.series(variable), axis, false)
    }

    /// Like [`Self::flatten`] but ignoring hidden runs.
    pub fn flatten_visible(&self, variable: &str, axis: Axis) -> Vec<f64> {
        AxisDomain::flatten(self.series(variable), axis, true)
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        for list in self.variables.values_mut() {
            list.clear();
        }
    }
}
