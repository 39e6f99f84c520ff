//! webdice_chart: multi-run interactive charting of climate-economy model
//! runs in GPUI

pub mod chart_view;
pub mod client;
pub mod config;
pub mod custom_chart;
pub mod data_types;
pub mod export;
pub mod palette;
pub mod parameters;
pub mod payload;
pub mod run_controller;
pub mod run_list;
pub mod scales;
pub mod series_store;
pub mod session;
pub mod theme;
pub mod transform;
pub mod utils;
pub mod workspace;
pub mod zoom_overview;

pub use chart_view::{chart_element, ChartScene, ChartView};
pub use client::{HttpSimulationClient, RunRequest, SimulationClient};
pub use config::ChartingConfig;
pub use custom_chart::{ChartError, CustomChartView, ExtentRules, LogAxis};
pub use data_types::{AxisDomain, Metadata, RunColor, RunIndex, Sample, Series};
pub use parameters::{ParameterDescriptor, ParameterSet, ParameterValue};
pub use payload::{ParsedResult, PayloadError, RunData};
pub use run_controller::{RunController, RunError, RunOutcome};
pub use series_store::{AxisSource, SeriesStore};
pub use session::ChartingSession;
pub use theme::ChartTheme;
pub use workspace::{init, ChartWorkspace};
pub use zoom_overview::ZoomOverviewView;
