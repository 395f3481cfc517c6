use crate::models::{CallerIdentity, LogGroup, Metric, Role};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Application settings from `Settings.yaml`
///
/// Every field has a default, so a missing or partial file is fine. Values can
/// be overridden from the environment with a `CLOUDPANE_` prefix
/// (e.g. `CLOUDPANE_PAGE_SIZE=20`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory for rotating log files
    pub log_dir: String,

    /// Log at debug level instead of info
    pub debug_mode: bool,

    /// Mirror log output to the console
    pub console_output: bool,

    /// Interval of the UI frame timer that polls every panel
    pub frame_interval_ms: u64,

    /// Page size requested from paginated listings
    pub page_size: u32,

    /// Aggregation period of graphed metrics
    pub metric_period_secs: u32,

    /// How far back graphed metrics reach
    pub metric_window_secs: u32,

    /// Upper bound on datapoints per metric data page
    pub max_datapoints: u32,

    /// Fixture file backing the simulated service, relative to the config directory
    pub fixture_file: String,

    /// Region preselected when creating a session
    pub default_region: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            debug_mode: false,
            console_output: true,
            frame_interval_ms: 16,
            page_size: 50,
            metric_period_secs: 60,
            metric_window_secs: 3600,
            max_datapoints: 500,
            fixture_file: "Fixture.yaml".to_string(),
            default_region: "us-east-1".to_string(),
        }
    }
}

impl AppConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            page_size: self.page_size.max(1),
            metric_period_secs: self.metric_period_secs.max(1),
            metric_window_secs: self.metric_window_secs.max(1),
            max_datapoints: self.max_datapoints.max(1),
        }
    }
}

/// The subset of settings producers need on their worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub page_size: u32,
    pub metric_period_secs: u32,
    pub metric_window_secs: u32,
    pub max_datapoints: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        AppConfig::default().fetch_settings()
    }
}

/// Service operations that can be made to fail in a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CallerIdentity,
    DescribeLogGroups,
    ListRoles,
    ListMetrics,
    GetMetricData,
}

/// An error the fixture client returns instead of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectedFailure {
    /// Number of pages served successfully before failing
    #[serde(default)]
    pub after_pages: u32,

    pub code: String,
    pub message: String,

    #[serde(default = "default_failure_status")]
    pub status: u16,
}

fn default_failure_status() -> u16 {
    400
}

/// One simulated account, keyed by profile name in [`FixtureConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureAccount {
    pub identity: CallerIdentity,

    /// Simulated network latency per request
    #[serde(default)]
    pub latency_ms: u64,

    #[serde(default)]
    pub log_groups: Vec<LogGroup>,

    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub metrics: Vec<Metric>,

    #[serde(default)]
    pub failures: IndexMap<Operation, InjectedFailure>,
}

/// Simulated service contents from `Fixture.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    pub profiles: IndexMap<String, FixtureAccount>,
}

impl FixtureConfig {
    pub fn profile(&self, name: &str) -> Option<&FixtureAccount> {
        self.profiles.get(name)
    }

    /// Profile preselected in the session form: `default` when present,
    /// otherwise the first one listed.
    pub fn best_profile(&self) -> Option<&str> {
        if self.profiles.contains_key("default") {
            return Some("default");
        }
        self.profiles.keys().next().map(String::as_str)
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}
