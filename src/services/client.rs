use super::ApiError;
use crate::models::{CallerIdentity, LogGroup, Metric, MetricDataPage, MetricDataQuery, Page, Role};

/// Credentials and region a session talks to the service with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub profile: String,
    pub region: String,
}

/// A verified session: configuration plus the identity the service reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub title: String,
    pub config: SessionConfig,
    pub identity: CallerIdentity,
}

/// Blocking client for the remote service
///
/// Every call performs one request and may take as long as the network does,
/// so clients are only ever used from worker threads. Paginated calls take the
/// continuation token of the previous page (`None` for the first page).
pub trait ResourceClient: Send {
    fn caller_identity(&self) -> Result<CallerIdentity, ApiError>;

    fn describe_log_groups(&self, limit: u32, token: Option<String>) -> Result<Page<LogGroup>, ApiError>;

    fn list_roles(&self, max_items: u32, marker: Option<String>) -> Result<Page<Role>, ApiError>;

    fn list_metrics(&self, token: Option<String>) -> Result<Page<Metric>, ApiError>;

    fn get_metric_data(
        &self,
        query: &MetricDataQuery,
        token: Option<String>,
    ) -> Result<MetricDataPage, ApiError>;
}

/// Opens clients for sessions
///
/// Producers call [`connect`](Self::connect) on their worker thread, so opening
/// a client may block too.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn ResourceClient>, ApiError>;

    /// Profiles this factory can open sessions for, preferred one first.
    fn profiles(&self) -> Vec<String>;
}
