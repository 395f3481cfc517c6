// Fixture-backed service client
//
// Serves the resources of a FixtureConfig as if they came from the remote
// service: results are paged, every request sleeps for the account's configured
// latency, and failures can be injected per operation after a number of pages.
// Lets the whole GUI run (and be tested) without credentials or network access.

use super::client::{ClientFactory, ResourceClient, SessionConfig};
use super::{ApiError, ErrorKind};
use crate::models::{
    CallerIdentity, FixtureAccount, FixtureConfig, LogGroup, Metric, MetricDataPage,
    MetricDataQuery, MetricDataResult, Operation, Page, Role,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

/// Page size of metric listings (the service does not let callers choose)
pub const METRICS_PAGE_SIZE: usize = 25;

/// Opens [`FixtureClient`]s for the profiles of a fixture
#[derive(Debug, Clone)]
pub struct FixtureFactory {
    fixture: Arc<FixtureConfig>,
}

impl FixtureFactory {
    pub fn new(fixture: FixtureConfig) -> Self {
        Self {
            fixture: Arc::new(fixture),
        }
    }

    pub fn fixture(&self) -> &FixtureConfig {
        &self.fixture
    }
}

impl ClientFactory for FixtureFactory {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn ResourceClient>, ApiError> {
        if config.region.trim().is_empty() {
            return Err(ApiError::new(
                ErrorKind::Client,
                400,
                "InvalidRegion",
                "A region must be selected",
            ));
        }

        let account = self.fixture.profile(&config.profile).ok_or_else(|| {
            ApiError::new(
                ErrorKind::Client,
                403,
                "InvalidClientTokenId",
                format!("No credentials found for profile '{}'", config.profile),
            )
        })?;

        tracing::debug!(
            "Opening fixture client for profile {} in {}",
            config.profile,
            config.region
        );
        Ok(Box::new(FixtureClient::new(account.clone(), &config.region)))
    }

    fn profiles(&self) -> Vec<String> {
        let mut names = self.fixture.profile_names();
        if let Some(best) = self.fixture.best_profile() {
            if let Some(index) = names.iter().position(|name| name == best) {
                let best = names.remove(index);
                names.insert(0, best);
            }
        }
        names
    }
}

/// Client serving one fixture account
pub struct FixtureClient {
    account: FixtureAccount,
    region: String,
    requests: Cell<u64>,
    pages_served: RefCell<HashMap<Operation, u32>>,
}

impl FixtureClient {
    pub fn new(account: FixtureAccount, region: &str) -> Self {
        Self {
            account,
            region: region.to_string(),
            requests: Cell::new(0),
            pages_served: RefCell::new(HashMap::new()),
        }
    }

    /// Simulate one round trip for `operation`.
    ///
    /// Returns the request id, or the injected failure once the operation has
    /// served its allowance of pages.
    fn request(&self, operation: Operation) -> Result<String, ApiError> {
        if self.account.latency_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.account.latency_ms));
        }

        let number = self.requests.get() + 1;
        self.requests.set(number);
        let request_id = format!("fixture-{:06}", number);

        let mut pages_served = self.pages_served.borrow_mut();
        let served = pages_served.entry(operation).or_insert(0);

        if let Some(failure) = self.account.failures.get(&operation) {
            if *served >= failure.after_pages {
                tracing::debug!(
                    "Injecting {} into {:?} in {}",
                    failure.code,
                    operation,
                    self.region
                );
                return Err(
                    ApiError::from_code(failure.status, failure.code.clone(), failure.message.clone())
                        .with_request_id(request_id),
                );
            }
        }

        *served += 1;
        tracing::trace!("{} {:?} in {} served", request_id, operation, self.region);
        Ok(request_id)
    }
}

/// Slice one page out of `items` starting at the offset encoded in `token`.
fn slice_page<T: Clone>(
    items: &[T],
    limit: usize,
    token: Option<String>,
    request_id: &str,
) -> Result<Page<T>, ApiError> {
    let start = match token.as_deref().filter(|t| !t.is_empty()) {
        None => 0,
        Some(token) => token
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= items.len())
            .ok_or_else(|| {
                ApiError::new(
                    ErrorKind::Client,
                    400,
                    "InvalidParameterException",
                    format!("Invalid continuation token '{}'", token),
                )
                .with_request_id(request_id)
            })?,
    };

    let end = (start + limit.max(1)).min(items.len());
    let next_token = (end < items.len()).then(|| end.to_string());

    Ok(Page {
        items: items[start..end].to_vec(),
        next_token,
    })
}

/// Deterministic synthetic datapoints for `query`.
fn synthesize_datapoints(query: &MetricDataQuery) -> (Vec<i64>, Vec<f64>) {
    let period_ms = i64::from(query.period_secs.max(1)) * 1000;
    let first = query.start_ms.div_euclid(period_ms) * period_ms + period_ms;

    let mut hasher = DefaultHasher::new();
    query.metric.hash(&mut hasher);
    let seed = hasher.finish();
    let base = (seed % 80) as f64 + 10.0;
    let amplitude = (seed >> 8) % 20 + 5;
    let phase = ((seed >> 16) % 628) as f64 / 100.0;

    let mut timestamps = Vec::new();
    let mut values = Vec::new();
    let mut t = first;
    while t <= query.end_ms {
        let step = (t / period_ms) as f64;
        timestamps.push(t);
        values.push(base + amplitude as f64 * (step / 7.0 + phase).sin());
        t += period_ms;
    }
    (timestamps, values)
}

impl ResourceClient for FixtureClient {
    fn caller_identity(&self) -> Result<CallerIdentity, ApiError> {
        self.request(Operation::CallerIdentity)?;
        Ok(self.account.identity.clone())
    }

    fn describe_log_groups(&self, limit: u32, token: Option<String>) -> Result<Page<LogGroup>, ApiError> {
        let request_id = self.request(Operation::DescribeLogGroups)?;
        slice_page(&self.account.log_groups, limit as usize, token, &request_id)
    }

    fn list_roles(&self, max_items: u32, marker: Option<String>) -> Result<Page<Role>, ApiError> {
        let request_id = self.request(Operation::ListRoles)?;
        slice_page(&self.account.roles, max_items as usize, marker, &request_id)
    }

    fn list_metrics(&self, token: Option<String>) -> Result<Page<Metric>, ApiError> {
        let request_id = self.request(Operation::ListMetrics)?;
        slice_page(&self.account.metrics, METRICS_PAGE_SIZE, token, &request_id)
    }

    fn get_metric_data(
        &self,
        query: &MetricDataQuery,
        token: Option<String>,
    ) -> Result<MetricDataPage, ApiError> {
        let request_id = self.request(Operation::GetMetricData)?;

        if !self.account.metrics.contains(&query.metric) {
            return Ok(MetricDataPage {
                results: Vec::new(),
                next_token: None,
            });
        }

        let (timestamps, values) = synthesize_datapoints(query);
        let points: Vec<(i64, f64)> = timestamps.into_iter().zip(values).collect();
        let page = slice_page(&points, query.max_datapoints as usize, token, &request_id)?;

        let (timestamps_ms, values) = page.items.into_iter().unzip();
        Ok(MetricDataPage {
            results: vec![MetricDataResult {
                id: query.id.clone(),
                label: query.metric.name.clone(),
                timestamps_ms,
                values,
            }],
            next_token: page.next_token,
        })
    }
}
