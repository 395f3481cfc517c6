use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Continuation token; `None` (or empty) when this was the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// The continuation token, treating an empty token as "no more pages".
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Who the session's credentials belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account: String,
    pub user_id: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogGroup {
    pub name: String,
    pub arn: String,
    pub creation_time_ms: i64,

    #[serde(default)]
    pub stored_bytes: u64,

    #[serde(default)]
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub arn: String,
    pub create_date_ms: i64,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// A metric series identity: namespace, name and dimensions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metric {
    pub namespace: String,
    pub name: String,

    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

/// Namespace prefix reserved for the provider's own services
pub const PROVIDER_NAMESPACE_PREFIX: &str = "AWS/";

impl Metric {
    /// Whether the metric is published by the provider rather than by the user.
    pub fn is_provider_metric(&self) -> bool {
        self.namespace.starts_with(PROVIDER_NAMESPACE_PREFIX)
    }
}

/// Parameters of a datapoint query for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDataQuery {
    /// Identifier echoed back in [`MetricDataResult::id`]
    pub id: String,
    pub metric: Metric,
    pub period_secs: u32,
    pub stat: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub max_datapoints: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDataResult {
    pub id: String,
    pub label: String,
    pub timestamps_ms: Vec<i64>,
    pub values: Vec<f64>,
}

/// One page of datapoints returned for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDataPage {
    pub results: Vec<MetricDataResult>,
    pub next_token: Option<String>,
}

/// Format epoch milliseconds the way the resource tables display them.
///
/// Out-of-range timestamps are shown raw rather than rejected.
pub fn format_epoch_ms(epoch_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(time) => time.format("%Y-%m-%d:%H:%M:%S").to_string(),
        None => format!("{epoch_ms}ms"),
    }
}

static ARN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:(?P<partition>[\w-]+):(?P<service>[\w-]+):(?P<region>[\w-]*):(?P<account>\d*):(?P<resource>.+)$")
        .expect("Invalid ARN regex")
});

/// The parts of an Amazon-style resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl Arn {
    /// Split `arn:partition:service:region:account:resource`.
    ///
    /// Returns `None` for anything that does not have that shape.
    pub fn parse(arn: &str) -> Option<Self> {
        let captures = ARN_PATTERN.captures(arn)?;
        Some(Self {
            partition: captures["partition"].to_string(),
            service: captures["service"].to_string(),
            region: captures["region"].to_string(),
            account: captures["account"].to_string(),
            resource: captures["resource"].to_string(),
        })
    }

    /// Multi-line description used for ARN tooltips.
    pub fn describe(&self) -> String {
        let region = if self.region.is_empty() {
            "(global)"
        } else {
            &self.region
        };
        format!(
            "Partition: {}\nService: {}\nRegion: {}\nAccount: {}\nResource: {}",
            self.partition, self.service, region, self.account, self.resource
        )
    }
}
