// Producers for the resource panels
//
// Each producer runs on a task worker thread: it opens its own client through
// the factory, walks the paginated listing and pushes every resource into the
// run's Sink. They stop on the first error, on the last page, or as soon as the
// run is cancelled or superseded.

use super::ApiError;
use super::client::{ClientFactory, ResourceClient, SessionConfig, SessionInfo};
use crate::models::{FetchSettings, LogGroup, Metric, MetricDataPage, MetricDataQuery, Page, Role};
use crate::task::Sink;
use std::fmt::Display;

/// Drive a paginated listing into `sink`.
///
/// `fetch_page` receives the continuation token of the previous page (`None`
/// for the first one). Cancellation is checked before every request, never in
/// the middle of one.
///
/// # Returns
///
/// The number of pages fetched successfully.
pub fn paginate<T, E, F>(sink: &Sink<T, E>, mut fetch_page: F) -> usize
where
    E: Display,
    F: FnMut(Option<String>) -> Result<Page<T>, E>,
{
    let mut token: Option<String> = None;
    let mut pages = 0;

    loop {
        if sink.is_cancelled() {
            tracing::debug!("Run {} cancelled after {} pages", sink.generation(), pages);
            break;
        }

        match fetch_page(token.take()) {
            Ok(page) => {
                pages += 1;
                let next = page.continuation().map(str::to_string);
                for item in page.items {
                    sink.add(item);
                }
                match next {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }
            Err(e) => {
                tracing::warn!("Page {} of run {} failed: {}", pages + 1, sink.generation(), e);
                sink.fail(e);
                break;
            }
        }
    }

    pages
}

/// Open a client for `session` and hand it to `body`, failing the run if the
/// connection is refused.
fn with_client<T, F>(factory: &dyn ClientFactory, session: &SessionConfig, sink: &Sink<T, ApiError>, body: F)
where
    F: FnOnce(&dyn ResourceClient),
{
    match factory.connect(session) {
        Ok(client) => body(client.as_ref()),
        Err(e) => {
            tracing::warn!("Could not open a client for profile {}: {}", session.profile, e);
            sink.fail(e);
        }
    }
}

pub fn fetch_all_log_groups(
    factory: &dyn ClientFactory,
    session: &SessionConfig,
    settings: FetchSettings,
    sink: &Sink<LogGroup, ApiError>,
) {
    with_client(factory, session, sink, |client| {
        let pages = paginate(sink, |token| client.describe_log_groups(settings.page_size, token));
        tracing::debug!("Log group listing finished after {} pages", pages);
    });
}

pub fn fetch_all_roles(
    factory: &dyn ClientFactory,
    session: &SessionConfig,
    settings: FetchSettings,
    sink: &Sink<Role, ApiError>,
) {
    with_client(factory, session, sink, |client| {
        let pages = paginate(sink, |marker| client.list_roles(settings.page_size, marker));
        tracing::debug!("Role listing finished after {} pages", pages);
    });
}

/// List every metric of the account. The service chooses the page size.
pub fn fetch_all_metrics(factory: &dyn ClientFactory, session: &SessionConfig, sink: &Sink<Metric, ApiError>) {
    with_client(factory, session, sink, |client| {
        let pages = paginate(sink, |token| client.list_metrics(token));
        tracing::debug!("Metric listing finished after {} pages", pages);
    });
}

/// Fetch the datapoints of `query`, one [`MetricDataPage`] per item.
///
/// Pages are delivered with their continuation token stripped; the consumer
/// only needs the results.
pub fn fetch_metric_data(
    factory: &dyn ClientFactory,
    session: &SessionConfig,
    query: MetricDataQuery,
    sink: &Sink<MetricDataPage, ApiError>,
) {
    with_client(factory, session, sink, |client| {
        let pages = paginate(sink, |token| {
            client.get_metric_data(&query, token).map(|page| Page {
                next_token: page.next_token,
                items: vec![MetricDataPage {
                    results: page.results,
                    next_token: None,
                }],
            })
        });
        tracing::debug!("Metric data for {} finished after {} pages", query.id, pages);
    });
}

/// Build the datapoint query graphing `metric` over the configured window ending at `now_ms`.
pub fn metric_query(id: impl Into<String>, metric: Metric, settings: FetchSettings, now_ms: i64) -> MetricDataQuery {
    MetricDataQuery {
        id: id.into(),
        metric,
        period_secs: settings.metric_period_secs,
        stat: "Average".to_string(),
        start_ms: now_ms - i64::from(settings.metric_window_secs) * 1000,
        end_ms: now_ms,
        max_datapoints: settings.max_datapoints,
    }
}

/// Verify the credentials of `config` and describe the resulting session.
///
/// Runs on the worker of the session form's action.
pub fn open_session(factory: &dyn ClientFactory, config: SessionConfig) -> Result<SessionInfo, ApiError> {
    let client = factory.connect(&config)?;
    let identity = client.caller_identity()?;

    tracing::info!(
        "Session verified: profile {} in {} as {}",
        config.profile,
        config.region,
        identity.arn
    );

    Ok(SessionInfo {
        title: format!("{}@{} ({})", config.profile, config.region, identity.account),
        config,
        identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_query_window() {
        let settings = FetchSettings {
            page_size: 10,
            metric_period_secs: 300,
            metric_window_secs: 7200,
            max_datapoints: 100,
        };
        let metric = Metric {
            namespace: "AWS/Lambda".to_string(),
            name: "Invocations".to_string(),
            dimensions: vec![],
        };

        let query = metric_query("m1", metric, settings, 10_000_000);
        assert_eq!(query.id, "m1");
        assert_eq!(query.period_secs, 300);
        assert_eq!(query.start_ms, 10_000_000 - 7_200_000);
        assert_eq!(query.end_ms, 10_000_000);
        assert_eq!(query.max_datapoints, 100);
    }
}
