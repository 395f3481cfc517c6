//! Integration tests for the service producers
//!
//! These tests verify:
//! - Paginated listings follow continuation tokens to the last page
//! - A failing page ends the run but keeps the items already delivered
//! - Cancellation stops the listing between pages
//! - Session verification through the client factory
//! - The fixture-backed service end to end

use cloudpane::config::default_fixture;
use cloudpane::models::{
    CallerIdentity, FetchSettings, LogGroup, Metric, MetricDataPage, MetricDataQuery, MetricDataResult, Page, Role,
};
use cloudpane::services::fetch::{
    fetch_all_log_groups, fetch_all_roles, fetch_metric_data, metric_query, open_session,
};
use cloudpane::services::{ApiError, ClientFactory, ErrorKind, FixtureFactory, ResourceClient, SessionConfig};
use cloudpane::task::{AsyncCollector, AsyncStream};
use mockall::{Sequence, mock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

mock! {
    pub Client {}

    impl ResourceClient for Client {
        fn caller_identity(&self) -> Result<CallerIdentity, ApiError>;
        fn describe_log_groups(&self, limit: u32, token: Option<String>) -> Result<Page<LogGroup>, ApiError>;
        fn list_roles(&self, max_items: u32, marker: Option<String>) -> Result<Page<Role>, ApiError>;
        fn list_metrics(&self, token: Option<String>) -> Result<Page<Metric>, ApiError>;
        fn get_metric_data(&self, query: &MetricDataQuery, token: Option<String>) -> Result<MetricDataPage, ApiError>;
    }
}

mock! {
    pub Factory {}

    impl ClientFactory for Factory {
        fn connect(&self, config: &SessionConfig) -> Result<Box<dyn ResourceClient>, ApiError>;
        fn profiles(&self) -> Vec<String>;
    }
}

fn session() -> SessionConfig {
    SessionConfig {
        profile: "dev".to_string(),
        region: "eu-west-1".to_string(),
    }
}

fn settings(page_size: u32) -> FetchSettings {
    FetchSettings {
        page_size,
        ..FetchSettings::default()
    }
}

fn group(name: &str) -> LogGroup {
    LogGroup {
        name: name.to_string(),
        arn: format!("arn:aws:logs:eu-west-1:123456789012:log-group:{name}"),
        creation_time_ms: 1_700_000_000_000,
        stored_bytes: 0,
        retention_days: None,
    }
}

fn page(items: Vec<LogGroup>, next_token: Option<&str>) -> Page<LogGroup> {
    Page {
        items,
        next_token: next_token.map(str::to_string),
    }
}

fn throttled() -> ApiError {
    ApiError::from_code(400, "ThrottlingException", "Rate exceeded").with_request_id("req-2")
}

/// A factory handing out `client` exactly once.
fn factory_with(client: MockClient) -> Arc<MockFactory> {
    let mut factory = MockFactory::new();
    factory
        .expect_connect()
        .withf(|config| config.profile == "dev")
        .times(1)
        .return_once(move |_| Ok(Box::new(client) as Box<dyn ResourceClient>));
    Arc::new(factory)
}

fn wait_idle<T: Clone + Send + 'static>(collector: &mut AsyncCollector<T, ApiError>) -> Vec<T> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        collector.get_items();
        if !collector.is_working() && collector.pending() == 0 {
            return collector.items().to_vec();
        }
        assert!(Instant::now() < deadline, "listing did not finish");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn list_log_groups(factory: Arc<MockFactory>, page_size: u32) -> AsyncCollector<LogGroup, ApiError> {
    let mut collector = AsyncCollector::new("log-groups");
    collector.run(move |sink| fetch_all_log_groups(factory.as_ref(), &session(), settings(page_size), sink));
    collector
}

fn names(groups: &[LogGroup]) -> Vec<&str> {
    groups.iter().map(|g| g.name.as_str()).collect()
}

#[test]
fn test_pagination_follows_tokens() {
    let mut client = MockClient::new();
    let mut seq = Sequence::new();
    client
        .expect_describe_log_groups()
        .withf(|limit, token| *limit == 2 && token.is_none())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(page(vec![group("a"), group("b")], Some("t1"))));
    client
        .expect_describe_log_groups()
        .withf(|_, token| token.as_deref() == Some("t1"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(page(vec![group("c")], None)));

    let factory = factory_with(client);
    let mut collector = list_log_groups(Arc::clone(&factory), 2);

    let groups = wait_idle(&mut collector);
    assert_eq!(names(&groups), vec!["a", "b", "c"]);
    assert!(!collector.has_error());
}

#[test]
fn test_empty_token_ends_listing() {
    let mut client = MockClient::new();
    client
        .expect_describe_log_groups()
        .times(1)
        .returning(|_, _| Ok(page(vec![group("only")], Some(""))));

    let mut collector = list_log_groups(factory_with(client), 10);

    assert_eq!(names(&wait_idle(&mut collector)), vec!["only"]);
    assert!(!collector.has_error());
}

#[test]
fn test_failed_page_keeps_delivered_items() {
    let mut client = MockClient::new();
    let mut seq = Sequence::new();
    client
        .expect_describe_log_groups()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(page(vec![group("a"), group("b")], Some("t1"))));
    client
        .expect_describe_log_groups()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(throttled()));

    let mut collector = list_log_groups(factory_with(client), 2);

    assert_eq!(names(&wait_idle(&mut collector)), vec!["a", "b"]);
    let error = collector.error().expect("listing should have failed");
    assert_eq!(error.code, "ThrottlingException");
    assert_eq!(error.kind, ErrorKind::Throttling);
    assert_eq!(error.request_id, "req-2");
    assert!(error.is_retryable());
}

#[test]
fn test_connect_failure_fails_the_run() {
    let mut factory = MockFactory::new();
    factory
        .expect_connect()
        .times(1)
        .returning(|_| Err(ApiError::from_code(403, "InvalidClientTokenId", "Unknown profile")));
    let factory = Arc::new(factory);

    let mut collector = AsyncCollector::<Role, ApiError>::new("roles");
    let producer_factory = Arc::clone(&factory);
    collector.run(move |sink| fetch_all_roles(producer_factory.as_ref(), &session(), settings(10), sink));

    assert!(wait_idle(&mut collector).is_empty());
    let error = collector.take_error().expect("connect error reported");
    assert_eq!(error.status, 403);
    assert!(!error.is_retryable());
}

#[test]
fn test_cancel_stops_between_pages() {
    let (open, gate) = mpsc::channel::<()>();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut client = MockClient::new();
    let counter = Arc::clone(&calls);
    client.expect_describe_log_groups().returning(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = gate.recv_timeout(Duration::from_secs(5));
        Ok(page(vec![group("a"), group("b")], Some("more")))
    });

    let mut collector = list_log_groups(factory_with(client), 2);
    let deadline = Instant::now() + Duration::from_secs(5);
    while calls.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "first page was never requested");
        std::thread::sleep(Duration::from_millis(1));
    }

    collector.cancel();
    open.send(()).unwrap();

    // the page in flight is still delivered, the next one is never requested
    assert_eq!(names(&wait_idle(&mut collector)), vec!["a", "b"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!collector.has_error());
}

#[test]
fn test_metric_data_pages_are_streamed() {
    let result = |id: &str, values: Vec<f64>| MetricDataResult {
        id: id.to_string(),
        label: "Invocations".to_string(),
        timestamps_ms: (0..values.len() as i64).map(|i| i * 60_000).collect(),
        values,
    };

    let mut client = MockClient::new();
    let mut seq = Sequence::new();
    let first = result("q1", vec![1.0, 2.0]);
    let second = result("q1", vec![3.0]);
    client
        .expect_get_metric_data()
        .withf(|query, token| query.id == "q1" && token.is_none())
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_, _| {
            Ok(MetricDataPage {
                results: vec![first],
                next_token: Some("p2".to_string()),
            })
        });
    client
        .expect_get_metric_data()
        .withf(|_, token| token.as_deref() == Some("p2"))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_, _| {
            Ok(MetricDataPage {
                results: vec![second],
                next_token: None,
            })
        });

    let factory = factory_with(client);
    let metric = Metric {
        namespace: "AWS/Lambda".to_string(),
        name: "Invocations".to_string(),
        dimensions: vec![],
    };
    let query = metric_query("q1", metric, FetchSettings::default(), 1_700_000_000_000);

    let mut stream = AsyncStream::<MetricDataPage, ApiError>::new("graph");
    stream.run(move |sink| fetch_metric_data(factory.as_ref(), &session(), query, sink));

    let mut pages = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while stream.is_working() || stream.pending() > 0 {
        assert!(Instant::now() < deadline, "metric data did not finish");
        if let Some(page) = stream.pull_item() {
            pages.push(page);
        }
    }

    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| p.next_token.is_none()));
    let values: Vec<f64> = pages.iter().flat_map(|p| p.results[0].values.clone()).collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
    assert!(!stream.has_error());
}

#[test]
fn test_open_session_reports_identity() {
    let mut client = MockClient::new();
    client.expect_caller_identity().times(1).returning(|| {
        Ok(CallerIdentity {
            account: "123456789012".to_string(),
            user_id: "AIDADEV".to_string(),
            arn: "arn:aws:iam::123456789012:user/dev".to_string(),
        })
    });
    let factory = factory_with(client);

    let info = open_session(factory.as_ref(), session()).unwrap();
    assert_eq!(info.title, "dev@eu-west-1 (123456789012)");
    assert_eq!(info.config, session());
    assert_eq!(info.identity.user_id, "AIDADEV");
}

#[test]
fn test_open_session_propagates_identity_error() {
    let mut client = MockClient::new();
    client
        .expect_caller_identity()
        .times(1)
        .returning(|| Err(ApiError::from_code(503, "ServiceUnavailable", "Try again")));
    let factory = factory_with(client);

    let error = open_session(factory.as_ref(), session()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Service);
}

#[test]
fn test_fixture_service_end_to_end() {
    let mut fixture = default_fixture();
    for account in fixture.profiles.values_mut() {
        account.latency_ms = 0;
    }
    let factory = Arc::new(FixtureFactory::new(fixture));
    let config = SessionConfig {
        profile: "default".to_string(),
        region: "us-east-1".to_string(),
    };

    let mut collector = AsyncCollector::<LogGroup, ApiError>::new("fixture-log-groups");
    let producer_factory = Arc::clone(&factory);
    let producer_config = config.clone();
    collector.run(move |sink| fetch_all_log_groups(producer_factory.as_ref(), &producer_config, settings(7), sink));

    let groups = wait_idle(&mut collector);
    assert_eq!(groups.len(), 54);
    assert!(!collector.has_error());

    let throttled = SessionConfig {
        profile: "throttled".to_string(),
        ..config
    };
    let mut roles = AsyncCollector::<Role, ApiError>::new("fixture-roles");
    roles.run(move |sink| fetch_all_roles(factory.as_ref(), &throttled, settings(7), sink));

    assert!(wait_idle(&mut roles).is_empty());
    assert_eq!(roles.error().map(|e| e.status), Some(403));
}
