//! Services module - the boundary to the remote service.
//!
//! Everything that talks to the service lives here and is free of UI code, so
//! it can be exercised from tests without a window.
//!
//! # Components
//!
//! - [`ResourceClient`]: Blocking client trait with one method per service operation.
//!   Paginated operations take and return continuation tokens.
//! - [`ClientFactory`]: Opens a client for a [`SessionConfig`]. Producers call it on their
//!   worker thread, so neither connecting nor fetching ever runs on the UI thread.
//! - [`FixtureFactory`] / [`FixtureClient`]: Serve a `Fixture.yaml` with simulated latency,
//!   paging and injected failures.
//! - [`fetch`]: Producers that walk the paginated listings into a task [`Sink`](crate::task::Sink).
//! - [`ApiError`]: Error returned by every operation, classified by [`ErrorKind`].
//!
//! # Usage Example
//!
//! ```ignore
//! use cloudpane::services::{fetch, FixtureFactory, SessionConfig};
//! use cloudpane::task::AsyncCollector;
//!
//! let factory = Arc::new(FixtureFactory::new(fixture));
//! let session = SessionConfig { profile: "default".into(), region: "us-east-1".into() };
//!
//! let mut log_groups = AsyncCollector::new("log-groups");
//! log_groups.run(move |sink| fetch::fetch_all_log_groups(factory.as_ref(), &session, settings, sink));
//!
//! // once per frame
//! let rows = log_groups.get_items();
//! ```

pub mod client;
pub mod error;
pub mod fetch;
pub mod fixture;

pub use client::{ClientFactory, ResourceClient, SessionConfig, SessionInfo};
pub use error::{ApiError, ErrorKind};
pub use fixture::{FixtureClient, FixtureFactory};
