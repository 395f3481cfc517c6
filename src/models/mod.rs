//! Data models for the cloudpane application.
//!
//! This module contains the plain data structures shared by the services, the
//! application state and the UI:
//! - [`AppConfig`]: Application settings loaded from `Settings.yaml`
//! - [`FixtureConfig`]: Simulated service contents loaded from `Fixture.yaml`
//! - [`LogGroup`], [`Role`], [`Metric`] and friends: resources listed from the remote service
//! - [`Arn`]: Parsed resource names used for table tooltips
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: Config and resource structs derive `Serialize`/`Deserialize` for YAML fixtures
//! - **Cloneable and `Send`**: Resources are produced on worker threads and moved to the UI thread

pub mod config;
pub mod resources;

pub use config::{
    AppConfig, FetchSettings, FixtureAccount, FixtureConfig, InjectedFailure, Operation,
};
pub use resources::{
    Arn, CallerIdentity, Dimension, LogGroup, Metric, MetricDataPage, MetricDataQuery,
    MetricDataResult, Page, Role, format_epoch_ms,
};
