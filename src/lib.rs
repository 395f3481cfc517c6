// cloudpane - Non-blocking desktop browser for a remote cloud account
//
// This is the library crate containing the task bridge, the service boundary
// and the application state. The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod task;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppConfig, FixtureConfig};
pub use state::AppState;
pub use task::{AsyncAction, AsyncCollector, AsyncStream, Sink};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
