//! cloudpane - Non-blocking desktop browser for a remote cloud account
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for cloudpane. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + console output)
//! - The service client factory (fixture-backed)
//! - GUI controller ([`GuiController`] - drives the panels from a frame timer)
//!
//! The application uses a simple threading model:
//! - **Main thread**: Runs the Slint event loop and polls every panel once per frame
//! - **Task workers**: One short-lived thread per fetch, owned by the panel that started it
//!
//! # Execution Flow
//!
//! 1. Load `Settings.yaml` from `cloudpane Data/` (plus `CLOUDPANE_*` overrides)
//! 2. Initialize logging → logs/cloudpane.<date>
//! 3. Load the fixture (generated on first start)
//! 4. Create GuiController
//! 5. Run Slint event loop (blocks until window closed)
//! 6. Log task metrics
//!
//! # Configuration Files
//!
//! Expected in `cloudpane Data/` directory:
//! - `Settings.yaml`: Logging, frame interval, paging and graph settings
//! - `Fixture.yaml`: Accounts served by the simulated service

use anyhow::{Context, Result};
use cloudpane::services::FixtureFactory;
use cloudpane::ui::GuiController;
use cloudpane::{APP_NAME, ConfigManager, VERSION, metrics};
use std::sync::Arc;

/// Directory holding `Settings.yaml` and the default fixture
const CONFIG_DIR: &str = "cloudpane Data";

/// Main entry point for the cloudpane GUI application
///
/// # Errors
///
/// This function can fail if:
/// - The configuration directory cannot be created
/// - `Settings.yaml` or the fixture is invalid YAML
/// - Logging initialization fails (disk space, permissions)
/// - Slint UI initialization fails (graphics drivers, display)
fn main() -> Result<()> {
    let config_manager = Arc::new(ConfigManager::new(CONFIG_DIR)?);
    let config = config_manager.load_settings()?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = cloudpane::logging::setup_logging(&config)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let fixture_path = config_manager.fixture_path(&config);
    let fixture = config_manager
        .load_fixture(&fixture_path)
        .context("Failed to load the service fixture")?;
    tracing::info!("Serving profiles {:?}", fixture.profile_names());

    let factory = Arc::new(FixtureFactory::new(fixture));
    let gui_controller = GuiController::new(&config, config_manager, factory)?;

    tracing::info!("GUI controller initialized, launching window");

    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    metrics::global().log_summary();

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
