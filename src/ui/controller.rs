// GUI Controller - Bridges the Slint window with the application state
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - AppState (sessions, panels and the error panel)
// - ConfigManager (loading another fixture at runtime)
//
// It handles:
// - The frame timer that drives AppState::tick once per frame
// - Pushing rows, tabs and the plot into the window's models
// - Mapping UI callbacks to panel actions
// - File browser dialogs
//
// Everything here runs on the UI thread. Slow work only ever happens inside the
// panels' background tasks, so no callback or frame ever blocks.

use crate::config::ConfigManager;
use crate::models::AppConfig;
use crate::services::{ClientFactory, FixtureFactory};
use crate::state::{AppState, Session, SessionId};
use crate::ui::panels::{Panel, PanelKind, ResourceRow, metrics::format_dimensions};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use slint::{ModelRc, SharedString, StandardListViewItem, Timer, TimerMode, VecModel};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

// Include the generated Slint code
slint::include_modules!();

/// View box of the plot `Path` in `ui/main.slint`
const PLOT_WIDTH: f64 = 600.0;
const PLOT_HEIGHT: f64 = 240.0;

/// What the window currently shows, plus the tab models last pushed to it
#[derive(Debug, Default)]
struct View {
    session: Option<SessionId>,
    panel: Option<usize>,
    session_tabs: Vec<TabItem>,
    panel_tabs: Vec<TabItem>,
}

impl View {
    /// Point the selection at something that still exists.
    fn resolve(&mut self, state: &AppState) {
        if self.session.and_then(|id| state.session(id)).is_none() {
            self.session = state.sessions().first().map(Session::id);
            self.panel = None;
        }

        let panel_count = self
            .session
            .and_then(|id| state.session(id))
            .map_or(0, |session| session.panels().len());

        self.panel = match self.panel {
            _ if panel_count == 0 => None,
            Some(index) if index < panel_count => Some(index),
            Some(_) => Some(panel_count - 1),
            None => Some(0),
        };
    }

    fn session_index(&self, state: &AppState) -> i32 {
        self.session
            .and_then(|id| state.sessions().iter().position(|s| s.id() == id))
            .map_or(-1, |index| index as i32)
    }

    fn current_session<'a>(&self, state: &'a AppState) -> Option<&'a Session> {
        state.session(self.session?)
    }

    fn current_panel<'a>(&self, state: &'a AppState) -> Option<&'a Panel> {
        self.current_session(state)?.panel(self.panel?)
    }

    fn current_panel_mut<'a>(&self, state: &'a mut AppState) -> Option<&'a mut Panel> {
        state.session_mut(self.session?)?.panel_mut(self.panel?)
    }
}

/// GUI Controller that wires up the Slint UI with the application state
///
/// Owns the [`AppState`] (behind `Rc<RefCell<_>>`, shared with the UI
/// callbacks) and a [`slint::Timer`] that calls [`AppState::tick`] every
/// `frame_interval_ms`.
///
/// # Example
/// ```ignore
/// let config_manager = Arc::new(ConfigManager::new("cloudpane Data")?);
/// let config = config_manager.load_settings()?;
/// let fixture = config_manager.load_fixture(&config_manager.fixture_path(&config))?;
///
/// let controller = GuiController::new(&config, config_manager, Arc::new(FixtureFactory::new(fixture)))?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    ui: MainWindow,
    state: Rc<RefCell<AppState>>,
    view: Rc<RefCell<View>>,
    frame_timer: Timer,
    frame_interval: Duration,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `config` - Application settings (frame interval, paging, default region)
    /// * `config_manager` - Used to load another fixture from the UI
    /// * `factory` - Opens clients for the sessions created in this window
    pub fn new(
        config: &AppConfig,
        config_manager: Arc<ConfigManager>,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let state = Rc::new(RefCell::new(AppState::new(
            factory,
            config.fetch_settings(),
            &config.default_region,
        )));
        let view = Rc::new(RefCell::new(View::default()));

        {
            let state = state.borrow();
            let form = state.create_session();
            ui.set_profiles(string_model(form.profiles()));
            ui.set_profile(form.profile.as_str().into());
            ui.set_region(form.region.as_str().into());
        }
        ui.set_fixture_path(config_manager.fixture_path(config).as_str().into());

        Self::sync(&ui, &state.borrow(), &mut view.borrow_mut(), true);
        Self::setup_callbacks(&ui, &state, &view, config_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            state,
            view,
            frame_timer: Timer::default(),
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
        })
    }

    /// Run the GUI (blocks until window is closed)
    ///
    /// Starts the frame timer, runs the Slint event loop, and on exit closes
    /// every session so their background tasks are told to stop.
    pub fn run(self) -> Result<(), slint::PlatformError> {
        let ui_weak = self.ui.as_weak();
        let state = Rc::clone(&self.state);
        let view = Rc::clone(&self.view);

        self.frame_timer
            .start(TimerMode::Repeated, self.frame_interval, move || {
                if let Some(ui) = ui_weak.upgrade() {
                    Self::on_frame(&ui, &state, &view);
                }
            });

        tracing::info!(
            "Starting GUI event loop ({}ms frames)",
            self.frame_interval.as_millis()
        );
        let result = self.ui.run();

        self.frame_timer.stop();
        let mut state = self.state.borrow_mut();
        let ids: Vec<SessionId> = state.sessions().iter().map(Session::id).collect();
        for id in ids {
            state.remove_session(id);
        }

        result
    }

    /// One frame: drive every task, then refresh what changed.
    fn on_frame(ui: &MainWindow, state: &Rc<RefCell<AppState>>, view: &Rc<RefCell<View>>) {
        let mut state = state.borrow_mut();
        let mut view = view.borrow_mut();

        let sessions_before = state.sessions().len();
        let changed = state.tick();

        // Jump to a session as soon as it has been verified
        if state.sessions().len() > sessions_before {
            view.session = state.sessions().last().map(Session::id);
            view.panel = None;
        }

        Self::sync(ui, &state, &mut view, changed);
    }

    /// Push the state into the window.
    ///
    /// Status lines and tabs are cheap and refreshed every call; models holding
    /// rows are only rebuilt when `content_changed`.
    fn sync(ui: &MainWindow, state: &AppState, view: &mut View, content_changed: bool) {
        view.resolve(state);

        ui.set_creating_session(state.create_session().is_working());
        Self::sync_tabs(ui, state, view);

        let panel = view.current_panel(state);
        ui.set_panel_status(panel.map(Panel::status).unwrap_or_default().into());
        ui.set_panel_busy(panel.is_some_and(Panel::is_working));

        if content_changed {
            Self::sync_content(ui, state, view);
            Self::sync_errors(ui, state);
        }
    }

    fn sync_tabs(ui: &MainWindow, state: &AppState, view: &mut View) {
        let session_tabs: Vec<TabItem> = state
            .sessions()
            .iter()
            .map(|session| TabItem {
                title: session.title().into(),
                busy: session.panels().iter().any(Panel::is_working),
            })
            .collect();

        let panel_tabs: Vec<TabItem> = view
            .current_session(state)
            .map(|session| {
                session
                    .panels()
                    .iter()
                    .map(|panel| TabItem {
                        title: panel.title().into(),
                        busy: panel.is_working(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if session_tabs != view.session_tabs {
            ui.set_sessions(ModelRc::new(VecModel::from(session_tabs.clone())));
            view.session_tabs = session_tabs;
        }
        if panel_tabs != view.panel_tabs {
            ui.set_panels(ModelRc::new(VecModel::from(panel_tabs.clone())));
            view.panel_tabs = panel_tabs;
        }

        ui.set_current_session(view.session_index(state));
        ui.set_current_panel(view.panel.map_or(-1, |index| index as i32));
    }

    fn sync_content(ui: &MainWindow, state: &AppState, view: &View) {
        match view.current_panel(state) {
            Some(Panel::Metrics(metrics)) => {
                ui.set_panel_kind("metrics".into());

                let rows: Vec<MetricItem> = metrics
                    .rows()
                    .into_iter()
                    .map(|row| MetricItem {
                        namespace: row.namespace.into(),
                        name: row.name.into(),
                        dimensions: row.dimensions.into(),
                        provider: row.provider,
                    })
                    .collect();
                ui.set_metric_rows(ModelRc::new(VecModel::from(rows)));

                match metrics.graph_state() {
                    Some(graph) => {
                        ui.set_plot_title(
                            format!(
                                "{} / {} {}",
                                graph.metric.namespace,
                                graph.metric.name,
                                format_dimensions(&graph.metric.dimensions)
                            )
                            .into(),
                        );
                        let range = match graph.value_range() {
                            Some((lo, hi)) => {
                                format!("{:.2} to {:.2}, {} datapoints", lo, hi, graph.points.len())
                            }
                            None => "No datapoints yet".to_string(),
                        };
                        ui.set_plot_range(range.into());
                        ui.set_plot_commands(graph.svg_path(PLOT_WIDTH, PLOT_HEIGHT).into());
                    }
                    None => {
                        ui.set_plot_title("Select a metric to graph".into());
                        ui.set_plot_range(SharedString::default());
                        ui.set_plot_commands(SharedString::default());
                    }
                }
            }
            Some(panel) => {
                ui.set_panel_kind("table".into());
                let rows = panel.rows().unwrap_or_default();
                ui.set_table_rows(table_model(&rows));
                ui.set_row_details(string_model(rows.into_iter().map(|row| row.detail).collect()));
            }
            None => {
                ui.set_panel_kind(SharedString::default());
            }
        }
    }

    fn sync_errors(ui: &MainWindow, state: &AppState) {
        let errors = state.errors();
        let items: Vec<ErrorItem> = errors
            .entries()
            .iter()
            .map(|entry| ErrorItem {
                summary: entry.summary().into(),
                retryable: entry.error.is_retryable(),
            })
            .collect();

        ui.set_errors(ModelRc::new(VecModel::from(items)));
        ui.set_selected_error(errors.selected().map_or(-1, |index| index as i32));
        ui.set_error_details(
            errors
                .selected_entry()
                .map(|entry| format!("{}\n{}", entry.source, entry.error.details()))
                .unwrap_or_default()
                .into(),
        );
    }

    /// Run `action` against the state from a UI callback, then refresh the window.
    fn apply<F>(ui_weak: &slint::Weak<MainWindow>, state: &Rc<RefCell<AppState>>, view: &Rc<RefCell<View>>, action: F)
    where
        F: FnOnce(&MainWindow, &mut AppState, &mut View),
    {
        let Some(ui) = ui_weak.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        let mut view = view.borrow_mut();

        action(&ui, &mut state, &mut view);
        Self::sync(&ui, &state, &mut view, true);
    }

    /// Set up Slint callbacks
    fn setup_callbacks(
        ui: &MainWindow,
        state: &Rc<RefCell<AppState>>,
        view: &Rc<RefCell<View>>,
        config_manager: Arc<ConfigManager>,
    ) {
        let handles = || (ui.as_weak(), Rc::clone(state), Rc::clone(view));

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_create_session(move || {
            Self::apply(&ui_weak, &state_rc, &view_rc, |ui, state, _| {
                let form = state.create_session_mut();
                form.profile = ui.get_profile().to_string();
                form.region = ui.get_region().to_string();

                tracing::info!("New session requested for {} in {}", form.profile, form.region);
                if !form.submit() {
                    tracing::debug!("Session lookup already in progress");
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_browse_fixture(move || {
            let Some(path) = Self::show_file_picker("Select fixture", vec![("YAML", &["yaml", "yml"][..])]) else {
                return;
            };

            Self::apply(&ui_weak, &state_rc, &view_rc, |ui, state, _| {
                match config_manager.load_fixture(&path) {
                    Ok(fixture) => {
                        state.set_factory(Arc::new(FixtureFactory::new(fixture)));
                        let form = state.create_session();
                        ui.set_profiles(string_model(form.profiles()));
                        ui.set_profile(form.profile.as_str().into());
                        ui.set_fixture_path(path.as_str().into());
                        ui.set_status_message(SharedString::default());
                    }
                    Err(e) => {
                        tracing::error!("Failed to load fixture {}: {:#}", path, e);
                        ui.set_status_message(format!("Could not load {}: {}", path, e).into());
                    }
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_select_session(move |index| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, view| {
                if let Some(session) = to_index(index).and_then(|i| state.sessions().get(i)) {
                    view.session = Some(session.id());
                    view.panel = None;
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_close_session(move |index| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, _| {
                if let Some(id) = to_index(index).and_then(|i| state.sessions().get(i)).map(Session::id) {
                    state.remove_session(id);
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_open_panel(move |kind| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, view| {
                let Some(kind) = to_index(kind).and_then(PanelKind::from_index) else {
                    return;
                };
                if let Some(session) = view.session.and_then(|id| state.session_mut(id)) {
                    view.panel = Some(session.open_panel(kind));
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_select_panel(move |index| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, _, view| {
                view.panel = to_index(index);
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_close_panel(move |index| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, view| {
                let (Some(session), Some(index)) = (view.session.and_then(|id| state.session_mut(id)), to_index(index)) else {
                    return;
                };
                session.close_panel(index);
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_fetch(move || {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, view| {
                if let Some(panel) = view.current_panel_mut(state) {
                    if !panel.fetch() {
                        tracing::debug!("{} is still fetching, refresh ignored", panel.title());
                    }
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_graph_metric(move |index| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, view| {
                let metrics = view.current_panel_mut(state).and_then(Panel::as_metrics_mut);
                if let (Some(metrics), Some(index)) = (metrics, to_index(index)) {
                    metrics.graph_row(index);
                }
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_select_error(move |index| {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, _| {
                state.errors_mut().select(to_index(index));
            });
        });

        let (ui_weak, state_rc, view_rc) = handles();
        ui.on_clear_errors(move || {
            Self::apply(&ui_weak, &state_rc, &view_rc, |_, state, _| {
                state.errors_mut().clear();
            });
        });
    }

    /// Show a native file picker dialog
    ///
    /// # Arguments
    /// * `title` - Dialog title
    /// * `filters` - File type filters (name, extensions)
    ///
    /// # Returns
    /// The selected file path, or None if cancelled
    fn show_file_picker(title: &str, filters: Vec<(&str, &[&str])>) -> Option<Utf8PathBuf> {
        use rfd::FileDialog;

        let mut dialog = FileDialog::new().set_title(title);
        for (name, extensions) in filters {
            dialog = dialog.add_filter(name, extensions);
        }

        dialog.pick_file().and_then(|path| {
            Utf8PathBuf::try_from(path)
                .map_err(|e| {
                    tracing::error!("Failed to convert path to UTF-8: {}", e);
                    e
                })
                .ok()
        })
    }
}

fn to_index(index: i32) -> Option<usize> {
    usize::try_from(index).ok()
}

fn string_model(items: Vec<String>) -> ModelRc<SharedString> {
    let items: Vec<SharedString> = items.into_iter().map(SharedString::from).collect();
    ModelRc::new(VecModel::from(items))
}

/// Rows for the Name / ARN / Created table.
fn table_model(rows: &[ResourceRow]) -> ModelRc<ModelRc<StandardListViewItem>> {
    let rows: Vec<ModelRc<StandardListViewItem>> = rows
        .iter()
        .map(|row| {
            let cells: Vec<StandardListViewItem> = [&row.name, &row.arn, &row.created]
                .into_iter()
                .map(|cell| StandardListViewItem::from(cell.as_str()))
                .collect();
            ModelRc::new(VecModel::from(cells))
        })
        .collect();
    ModelRc::new(VecModel::from(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_fixture;
    use crate::models::{CallerIdentity, FetchSettings};
    use crate::services::{SessionConfig, SessionInfo};
    use slint::Model;

    // The window itself needs a display; these cover the state-to-model plumbing.

    fn state() -> AppState {
        let mut fixture = default_fixture();
        for account in fixture.profiles.values_mut() {
            account.latency_ms = 0;
        }
        AppState::new(Arc::new(FixtureFactory::new(fixture)), FetchSettings::default(), "us-east-1")
    }

    fn info() -> SessionInfo {
        SessionInfo {
            title: "default@us-east-1".to_string(),
            config: SessionConfig {
                profile: "default".to_string(),
                region: "us-east-1".to_string(),
            },
            identity: CallerIdentity {
                account: "123456789012".to_string(),
                user_id: "AIDA".to_string(),
                arn: "arn:aws:iam::123456789012:user/operator".to_string(),
            },
        }
    }

    #[test]
    fn test_view_follows_removed_session() {
        let mut state = state();
        let first = state.add_session(info());
        let second = state.add_session(info());

        let mut view = View {
            session: Some(second),
            ..View::default()
        };
        view.resolve(&state);
        assert_eq!(view.session, Some(second));
        assert_eq!(view.session_index(&state), 1);

        state.remove_session(second);
        view.resolve(&state);
        assert_eq!(view.session, Some(first));
        assert_eq!(view.panel, None);
    }

    #[test]
    fn test_view_clamps_panel_index() {
        let mut state = state();
        let id = state.add_session(info());
        let session = state.session_mut(id).unwrap();
        session.open_panel(PanelKind::LogGroups);
        session.open_panel(PanelKind::Roles);

        let mut view = View {
            session: Some(id),
            panel: Some(5),
            ..View::default()
        };
        view.resolve(&state);
        assert_eq!(view.panel, Some(1));
        assert_eq!(view.current_panel(&state).unwrap().kind(), PanelKind::Roles);
    }

    #[test]
    fn test_empty_state_selects_nothing() {
        let state = state();
        let mut view = View::default();
        view.resolve(&state);
        assert_eq!(view.session_index(&state), -1);
        assert!(view.current_panel(&state).is_none());
    }

    #[test]
    fn test_table_model() {
        let rows = vec![ResourceRow {
            name: "deployer".to_string(),
            arn: "arn:aws:iam::1:role/deployer".to_string(),
            created: "2023-11-14:22:13:20".to_string(),
            detail: String::new(),
        }];

        let model = table_model(&rows);
        assert_eq!(model.row_count(), 1);
        let cells = model.row_data(0).unwrap();
        assert_eq!(cells.row_count(), 3);
        assert_eq!(cells.row_data(1).unwrap().text.as_str(), "arn:aws:iam::1:role/deployer");
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(-1), None);
        assert_eq!(to_index(3), Some(3));
    }
}
