// Application state
//
// AppState is owned by the GUI controller and only ever touched on the UI
// thread. Background work lives inside the panels' tasks; AppState::tick drives
// all of them once per frame.

pub mod session;

pub use session::{CreateSessionPanel, Session, SessionId};

use crate::metrics;
use crate::models::FetchSettings;
use crate::services::{ClientFactory, SessionInfo};
use crate::ui::panels::ErrorPanel;
use std::sync::Arc;

/// Everything the window shows: open sessions, the session form and the error list
///
/// # Related Types
///
/// - [`Session`]: One verified account and its panels
/// - [`CreateSessionPanel`]: Verifies credentials before a session is added
/// - [`crate::ui::panels::ErrorPanel`]: Errors acknowledged by every panel
/// - [`crate::ui::controller::GuiController`]: Owns the state and calls [`tick`](Self::tick)
pub struct AppState {
    factory: Arc<dyn ClientFactory>,
    settings: FetchSettings,
    sessions: Vec<Session>,
    next_session: u64,
    create_session: CreateSessionPanel,
    errors: ErrorPanel,
}

impl AppState {
    pub fn new(factory: Arc<dyn ClientFactory>, settings: FetchSettings, default_region: &str) -> Self {
        Self {
            create_session: CreateSessionPanel::new(Arc::clone(&factory), default_region),
            factory,
            settings,
            sessions: Vec::new(),
            next_session: 1,
            errors: ErrorPanel::new(),
        }
    }

    /// Add a verified session.
    pub fn add_session(&mut self, info: SessionInfo) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;

        tracing::info!("Adding {} ({})", id, info.title);
        self.sessions
            .push(Session::new(id, info, Arc::clone(&self.factory), self.settings));
        id
    }

    /// Remove a session, stopping every panel it had open.
    pub fn remove_session(&mut self, id: SessionId) -> bool {
        let Some(index) = self.sessions.iter().position(|s| s.id() == id) else {
            return false;
        };

        let mut session = self.sessions.remove(index);
        tracing::info!("Removing {} ({})", id, session.title());
        session.close_all();
        true
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    pub fn create_session(&self) -> &CreateSessionPanel {
        &self.create_session
    }

    pub fn create_session_mut(&mut self) -> &mut CreateSessionPanel {
        &mut self.create_session
    }

    pub fn errors(&self) -> &ErrorPanel {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorPanel {
        &mut self.errors
    }

    pub fn settings(&self) -> FetchSettings {
        self.settings
    }

    /// Use `factory` for sessions created from now on. Open sessions keep theirs.
    pub fn set_factory(&mut self, factory: Arc<dyn ClientFactory>) {
        self.create_session.set_factory(Arc::clone(&factory));
        self.factory = factory;
    }

    /// Drive every task for one frame.
    ///
    /// Returns whether anything displayed changed: a session was added, a panel
    /// received data or was closed, or an error arrived.
    pub fn tick(&mut self) -> bool {
        metrics::global().record_frame();

        let errors_before = self.errors.len();
        let mut changed = false;

        if let Some(info) = self.create_session.tick(&mut self.errors) {
            self.add_session(info);
            changed = true;
        }

        for session in &mut self.sessions {
            changed |= session.tick(&mut self.errors);
        }

        changed || self.errors.len() != errors_before
    }
}
