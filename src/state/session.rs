use crate::models::FetchSettings;
use crate::services::{ApiError, ClientFactory, SessionConfig, SessionInfo, fetch};
use crate::task::AsyncAction;
use crate::ui::panels::{ErrorPanel, Panel, PanelContext, PanelKind};
use std::fmt;
use std::sync::Arc;

/// Stable identifier of a session, unique for the lifetime of an [`AppState`](super::AppState)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A verified connection to one account and the panels opened on it
pub struct Session {
    id: SessionId,
    info: SessionInfo,
    context: PanelContext,
    panels: Vec<Panel>,
}

impl Session {
    pub fn new(id: SessionId, info: SessionInfo, factory: Arc<dyn ClientFactory>, settings: FetchSettings) -> Self {
        let context = PanelContext {
            factory,
            session: info.config.clone(),
            settings,
        };
        Self {
            id,
            info,
            context,
            panels: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    /// Open a panel of `kind` and return its index.
    pub fn open_panel(&mut self, kind: PanelKind) -> usize {
        tracing::info!("{}: opening {} panel", self.info.title, kind.title());
        self.panels.push(Panel::open(kind, self.context.clone()));
        self.panels.len() - 1
    }

    /// Close the panel at `index`. It is removed on the next [`tick`](Self::tick).
    pub fn close_panel(&mut self, index: usize) -> bool {
        match self.panels.get_mut(index) {
            Some(panel) => {
                tracing::info!("{}: closing {} panel", self.info.title, panel.title());
                panel.close();
                true
            }
            None => false,
        }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    pub fn panel_mut(&mut self, index: usize) -> Option<&mut Panel> {
        self.panels.get_mut(index)
    }

    /// Close every panel, stopping their tasks.
    pub fn close_all(&mut self) {
        for panel in &mut self.panels {
            panel.close();
        }
    }

    /// Drop closed panels and drive the remaining ones for one frame.
    ///
    /// Returns whether anything displayed changed (including panels going away).
    pub fn tick(&mut self, errors: &mut ErrorPanel) -> bool {
        let before = self.panels.len();
        self.panels.retain(Panel::is_open);
        let mut changed = self.panels.len() != before;

        for panel in &mut self.panels {
            let source = format!("{} / {}", self.info.title, panel.title());
            changed |= panel.tick(&source, errors);
        }
        changed
    }
}

/// The "new session" form: verifies credentials in the background
pub struct CreateSessionPanel {
    factory: Arc<dyn ClientFactory>,
    pub profile: String,
    pub region: String,
    lookup: AsyncAction<Result<SessionInfo, ApiError>>,
    /// Profile of the lookup in flight; the form fields may change meanwhile.
    submitted: String,
}

impl CreateSessionPanel {
    /// A form preset to the factory's preferred profile and `default_region`.
    pub fn new(factory: Arc<dyn ClientFactory>, default_region: &str) -> Self {
        let profile = factory.profiles().into_iter().next().unwrap_or_default();
        Self {
            factory,
            profile,
            region: default_region.to_string(),
            lookup: AsyncAction::new("caller-identity"),
            submitted: String::new(),
        }
    }

    pub fn profiles(&self) -> Vec<String> {
        self.factory.profiles()
    }

    /// Switch to another factory, e.g. after loading another fixture.
    ///
    /// A lookup in flight keeps using the old one.
    pub fn set_factory(&mut self, factory: Arc<dyn ClientFactory>) {
        if !factory.profiles().contains(&self.profile) {
            self.profile = factory.profiles().into_iter().next().unwrap_or_default();
        }
        self.factory = factory;
    }

    pub fn factory(&self) -> &Arc<dyn ClientFactory> {
        &self.factory
    }

    /// Verify the entered profile and region. Ignored while a lookup is pending.
    pub fn submit(&mut self) -> bool {
        let factory = Arc::clone(&self.factory);
        let config = SessionConfig {
            profile: self.profile.trim().to_string(),
            region: self.region.trim().to_string(),
        };
        let profile = config.profile.clone();
        let started = self
            .lookup
            .run(move || fetch::open_session(factory.as_ref(), config))
            .is_some();
        if started {
            self.submitted = profile;
        }
        started
    }

    pub fn is_working(&self) -> bool {
        self.lookup.is_working()
    }

    /// Per-frame update: picks up a finished lookup.
    ///
    /// A verified session is returned for the caller to add; a failure goes to
    /// the error panel.
    pub fn tick(&mut self, errors: &mut ErrorPanel) -> Option<SessionInfo> {
        match self.lookup.take_result()? {
            Ok(info) => Some(info),
            Err(error) => {
                errors.push(format!("New session ({})", self.submitted), error);
                None
            }
        }
    }
}
