//! Per-resource panels of a session.
//!
//! Panels own the background tasks that fetch their data and are driven once
//! per frame through [`Panel::tick`]. None of them depend on Slint: the
//! controller reads rows and status lines out of them and pushes those into
//! the window's models.
//!
//! - [`LogGroupsPanel`] / [`RolesPanel`]: tables filled by an [`AsyncCollector`](crate::task::AsyncCollector)
//! - [`MetricsPanel`]: namespace tree plus a graph, both fed by [`AsyncStream`](crate::task::AsyncStream)s
//! - [`ErrorPanel`]: every error the other panels acknowledged

pub mod errors;
pub mod log_groups;
pub mod metrics;
pub mod roles;
pub mod table;

pub use errors::{ErrorEntry, ErrorPanel};
pub use log_groups::LogGroupsPanel;
pub use metrics::{Graph, MetricRow, MetricsPanel};
pub use roles::RolesPanel;
pub use table::{TablePanel, TableResource};

use crate::models::FetchSettings;
use crate::services::{ClientFactory, SessionConfig};
use std::sync::Arc;

/// What every producer of a session needs on its worker thread
#[derive(Clone)]
pub struct PanelContext {
    pub factory: Arc<dyn ClientFactory>,
    pub session: SessionConfig,
    pub settings: FetchSettings,
}

/// One table row of a listed resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRow {
    pub name: String,
    pub arn: String,
    pub created: String,

    /// Tooltip text
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    LogGroups,
    Roles,
    Metrics,
}

impl PanelKind {
    pub const ALL: [PanelKind; 3] = [PanelKind::LogGroups, PanelKind::Roles, PanelKind::Metrics];

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::LogGroups => "Log groups",
            PanelKind::Roles => "Roles",
            PanelKind::Metrics => "Metrics",
        }
    }

    /// Kind at `index` of [`ALL`](Self::ALL), as used by the "open panel" menu.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// A panel opened in a session
pub enum Panel {
    LogGroups(LogGroupsPanel),
    Roles(RolesPanel),
    Metrics(MetricsPanel),
}

impl Panel {
    /// Open a panel of `kind`; its first fetch starts immediately.
    pub fn open(kind: PanelKind, context: PanelContext) -> Self {
        match kind {
            PanelKind::LogGroups => Panel::LogGroups(LogGroupsPanel::new(context)),
            PanelKind::Roles => Panel::Roles(RolesPanel::new(context)),
            PanelKind::Metrics => Panel::Metrics(MetricsPanel::new(context)),
        }
    }

    pub fn kind(&self) -> PanelKind {
        match self {
            Panel::LogGroups(_) => PanelKind::LogGroups,
            Panel::Roles(_) => PanelKind::Roles,
            Panel::Metrics(_) => PanelKind::Metrics,
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind().title()
    }

    /// Per-frame update. Errors are moved into `errors` labelled with `source`.
    ///
    /// Returns whether anything displayed by the panel changed.
    pub fn tick(&mut self, source: &str, errors: &mut ErrorPanel) -> bool {
        match self {
            Panel::LogGroups(panel) => panel.tick(source, errors),
            Panel::Roles(panel) => panel.tick(source, errors),
            Panel::Metrics(panel) => panel.tick(source, errors),
        }
    }

    /// Refresh the panel's listing. Ignored while it is still running.
    pub fn fetch(&mut self) -> bool {
        match self {
            Panel::LogGroups(panel) => panel.fetch(),
            Panel::Roles(panel) => panel.fetch(),
            Panel::Metrics(panel) => panel.fetch(),
        }
    }

    pub fn is_working(&self) -> bool {
        match self {
            Panel::LogGroups(panel) => panel.is_working(),
            Panel::Roles(panel) => panel.is_working(),
            Panel::Metrics(panel) => panel.is_working(),
        }
    }

    pub fn status(&self) -> String {
        match self {
            Panel::LogGroups(panel) => panel.status(),
            Panel::Roles(panel) => panel.status(),
            Panel::Metrics(panel) => panel.status(),
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            Panel::LogGroups(panel) => panel.is_open(),
            Panel::Roles(panel) => panel.is_open(),
            Panel::Metrics(panel) => panel.is_open(),
        }
    }

    pub fn close(&mut self) {
        match self {
            Panel::LogGroups(panel) => panel.close(),
            Panel::Roles(panel) => panel.close(),
            Panel::Metrics(panel) => panel.close(),
        }
    }

    /// Table rows, for the table panels.
    pub fn rows(&self) -> Option<Vec<ResourceRow>> {
        match self {
            Panel::LogGroups(panel) => Some(panel.rows()),
            Panel::Roles(panel) => Some(panel.rows()),
            Panel::Metrics(_) => None,
        }
    }

    pub fn as_metrics_mut(&mut self) -> Option<&mut MetricsPanel> {
        match self {
            Panel::Metrics(panel) => Some(panel),
            _ => None,
        }
    }

    pub fn as_metrics(&self) -> Option<&MetricsPanel> {
        match self {
            Panel::Metrics(panel) => Some(panel),
            _ => None,
        }
    }
}
