// Table panels
//
// Log groups and roles are both "list everything, show it as a table" panels.
// The panel owns an AsyncCollector; each frame moves at most one resource into
// the table and hands any error over to the error panel.

use super::{ErrorPanel, PanelContext, ResourceRow};
use crate::services::ApiError;
use crate::task::{AsyncCollector, Sink};

/// A resource listed by a [`TablePanel`]
pub trait TableResource: Clone + Send + 'static {
    /// Names worker threads and log lines
    const TASK_LABEL: &'static str;

    /// Plural shown in panel titles and status lines
    const NOUN: &'static str;

    fn row(&self) -> ResourceRow;

    /// Producer listing every resource of the session.
    fn produce(context: &PanelContext, sink: &Sink<Self, ApiError>);
}

pub struct TablePanel<R> {
    context: PanelContext,
    open: bool,
    resources: AsyncCollector<R, ApiError>,
}

impl<R: TableResource> TablePanel<R> {
    /// Open the panel and start listing right away.
    pub fn new(context: PanelContext) -> Self {
        let mut panel = Self {
            context,
            open: true,
            resources: AsyncCollector::new(R::TASK_LABEL),
        };
        panel.fetch();
        panel
    }

    /// Re-list all resources. Ignored while a listing is running.
    pub fn fetch(&mut self) -> bool {
        let context = self.context.clone();
        self.resources
            .run(move |sink| R::produce(&context, sink))
            .is_some()
    }

    /// Per-frame update. Returns whether the table changed.
    pub fn tick(&mut self, source: &str, errors: &mut ErrorPanel) -> bool {
        let grew = self.resources.poll();
        if let Some(error) = self.resources.take_error() {
            errors.push(source, error);
        }
        grew
    }

    pub fn resources(&self) -> &[R] {
        self.resources.items()
    }

    pub fn rows(&self) -> Vec<ResourceRow> {
        self.resources.items().iter().map(R::row).collect()
    }

    pub fn is_working(&self) -> bool {
        self.resources.is_working()
    }

    /// Working, or still holding undelivered items.
    pub fn is_loading(&self) -> bool {
        self.resources.is_working() || self.resources.pending() > 0
    }

    pub fn status(&self) -> String {
        let count = self.resources.items().len();
        if self.is_loading() {
            format!("Loading {}... ({})", R::NOUN, count)
        } else {
            format!("{} {}", count, R::NOUN)
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Mark the panel closed and stop its listing.
    pub fn close(&mut self) {
        self.open = false;
        self.resources.cancel();
    }
}
