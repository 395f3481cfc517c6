use crate::models::format_epoch_ms;
use crate::services::ApiError;
use chrono::Utc;

/// An error moved out of a panel's task, with where and when it happened
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    /// Session and panel the error came from
    pub source: String,
    pub error: ApiError,
    pub time: String,
}

impl ErrorEntry {
    /// One-line summary for the error list.
    pub fn summary(&self) -> String {
        format!("[{}] {}: {}", self.time, self.source, self.error)
    }
}

/// Collects the errors every panel acknowledges, newest last.
///
/// Panels hand errors over as soon as their task reports one, so an error never
/// lingers next to the results of a later run. The list is only emptied by
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct ErrorPanel {
    entries: Vec<ErrorEntry>,
    selected: Option<usize>,
}

impl ErrorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl Into<String>, error: ApiError) {
        let source = source.into();
        tracing::warn!("{}: {}", source, error);

        self.entries.push(ErrorEntry {
            source,
            error,
            time: format_epoch_ms(Utc::now().timestamp_millis()),
        });
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Select the entry whose details are shown. Out-of-range indices deselect.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.entries.len());
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&ErrorEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected = None;
    }
}
