use super::Generation;
use super::runner::{Runner, Sink};

/// Incremental producer whose items accumulate in a list owned by the task.
///
/// Built for paginated "describe everything" calls feeding a table: the producer
/// adds rows as pages arrive, and the render loop calls
/// [`get_items`](Self::get_items) once per frame. Each call moves at most one
/// queued item into the retained list, so the per-frame cost stays constant no
/// matter how fast the producer is; a large backlog drains at one row per frame.
///
/// # Example
/// ```ignore
/// let mut groups = AsyncCollector::<LogGroup, ApiError>::new("log-groups");
///
/// if fetch_clicked && !groups.is_working() {
///     groups.run(move |sink| fetch_all_log_groups(&*client, 50, sink));
/// }
///
/// for group in groups.get_items() {
///     draw_row(group);
/// }
/// ```
pub struct AsyncCollector<T, E> {
    runner: Runner<T, E>,
    items: Vec<T>,
}

impl<T, E> AsyncCollector<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create an idle collector. `label` names worker threads and log lines.
    pub fn new(label: &'static str) -> Self {
        Self {
            runner: Runner::new(label),
            items: Vec::new(),
        }
    }

    /// Start `producer` on a background thread.
    ///
    /// Ignored (returns `None`) while a run is active. Otherwise the retained
    /// items, any previous error and any undrained backlog are cleared.
    pub fn run<F>(&mut self, producer: F) -> Option<Generation>
    where
        F: FnOnce(&Sink<T, E>) + Send + 'static,
    {
        let started = self.runner.start(producer, false);
        if started.is_some() {
            self.items.clear();
        }
        started
    }

    /// Cancel and abandon any active run, then start `producer`.
    pub fn restart<F>(&mut self, producer: F) -> Option<Generation>
    where
        F: FnOnce(&Sink<T, E>) + Send + 'static,
    {
        let started = self.runner.start(producer, true);
        if started.is_some() {
            self.items.clear();
        }
        started
    }

    /// Ask the active producer to stop at its next cancellation check.
    ///
    /// Items collected so far stay in place.
    pub fn cancel(&self) {
        self.runner.cancel();
    }

    /// Drain at most one pending item into the list, then return the list.
    pub fn get_items(&mut self) -> &[T] {
        self.poll();
        &self.items
    }

    /// Drain at most one pending item. Returns whether the list grew.
    pub fn poll(&mut self) -> bool {
        match self.runner.drain_one() {
            Some(item) => {
                self.items.push(item);
                true
            }
            None => false,
        }
    }

    /// The retained items, without draining.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_working(&self) -> bool {
        self.runner.is_working()
    }

    pub fn has_error(&self) -> bool {
        self.runner.has_error()
    }

    /// The error that ended the current run, left in place.
    pub fn error(&self) -> Option<E>
    where
        E: Clone,
    {
        self.runner.error()
    }

    /// Remove and return the error that ended the current run.
    pub fn take_error(&mut self) -> Option<E> {
        self.runner.take_error()
    }

    /// Acknowledge the current error. Retained items are kept.
    pub fn clear(&mut self) -> bool {
        self.runner.clear_error()
    }

    pub fn generation(&self) -> Generation {
        self.runner.generation()
    }

    /// Entries queued but not yet drained (including stale ones).
    pub fn pending(&self) -> usize {
        self.runner.pending()
    }
}
