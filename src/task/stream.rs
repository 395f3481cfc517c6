use super::Generation;
use super::runner::{Runner, Sink};

/// Incremental producer whose items are handed straight to the consumer.
///
/// Unlike [`AsyncCollector`](super::AsyncCollector) nothing is retained: every
/// [`pull_item`](Self::pull_item) gives ownership of at most one item to the
/// caller, which is free to aggregate it however it likes (bucketing metrics by
/// namespace, appending datapoints to a plot, ...).
///
/// # Example
/// ```ignore
/// let mut metrics = AsyncStream::<Metric, ApiError>::new("metrics");
/// metrics.run(move |sink| fetch_all_metrics(&*client, sink));
///
/// // once per frame
/// if let Some(metric) = metrics.pull_item() {
///     tree.insert(metric);
/// }
/// ```
pub struct AsyncStream<T, E> {
    runner: Runner<T, E>,
}

impl<T, E> AsyncStream<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create an idle stream. `label` names worker threads and log lines.
    pub fn new(label: &'static str) -> Self {
        Self {
            runner: Runner::new(label),
        }
    }

    /// Start `producer` on a background thread.
    ///
    /// Returns the generation of the new run, or `None` when a run is already
    /// active (the request is ignored) or the worker could not be spawned. Any
    /// unacknowledged error from the previous run is discarded.
    pub fn run<F>(&mut self, producer: F) -> Option<Generation>
    where
        F: FnOnce(&Sink<T, E>) + Send + 'static,
    {
        self.runner.start(producer, false)
    }

    /// Like [`run`](Self::run), but cancels and abandons an active run instead of
    /// ignoring the request. Nothing the abandoned producer emits afterwards is
    /// ever observed.
    pub fn restart<F>(&mut self, producer: F) -> Option<Generation>
    where
        F: FnOnce(&Sink<T, E>) + Send + 'static,
    {
        self.runner.start(producer, true)
    }

    /// Ask the active producer to stop at its next cancellation check.
    pub fn cancel(&self) {
        self.runner.cancel();
    }

    /// Take the next item of the current run, if one is waiting.
    ///
    /// Never blocks. Dequeues at most one entry; an entry left over from a
    /// superseded run is dropped and `None` is returned for this call.
    pub fn pull_item(&mut self) -> Option<T> {
        self.runner.drain_one()
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

    /// Acknowledge the current error without starting new work.
    pub fn clear(&mut self) -> bool {
        self.runner.clear_error()
    }

    pub fn generation(&self) -> Generation {
        self.runner.generation()
    }

    /// Entries queued but not yet pulled (including stale ones).
    pub fn pending(&self) -> usize {
        self.runner.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn pull_until_idle<T: Send + 'static>(stream: &mut AsyncStream<T, String>) -> Vec<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut items = Vec::new();
        loop {
            let working = stream.is_working();
            match stream.pull_item() {
                Some(item) => items.push(item),
                None if !working && stream.pending() == 0 => return items,
                None => std::thread::sleep(Duration::from_millis(1)),
            }
            assert!(Instant::now() < deadline, "stream did not settle");
        }
    }

    #[test]
    fn test_items_are_pulled_in_order() {
        let mut stream = AsyncStream::<u32, String>::new("test-stream");
        stream.run(|sink| {
            for i in 1..=3 {
                sink.add(i);
            }
        });

        assert_eq!(pull_until_idle(&mut stream), vec![1, 2, 3]);
        assert!(!stream.has_error());
    }

    #[test]
    fn test_error_is_reported_once() {
        let mut stream = AsyncStream::<u32, String>::new("test-stream");
        stream.run(|sink| {
            sink.add(1);
            sink.fail("first".to_string());
            sink.fail("second".to_string());
        });

        assert_eq!(pull_until_idle(&mut stream), vec![1]);
        assert!(stream.has_error());
        assert_eq!(stream.error().as_deref(), Some("first"));
        assert_eq!(stream.take_error().as_deref(), Some("first"));
        assert!(!stream.has_error());
    }

    #[test]
    fn test_pull_on_fresh_stream_is_empty() {
        let mut stream = AsyncStream::<u32, String>::new("test-stream");
        assert_eq!(stream.pull_item(), None);
        assert!(!stream.is_working());
        assert_eq!(stream.generation(), Generation::ZERO);
    }
}
