// Shared machinery of the streaming task variants
//
// AsyncCollector and AsyncStream differ only in what the consumer does with a
// drained item. Everything else (the generation gate, the error slot, worker
// replacement, the queue) lives here.

use super::Generation;
use super::cancel::CancelToken;
use super::error_slot::ErrorSlot;
use super::queue::{Drained, GenerationQueue, QueueSender};
use super::status::{RunState, RunStatus};
use super::worker::Worker;
use crate::metrics;
use std::sync::Arc;

pub(crate) struct Shared<E> {
    pub(crate) status: RunStatus,
    pub(crate) errors: ErrorSlot<E>,
}

/// Capabilities handed to a producer for the duration of one run.
///
/// Everything a sink does is bound to the generation of its run: once the run
/// has been superseded, added items are dropped on the consumer side, errors are
/// refused, and [`is_cancelled`](Self::is_cancelled) turns true.
pub struct Sink<T, E> {
    items: QueueSender<T>,
    shared: Arc<Shared<E>>,
    cancel: CancelToken,
}

impl<T, E> Sink<T, E> {
    /// Hand one item to the consumer.
    pub fn add(&self, item: T) {
        if !self.items.push(item) {
            tracing::trace!("Task for run {} is gone, dropping item", self.generation());
        }
    }

    /// Report the error that ends this run.
    ///
    /// Only the first error of the current run is kept; later ones and errors
    /// from superseded runs are discarded. Producers are expected to stop right
    /// after calling this.
    pub fn fail(&self, error: E) {
        let generation = self.generation();
        let stored = self
            .shared
            .errors
            .report(|| self.shared.status.is_current(generation), error);

        if stored {
            metrics::global().record_error();
        } else {
            tracing::debug!("Discarding error from run {} (superseded or already failed)", generation);
        }
    }

    /// Whether the producer should stop at this iteration boundary.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || !self.shared.status.is_current(self.generation())
    }

    pub fn generation(&self) -> Generation {
        self.items.generation()
    }
}

pub(crate) struct Runner<T, E> {
    label: &'static str,
    shared: Arc<Shared<E>>,
    queue: GenerationQueue<T>,
    worker: Option<Worker>,
}

impl<T, E> Runner<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            shared: Arc::new(Shared {
                status: RunStatus::new(),
                errors: ErrorSlot::new(),
            }),
            queue: GenerationQueue::new(),
            worker: None,
        }
    }

    /// Start `producer` on a fresh worker.
    ///
    /// With `supersede == false` this is a no-op while a run is active. With
    /// `supersede == true` an active run is cancelled and abandoned first.
    pub(crate) fn start<F>(&mut self, producer: F, supersede: bool) -> Option<Generation>
    where
        F: FnOnce(&Sink<T, E>) + Send + 'static,
    {
        if !supersede && self.is_working() {
            tracing::debug!(
                "{}: run {} still active, ignoring run request",
                self.label,
                self.generation()
            );
            metrics::global().record_run_ignored();
            return None;
        }

        if let Some(previous) = self.worker.take() {
            previous.cancel();
            if self.shared.status.is_current(previous.generation()) && self.is_working() {
                tracing::debug!(
                    "{}: superseding run {}",
                    self.label,
                    previous.generation()
                );
                metrics::global().record_run_superseded();
            }
        }

        let discarded = self.queue.discard_pending();
        if discarded > 0 {
            tracing::trace!("{}: discarded {} queued entries", self.label, discarded);
            metrics::global().record_stale_dropped(discarded);
        }

        let status = &self.shared.status;
        let generation = self.shared.errors.reset_with(|| {
            if supersede {
                Some(status.supersede().0)
            } else {
                status.begin()
            }
        })?;

        let items = self.queue.sender(generation);
        let body_shared = Arc::clone(&self.shared);
        let exit_shared = Arc::clone(&self.shared);
        let label = self.label;

        let spawned = Worker::spawn(
            label,
            generation,
            move |cancel| {
                let sink = Sink {
                    items,
                    shared: body_shared,
                    cancel,
                };
                producer(&sink);
            },
            move |_completed| {
                if exit_shared.status.finish(generation, RunState::Idle) {
                    tracing::debug!("{}: run {} finished", label, generation);
                } else {
                    tracing::debug!("{}: superseded run {} exited", label, generation);
                }
            },
        );

        match spawned {
            Ok(worker) => {
                tracing::debug!("{}: started run {}", self.label, generation);
                metrics::global().record_run_started();
                self.worker = Some(worker);
                Some(generation)
            }
            Err(e) => {
                tracing::error!("{}: failed to spawn worker thread: {}", self.label, e);
                self.shared.status.finish(generation, RunState::Idle);
                None
            }
        }
    }

    /// Dequeue at most one entry; `Some` only for items of the current run.
    pub(crate) fn drain_one(&mut self) -> Option<T> {
        match self.queue.drain_one(self.shared.status.generation()) {
            Drained::Current(item) => {
                metrics::global().record_item_delivered();
                Some(item)
            }
            Drained::Stale(generation) => {
                tracing::trace!("{}: dropped entry from stale run {}", self.label, generation);
                metrics::global().record_stale_dropped(1);
                None
            }
            Drained::Empty => None,
        }
    }

    pub(crate) fn cancel(&self) {
        if let Some(worker) = &self.worker {
            worker.cancel();
        }
    }

    pub(crate) fn is_working(&self) -> bool {
        self.shared.status.state() == RunState::Running
    }

    pub(crate) fn generation(&self) -> Generation {
        self.shared.status.generation()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn has_error(&self) -> bool {
        self.shared.errors.has_error()
    }

    pub(crate) fn error(&self) -> Option<E>
    where
        E: Clone,
    {
        self.shared.errors.get()
    }

    pub(crate) fn take_error(&self) -> Option<E> {
        self.shared.errors.take()
    }

    pub(crate) fn clear_error(&self) -> bool {
        self.shared.errors.clear()
    }
}
