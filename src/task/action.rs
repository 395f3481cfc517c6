// AsyncAction - run a function once on a background thread and keep its result
//
// The simplest of the task variants: no queue, no error slot. Callers that can
// fail fold the error into `T` (typically `Result<V, E>`).

use super::Generation;
use super::status::{RunState, RunStatus};
use super::worker::Worker;
use crate::metrics;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Shared<T> {
    status: RunStatus,
    result: Mutex<Option<T>>,
}

impl<T> Shared<T> {
    fn result(&self) -> MutexGuard<'_, Option<T>> {
        self.result.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One-shot background computation with a pick-up-and-acknowledge result.
///
/// States: `Idle -> Running -> Complete -> Idle`. The last step only happens
/// when the consumer acknowledges the result with [`clear`](Self::clear) or
/// [`take_result`](Self::take_result); until then `run()` is ignored so a
/// pending result can never be silently replaced.
///
/// A function that panics leaves the action `Idle` with no result.
pub struct AsyncAction<T> {
    label: &'static str,
    shared: Arc<Shared<T>>,
    worker: Option<Worker>,
}

impl<T: Send + 'static> AsyncAction<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            shared: Arc::new(Shared {
                status: RunStatus::new(),
                result: Mutex::new(None),
            }),
            worker: None,
        }
    }

    /// Run `func` on a background thread.
    ///
    /// Returns `None` (and does nothing) while running or while a completed
    /// result has not been acknowledged.
    pub fn run<F>(&mut self, func: F) -> Option<Generation>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let Some(generation) = self.shared.status.begin() else {
            tracing::debug!(
                "{}: ignoring run request while {:?}",
                self.label,
                self.shared.status.state()
            );
            metrics::global().record_run_ignored();
            return None;
        };

        self.shared.result().take();
        self.worker = None;

        let body_shared = Arc::clone(&self.shared);
        let exit_shared = Arc::clone(&self.shared);
        let label = self.label;

        let spawned = Worker::spawn(
            label,
            generation,
            move |_cancel| {
                let value = func();
                let mut slot = body_shared.result();
                if body_shared.status.is_current(generation) {
                    *slot = Some(value);
                }
            },
            move |completed| {
                let to = if completed {
                    RunState::Complete
                } else {
                    RunState::Idle
                };
                if exit_shared.status.finish(generation, to) {
                    tracing::debug!("{}: run {} ended as {:?}", label, generation, to);
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

    pub fn is_working(&self) -> bool {
        self.shared.status.state() == RunState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.shared.status.state() == RunState::Complete
    }

    pub fn state(&self) -> RunState {
        self.shared.status.state()
    }

    /// A copy of the completed result, leaving it pending.
    pub fn result(&self) -> Option<T>
    where
        T: Clone,
    {
        if !self.is_complete() {
            return None;
        }
        self.shared.result().clone()
    }

    /// Take the completed result and acknowledge it in one step.
    pub fn take_result(&mut self) -> Option<T> {
        if !self.is_complete() {
            return None;
        }

        let value = self.shared.result().take();
        self.shared.status.acknowledge();
        value
    }

    /// Acknowledge a completed run, dropping its result. Returns `false` when
    /// there was nothing to acknowledge.
    pub fn clear(&mut self) -> bool {
        if !self.shared.status.acknowledge() {
            return false;
        }
        self.shared.result().take();
        true
    }

    pub fn generation(&self) -> Generation {
        self.shared.status.generation()
    }
}
