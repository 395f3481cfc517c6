// Background worker thread owned by a task
//
// One dedicated OS thread per run. Replacing or dropping a worker signals
// cancellation and detaches the thread; the UI thread never joins.

use super::Generation;
use super::cancel::{CancelHandle, CancelToken, cancel_pair};
use crate::metrics;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

pub struct Worker {
    handle: Option<JoinHandle<()>>,
    cancel: CancelHandle,
    generation: Generation,
}

impl Worker {
    /// Spawn `body` on a new thread named `<label>-<generation>`.
    ///
    /// `body` receives the cancellation token for this run. A panic inside
    /// `body` is caught and logged on the worker thread, then `on_exit` runs
    /// with `false`; after a normal return it runs with `true`. Either way
    /// `on_exit` runs exactly once, on the worker thread.
    pub fn spawn<F, X>(label: &str, generation: Generation, body: F, on_exit: X) -> io::Result<Self>
    where
        F: FnOnce(CancelToken) + Send + 'static,
        X: FnOnce(bool) + Send + 'static,
    {
        let (cancel, token) = cancel_pair();
        let name = format!("{}-{}", label, generation.get());

        let handle = thread::Builder::new().name(name).spawn(move || {
            let completed = match panic::catch_unwind(AssertUnwindSafe(|| body(token))) {
                Ok(()) => true,
                Err(payload) => {
                    tracing::error!(
                        "Producer for run {} panicked: {}",
                        generation,
                        panic_message(payload.as_ref())
                    );
                    metrics::global().record_producer_panic();
                    false
                }
            };
            on_exit(completed);
        })?;

        Ok(Self {
            handle: Some(handle),
            cancel,
            generation,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Ask the producer to stop at its next cancellation check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.cancel();
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                tracing::debug!(
                    "Detaching worker {:?} for run {}",
                    handle.thread().name(),
                    self.generation
                );
            }
            _ => {}
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_on_exit_reports_normal_completion() {
        let (tx, rx) = mpsc::channel();
        let worker = Worker::spawn(
            "test",
            Generation::from_raw(1),
            |_token| {},
            move |completed| tx.send(completed).unwrap(),
        )
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
        assert_eq!(worker.generation().get(), 1);
    }

    #[test]
    fn test_panic_is_contained() {
        let (tx, rx) = mpsc::channel();
        let _worker = Worker::spawn(
            "test",
            Generation::from_raw(2),
            |_token| panic!("boom"),
            move |completed| tx.send(completed).unwrap(),
        )
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(false));
    }

    #[test]
    fn test_drop_cancels_running_body() {
        let (tx, rx) = mpsc::channel();
        let worker = Worker::spawn(
            "test",
            Generation::from_raw(3),
            move |token| {
                while !token.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
                tx.send(()).unwrap();
            },
            |_| {},
        )
        .unwrap();

        drop(worker);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_panic_message_extracts_strings() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&5_u8), "<non-string panic payload>");
    }
}
