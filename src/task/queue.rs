// Unbounded item queue between background workers and the UI thread
//
// Entries are tagged with the generation of the run that produced them. The
// queue itself never filters anything; the owning task compares tags against
// its current generation when draining.

use super::Generation;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

struct Entry<T> {
    generation: Generation,
    item: T,
}

/// Outcome of a single non-blocking dequeue.
#[derive(Debug, PartialEq, Eq)]
pub enum Drained<T> {
    /// Nothing was waiting.
    Empty,
    /// An entry from a superseded run was discarded.
    Stale(Generation),
    /// An entry from the current run.
    Current(T),
}

/// Multi-producer, single-consumer queue of generation-tagged items.
///
/// The consumer half never blocks: [`drain_one`](Self::drain_one) performs at
/// most one `try_recv`.
pub struct GenerationQueue<T> {
    tx: UnboundedSender<Entry<T>>,
    rx: UnboundedReceiver<Entry<T>>,
}

impl<T> Default for GenerationQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GenerationQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Producer handle that stamps every item with `generation`.
    pub fn sender(&self, generation: Generation) -> QueueSender<T> {
        QueueSender {
            tx: self.tx.clone(),
            generation,
        }
    }

    /// Dequeue at most one entry and classify it against `current`.
    pub fn drain_one(&mut self, current: Generation) -> Drained<T> {
        match self.rx.try_recv() {
            Ok(entry) if entry.generation == current => Drained::Current(entry.item),
            Ok(entry) => Drained::Stale(entry.generation),
            // The queue owns a sender, so it can never be observed as disconnected
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Drained::Empty,
        }
    }

    /// Drop everything currently queued, returning how many entries went away.
    ///
    /// Entries pushed concurrently by a still-running worker may survive; they
    /// are caught by the generation check on the next drain.
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    /// Number of entries waiting to be drained.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Producer half bound to one generation.
pub struct QueueSender<T> {
    tx: UnboundedSender<Entry<T>>,
    generation: Generation,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            generation: self.generation,
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueue `item`. Returns `false` once the owning task has been dropped.
    pub fn push(&self, item: T) -> bool {
        self.tx
            .send(Entry {
                generation: self.generation,
                item,
            })
            .is_ok()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}
