//! Background task bridge between blocking producers and a per-frame UI loop.
//!
//! The render loop must never block, yet everything it displays comes from
//! slow, paginated network calls. The types in this module run such calls on a
//! dedicated worker thread and let the UI thread poll for results once per frame.
//!
//! - [`AsyncAction`]: run a function once, keep its single result until acknowledged.
//! - [`AsyncCollector`]: incremental producer; drained items are retained in a list.
//! - [`AsyncStream`]: incremental producer; drained items are handed to the caller.
//!
//! # Generation gate
//!
//! Every accepted run gets a fresh [`Generation`]. Producers only ever talk to the
//! task through a [`Sink`] bound to their own generation, and the consumer drops
//! anything tagged with another one. A superseded worker may keep running in the
//! background until it next checks [`Sink::is_cancelled`], but nothing it emits
//! after being superseded (items, errors, or its end-of-run state change) is ever
//! observed.
//!
//! # Threading
//!
//! One OS thread per run, no pool. The consumer side (`run`, `get_items`,
//! `pull_item`, `is_working`, `has_error`, ...) is only ever called from the UI
//! thread and never waits on a worker.

pub mod action;
pub mod cancel;
pub mod collector;
pub mod error_slot;
pub mod generation;
pub mod queue;
pub mod runner;
pub mod status;
pub mod stream;
pub mod worker;

pub use action::AsyncAction;
pub use cancel::{CancelHandle, CancelToken};
pub use collector::AsyncCollector;
pub use generation::Generation;
pub use runner::Sink;
pub use status::RunState;
pub use stream::AsyncStream;
