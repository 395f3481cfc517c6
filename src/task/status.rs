// Run status word shared between a task and its worker threads
//
// The run state and the generation live in a single AtomicU64 so that the
// worker's end-of-run transition can be one compare-and-swap: if the consumer
// has started a newer run in the meantime, the swap fails and the stale worker
// leaves the state alone.

use super::Generation;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of low bits of the status word reserved for [`RunState`].
pub(crate) const STATE_BITS: u32 = 2;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

/// Lifecycle of a background task.
///
/// Streaming tasks only ever use `Idle` and `Running`. `Complete` is the extra
/// state of [`AsyncAction`](super::AsyncAction): finished, result waiting to be
/// picked up and acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Complete = 2,
}

impl RunState {
    const fn from_bits(bits: u64) -> Self {
        match bits {
            1 => RunState::Running,
            2 => RunState::Complete,
            _ => RunState::Idle,
        }
    }
}

const fn pack(generation: Generation, state: RunState) -> u64 {
    (generation.get() << STATE_BITS) | state as u64
}

const fn unpack(word: u64) -> (Generation, RunState) {
    (
        Generation::from_raw(word >> STATE_BITS),
        RunState::from_bits(word & STATE_MASK),
    )
}

/// Atomic `(generation, state)` pair.
#[derive(Debug)]
pub struct RunStatus {
    word: AtomicU64,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatus {
    pub fn new() -> Self {
        Self {
            word: AtomicU64::new(pack(Generation::ZERO, RunState::Idle)),
        }
    }

    pub fn load(&self) -> (Generation, RunState) {
        unpack(self.word.load(Ordering::Acquire))
    }

    pub fn state(&self) -> RunState {
        self.load().1
    }

    pub fn generation(&self) -> Generation {
        self.load().0
    }

    /// Whether `generation` is still the run the consumer cares about.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation() == generation
    }

    /// Move from `Idle` to `Running` under a fresh generation.
    ///
    /// Returns `None` without touching anything when the task is running or
    /// holds an unacknowledged result.
    pub fn begin(&self) -> Option<Generation> {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let (generation, state) = unpack(current);
            if state != RunState::Idle {
                return None;
            }

            let next = generation.next();
            match self.word.compare_exchange_weak(
                current,
                pack(next, RunState::Running),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(next),
                Err(actual) => current = actual,
            }
        }
    }

    /// Start a fresh generation regardless of the current state.
    ///
    /// Returns the new generation and the state it replaced. Whatever worker
    /// owned the previous generation can no longer finish this status.
    pub fn supersede(&self) -> (Generation, RunState) {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let (generation, state) = unpack(current);
            let next = generation.next();
            match self.word.compare_exchange_weak(
                current,
                pack(next, RunState::Running),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return (next, state),
                Err(actual) => current = actual,
            }
        }
    }

    /// End the run tagged `generation`, moving it to `to`.
    ///
    /// Fails (returns `false`) when the run is no longer the current one.
    pub fn finish(&self, generation: Generation, to: RunState) -> bool {
        self.word
            .compare_exchange(
                pack(generation, RunState::Running),
                pack(generation, to),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Acknowledge a completed run: `Complete -> Idle`, generation unchanged.
    pub fn acknowledge(&self) -> bool {
        let (generation, state) = self.load();
        if state != RunState::Complete {
            return false;
        }

        self.word
            .compare_exchange(
                pack(generation, RunState::Complete),
                pack(generation, RunState::Idle),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
