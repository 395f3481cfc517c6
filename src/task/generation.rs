use std::fmt;

/// Tag identifying one run of a background task.
///
/// Every accepted `run()` on a task bumps its generation exactly once. Anything a
/// worker produces is stamped with the generation it was started under, and the
/// consumer drops whatever does not carry the current one. Generations only ever
/// grow for the lifetime of a task instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The generation of a task that has never been run.
    pub const ZERO: Generation = Generation(0);

    /// Largest value that still fits next to the packed run state.
    pub(crate) const MAX: u64 = u64::MAX >> super::status::STATE_BITS;

    pub(crate) const fn from_raw(raw: u64) -> Self {
        Generation(raw)
    }

    /// Raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The generation that follows this one.
    ///
    /// The counter space is 62 bits wide; at one run per nanosecond it outlasts
    /// the process by more than a century, so exhausting it is treated as a bug.
    pub(crate) fn next(self) -> Self {
        debug_assert!(self.0 < Self::MAX, "generation counter exhausted");
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
