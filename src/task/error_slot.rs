use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds at most one error per run.
///
/// `has_error` is a plain atomic so the UI thread can check it every frame
/// without touching the lock. The lock only guards the value itself and is
/// never held across anything slower than a move.
#[derive(Debug)]
pub struct ErrorSlot<E> {
    has_error: AtomicBool,
    value: Mutex<Option<E>>,
}

impl<E> Default for ErrorSlot<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorSlot<E> {
    pub fn new() -> Self {
        Self {
            has_error: AtomicBool::new(false),
            value: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<E>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::Acquire)
    }

    /// Store `error` if the slot is empty and `accept` still agrees.
    ///
    /// `accept` runs while the slot is locked, so a concurrent
    /// [`reset_with`](Self::reset_with) either happens entirely before it or
    /// entirely after the error has been stored.
    pub fn report(&self, accept: impl FnOnce() -> bool, error: E) -> bool {
        let mut slot = self.lock();
        if slot.is_some() || !accept() {
            return false;
        }

        *slot = Some(error);
        self.has_error.store(true, Ordering::Release);
        true
    }

    pub fn get(&self) -> Option<E>
    where
        E: Clone,
    {
        self.lock().clone()
    }

    /// Remove and return the stored error.
    pub fn take(&self) -> Option<E> {
        let mut slot = self.lock();
        self.has_error.store(false, Ordering::Release);
        slot.take()
    }

    /// Drop the stored error. Returns whether there was one.
    pub fn clear(&self) -> bool {
        self.take().is_some()
    }

    /// Empty the slot and run `f` before anyone else can report into it.
    pub fn reset_with<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut slot = self.lock();
        *slot = None;
        self.has_error.store(false, Ordering::Release);
        f()
    }
}
