//! The mutual-exclusion primitive for transfer-performing operations.

use core::sync::atomic::{AtomicBool, Ordering};

/// Rejects nested entry into transfer-performing ledger operations.
///
/// The guard stays engaged for the whole duration of an operation, external
/// custodian call included, so a callback arriving from inside a transfer
/// cannot re-enter the ledger and observe or corrupt mid-operation state.
/// Unlike a mutex, a failed engagement does not block: the nested call is
/// rejected outright.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    /// Whether a transfer-performing operation is currently in flight.
    engaged: AtomicBool,
}

impl ReentrancyGuard {
    /// Create a disengaged guard.
    pub const fn new() -> Self {
        Self {
            engaged: AtomicBool::new(false),
        }
    }

    /// Engage the guard for the lifetime of the returned lock.
    ///
    /// Returns [`None`] if the guard is already engaged.
    pub fn engage(&self) -> Option<GuardLock<'_>> {
        self.engaged
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| GuardLock { guard: self })
    }
}

/// The engaged state of a [`ReentrancyGuard`].
///
/// Disengages the guard when dropped, which covers every exit path of the
/// operation holding it, early returns and panics included.
#[derive(Debug)]
pub struct GuardLock<'a> {
    /// The guard to disengage on drop.
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardLock<'_> {
    fn drop(&mut self) {
        self.guard.engaged.store(false, Ordering::Release);
    }
}
