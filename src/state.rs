use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use crate::catalog::Catalog;

/// how many extra ticks an identifier is held for before we move on; each
/// identifier is therefore live for MAX_REPEAT + 1 ticks
pub const MAX_REPEAT: u8 = 3;

/// back-off between attempts when waiting on a contended lock
const LOCK_RETRY: Duration = Duration::from_millis(1);

/// where we are in the catalog. only `tick` moves it, so both fields stay
/// in range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleState {
    current_index: usize,
    repeat_count: u8,
}

/// what a tick did to the state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// same identifier, one more repeat
    Repeat,
    /// moved on to a new identifier
    Advance,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn at(current_index: usize, repeat_count: u8) -> Self {
        assert!(repeat_count <= MAX_REPEAT);
        CycleState {
            current_index,
            repeat_count,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn repeat_count(&self) -> u8 {
        self.repeat_count
    }

    /// apply one timer tick
    pub fn tick(&mut self, catalog: &Catalog) -> Step {
        self.repeat_count += 1;
        if self.repeat_count > MAX_REPEAT {
            self.repeat_count = 0;
            self.current_index = catalog.next_index(self.current_index);
            Step::Advance
        } else {
            Step::Repeat
        }
    }
}

/// the cycle state behind its lock, owned by its one writer (the
/// controller). anybody else gets a StateReader
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Arc<Mutex<CycleState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// wait as long as it takes. only the controller does this, and only for
    /// the length of a transition
    pub fn lock(&self) -> MutexGuard<'_, CycleState> {
        lock_recovering(&self.inner)
    }

    /// copy of the current state, waiting as long as it takes
    pub fn snapshot(&self) -> CycleState {
        *self.lock()
    }

    /// a read-only view of the same state
    pub fn reader(&self) -> StateReader {
        StateReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// read-only access to the cycle state; all it can do is take copies
#[derive(Clone, Debug)]
pub struct StateReader {
    inner: Arc<Mutex<CycleState>>,
}

impl StateReader {
    /// wait at most `timeout` for the lock and copy the state out; None means
    /// somebody else held it for the whole time
    pub fn lock_for(&self, timeout: Duration) -> Option<CycleState> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Some(*guard),
                Err(TryLockError::Poisoned(poisoned)) => return Some(*poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    spin_sleep::sleep(LOCK_RETRY.min(deadline - now));
                }
            }
        }
    }

    /// copy of the current state, waiting as long as it takes
    pub fn snapshot(&self) -> CycleState {
        *lock_recovering(&self.inner)
    }
}

// NB. CycleState is plain data and every value tick() can produce is valid,
//     so a panic elsewhere while holding the lock can't leave it broken
fn lock_recovering(inner: &Mutex<CycleState>) -> MutexGuard<'_, CycleState> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
