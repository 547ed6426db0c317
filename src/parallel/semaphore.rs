use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// A counting semaphore limiting how many tasks may run at once
#[derive(Debug)]
pub struct Semaphore {
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}
impl Semaphore {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Arc<Self> {
        Arc::new(Self {
            available: Mutex::new(capacity.get()),
            released: Condvar::new(),
            capacity: capacity.get(),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently free
    #[must_use]
    pub fn available(&self) -> usize {
        *self.available.lock()
    }

    /// Blocks until a permit is free and takes it
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> Permit {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
        Permit {
            semaphore: Arc::clone(self),
        }
    }

    /// Takes a permit if one is free, without blocking
    #[must_use]
    pub fn try_acquire(self: &Arc<Self>) -> Option<Permit> {
        let mut available = self.available.lock();
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(Permit {
            semaphore: Arc::clone(self),
        })
    }

    fn release(&self) {
        let mut available = self.available.lock();
        *available += 1;
        debug_assert!(*available <= self.capacity);
        self.released.notify_one();
    }
}

/// A held semaphore permit, returned to the pool when dropped
///
/// Dropping happens on every exit path of its holder, unwinding included.
#[derive(Debug)]
pub struct Permit {
    semaphore: Arc<Semaphore>,
}
impl Drop for Permit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
