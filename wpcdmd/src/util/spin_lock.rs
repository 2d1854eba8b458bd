//! A minimal lock for handing hardware between task code and an interrupt.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// Guards a `T` against concurrent or reentrant access with a single atomic
/// flag.
///
/// Nothing here can block. An interrupt handler that finds the lock taken
/// has to give up (`try_lock`); task code, which the interrupt can preempt
/// but never the other way round, may spin (`lock`).
#[derive(Debug)]
pub struct SpinLock<T: ?Sized> {
    locked: AtomicBool,
    contents: UnsafeCell<T>,
}

unsafe impl<T: Send + ?Sized> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(contents: T) -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
            contents: UnsafeCell::new(contents),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpinLockError {
    Contended,
}

impl<T: ?Sized + Send> SpinLock<T> {
    pub fn try_lock(&self) -> Result<SpinLockGuard<T>, SpinLockError> {
        if self.locked.swap(true, Ordering::Acquire) {
            return Err(SpinLockError::Contended);
        }
        // We made the false->true transition, so nobody else holds a
        // reference into the cell until the guard drops.
        Ok(SpinLockGuard {
            locked: LockBorrow(&self.locked),
            contents: unsafe { &mut *self.contents.get() },
        })
    }

    /// Spins until the lock is free. Never call this from the interrupt.
    pub fn lock(&self) -> SpinLockGuard<T> {
        loop {
            if let Ok(guard) = self.try_lock() {
                return guard;
            }
        }
    }
}

#[must_use = "if dropped, the spinlock will immediately unlock"]
#[derive(Debug)]
pub struct SpinLockGuard<'a, T: ?Sized> {
    locked: LockBorrow<'a>,
    contents: &'a mut T,
}

/// Releases the lock flag on drop. Kept separate from `SpinLockGuard` so the
/// guard can be taken apart by `map`.
#[derive(Debug)]
struct LockBorrow<'a>(&'a AtomicBool);

impl<'a, T: ?Sized> SpinLockGuard<'a, T> {
    /// Narrows a guard to part of its contents, e.g. the inside of an
    /// `Option`. The lock stays held until the new guard drops.
    pub fn map<U: ?Sized>(
        orig: SpinLockGuard<'a, T>,
        f: impl FnOnce(&mut T) -> &mut U,
    ) -> SpinLockGuard<'a, U> {
        let SpinLockGuard { locked, contents } = orig;
        SpinLockGuard {
            locked,
            contents: f(contents),
        }
    }
}

impl<'a, T: ?Sized> core::ops::Deref for SpinLockGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.contents
    }
}

impl<'a, T: ?Sized> core::ops::DerefMut for SpinLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.contents
    }
}

impl<'a> Drop for LockBorrow<'a> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
