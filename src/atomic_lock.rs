use std::sync::atomic::{AtomicU32, Ordering};

use crate::platform;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// Busy-wait mutual exclusion built on compare-and-swap.
///
/// `AtomicLock` never parks a thread with the OS. A contended `acquire` keeps
/// retrying the swap, yielding its time slice between attempts, until the
/// holder calls `release`. This makes it usable without any blocking
/// primitive, at the price of burning CPU while waiting.
///
/// # Caveats
///
/// * Not reentrant: acquiring twice from the same thread deadlocks forever.
/// * Not fair: under contention the next owner is whoever wins the swap.
/// * No timeout: a holder that never releases blocks every waiter.
///
/// Critical sections guarded by this lock must therefore stay short and must
/// not call back into code that takes the same lock.
///
/// # Examples
///
/// ```
/// # use spinlog::AtomicLock;
/// let lock = AtomicLock::new();
/// {
///     let _guard = lock.lock();
///     assert!(lock.is_locked());
/// }
/// assert!(!lock.is_locked());
/// ```
#[derive(Debug)]
pub struct AtomicLock {
    flag: AtomicU32,
}

impl AtomicLock {
    /// Creates an unlocked lock.
    pub const fn new() -> Self {
        Self {
            flag: AtomicU32::new(UNLOCKED),
        }
    }

    /// Spins until the flag is claimed by the calling thread.
    pub fn acquire(&self) {
        while !platform::compare_and_swap(&self.flag, UNLOCKED, LOCKED) {
            platform::yield_now();
        }
    }

    /// Makes a single attempt to claim the flag.
    pub fn try_acquire(&self) -> bool {
        self.flag
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Marks the lock as free.
    ///
    /// Must only be called by the thread that currently holds the lock.
    /// Releasing a lock held by someone else lets two threads into the
    /// critical section at once.
    pub fn release(&self) {
        platform::store(&self.flag, UNLOCKED);
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    ///
    /// Prefer this over pairing `acquire`/`release` by hand: the guard also
    /// releases when the critical section unwinds.
    pub fn lock(&self) -> LockGuard<'_> {
        self.acquire();
        LockGuard { lock: self }
    }

    /// Advisory snapshot of the flag. Only meaningful in tests and assertions.
    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed) == LOCKED
    }
}

impl Default for AtomicLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the owning thread holds an [`AtomicLock`].
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a AtomicLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
