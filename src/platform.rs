//! Platform primitives used by the spin lock.
//!
//! The lock only needs three things from the platform: a compare-and-swap on
//! an integer flag, an unconditional store, and a way to give up the rest of
//! the current scheduling quantum. The backing for `yield_now` is picked at
//! build time so the lock itself never carries `cfg` attributes.

use std::sync::atomic::{AtomicU32, Ordering};

/// Atomically replaces `current` with `new` in `flag`.
///
/// Returns `true` when the swap happened. Acquire ordering on success pairs
/// with the release in [`store`].
#[inline(always)]
pub fn compare_and_swap(flag: &AtomicU32, current: u32, new: u32) -> bool {
    flag.compare_exchange_weak(current, new, Ordering::Acquire, Ordering::Relaxed)
        .is_ok()
}

/// Unconditionally publishes `value` to `flag` with release ordering.
#[inline(always)]
pub fn store(flag: &AtomicU32, value: u32) {
    flag.store(value, Ordering::Release);
}

/// Gives the remainder of the calling thread's time slice back to the scheduler.
#[inline]
pub fn yield_now() {
    backend::yield_now()
}

#[cfg(unix)]
mod backend {
    // std maps this onto sched_yield(2)
    #[inline]
    pub fn yield_now() {
        std::thread::yield_now();
    }
}

#[cfg(windows)]
mod backend {
    use windows_sys::Win32::System::Threading::Sleep;

    #[inline]
    pub fn yield_now() {
        // Sleep(0) relinquishes the quantum to any ready thread of equal priority.
        unsafe { Sleep(0) }
    }
}

#[cfg(not(any(unix, windows)))]
mod backend {
    #[inline]
    pub fn yield_now() {
        std::hint::spin_loop();
    }
}
