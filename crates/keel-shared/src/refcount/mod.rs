//! Raw reference counters.
//!
//! [`RefCount`] is the thread-safe counter used by [`Shared`](crate::Shared).
//! Increments and decrements are single atomic read-modify-write operations,
//! so among any number of threads racing to release the same object exactly
//! one observes the transition to zero. [`SimpleRefCount`] offers the same
//! contract for objects confined to one thread.
//!
//! Precondition violations (releasing at zero, counting past the overflow
//! guard) are internal-consistency faults. They are logged and the process is
//! aborted, because continuing would risk freeing live memory.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering, fence};

const REFCOUNT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::refcount");

/// Counts above this value are treated as a leak of handles and abort.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Thread-safe reference counter with a "no delete" suppression flag.
///
/// A fresh counter starts at zero. Each owner calls [`RefCount::retain`] when
/// it acquires the object and [`RefCount::release`] when it lets go. The call
/// to `release` that returns `true` is the one responsible for destroying the
/// object.
///
/// # Example
///
/// ```
/// use keel_shared::RefCount;
///
/// let refs = RefCount::new();
/// refs.retain();
/// refs.retain();
/// assert!(!refs.release());
/// assert!(refs.release(), "last release owns destruction");
/// ```
#[derive(Debug, Default)]
pub struct RefCount {
    count: AtomicUsize,
    no_delete: AtomicBool,
}

impl RefCount {
    /// Creates a counter at zero whose object may be destroyed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            no_delete: AtomicBool::new(false),
        }
    }

    /// Creates a counter at zero whose object is never destroyed by counting.
    #[must_use]
    pub const fn external() -> Self {
        Self {
            count: AtomicUsize::new(0),
            no_delete: AtomicBool::new(true),
        }
    }

    /// Increments the count by one.
    ///
    /// Safe to call concurrently from any number of threads. Aborts the
    /// process if the count would pass the overflow guard.
    pub fn retain(&self) {
        // A new owner can only be created from an existing one, so no
        // ordering with other memory is required here.
        let previous = self.count.fetch_add(1, Ordering::Relaxed);
        if previous >= MAX_REFCOUNT {
            fault("reference count overflow", previous);
        }
    }

    /// Decrements the count by one.
    ///
    /// Returns `true` when this call took the count to zero and the object is
    /// not flagged "no delete"; the caller must then destroy the object.
    /// Exactly one of any set of concurrent callers can receive `true`.
    /// Aborts the process if the count was already zero.
    #[must_use = "a `true` result transfers responsibility for destroying the object"]
    pub fn release(&self) -> bool {
        let previous = self.count.fetch_sub(1, Ordering::Release);
        if previous == 0 {
            fault("released an object whose count was already zero", previous);
        }
        if previous != 1 {
            return false;
        }
        // Order the destruction after every earlier release on other threads.
        fence(Ordering::Acquire);
        !self.no_delete.load(Ordering::Acquire)
    }

    /// Returns the current count.
    ///
    /// The value is advisory: other threads may change it as soon as this
    /// call returns.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Sets or clears the "no delete" flag.
    ///
    /// Intended to be called once, early in the object's life, by code that
    /// manages the object's storage itself.
    pub fn set_no_delete(&self, flag: bool) {
        self.no_delete.store(flag, Ordering::Release);
    }

    /// Returns `true` when destruction is suppressed.
    #[must_use]
    pub fn is_no_delete(&self) -> bool {
        self.no_delete.load(Ordering::Acquire)
    }
}

/// Single-threaded reference counter with the same contract as [`RefCount`].
///
/// The counter uses [`Cell`] and is therefore `!Sync`; it suits objects that
/// never leave the thread that created them.
#[derive(Debug, Default)]
pub struct SimpleRefCount {
    count: Cell<usize>,
    no_delete: Cell<bool>,
}

impl SimpleRefCount {
    /// Creates a counter at zero whose object may be destroyed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: Cell::new(0),
            no_delete: Cell::new(false),
        }
    }

    /// Increments the count by one.
    pub fn retain(&self) {
        let previous = self.count.get();
        if previous >= MAX_REFCOUNT {
            fault("reference count overflow", previous);
        }
        self.count.set(previous + 1);
    }

    /// Decrements the count by one, returning `true` when the caller must
    /// destroy the object.
    #[must_use = "a `true` result transfers responsibility for destroying the object"]
    pub fn release(&self) -> bool {
        let previous = self.count.get();
        if previous == 0 {
            fault("released an object whose count was already zero", previous);
        }
        self.count.set(previous - 1);
        previous == 1 && !self.no_delete.get()
    }

    /// Returns the current count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Sets or clears the "no delete" flag.
    pub fn set_no_delete(&self, flag: bool) {
        self.no_delete.set(flag);
    }

    /// Returns `true` when destruction is suppressed.
    #[must_use]
    pub fn is_no_delete(&self) -> bool {
        self.no_delete.get()
    }
}

#[cold]
fn fault(message: &'static str, count: usize) -> ! {
    tracing::error!(
        target: REFCOUNT_TARGET,
        count,
        "{message}; aborting"
    );
    std::process::abort()
}
