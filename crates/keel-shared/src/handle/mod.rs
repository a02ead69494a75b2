//! Counted handles over shared objects.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::refcount::RefCount;

/// A value paired with the reference counter that governs its lifetime.
///
/// Heap objects are created through [`Shared::new`]. Objects with static
/// storage are declared with [`SharedObject::external`] (or
/// [`SharedObject::new`]) and attached through [`Shared::from_static`].
///
/// # Example
///
/// ```
/// use keel_shared::{Shared, SharedObject};
///
/// static DEFAULT_ADAPTER: SharedObject<&str> = SharedObject::external("default");
///
/// let handle = Shared::from_static(&DEFAULT_ADAPTER);
/// assert!(Shared::is_external(&handle));
/// assert_eq!(*handle, "default");
/// ```
pub struct SharedObject<T> {
    refs: RefCount,
    value: T,
}

impl<T> SharedObject<T> {
    /// Wraps a value in a counter at zero.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            refs: RefCount::new(),
            value,
        }
    }

    /// Wraps a value whose storage is managed outside the counting mechanism.
    #[must_use]
    pub const fn external(value: T) -> Self {
        Self {
            refs: RefCount::external(),
            value,
        }
    }

    /// Returns the current number of handles.
    #[must_use]
    pub fn count(&self) -> usize {
        self.refs.count()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedObject<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SharedObject")
            .field("count", &self.refs.count())
            .field("no_delete", &self.refs.is_no_delete())
            .field("value", &self.value)
            .finish()
    }
}

/// Thread-safe counted handle to a [`SharedObject`].
///
/// Cloning retains, dropping releases, and the handle that performs the final
/// release of a heap object frees it. The handle is `Send` and `Sync` exactly
/// when `T` is both.
pub struct Shared<T> {
    ptr: NonNull<SharedObject<T>>,
    marker: PhantomData<SharedObject<T>>,
}

// SAFETY: the counter is atomic and the value is only reachable through
// shared references, so handles may move and be shared between threads when
// `T` itself can.
unsafe impl<T: Send + Sync> Send for Shared<T> {}
// SAFETY: see the `Send` implementation above.
unsafe impl<T: Send + Sync> Sync for Shared<T> {}

impl<T> Shared<T> {
    /// Allocates a new shared object and returns the first handle to it.
    #[must_use]
    pub fn new(value: T) -> Self {
        let object = Box::new(SharedObject::new(value));
        object.refs.retain();
        Self {
            ptr: NonNull::from(Box::leak(object)),
            marker: PhantomData,
        }
    }

    /// Returns a handle to an object with static storage.
    ///
    /// The object is flagged "no delete" before it is retained, so it is never
    /// freed when its count returns to zero.
    #[must_use]
    pub fn from_static(object: &'static SharedObject<T>) -> Self {
        object.refs.set_no_delete(true);
        object.refs.retain();
        Self {
            ptr: NonNull::from(object),
            marker: PhantomData,
        }
    }

    /// Returns the current number of handles to the object.
    ///
    /// The value is advisory under concurrent cloning and dropping.
    #[must_use]
    pub fn count(this: &Self) -> usize {
        this.object().refs.count()
    }

    /// Returns `true` when the object is exempt from destruction.
    #[must_use]
    pub fn is_external(this: &Self) -> bool {
        this.object().refs.is_no_delete()
    }

    /// Returns `true` when both handles point to the same object.
    #[must_use]
    pub fn ptr_eq(left: &Self, right: &Self) -> bool {
        left.ptr == right.ptr
    }

    fn object(&self) -> &SharedObject<T> {
        // SAFETY: the handle holds a count on the object, so it has not been
        // freed.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        self.object().refs.retain();
        Self {
            ptr: self.ptr,
            marker: PhantomData,
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if self.object().refs.release() {
            // SAFETY: `release` returned `true`, so this was the last handle
            // and the object is not flagged "no delete". Only objects created
            // by `Shared::new` can reach this point, because `from_static`
            // always sets the flag and it cannot be cleared through a handle.
            drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object().value
    }
}

impl<T> AsRef<T> for Shared<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, formatter)
    }
}

impl<T: fmt::Display> fmt::Display for Shared<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, formatter)
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
