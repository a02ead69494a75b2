//! Reference-counted ownership primitives for the Keel runtime.
//!
//! Every long-lived object that the host hands out to services (the host
//! context, adapters, in-flight requests) is owned through a counted handle
//! rather than a garbage collector. Handles are cloned and dropped from any
//! number of dispatch threads without an external lock, so the counter itself
//! must be atomic.
//!
//! The crate exposes two layers:
//!
//! - [`RefCount`] and [`SimpleRefCount`] are the raw counters. They can be
//!   embedded in a type that manages its own storage (the intrusive style).
//! - [`Shared`] is a handle over a heap-allocated [`SharedObject`]. It retains
//!   on clone, releases on drop, and frees the allocation exactly once, on the
//!   decrement that takes the count from one to zero.
//!
//! Objects with static storage participate in the same handle type through
//! [`Shared::from_static`]. Such objects are flagged "no delete" and are never
//! freed by the counting mechanism.
//!
//! # Example
//!
//! ```
//! use keel_shared::Shared;
//!
//! let first = Shared::new(String::from("adapter"));
//! let second = first.clone();
//! assert_eq!(Shared::count(&first), 2);
//! drop(first);
//! assert_eq!(Shared::count(&second), 1);
//! assert_eq!(second.as_str(), "adapter");
//! ```

pub mod handle;
pub mod refcount;

#[cfg(test)]
mod tests;

pub use self::handle::{Shared, SharedObject};
pub use self::refcount::{RefCount, SimpleRefCount};
