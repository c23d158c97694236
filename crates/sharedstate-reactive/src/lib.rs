#![forbid(unsafe_code)]

//! Observable values for state shared between presentation controllers.
//!
//! This crate provides the change-propagation primitives:
//!
//! - [`Observable`]: a shared, version-tracked value that notifies
//!   subscribers synchronously on every `set`.
//! - [`ReadOnly`]: a handle without write access, either a view of a root
//!   or the output of a derivation.
//! - [`Readable::map`] / [`Readable::distinct`]: derive a projection, then
//!   drop emissions equal to the last one forwarded.
//! - [`Subscription`] / [`SubscriptionScope`]: RAII handles that unsubscribe
//!   on drop.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). Notification runs on
//! the thread that calls `set`, and the whole cascade through derived
//! observables completes before `set` returns.
//!
//! A typical chain projects a broad state to the slice one consumer needs and
//! ends with `distinct`, so the consumer only hears about changes to that
//! slice:
//!
//! ```
//! use sharedstate_reactive::{Observable, Readable};
//!
//! let root = Observable::new((1, "a"));
//! let first = root.map(|(n, _)| *n).distinct();
//! let _sub = first.subscribe(|n| println!("first = {n}"));
//!
//! root.set((1, "b")); // suppressed
//! root.set((2, "b")); // prints "first = 2"
//! ```

mod derived;
mod observable;
mod readable;
mod subscription;

pub use derived::{ReadOnly, distinct, distinct_by, map};
pub use observable::Observable;
pub use readable::Readable;
pub use subscription::{Subscription, SubscriptionScope};
