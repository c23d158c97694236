#![forbid(unsafe_code)]

//! The read capability shared by roots and derived observables.

use std::any::Any;
use std::rc::Rc;

use crate::derived::{self, ReadOnly};
use crate::observable::Observable;
use crate::subscription::Subscription;
use sealed::Source;

pub(crate) mod sealed {
    use super::*;

    pub trait Source<T> {
        /// The observable that holds this handle's value.
        fn observable(&self) -> &Observable<T>;

        /// What a derivation built on this handle must keep alive.
        ///
        /// Roots are not owned by their derivations, so they return `None`.
        fn keep_alive(&self) -> Option<Rc<dyn Any>>;
    }
}

/// Read access to an observable value.
///
/// Implemented by the read-write [`Observable`] and by [`ReadOnly`] handles.
/// Values flowing through [`distinct`](Self::distinct) must implement
/// structural `PartialEq`; equality is what decides whether an emission is
/// forwarded.
pub trait Readable<T: Clone + 'static>: Source<T> {
    /// Get a clone of the current value.
    fn get(&self) -> T {
        self.observable().get()
    }

    /// Access the current value by reference without cloning.
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.observable().with(f)
    }

    /// Register `callback`, replaying the current value before returning.
    ///
    /// The returned [`Subscription`] keeps a derivation chain alive on its
    /// own, so the handle this was called on may be dropped first.
    fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.observable()
            .subscribe(callback)
            .retaining(self.keep_alive())
    }

    /// Number of live subscribers.
    fn subscriber_count(&self) -> usize {
        self.observable().subscriber_count()
    }

    /// Current version number. Increments by 1 on each emission.
    fn version(&self) -> u64 {
        self.observable().version()
    }

    /// Derive an observable holding `f` applied to every value of this one.
    fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> ReadOnly<U> {
        derived::map(self, f)
    }

    /// Derive an observable that drops emissions equal to the last one it
    /// forwarded.
    fn distinct(&self) -> ReadOnly<T>
    where
        T: PartialEq,
    {
        derived::distinct(self)
    }

    /// Like [`distinct`](Self::distinct), with a caller-supplied equality.
    fn distinct_by(&self, same: impl Fn(&T, &T) -> bool + 'static) -> ReadOnly<T> {
        derived::distinct_by(self, same)
    }
}

impl<T: Clone + 'static> Source<T> for Observable<T> {
    fn observable(&self) -> &Observable<T> {
        self
    }

    fn keep_alive(&self) -> Option<Rc<dyn Any>> {
        None
    }
}

impl<T: Clone + 'static> Readable<T> for Observable<T> {}
