#![forbid(unsafe_code)]

//! Read-only observables derived from other observables.
//!
//! # Design
//!
//! A derivation owns its own [`Observable`] holding the derived value and a
//! [`Subscription`] to its upstream. The upstream callback reaches the derived
//! value through a weak handle, so the upstream never keeps a derivation
//! alive. The derivation in turn keeps its upstream *derivation* alive (but
//! not a root), which lets callers build `root.map(..).distinct()` and keep
//! only the leaf.
//!
//! # Invariants
//!
//! 1. `map` emits `f(v)` for every upstream emission `v`, equal or not.
//! 2. `distinct` forwards `v` iff it differs from the last forwarded value.
//!    Only the immediately preceding value is compared, not the history.
//! 3. A derivation is kept alive by its handles and by the subscriptions
//!    taken through them. Dropping the last of both releases its upstream
//!    subscription, and recursively that of every derivation it kept alive.
//!
//! # Failure Modes
//!
//! - **Root dropped**: the subscription becomes inert. The derivation keeps
//!   its last value and never emits again.

use std::any::Any;
use std::rc::Rc;

use crate::observable::Observable;
use crate::readable::{Readable, sealed::Source};
use crate::subscription::Subscription;

/// Upstream wiring held by a derivation.
struct Link {
    /// Released first, so the parent is never notified into a dead child.
    _subscription: Subscription,
    _parent: Option<Rc<dyn Any>>,
}

/// A read-only handle: a view of a root, or the output of a derivation.
///
/// Cloning a `ReadOnly` creates a new handle to the **same** derivation; the
/// upstream subscription is released when the last clone is dropped.
pub struct ReadOnly<T> {
    value: Observable<T>,
    /// `None` for a plain view of a root.
    link: Option<Rc<Link>>,
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            link: self.link.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnly")
            .field("value", &self.value)
            .field("derived", &self.link.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> ReadOnly<T> {
    pub(crate) fn view(value: Observable<T>) -> Self {
        Self { value, link: None }
    }

    fn chained(
        value: Observable<T>,
        subscription: Subscription,
        parent: Option<Rc<dyn Any>>,
    ) -> Self {
        Self {
            value,
            link: Some(Rc::new(Link {
                _subscription: subscription,
                _parent: parent,
            })),
        }
    }

    /// Whether this handle was produced by `map` or `distinct`.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.link.is_some()
    }
}

impl<T: Clone + 'static> Source<T> for ReadOnly<T> {
    fn observable(&self) -> &Observable<T> {
        &self.value
    }

    fn keep_alive(&self) -> Option<Rc<dyn Any>> {
        self.link
            .as_ref()
            .map(|_| Rc::new(self.clone()) as Rc<dyn Any>)
    }
}

impl<T: Clone + 'static> Readable<T> for ReadOnly<T> {}

/// Derive an observable holding `f` applied to each value of `source`.
///
/// `f` runs once at construction and once per upstream emission. Emissions
/// are never de-duplicated; compose with [`distinct`] for that.
pub fn map<S, T, U>(source: &S, f: impl Fn(&T) -> U + 'static) -> ReadOnly<U>
where
    S: Readable<T> + ?Sized,
    T: Clone + 'static,
    U: Clone + 'static,
{
    let upstream = source.observable();
    let value = Observable::new(upstream.with(&f));

    let target = value.downgrade();
    let subscription = upstream.listen(move |v| {
        if let Some(target) = target.upgrade() {
            target.set(f(v));
        }
    });

    ReadOnly::chained(value, subscription, source.keep_alive())
}

/// Derive an observable that suppresses emissions equal to the last one it
/// forwarded. Requires structural equality on `T`.
pub fn distinct<S, T>(source: &S) -> ReadOnly<T>
where
    S: Readable<T> + ?Sized,
    T: Clone + PartialEq + 'static,
{
    distinct_by(source, |last, next| last == next)
}

/// [`distinct`] with a caller-supplied equality.
pub fn distinct_by<S, T>(source: &S, same: impl Fn(&T, &T) -> bool + 'static) -> ReadOnly<T>
where
    S: Readable<T> + ?Sized,
    T: Clone + 'static,
{
    let upstream = source.observable();
    let value = Observable::new(upstream.get());

    let target = value.downgrade();
    let subscription = upstream.listen(move |v| {
        let Some(target) = target.upgrade() else {
            return;
        };
        if target.with(|last| same(last, v)) {
            tracing::trace!(message = "distinct.suppressed", version = target.version());
            return;
        }
        target.set(v.clone());
    });

    ReadOnly::chained(value, subscription, source.keep_alive())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
