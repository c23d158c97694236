#![forbid(unsafe_code)]

//! Scoped subscription handles.
//!
//! A [`Subscription`] owns the strong reference to its callback. Releasing it,
//! explicitly via [`unsubscribe`](Subscription::unsubscribe) or implicitly on
//! drop, detaches the callback from its observable. [`SubscriptionScope`]
//! groups the handles of one consumer so they can be released together when
//! that consumer is torn down.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

type Release = Box<dyn FnOnce()>;

/// RAII guard for a registered callback.
///
/// Dropping the guard unsubscribes. [`unsubscribe`](Self::unsubscribe) may be
/// called any number of times, including from inside a notification callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    release: RefCell<Option<Release>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, release: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            release: RefCell::new(Some(Box::new(release))),
        }
    }

    /// Hold `keep` until this subscription is released.
    ///
    /// The callback is detached before `keep` is dropped, so a derivation
    /// chain kept alive this way is torn down only after it stops delivering.
    pub(crate) fn retaining(self, keep: Option<Rc<dyn Any>>) -> Self {
        let Some(keep) = keep else {
            return self;
        };
        let release = self.release.borrow_mut().take();
        Self::new(self.id, move || {
            if let Some(release) = release {
                release();
            }
            drop(keep);
        })
    }

    /// Detach the callback. Later calls are no-ops.
    pub fn unsubscribe(&self) {
        let release = self.release.borrow_mut().take();
        if let Some(release) = release {
            tracing::trace!(message = "observable.unsubscribe", id = self.id);
            release();
        }
    }

    /// Whether the callback is still registered through this handle.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.borrow().is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A set of subscriptions released together.
///
/// Consumers with an attach/detach lifecycle keep one scope, [`add`](Self::add)
/// every subscription they take, and [`clear`](Self::clear) it on detach.
/// Dropping the scope clears it.
#[derive(Debug, Default)]
pub struct SubscriptionScope {
    subscriptions: RefCell<Vec<Subscription>>,
}

impl SubscriptionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `subscription` until the scope is cleared.
    pub fn add(&self, subscription: Subscription) {
        self.subscriptions.borrow_mut().push(subscription);
    }

    /// Release every held subscription, in the order they were added.
    pub fn clear(&self) {
        let released = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for subscription in &released {
            subscription.unsubscribe();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.borrow().is_empty()
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Observable;
    use std::cell::Cell;

    #[test]
    fn release_runs_once() {
        let runs = Rc::new(Cell::new(0u32));
        let r = Rc::clone(&runs);
        let sub = Subscription::new(0, move || r.set(r.get() + 1));

        assert!(sub.is_active());
        sub.unsubscribe();
        sub.unsubscribe();
        drop(sub);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn retained_value_outlives_callback_release() {
        let order = Rc::new(RefCell::new(Vec::new()));

        struct Marker(Rc<RefCell<Vec<&'static str>>>);
        impl Drop for Marker {
            fn drop(&mut self) {
                self.0.borrow_mut().push("keep");
            }
        }

        let o = Rc::clone(&order);
        let keep: Rc<dyn Any> = Rc::new(Marker(Rc::clone(&order)));
        let sub = Subscription::new(1, move || o.borrow_mut().push("release"))
            .retaining(Some(keep));
        assert!(order.borrow().is_empty());

        sub.unsubscribe();
        assert_eq!(*order.borrow(), ["release", "keep"]);
        drop(sub);
        assert_eq!(order.borrow().len(), 2);
    }

    #[test]
    fn drop_releases() {
        let runs = Rc::new(Cell::new(0u32));
        let r = Rc::clone(&runs);
        drop(Subscription::new(3, move || r.set(r.get() + 1)));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn scope_clear_releases_all() {
        let a = Observable::new(0);
        let b = Observable::new("x".to_string());
        let scope = SubscriptionScope::new();
        scope.add(a.subscribe(|_| {}));
        scope.add(a.subscribe(|_| {}));
        scope.add(b.subscribe(|_| {}));
        assert_eq!(scope.len(), 3);
        assert_eq!(a.subscriber_count(), 2);

        scope.clear();
        assert!(scope.is_empty());
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);

        // Reusable after clear.
        scope.add(a.subscribe(|_| {}));
        assert_eq!(a.subscriber_count(), 1);
    }

    #[test]
    fn scope_drop_releases_all() {
        let obs = Observable::new(1);
        {
            let scope = SubscriptionScope::new();
            scope.add(obs.subscribe(|_| {}));
            assert_eq!(obs.subscriber_count(), 1);
        }
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn debug_reports_state() {
        let sub = Subscription::new(7, || {});
        assert_eq!(format!("{sub:?}"), "Subscription { id: 7, active: true }");
        sub.unsubscribe();
        assert_eq!(format!("{sub:?}"), "Subscription { id: 7, active: false }");
    }
}
