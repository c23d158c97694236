#![forbid(unsafe_code)]

//! Shared, version-tracked values with synchronous change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps the current value, a version counter, and the
//! subscriber list in shared, reference-counted storage. Subscribers are held
//! as `Weak` callbacks; the strong reference lives in the [`Subscription`]
//! returned to the caller, so dropping the handle is enough to stop delivery.
//! Dead entries are pruned eagerly on unsubscribe and lazily on delivery.
//!
//! # Invariants
//!
//! 1. Every `set` bumps the version by exactly 1 and notifies, even when the
//!    new value equals the old one. De-duplication belongs to
//!    [`distinct`](crate::Readable::distinct).
//! 2. Subscribers are notified in registration order.
//! 3. `subscribe` replays the current value before returning.
//! 4. No `RefCell` borrow is held while a callback runs, so callbacks may
//!    freely read, write, subscribe, or unsubscribe.
//! 5. A `set` issued while this observable is already delivering is queued
//!    and delivered after the current round, in FIFO order.
//!
//! # Failure Modes
//!
//! - **Callback panics**: the in-flight round is abandoned and queued values
//!   are discarded. The stored value is already updated, and the observable
//!   accepts new writes afterwards.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::subscription::Subscription;

type Callback<T> = dyn Fn(&T);

/// Shared interior for [`Observable<T>`].
pub(crate) struct ObservableInner<T> {
    value: T,
    /// Bumped once per `set`.
    version: u64,
    next_id: u64,
    /// Registration-ordered `(id, callback)` pairs.
    subscribers: Vec<(u64, Weak<Callback<T>>)>,
    /// True while a delivery round is running.
    delivering: bool,
    /// Values written re-entrantly during a delivery round.
    pending: VecDeque<T>,
}

impl<T> ObservableInner<T> {
    fn live_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|(_, callback)| callback.strong_count() > 0)
            .count()
    }
}

/// A shared value holder that notifies subscribers whenever it is replaced.
///
/// This is the read-write capability. Hand out [`read_only`](Self::read_only)
/// views to consumers that must not write.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.live_count())
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                next_id: 0,
                subscribers: Vec::new(),
                delivering: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls [`set`](Self::set) on the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value and synchronously notify every subscriber with it.
    pub fn set(&self, value: T) {
        let first = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
            tracing::trace!(
                message = "observable.set",
                version = inner.version,
                subscribers = inner.subscribers.len(),
                queued = inner.delivering
            );
            if inner.delivering {
                let queued = inner.value.clone();
                inner.pending.push_back(queued);
                return;
            }
            inner.delivering = true;
            inner.value.clone()
        };
        self.deliver(first);
    }

    /// Compute the next value from the current one and [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    /// Register `callback` and immediately invoke it with the current value.
    ///
    /// Delivery stops when the returned [`Subscription`] is unsubscribed or
    /// dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        let subscription = self.register(Rc::clone(&callback));
        let current = self.get();
        callback(&current);
        subscription
    }

    /// Register `callback` for future changes only, without the replay.
    pub(crate) fn listen(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.register(Rc::new(callback))
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().live_count()
    }

    /// Current version number. Increments by 1 on each `set`.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// A handle to the same value without write access.
    #[must_use]
    pub fn read_only(&self) -> crate::ReadOnly<T> {
        crate::ReadOnly::view(self.clone())
    }

    pub(crate) fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn register(&self, callback: Rc<Callback<T>>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Rc::downgrade(&callback)));
            id
        };
        tracing::trace!(message = "observable.subscribe", id);

        let owner = Rc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(strong) = owner.upgrade()
                && let Ok(mut inner) = strong.try_borrow_mut()
            {
                inner.subscribers.retain(|(entry, _)| *entry != id);
            }
            // Releasing the only strong reference makes the weak entry dead
            // even when the list could not be borrowed above.
            drop(callback);
        })
    }

    fn deliver(&self, first: T) {
        let _round = DeliveryRound {
            inner: &self.inner,
        };
        let mut next = Some(first);
        while let Some(value) = next {
            let targets: Vec<Weak<Callback<T>>> = {
                let mut inner = self.inner.borrow_mut();
                inner
                    .subscribers
                    .retain(|(_, callback)| callback.strong_count() > 0);
                inner
                    .subscribers
                    .iter()
                    .map(|(_, callback)| Weak::clone(callback))
                    .collect()
            };
            for target in targets {
                // Subscribers removed earlier in this round fail to upgrade.
                if let Some(callback) = target.upgrade() {
                    callback(&value);
                }
            }
            next = self.inner.borrow_mut().pending.pop_front();
        }
    }
}

/// Ends a delivery round, including when a callback unwinds.
struct DeliveryRound<'a, T> {
    inner: &'a RefCell<ObservableInner<T>>,
}

impl<T> Drop for DeliveryRound<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.delivering = false;
            inner.pending.clear();
        }
    }
}

/// Non-owning handle used by derivations to reach their target.
pub(crate) struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T> WeakObservable<T> {
    pub(crate) fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &T| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn get_and_set() {
        let obs = Observable::new(1);
        assert_eq!(obs.get(), 1);
        obs.set(2);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.with(|v| v * 10), 20);
    }

    #[test]
    fn subscribe_replays_current_value() {
        let obs = Observable::new("initial".to_string());
        let (seen, sink) = recorder::<String>();
        let _sub = obs.subscribe(sink);
        assert_eq!(*seen.borrow(), vec!["initial".to_string()]);
    }

    #[test]
    fn set_notifies_every_subscriber_in_order() {
        let obs = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = Rc::clone(&order);
        let _s1 = obs.listen(move |v| o1.borrow_mut().push(("first", *v)));
        let o2 = Rc::clone(&order);
        let _s2 = obs.listen(move |v| o2.borrow_mut().push(("second", *v)));

        obs.set(7);
        assert_eq!(*order.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn equal_value_still_notifies() {
        let obs = Observable::new(5);
        let (seen, sink) = recorder::<i32>();
        let _sub = obs.subscribe(sink);

        obs.set(5);
        obs.set(5);
        assert_eq!(*seen.borrow(), vec![5, 5, 5]);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn update_derives_from_current() {
        let obs = Observable::new(vec![1, 2]);
        obs.update(|v| {
            let mut next = v.clone();
            next.push(3);
            next
        });
        assert_eq!(obs.get(), vec![1, 2, 3]);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let obs = Observable::new(0);
        let (seen, sink) = recorder::<i32>();
        let sub = obs.subscribe(sink);

        obs.set(1);
        sub.unsubscribe();
        obs.set(2);

        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert!(!sub.is_active());
    }

    #[test]
    fn unsubscribe_twice_is_harmless() {
        let obs = Observable::new(0);
        let (kept, sink) = recorder::<i32>();
        let _kept = obs.listen(sink);
        let sub = obs.listen(|_| {});
        assert_eq!(obs.subscriber_count(), 2);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(obs.subscriber_count(), 1);

        obs.set(3);
        assert_eq!(*kept.borrow(), vec![3]);
    }

    #[test]
    fn drop_unsubscribes() {
        let obs = Observable::new(0);
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let sub = obs.listen(move |_| c.set(c.get() + 1));
        assert_eq!(obs.subscriber_count(), 1);

        drop(sub);
        assert_eq!(obs.subscriber_count(), 0);
        obs.set(1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn unsubscribe_other_during_delivery_skips_it() {
        let obs = Observable::new(0);
        let victim_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let (killer_seen, killer_sink) = recorder::<i32>();
        let (victim_seen, victim_sink) = recorder::<i32>();
        let (tail_seen, tail_sink) = recorder::<i32>();

        let slot = Rc::clone(&victim_slot);
        let _killer = obs.listen(move |v: &i32| {
            killer_sink(v);
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        *victim_slot.borrow_mut() = Some(obs.listen(victim_sink));
        let _tail = obs.listen(tail_sink);

        obs.set(1);
        obs.set(2);

        assert_eq!(*killer_seen.borrow(), vec![1, 2]);
        assert!(victim_seen.borrow().is_empty());
        assert_eq!(*tail_seen.borrow(), vec![1, 2]);
        assert_eq!(obs.subscriber_count(), 2);
    }

    #[test]
    fn unsubscribe_self_during_delivery() {
        let obs = Observable::new(0);
        let own: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0u32));
        let (tail_seen, tail_sink) = recorder::<i32>();

        let slot = Rc::clone(&own);
        let c = Rc::clone(&calls);
        *own.borrow_mut() = Some(obs.listen(move |_| {
            c.set(c.get() + 1);
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        }));
        let _tail = obs.listen(tail_sink);

        obs.set(1);
        obs.set(2);

        assert_eq!(calls.get(), 1);
        assert_eq!(*tail_seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn reentrant_set_is_queued_in_order() {
        let obs = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let writer = obs.clone();
        let o1 = Rc::clone(&order);
        let _s1 = obs.listen(move |v| {
            o1.borrow_mut().push(("a", *v));
            if *v == 1 {
                writer.set(2);
            }
        });
        let o2 = Rc::clone(&order);
        let _s2 = obs.listen(move |v| o2.borrow_mut().push(("b", *v)));

        obs.set(1);
        assert_eq!(
            *order.borrow(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn subscribe_during_delivery_gets_replay() {
        let obs = Observable::new(0);
        let late: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let (late_seen, late_sink) = recorder::<i32>();
        let late_sink = Rc::new(late_sink);

        let source = obs.clone();
        let slot = Rc::clone(&late);
        let _s = obs.listen(move |_| {
            if slot.borrow().is_none() {
                let sink = Rc::clone(&late_sink);
                let sub = source.subscribe(move |v| sink(v));
                *slot.borrow_mut() = Some(sub);
            }
        });

        obs.set(4);
        assert_eq!(*late_seen.borrow(), vec![4]);
        obs.set(5);
        assert_eq!(*late_seen.borrow(), vec![4, 5]);
    }

    #[test]
    fn panicking_callback_does_not_wedge() {
        let obs = Observable::new(0);
        let sub = obs.listen(|v| {
            if *v == 1 {
                panic!("boom");
            }
        });

        let writer = obs.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.set(1)));
        assert!(result.is_err());
        drop(sub);

        let (seen, sink) = recorder::<i32>();
        let _s = obs.listen(sink);
        obs.set(2);
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn clone_shares_state() {
        let a = Observable::new(1);
        let b = a.clone();
        b.set(9);
        assert_eq!(a.get(), 9);
        assert_eq!(a.version(), 1);
    }

    #[test]
    fn subscription_outlives_observable() {
        let sub;
        {
            let obs = Observable::new(0);
            sub = obs.listen(|_| {});
        }
        assert!(sub.is_active());
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let _sub = obs.listen(|_| {});
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("subscribers: 1"));
    }
}
