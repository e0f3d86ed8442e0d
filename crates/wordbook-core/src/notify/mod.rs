//! Typed publish/subscribe lists.
//!
//! [`Listeners`] is the building block shared by the connectivity monitor and
//! the data-changed [`EventNotifier`]. Fan-out is synchronous and runs on the
//! publisher's task; listeners must not block.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener<E>)>>,
}

impl<E> Registry<E> {
    // The list is only pushed to or filtered, so it stays usable after a
    // panicking holder poisons the lock
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Listener<E>)>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Listener registry lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}

/// A list of subscribers to events of type `E`.
pub struct Listeners<E> {
    registry: Arc<Registry<E>>,
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it stays active until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.entries().push((id, Arc::new(listener)));

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry
                        .entries()
                        .retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Deliver `event` to every current subscriber, in subscription order.
    pub fn emit(&self, event: &E) {
        // Snapshot so listeners may subscribe/unsubscribe while being called
        let snapshot: Vec<Listener<E>> = self
            .registry
            .entries()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `subscribe`; unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// "The data changed, reload" signal. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChanged;

/// Process-wide publish point for [`DataChanged`].
#[derive(Clone, Default)]
pub struct EventNotifier {
    listeners: Listeners<DataChanged>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.listeners.subscribe(move |_: &DataChanged| listener())
    }

    /// Fire-and-forget fan-out to current subscribers.
    pub fn publish(&self) {
        tracing::debug!(
            "Publishing data-changed to {} subscriber(s)",
            self.listeners.len()
        );
        self.listeners.emit(&DataChanged);
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let notifier = EventNotifier::new();
        let (first, on_first) = counter();
        let (second, on_second) = counter();
        let _a = notifier.subscribe(on_first);
        let _b = notifier.subscribe(on_second);

        notifier.publish();
        notifier.publish();

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = EventNotifier::new();
        let (count, on_change) = counter();
        let subscription = notifier.subscribe(on_change);

        notifier.publish();
        subscription.unsubscribe();
        notifier.publish();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn dropping_handle_unsubscribes() {
        let notifier = EventNotifier::new();
        let (count, on_change) = counter();
        {
            let _subscription = notifier.subscribe(on_change);
            assert_eq!(notifier.subscriber_count(), 1);
        }
        notifier.publish();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clones_share_subscribers() {
        let notifier = EventNotifier::new();
        let publisher = notifier.clone();
        let (count, on_change) = counter();
        let _subscription = notifier.subscribe(on_change);

        publisher.publish();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        EventNotifier::new().publish();
    }

    #[test]
    fn typed_listeners_receive_event_value() {
        let listeners: Listeners<u32> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = listeners.subscribe(move |value: &u32| {
            sink.lock().unwrap().push(*value);
        });

        listeners.emit(&3);
        listeners.emit(&5);

        assert_eq!(*seen.lock().unwrap(), vec![3, 5]);
    }

    #[test]
    fn subscribe_still_registers_after_poisoned_lock() {
        let notifier = EventNotifier::new();
        let registry = Arc::clone(&notifier.listeners.registry);
        let holder = std::thread::spawn(move || {
            let _entries = registry.entries.lock().unwrap();
            panic!("listener registry holder panicked");
        });
        assert!(holder.join().is_err());
        assert!(notifier.listeners.registry.entries.is_poisoned());

        let (count, on_change) = counter();
        let subscription = notifier.subscribe(on_change);
        assert_eq!(notifier.subscriber_count(), 1);

        notifier.publish();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
