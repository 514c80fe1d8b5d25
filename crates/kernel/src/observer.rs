//! Change observation between scene objects.
//!
//! A source keeps an [`ObserverList`]; observers register through it and get a
//! [`Subscription`] back. Dropping the subscription unregisters the observer,
//! so teardown (including unwinding) never leaves a dangling registration.

use parking_lot::Mutex;
use prism_common::ObjectId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Receives invalidation callbacks from objects it subscribed to.
pub trait ChangeObserver: Send + Sync {
    fn notify_change(&self, source: ObjectId);
}

#[derive(Default)]
pub struct ObserverList {
    next_key: AtomicU64,
    entries: Mutex<Vec<(u64, Weak<dyn ChangeObserver>)>>,
}

impl ObserverList {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `observer`. The list only keeps a weak reference.
    pub fn subscribe(self: &Arc<Self>, observer: &Arc<dyn ChangeObserver>) -> Subscription {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((key, Arc::downgrade(observer)));
        Subscription {
            list: Arc::downgrade(self),
            key,
        }
    }

    /// Notify every live observer. Dead entries are pruned.
    pub fn notify(&self, source: ObjectId) {
        let live: Vec<Arc<dyn ChangeObserver>> = {
            let mut entries = self.entries.lock();
            entries.retain(|(_, weak)| weak.strong_count() > 0);
            entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        // Callbacks run without the lock held so they may subscribe or cancel.
        for observer in live {
            observer.notify_change(source);
        }
    }

    /// Number of registered subscriptions (live or not yet pruned).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, key: u64) {
        self.entries.lock().retain(|(k, _)| *k != key);
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("subscriptions", &self.len())
            .finish()
    }
}

/// Registration handle returned by [`ObserverList::subscribe`].
#[must_use = "dropping a subscription unregisters the observer"]
#[derive(Debug)]
pub struct Subscription {
    list: Weak<ObserverList>,
    key: u64,
}

impl Subscription {
    /// Unregister explicitly.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.remove(self.key);
        }
    }
}
