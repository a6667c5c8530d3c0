//! Path-keyed listener registry.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{Listener, SubscriptionId};

/// Internal subscription state.
struct Subscription {
    id: SubscriptionId,
    listener: Listener,
}

/// Listeners keyed by the exact path string they were registered at.
///
/// Registration order within a path is preserved and is the order in which
/// listeners are notified. Paths need not exist in the tree.
pub struct SubscriptionRegistry {
    subscriptions: RwLock<HashMap<String, Vec<Subscription>>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a listener to the sequence at `path`.
    pub fn subscribe(&self, path: &str, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));

        self.subscriptions
            .write()
            .entry(path.to_string())
            .or_default()
            .push(Subscription { id, listener });

        id
    }

    /// Remove one listener. Returns false if it was not registered at `path`.
    pub fn unsubscribe(&self, path: &str, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.write();
        let Some(list) = subs.get_mut(path) else {
            return false;
        };

        let Some(pos) = list.iter().position(|s| s.id == id) else {
            return false;
        };
        list.remove(pos);
        true
    }

    /// Remove the whole sequence at `path`. Returns how many were removed.
    pub fn unsubscribe_all(&self, path: &str) -> usize {
        self.subscriptions
            .write()
            .remove(path)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Listeners at exactly `path`, in registration order.
    ///
    /// The returned list is detached from the registry, so callers can invoke
    /// listeners that subscribe or unsubscribe without deadlocking.
    pub fn listeners(&self, path: &str) -> Vec<Listener> {
        self.subscriptions
            .read()
            .get(path)
            .map(|list| list.iter().map(|s| s.listener.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of listeners at exactly `path`.
    pub fn count(&self, path: &str) -> usize {
        self.subscriptions
            .read()
            .get(path)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::Change;
    use std::sync::Arc;

    fn noop() -> Listener {
        Arc::new(|_: &Change<'_>| -> crate::error::Result<()> { Ok(()) })
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let registry = SubscriptionRegistry::new();

        let id = registry.subscribe("foo.bar", noop());
        assert_eq!(registry.count("foo.bar"), 1);
        assert_eq!(registry.count("foo"), 0);

        assert!(registry.unsubscribe("foo.bar", id));
        assert_eq!(registry.count("foo.bar"), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let registry = SubscriptionRegistry::new();
        let a = registry.subscribe("foo", noop());
        let b = registry.subscribe("foo", noop());

        // Wrong path, then an id that was never issued.
        assert!(!registry.unsubscribe("bar", a));
        assert!(!registry.unsubscribe("foo", SubscriptionId(999)));
        assert_eq!(registry.count("foo"), 2);

        assert!(registry.unsubscribe("foo", b));
        assert!(!registry.unsubscribe("foo", b));
        assert_eq!(registry.count("foo"), 1);
    }

    #[test]
    fn test_unsubscribe_all() {
        let registry = SubscriptionRegistry::new();
        for _ in 0..3 {
            registry.subscribe("foo.bar", noop());
        }
        registry.subscribe("foo", noop());

        assert_eq!(registry.unsubscribe_all("foo.bar"), 3);
        assert_eq!(registry.count("foo.bar"), 0);
        assert_eq!(registry.count("foo"), 1);
        assert_eq!(registry.unsubscribe_all("foo.bar"), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SubscriptionRegistry::new();
        let a = registry.subscribe("x", noop());
        let b = registry.subscribe("y", noop());
        assert_ne!(a, b);
    }
}
