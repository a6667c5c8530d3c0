//! Main Store struct: the state tree plus its subscriptions.

use crate::error::{Result, StateError};
use crate::path::KeyPath;
use crate::subscriptions::{Change, SubscriptionId, SubscriptionRegistry, WatchHandle};
use crate::types::{StoreConfig, Tree, Value};
use crossbeam_channel::{bounded, TrySendError};
use parking_lot::RwLock;
use serde_json::map::Entry;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A path-addressed state tree with hierarchical change notification.
///
/// Every mutation notifies listeners registered at the root, then at each
/// ancestor of the mutated path from shortest to longest, then at the path
/// itself. Listeners run synchronously inside the mutating call with no
/// internal lock held, so they may read or mutate the store again.
pub struct Store {
    config: StoreConfig,

    /// The separator as a string; names the root.
    root_marker: String,

    /// Live root. Copy-on-write, so handles given out by `get_state` are
    /// stable snapshots.
    root: RwLock<Arc<Tree>>,

    subscriptions: SubscriptionRegistry,
}

impl Store {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store seeded with `initial`.
    pub fn with_state(initial: Tree) -> Self {
        Self::with_config_and_state(StoreConfig::default(), initial)
    }

    /// Create an empty store with a custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_config_and_state(config, Tree::new())
    }

    pub fn with_config_and_state(config: StoreConfig, initial: Tree) -> Self {
        Self {
            root_marker: config.separator.to_string(),
            config,
            root: RwLock::new(Arc::new(initial)),
            subscriptions: SubscriptionRegistry::new(),
        }
    }

    pub fn separator(&self) -> char {
        self.config.separator
    }

    /// The path naming the root.
    pub fn root_marker(&self) -> &str {
        &self.root_marker
    }

    fn key<'p>(&self, path: &'p str) -> KeyPath<'p> {
        KeyPath::new(path, self.config.separator)
    }

    /// Ancestor chain of `path` using this store's separator.
    pub fn expand_tree(&self, path: &str) -> Vec<String> {
        crate::path::expand_tree(path, self.config.separator)
    }

    // --- Root Operations ---

    /// The root mapping as it is right now.
    pub fn get_state(&self) -> Arc<Tree> {
        Arc::clone(&self.root.read())
    }

    /// Replace the whole tree and notify root listeners.
    ///
    /// Root listeners receive the new and old trees as owned `Value`s, which
    /// costs a copy of the new tree (and of the old one while a snapshot of it
    /// is still held). Without root listeners nothing is copied.
    pub fn set_state(&self, state: Tree) -> Result<()> {
        debug!(keys = state.len(), "Setting root state");

        if self.subscriptions.count(&self.root_marker) == 0 {
            *self.root.write() = Arc::new(state);
            return Ok(());
        }

        let value = Value::Object(state.clone());
        let previous = std::mem::replace(&mut *self.root.write(), Arc::new(state));
        let old_value = Arc::try_unwrap(previous).unwrap_or_else(|arc| (*arc).clone());

        self.handle_change(
            &self.root_marker,
            Some(&value),
            Some(&Value::Object(old_value)),
        )
    }

    // --- Path Operations ---

    /// Read the value at `path`.
    ///
    /// Returns `Ok(None)` when every intermediate segment is a mapping but the
    /// final key is absent. Never creates structure.
    pub fn get(&self, path: &str) -> Result<Option<Value>> {
        let key = self.key(path);
        let root = self.get_state();

        if key.is_root() {
            return Ok(Some(Value::Object((*root).clone())));
        }

        Ok(key.resolve(&root)?.cloned())
    }

    /// True if a value exists at `path`.
    pub fn contains(&self, path: &str) -> Result<bool> {
        let key = self.key(path);
        if key.is_root() {
            return Ok(true);
        }

        let root = self.get_state();
        Ok(key.resolve(&root)?.is_some())
    }

    /// Set the value at `path`. Every intermediate mapping must already exist.
    pub fn update(&self, path: &str, value: Value) -> Result<()> {
        self.update_with(path, value, false)
    }

    /// Set the value at `path`, creating missing intermediate mappings.
    pub fn create(&self, path: &str, value: Value) -> Result<()> {
        self.update_with(path, value, true)
    }

    /// Set the value at `path` and notify its ancestor chain.
    ///
    /// With `create`, absent intermediate segments become empty mappings, but an
    /// existing non-mapping value is never replaced (`StateError::Overwrite`).
    /// Without it, a missing or non-mapping intermediate is
    /// `StateError::InvalidPath`. Nothing is changed or notified on failure.
    pub fn update_with(&self, path: &str, value: Value, create: bool) -> Result<()> {
        let key = self.key(path);

        if key.is_root() {
            return match value {
                Value::Object(state) => self.set_state(state),
                other => Err(StateError::InvalidRoot(kind_of(&other).to_string())),
            };
        }

        let (parents, last) = key.split_last();
        let old_value = {
            let mut root = self.root.write();
            let parent = walk_mut(Arc::make_mut(&mut root), &parents, create, path)?;
            parent.insert(last.to_string(), value.clone())
        };

        debug!(path, create, "Updated state tree");
        self.handle_change(path, Some(&value), old_value.as_ref())
    }

    /// Remove the key at `path` from its parent mapping.
    ///
    /// Notifies twice: once for the parent path with the pruned parent mapping,
    /// then once for `path` itself with an absent new value. Deleting the root
    /// clears the tree.
    pub fn delete(&self, path: &str) -> Result<()> {
        let key = self.key(path);

        if key.is_root() {
            debug!("Clearing state tree");
            return self.set_state(Tree::new());
        }

        let (parents, last) = key.split_last();
        let (previous, old_parent, new_parent) = {
            let mut root = self.root.write();
            let parent = walk_mut(Arc::make_mut(&mut root), &parents, false, path)?;
            let old_parent = parent.clone();
            let previous = parent.remove(last);
            (previous, old_parent, parent.clone())
        };

        debug!(path, existed = previous.is_some(), "Deleted from state tree");

        let parent_path = key.parent().unwrap_or(self.root_marker.as_str());
        self.handle_change(
            parent_path,
            Some(&Value::Object(new_parent)),
            Some(&Value::Object(old_parent)),
        )?;
        self.handle_change(path, None, previous.as_ref())
    }

    // --- Subscriptions ---

    /// Register `listener` at `path`. It hears about changes at `path` and
    /// anywhere below it, whether or not `path` exists yet.
    pub fn subscribe<F>(&self, path: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&Change<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.subscriptions.subscribe(path, Arc::new(listener));
        debug!(path, id = id.0, "Added subscription");
        id
    }

    /// Register `listener` at the root; it hears every change.
    pub fn subscribe_all<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Change<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribe(&self.root_marker, listener)
    }

    /// Remove one listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, path: &str, id: SubscriptionId) -> bool {
        let removed = self.subscriptions.unsubscribe(path, id);
        if removed {
            debug!(path, id = id.0, "Removing subscription");
        }
        removed
    }

    /// Remove every listener registered at exactly `path`.
    pub fn unsubscribe_all(&self, path: &str) -> usize {
        let removed = self.subscriptions.unsubscribe_all(path);
        debug!(path, removed, "Removing all subscriptions");
        removed
    }

    /// Number of listeners registered at exactly `path`.
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.subscriptions.count(path)
    }

    /// Subscribe at `path` through a bounded channel.
    ///
    /// When the channel is full the change is dropped for this watcher only.
    pub fn watch(&self, path: &str) -> WatchHandle {
        let (sender, receiver) = bounded(self.config.watch_buffer_size);
        let watched = path.to_string();

        let id = self.subscribe(path, move |change| {
            match sender.try_send(change.to_event()) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        watch = %watched,
                        path = change.path,
                        "Watch buffer full, dropping change"
                    );
                }
            }
            Ok(())
        });

        WatchHandle {
            id,
            path: path.to_string(),
            receiver,
        }
    }

    /// Remove a watch subscription.
    pub fn unwatch(&self, handle: &WatchHandle) -> bool {
        self.unsubscribe(&handle.path, handle.id)
    }

    // --- Broadcasting ---

    /// Notify the root, then each ancestor of `path`, then `path` itself.
    ///
    /// A listener error stops the pass and is returned.
    pub(crate) fn handle_change(
        &self,
        path: &str,
        value: Option<&Value>,
        old_value: Option<&Value>,
    ) -> Result<()> {
        debug!(path, "State change");

        let key = self.key(path);
        let mut chain = vec![self.root_marker.as_str()];
        if !key.is_root() {
            chain.extend(key.ancestors());
        }

        for target in chain {
            let listeners = self.subscriptions.listeners(target);
            if listeners.is_empty() {
                continue;
            }

            trace!(path = target, count = listeners.len(), "Notifying subscriptions");
            for listener in listeners {
                let state = self.get_state();
                listener(&Change {
                    path,
                    value,
                    old_value,
                    state: &state,
                })?;
            }
        }

        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Descend through `parents`, returning the mapping that holds the last key.
///
/// A mapping is only ever inserted into a vacant slot, and everything below a
/// fresh mapping is vacant too, so a failing walk has not modified the tree.
fn walk_mut<'t>(
    tree: &'t mut Tree,
    parents: &[&str],
    create: bool,
    path: &str,
) -> Result<&'t mut Tree> {
    let mut current = tree;
    for segment in parents {
        let slot = match current.entry(*segment) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if create => entry.insert(Value::Object(Tree::new())),
            Entry::Vacant(_) => return Err(StateError::InvalidPath(path.to_string())),
        };

        current = match slot {
            Value::Object(map) => map,
            _ if create => return Err(StateError::Overwrite(path.to_string())),
            _ => return Err(StateError::InvalidPath(path.to_string())),
        };
    }

    Ok(current)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
