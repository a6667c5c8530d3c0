//! Bind slices of a shared store to a component's local state.
//!
//! A `Binding` owns a component and a descriptor of `(local key, store path)`
//! pairs. While attached, every change at or below a bound path is copied into
//! the local key. Local writes made with `map = true` are pushed to the store
//! first; writes that originate from the store never go back to it.
//!
//! ```ignore
//! let store = Arc::new(Store::with_state(initial));
//! let mut list = Binding::new(
//!     Arc::clone(&store),
//!     [("todos", "todos.list"), ("filter", "todos.filter")],
//!     TodoList::default(),
//! );
//!
//! list.attach()?;
//! list.set_state(patch, true)?; // also updates `todos.filter` in the store
//! list.detach();
//! ```

use crate::error::Result;
use crate::path::KeyPath;
use crate::store::Store;
use crate::subscriptions::{Change, SubscriptionId};
use crate::types::{Tree, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle hooks for a bound component. All hooks default to no-ops.
///
/// Hooks receive a copy of local state and run with no lock on it held, so a
/// hook may write to the store, including to paths the component is bound to.
/// Changes caused by a hook are delivered through `state_changed` once the
/// hook returns.
pub trait Component: Send + 'static {
    /// Called at the end of `attach`, with local state already seeded.
    fn will_mount(&mut self, _state: &Tree) {}

    /// Called at the start of `detach`, before unsubscribing.
    fn will_unmount(&mut self) {}

    /// Called after every change to local state.
    fn state_changed(&mut self, _state: &Tree) {}
}

impl Component for () {}

/// Local state and component, shared with the binding's store listeners.
struct Local<C> {
    state: Mutex<Tree>,
    component: Mutex<C>,
    /// Local state changed and the component has not been told yet.
    pending: AtomicBool,
}

impl<C: Component> Local<C> {
    fn new(component: C) -> Self {
        Self {
            state: Mutex::new(Tree::new()),
            component: Mutex::new(component),
            pending: AtomicBool::new(false),
        }
    }

    fn snapshot(&self) -> Tree {
        self.state.lock().clone()
    }

    fn merge(&self, patch: Tree) {
        self.state.lock().extend(patch);
        self.changed();
    }

    fn set(&self, key: &str, value: Option<Value>) {
        {
            let mut state = self.state.lock();
            match value {
                Some(value) => {
                    state.insert(key.to_string(), value);
                }
                None => {
                    state.remove(key);
                }
            }
        }
        self.changed();
    }

    /// Tell the component local state changed.
    ///
    /// Never waits for the component: if a hook is running (on this thread or
    /// another) the change is left pending for that hook's caller to deliver.
    fn changed(&self) {
        self.pending.store(true, Ordering::SeqCst);

        while let Some(mut component) = self.component.try_lock() {
            self.deliver(&mut component);
            drop(component);

            // Set again between the last delivery and the unlock.
            if !self.pending.load(Ordering::SeqCst) {
                break;
            }
        }
    }

    fn deliver(&self, component: &mut C) {
        while self.pending.swap(false, Ordering::SeqCst) {
            let state = self.snapshot();
            component.state_changed(&state);
        }
    }

    /// Run `f` on the component with a copy of local state, then deliver
    /// whatever changes it caused.
    fn hook<R>(&self, f: impl FnOnce(&mut C, &Tree) -> R) -> R {
        let mut component = self.component.lock();
        let state = self.snapshot();
        let result = f(&mut component, &state);
        self.deliver(&mut component);
        drop(component);

        if self.pending.load(Ordering::SeqCst) {
            self.changed();
        }
        result
    }
}

/// A component whose local state mirrors paths in a store.
pub struct Binding<C: Component = ()> {
    store: Arc<Store>,
    /// `(local key, store path)` pairs.
    descriptor: Vec<(String, String)>,
    local: Arc<Local<C>>,
    subscriptions: Vec<(String, SubscriptionId)>,
    attached: bool,
}

impl<C: Component> Binding<C> {
    /// Create a detached binding. Local state starts empty.
    pub fn new<K, P>(
        store: Arc<Store>,
        descriptor: impl IntoIterator<Item = (K, P)>,
        component: C,
    ) -> Self
    where
        K: Into<String>,
        P: Into<String>,
    {
        Self {
            store,
            descriptor: descriptor
                .into_iter()
                .map(|(key, path)| (key.into(), path.into()))
                .collect(),
            local: Arc::new(Local::new(component)),
            subscriptions: Vec::new(),
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Seed local state from the store and start listening.
    ///
    /// Reads every bound path before subscribing, so an invalid path leaves the
    /// binding detached with nothing registered.
    pub fn attach(&mut self) -> Result<()> {
        if self.attached {
            return Ok(());
        }

        debug!(keys = ?self.keys(), "Subscribing to keys on store");

        let mut initial = Tree::new();
        for (key, path) in &self.descriptor {
            if let Some(value) = self.store.get(path)? {
                initial.insert(key.clone(), value);
            }
        }

        for (key, path) in &self.descriptor {
            let id = self
                .store
                .subscribe(path, self.listener(key.clone(), path.clone()));
            self.subscriptions.push((path.clone(), id));
        }
        self.attached = true;

        self.local.merge(initial);
        self.local.hook(|component, state| component.will_mount(state));
        Ok(())
    }

    /// Stop listening. Local state is kept.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }

        self.local.hook(|component, _| component.will_unmount());

        debug!(keys = ?self.keys(), "Unsubscribing from keys on store");
        for (path, id) in self.subscriptions.drain(..) {
            self.store.unsubscribe(&path, id);
        }
        self.attached = false;
    }

    /// Merge `patch` into local state.
    ///
    /// With `map`, each bound key present in the patch is first written to its
    /// store path (without creating intermediate mappings). A store error
    /// leaves local state untouched, though keys written before the failure
    /// stay written.
    pub fn set_state(&self, patch: Tree, map: bool) -> Result<()> {
        if map {
            for (key, path) in &self.descriptor {
                if let Some(value) = patch.get(key) {
                    debug!(key = %key, path = %path, "Updating store from local state");
                    self.store.update(path, value.clone())?;
                }
            }
        }

        self.local.merge(patch);
        Ok(())
    }

    /// Copy of the current local state.
    pub fn local_state(&self) -> Tree {
        self.local.snapshot()
    }

    pub fn get_local(&self, key: &str) -> Option<Value> {
        self.local.state.lock().get(key).cloned()
    }

    /// Run `f` with the component and a copy of its local state.
    pub fn with_component<R>(&self, f: impl FnOnce(&mut C, &Tree) -> R) -> R {
        self.local.hook(f)
    }

    fn keys(&self) -> Vec<&str> {
        self.descriptor.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Listener that mirrors the value at `path` into local `key`.
    ///
    /// For a change below `path` the bound value is re-read from the change's
    /// state snapshot rather than taking the descendant's value.
    fn listener(
        &self,
        key: String,
        path: String,
    ) -> impl Fn(&Change<'_>) -> Result<()> + Send + Sync + 'static {
        let local = Arc::clone(&self.local);
        let separator = self.store.separator();

        move |change: &Change<'_>| {
            let bound = KeyPath::new(&path, separator);
            let value = if change.path == path {
                change.value.cloned()
            } else if bound.is_root() {
                Some(Value::Object((**change.state).clone()))
            } else {
                bound.resolve(change.state)?.cloned()
            };

            debug!(key = %key, path = %path, "Store update, updating local state");
            local.set(&key, value);
            Ok(())
        }
    }
}

impl<C: Component> Drop for Binding<C> {
    fn drop(&mut self) {
        self.detach();
    }
}
