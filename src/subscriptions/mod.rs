//! Subscriptions to changes in the state tree.
//!
//! Listeners are registered at an exact key path. A change at `a.b.c` is
//! delivered to listeners at the root, `a`, `a.b` and `a.b.c`, in that
//! order, and in registration order within each path.
//!
//! Two delivery styles are supported:
//! - Callbacks, invoked synchronously inside the mutating call
//! - Bounded channels (`Store::watch`), for consumers on another thread
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new();
//!
//! let id = store.subscribe("todos", |change| {
//!     println!("{} changed to {:?}", change.path, change.value);
//!     Ok(())
//! });
//!
//! let handle = store.watch("todos.filter");
//! store.create("todos.filter", json!("all"))?;
//! assert_eq!(handle.recv()?.path, "todos.filter");
//! ```

mod registry;
mod types;

pub use registry::SubscriptionRegistry;
pub use types::{Change, ChangeEvent, Listener, SubscriptionId, WatchHandle};
