//! # State Tree
//!
//! A path-addressed state container with hierarchical change notification,
//! plus a binding layer that mirrors slices of the tree into component-local
//! state.
//!
//! ## Core Concepts
//!
//! - **Tree**: nested JSON mappings; every other value is a leaf
//! - **Key paths**: dotted strings like `todos.list`; `.` alone is the root
//! - **Subscriptions**: listeners at a path hear changes at or below it,
//!   delivered root first, then shortest ancestor to longest
//! - **Bindings**: attach/detach adapters that keep a component's local state
//!   in sync with store paths
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use state_tree::Store;
//!
//! let store = Store::new();
//!
//! store.subscribe("todos", |change| {
//!     println!("{} -> {:?}", change.path, change.value);
//!     Ok(())
//! });
//!
//! store.create("todos.list", json!([]))?;
//! store.update("todos.list", json!([{"text": "x", "completed": false}]))?;
//!
//! assert_eq!(store.get("todos.list")?, Some(json!([{"text": "x", "completed": false}])));
//! # Ok::<(), state_tree::StateError>(())
//! ```

pub mod binding;
pub mod error;
pub mod path;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use binding::{Binding, Component};
pub use error::{Result, StateError};
pub use path::{expand_tree, KeyPath};
pub use store::Store;
pub use subscriptions::{
    Change, ChangeEvent, Listener, SubscriptionId, SubscriptionRegistry, WatchHandle,
};
pub use types::*;
