//! Core types for the state tree.

pub use serde_json::Value;

/// A mapping node. The root of every store is one of these.
pub type Tree = serde_json::Map<String, Value>;

/// Default key path separator.
pub const SEPARATOR: char = '.';

/// Path naming the root with the default separator.
pub const ROOT: &str = ".";

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Key path separator. The separator on its own names the root.
    pub separator: char,

    /// Channel capacity for `Store::watch`.
    /// Default: 1000
    pub watch_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            separator: SEPARATOR,
            watch_buffer_size: 1000,
        }
    }
}
