//! Dotted key paths.
//!
//! A path like `todos.list` addresses the value at key `list` inside the
//! mapping at key `todos`. The separator on its own (`.`) addresses the root.
//! Segments are taken literally: an empty segment is the empty-string key.

use crate::error::{Result, StateError};
use crate::types::{Tree, Value};
use std::fmt;

/// A borrowed key path together with the separator it was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPath<'a> {
    raw: &'a str,
    separator: char,
}

impl<'a> KeyPath<'a> {
    pub fn new(raw: &'a str, separator: char) -> Self {
        Self { raw, separator }
    }

    /// True if this path is exactly the separator.
    pub fn is_root(&self) -> bool {
        let mut chars = self.raw.chars();
        chars.next() == Some(self.separator) && chars.next().is_none()
    }

    /// The path with its last segment removed, or `None` when the path has
    /// a single segment (its parent is the root).
    pub fn parent(&self) -> Option<&'a str> {
        self.raw.rsplit_once(self.separator).map(|(parent, _)| parent)
    }

    /// The parent segments and the final segment.
    pub fn split_last(&self) -> (Vec<&'a str>, &'a str) {
        match self.raw.rsplit_once(self.separator) {
            Some((parent, last)) => (parent.split(self.separator).collect(), last),
            None => (Vec::new(), self.raw),
        }
    }

    /// Find the value this path addresses in `tree` without modifying it.
    ///
    /// Fails if a segment before the last is not a mapping. The root is not a
    /// `Value`; callers check `is_root` first.
    pub fn resolve<'t>(&self, tree: &'t Tree) -> Result<Option<&'t Value>> {
        let (parents, last) = self.split_last();

        let mut current = tree;
        for segment in parents {
            current = match current.get(segment) {
                Some(Value::Object(map)) => map,
                _ => return Err(StateError::InvalidPath(self.raw.to_string())),
            };
        }

        Ok(current.get(last))
    }

    /// Every prefix of the path, shortest first, ending with the path itself.
    pub fn ancestors(&self) -> Vec<&'a str> {
        let mut chain: Vec<&'a str> = self
            .raw
            .char_indices()
            .filter(|(_, c)| *c == self.separator)
            .map(|(i, _)| &self.raw[..i])
            .collect();
        chain.push(self.raw);
        chain
    }
}

impl fmt::Display for KeyPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

/// Expand a key path into its ancestor chain.
///
/// ```
/// use state_tree::path::expand_tree;
///
/// assert_eq!(expand_tree("foo.bar.baz", '.'), ["foo", "foo.bar", "foo.bar.baz"]);
/// ```
pub fn expand_tree(path: &str, separator: char) -> Vec<String> {
    KeyPath::new(path, separator)
        .ancestors()
        .into_iter()
        .map(str::to_string)
        .collect()
}
