//! Subscription types for change notification.

use crate::error::Result;
use crate::types::{Tree, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A change being delivered to a listener.
///
/// `path` is always the full path that was mutated, even when the listener
/// is registered at an ancestor or at the root.
#[derive(Clone, Copy, Debug)]
pub struct Change<'a> {
    pub path: &'a str,
    /// New value. `None` when the path was deleted.
    pub value: Option<&'a Value>,
    /// Previous value. `None` when the path did not exist.
    pub old_value: Option<&'a Value>,
    /// The whole tree as of this listener call.
    pub state: &'a Arc<Tree>,
}

impl Change<'_> {
    /// Owned copy of this change, without the state snapshot.
    pub fn to_event(&self) -> ChangeEvent {
        ChangeEvent {
            path: self.path.to_string(),
            value: self.value.cloned(),
            old_value: self.old_value.cloned(),
        }
    }
}

/// Callback invoked for each matching change.
///
/// An error returned here propagates out of the mutating call and stops the
/// rest of the notification pass.
pub type Listener = Arc<dyn Fn(&Change<'_>) -> Result<()> + Send + Sync>;

/// Unique identifier for a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Owned change, as delivered through a watch channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
}

/// Handle to a channel-backed subscription.
pub struct WatchHandle {
    pub id: SubscriptionId,
    /// Path the subscription is registered at.
    pub path: String,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<ChangeEvent>,
}

impl WatchHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> std::result::Result<ChangeEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> std::result::Result<ChangeEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> std::result::Result<ChangeEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every event currently buffered.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }
}
