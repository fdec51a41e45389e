//! Change notifications published by the store.
//!
//! Every capture, project and task write sends one [`StoreEvent`] on an
//! in-process tokio broadcast channel. Subscribers that fall behind receive
//! `RecvError::Lagged` and should treat it as "something changed".

use serde::{Deserialize, Serialize};
use stash_core::enums::CaptureStatus;
use tokio::sync::broadcast;

/// Capacity of the change channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// A change to the store.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A capture was created or its status/draft/progress changed.
    CaptureChanged {
        capture_id: String,
        status: CaptureStatus,
    },
    /// A project was created.
    ProjectCreated { project_id: String },
    /// A task was created or updated.
    TaskChanged { task_id: String },
}

impl StoreEvent {
    /// Whether the event could make a capture pending (the worker's wake-up condition).
    #[must_use]
    pub const fn may_have_pending(&self) -> bool {
        matches!(
            self,
            Self::CaptureChanged {
                status: CaptureStatus::Pending,
                ..
            }
        )
    }
}

/// Type alias for the broadcast sender.
pub type EventSender = broadcast::Sender<StoreEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = broadcast::Receiver<StoreEvent>;

/// Create a new change channel with default capacity.
#[must_use]
pub fn create_event_channel() -> EventSender {
    let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}
