use serde::{Deserialize, Serialize};

use crate::models::RoomId;

/// Lifecycle events emitted by the relay manager. Consumers subscribe to a
/// broadcast channel; there is no implicit emitter on the manager itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LifecycleEvent {
    /// A chatroom was created and its channel provisioned.
    ChatroomCreate {
        room_id: RoomId,
        guild_id: String,
        channel_id: String,
        creator_id: String,
        creator_username: String,
    },

    /// A chatroom was closed and its transcript fanned out.
    ChatroomClose {
        room_id: RoomId,
        channel_id: String,
        participants: usize,
        notified: usize,
    },
}
