use serde::{Deserialize, Serialize};

/// Store-assigned room identifier (SQLite rowid).
pub type RoomId = i64;

/// Lifecycle status of a chatroom. Transitions are one-directional:
/// Opened -> InProgress -> Closed. There is no reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Opened,
    InProgress,
    Closed,
}

impl RoomStatus {
    /// The integer stored in `rooms.status`, matching the `room_statuses`
    /// lookup table.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Opened => 1,
            Self::InProgress => 2,
            Self::Closed => 3,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            1 => Some(Self::Opened),
            2 => Some(Self::InProgress),
            3 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Human-readable name, identical to the `room_statuses.name` seed rows.
    pub fn name(self) -> &'static str {
        match self {
            Self::Opened => "Opened",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// A room row joined with its status name — the shape every read path
/// returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub guild_id: String,
    pub channel_id: String,
    pub creator_username: String,
    pub creator_id: String,
    pub status: RoomStatus,
    pub status_name: String,
    pub created_at: String,
}

/// The two lookup modes of the single read path.
#[derive(Debug, Clone)]
pub enum RoomSearch {
    /// All rooms created by this user, newest last.
    Creator(String),
    /// The room with this store-assigned ID.
    Id(RoomId),
}

/// Result of a successful `create`: the new channel plus its store row.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub channel_id: String,
    pub channel_name: String,
}

/// Both delivery confirmations from a relayed reply: one into the guild
/// channel, one into the creator's private context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDelivery {
    pub channel_message_id: String,
    pub direct_message_id: String,
}

/// Outcome of a successful closure. Notification counts are best-effort:
/// `notified` may be less than `participants` when individual deliveries
/// failed.
#[derive(Debug, Clone)]
pub struct ClosedRoom {
    pub room_id: RoomId,
    pub participants: usize,
    pub notified: usize,
}
