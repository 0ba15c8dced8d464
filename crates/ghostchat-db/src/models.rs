/// Database row types — these map directly to SQLite rows.
/// Distinct from the ghostchat-types API models to keep the DB layer
/// independent.

pub struct RoomRow {
    pub id: i64,
    pub guild_id: String,
    pub channel_id: String,
    pub creator_username: String,
    pub creator_discord_id: String,
    pub status: i64,
    pub status_name: String,
    pub created_at: String,
}

pub struct ParticipantRow {
    pub room_id: i64,
    pub user_discord_id: String,
    pub joined_at: String,
}
