use crate::Database;
use crate::models::{ParticipantRow, RoomRow};
use anyhow::Result;
use rusqlite::Connection;

const ROOM_SELECT: &str = "SELECT r.id, r.guild_id, r.channel_id, r.creator_username,
        r.creator_discord_id, r.status, rs.name, r.created_at
     FROM rooms r
     INNER JOIN room_statuses rs ON r.status = rs.id";

impl Database {
    // -- Rooms --

    pub fn insert_room(
        &self,
        guild_id: &str,
        channel_id: &str,
        creator_username: &str,
        creator_discord_id: &str,
        status: i64,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rooms (guild_id, channel_id, creator_username, creator_discord_id, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![guild_id, channel_id, creator_username, creator_discord_id, status],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All rooms created by this user, joined with their status names,
    /// oldest first.
    pub fn rooms_by_creator(&self, creator_discord_id: &str) -> Result<Vec<RoomRow>> {
        self.with_conn(|conn| {
            let sql = format!("{ROOM_SELECT} WHERE r.creator_discord_id = ?1 ORDER BY r.id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([creator_discord_id], room_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn room_by_id(&self, id: i64) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| {
            let sql = format!("{ROOM_SELECT} WHERE r.id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([id], room_from_row).optional()
        })
    }

    /// Reverse mapping from the bound platform channel to the creator's
    /// identity.
    pub fn creator_by_channel(&self, channel_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT creator_discord_id FROM rooms WHERE channel_id = ?1",
                [channel_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Mutate a room's status. Returns the affected row count; 0 means the
    /// room does not exist.
    pub fn set_room_status(&self, id: i64, status: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE rooms SET status = ?1 WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            Ok(n)
        })
    }

    // -- Participants --

    /// Register a participant. Duplicate pairs are ignored; returns true when
    /// a new row was inserted.
    pub fn add_participant(&self, room_id: i64, user_discord_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO room_participants (room_id, user_discord_id) VALUES (?1, ?2)",
                rusqlite::params![room_id, user_discord_id],
            )?;
            Ok(n > 0)
        })
    }

    /// Participants of a room in first-seen order.
    pub fn participants(&self, room_id: i64) -> Result<Vec<ParticipantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT room_id, user_discord_id, joined_at
                 FROM room_participants WHERE room_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([room_id], |row| {
                    Ok(ParticipantRow {
                        room_id: row.get(0)?,
                        user_discord_id: row.get(1)?,
                        joined_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn room_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<RoomRow, rusqlite::Error> {
    Ok(RoomRow {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        channel_id: row.get(2)?,
        creator_username: row.get(3)?,
        creator_discord_id: row.get(4)?,
        status: row.get(5)?,
        status_name: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
