use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS room_statuses (
            id      INTEGER PRIMARY KEY,
            name    TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS rooms (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id            TEXT NOT NULL,
            channel_id          TEXT NOT NULL UNIQUE,
            creator_username    TEXT NOT NULL,
            creator_discord_id  TEXT NOT NULL,
            status              INTEGER NOT NULL REFERENCES room_statuses(id),
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_rooms_creator
            ON rooms(creator_discord_id);

        -- rowid preserves first-seen insertion order for fan-out
        CREATE TABLE IF NOT EXISTS room_participants (
            room_id             INTEGER NOT NULL REFERENCES rooms(id),
            user_discord_id     TEXT NOT NULL,
            joined_at           TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(room_id, user_discord_id)
        );

        -- Seed the status lookup table
        INSERT OR IGNORE INTO room_statuses (id, name) VALUES
            (1, 'Opened'),
            (2, 'In Progress'),
            (3, 'Closed');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
