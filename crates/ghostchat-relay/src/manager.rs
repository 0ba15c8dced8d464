use std::sync::Arc;

use tracing::{info, warn};

use ghostchat_db::Database;
use ghostchat_db::models::RoomRow;
use ghostchat_platform::directory::{ChannelKind, Directory};
use ghostchat_platform::messenger::Messenger;
use ghostchat_platform::transcript::{ExportOptions, TranscriptExporter};
use ghostchat_types::embeds::{
    ANONYMOUS_PERSONA, ActionButton, COLOR_RELAY, Embed, FOOTER_TEXT, OutboundMessage,
};
use ghostchat_types::error::{RelayError, RelayResult};
use ghostchat_types::events::LifecycleEvent;
use ghostchat_types::models::{
    ClosedRoom, CreatedRoom, ReplyDelivery, RoomId, RoomRecord, RoomSearch, RoomStatus,
};

use crate::events::LifecycleBus;

/// The chatroom lifecycle and relay manager.
///
/// Owns chatroom creation, lookup, status transitions, the participant
/// registry, message relay with identity redaction, and closure with
/// transcript fan-out. Records are fetched fresh from the store on every
/// call; the manager itself holds no per-room state.
///
/// Concurrency: there is no per-room coordination. Two concurrent `reply`
/// calls on the same room may interleave their read-modify-write of status
/// and participant registration; the duplicate participant insert is absorbed
/// by the store's unique constraint and the double status transition targets
/// the same state. `close` racing a `reply` can deliver into a channel that
/// is already being archived. Callers needing stronger ordering must
/// serialize per room themselves.
pub struct ChatroomManager {
    db: Arc<Database>,
    directory: Arc<dyn Directory>,
    messenger: Arc<dyn Messenger>,
    exporter: Arc<dyn TranscriptExporter>,
    events: LifecycleBus,
    /// Closed channels are relocated here when configured.
    archive_category_id: Option<String>,
}

impl ChatroomManager {
    pub fn new(
        db: Arc<Database>,
        directory: Arc<dyn Directory>,
        messenger: Arc<dyn Messenger>,
        exporter: Arc<dyn TranscriptExporter>,
        events: LifecycleBus,
        archive_category_id: Option<String>,
    ) -> Self {
        Self { db, directory, messenger, exporter, events, archive_category_id }
    }

    pub fn events(&self) -> &LifecycleBus {
        &self.events
    }

    /// Run a store query off the async runtime. Failures are logged and
    /// surface as `RelayError::Persistence`; nothing is retried.
    async fn with_db<T, F>(&self, f: F) -> RelayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| RelayError::Persistence(anyhow::anyhow!("blocking task join: {e}")))?
            .map_err(|e| {
                tracing::error!("Store query failed: {e:#}");
                RelayError::Persistence(e)
            })
    }

    /// Create a new chatroom for `creator_id` under `category_id`.
    ///
    /// The one-open-chatroom-per-creator invariant is the caller's
    /// precondition; it is not re-checked here.
    pub async fn create(
        &self,
        guild_id: &str,
        creator_id: &str,
        category_id: &str,
    ) -> RelayResult<CreatedRoom> {
        let guild = self
            .directory
            .guild(guild_id)
            .await
            .map_err(RelayError::Platform)?
            .ok_or(RelayError::Resolution { what: "guild", id: guild_id.to_string() })?;
        let creator = self
            .directory
            .member(guild_id, creator_id)
            .await
            .map_err(RelayError::Platform)?
            .ok_or(RelayError::Resolution { what: "member", id: creator_id.to_string() })?;
        let category = self
            .directory
            .channel(category_id)
            .await
            .map_err(RelayError::Platform)?
            .filter(|c| c.kind == ChannelKind::Category)
            .ok_or(RelayError::Resolution { what: "category", id: category_id.to_string() })?;

        let name = format!("chatroom-{}", creator.username).to_lowercase();
        let channel = self
            .directory
            .create_text_channel(&guild.id, &name, &category.id)
            .await
            .map_err(RelayError::Platform)?;

        let announcement = OutboundMessage::from_embed(
            Embed::new()
                .author(creator.username.clone(), creator.avatar_url.clone())
                .description(format!(
                    "**{u}** has created this chatroom. All messages sent here will be \
                     anonymous and relayed back to **{u}**.",
                    u = creator.username
                ))
                .color(COLOR_RELAY)
                .footer(FOOTER_TEXT)
                .timestamp_now(),
        )
        .with_button(ActionButton::close());

        let initial_id = self
            .messenger
            .send_channel_message(&channel.id, &announcement)
            .await
            .map_err(RelayError::Platform)?;
        self.messenger
            .pin_message(&channel.id, &initial_id)
            .await
            .map_err(RelayError::Platform)?;

        // Best-effort: drop the platform's system pin notice.
        match self.messenger.channel_messages(&channel.id, Some(1)).await {
            Ok(messages) => {
                if let Some(last) = messages.last().filter(|m| m.system) {
                    if let Err(e) = self.messenger.delete_message(&channel.id, &last.id).await {
                        warn!("Failed to delete chatroom system pin message: {e:#}");
                    }
                }
            }
            Err(e) => warn!("Failed to read back chatroom history after pin: {e:#}"),
        }

        let room_id = {
            let guild_id = guild.id.clone();
            let channel_id = channel.id.clone();
            let username = creator.username.clone();
            let creator_id = creator.id.clone();
            self.with_db(move |db| {
                let id = db.insert_room(
                    &guild_id,
                    &channel_id,
                    &username,
                    &creator_id,
                    RoomStatus::Opened.as_i64(),
                )?;
                // The creator is a participant from the start.
                db.add_participant(id, &creator_id)?;
                Ok(id)
            })
            .await?
        };

        info!(
            "Created chatroom #{} ({}) in {} ({}) for {} ({})",
            name, channel.id, guild.name, guild.id, creator.username, creator.id
        );

        self.events.emit(LifecycleEvent::ChatroomCreate {
            room_id,
            guild_id: guild.id,
            channel_id: channel.id.clone(),
            creator_id: creator.id,
            creator_username: creator.username,
        });

        Ok(CreatedRoom { room_id, channel_id: channel.id, channel_name: name })
    }

    /// The single read path: rooms joined with status names, `None` when
    /// nothing matches.
    pub async fn get(&self, search: RoomSearch) -> RelayResult<Option<Vec<RoomRecord>>> {
        let rows = self
            .with_db(move |db| match &search {
                RoomSearch::Creator(user_id) => db.rooms_by_creator(user_id),
                RoomSearch::Id(room_id) => Ok(db.room_by_id(*room_id)?.into_iter().collect()),
            })
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }
        let records = rows
            .into_iter()
            .map(record_from_row)
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(RelayError::Persistence)?;
        Ok(Some(records))
    }

    /// Reverse mapping from a guild channel to the creator who owns it.
    pub async fn creator(&self, channel_id: &str) -> RelayResult<Option<String>> {
        let channel_id = channel_id.to_string();
        self.with_db(move |db| db.creator_by_channel(&channel_id)).await
    }

    /// Relay a message into the chatroom channel AND the creator's private
    /// context. `anonymous` is the caller's decision, made from where the
    /// message originated.
    ///
    /// Missing or closed rooms are a logged no-op, not an error.
    pub async fn reply(
        &self,
        room_id: RoomId,
        sender_id: &str,
        body: &str,
        anonymous: bool,
    ) -> RelayResult<Option<ReplyDelivery>> {
        let Some(room) = self.with_db(move |db| db.room_by_id(room_id)).await? else {
            warn!("Tried to relay into chatroom {room_id}, but it does not exist");
            return Ok(None);
        };
        let status = room_status(&room).map_err(RelayError::Persistence)?;
        if status.is_closed() {
            warn!("Tried to relay into chatroom {room_id}, but it is already closed");
            return Ok(None);
        }

        // First relayed reply moves the room out of Opened.
        if status == RoomStatus::Opened {
            self.with_db(move |db| {
                db.set_room_status(room_id, RoomStatus::InProgress.as_i64())?;
                Ok(())
            })
            .await?;
        }

        {
            let sender = sender_id.to_string();
            self.with_db(move |db| {
                db.add_participant(room_id, &sender)?;
                Ok(())
            })
            .await?;
        }

        let embed = self.relay_embed(&room, sender_id, body, anonymous).await;
        let message = OutboundMessage::from_embed(embed);

        let channel_message_id = self
            .messenger
            .send_channel_message(&room.channel_id, &message)
            .await
            .map_err(RelayError::Platform)?;
        let direct_message_id = self
            .messenger
            .send_direct_message(&room.creator_discord_id, &message)
            .await
            .map_err(RelayError::Platform)?;

        Ok(Some(ReplyDelivery { channel_message_id, direct_message_id }))
    }

    async fn relay_embed(
        &self,
        room: &RoomRow,
        sender_id: &str,
        body: &str,
        anonymous: bool,
    ) -> Embed {
        let embed = Embed::new()
            .description(body)
            .color(COLOR_RELAY)
            .footer(FOOTER_TEXT)
            .timestamp_now();

        if anonymous {
            return embed.author(ANONYMOUS_PERSONA, None);
        }

        match self.directory.member(&room.guild_id, sender_id).await {
            Ok(Some(member)) => embed.author(member.username, member.avatar_url),
            // Non-anonymous messages come from the creator's private context;
            // fall back to the denormalized handle when the directory has
            // nothing.
            Ok(None) => embed.author(room.creator_username.clone(), None),
            Err(e) => {
                warn!("Failed to resolve sender {sender_id} for relay embed: {e:#}");
                embed.author(room.creator_username.clone(), None)
            }
        }
    }

    /// Close a chatroom: export the transcript, notify every participant,
    /// archive the channel, then mutate status. Notification and archival are
    /// best-effort; the status mutation is authoritative.
    ///
    /// Missing or already-closed rooms return `None` with no side effects.
    pub async fn close(&self, room_id: RoomId) -> RelayResult<Option<ClosedRoom>> {
        let Some(room) = self.with_db(move |db| db.room_by_id(room_id)).await? else {
            warn!("Tried to close chatroom {room_id}, but it does not exist");
            return Ok(None);
        };
        let status = room_status(&room).map_err(RelayError::Persistence)?;
        if status.is_closed() {
            warn!("Tried to close chatroom {room_id}, but it is already closed");
            return Ok(None);
        }

        let participants = self.with_db(move |db| db.participants(room_id)).await?;

        let transcript = match self
            .exporter
            .export(
                &room.channel_id,
                &ExportOptions::full(format!("chatroom-{room_id}-transcript.txt")),
            )
            .await
        {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Transcript export failed for chatroom {room_id}: {e:#}");
                None
            }
        };

        let notice = Embed::new()
            .title("Chatroom Closed")
            .description(
                "This chatroom has been closed. A transcript of the conversation is included below.",
            )
            .color(COLOR_RELAY)
            .footer(FOOTER_TEXT)
            .timestamp_now();
        let mut message = OutboundMessage::from_embed(notice);
        if let Some(t) = &transcript {
            message.content = Some(format!("{}\n```\n{}```", t.filename, t.body));
        }

        let mut notified = 0usize;
        for participant in &participants {
            match self
                .messenger
                .send_direct_message(&participant.user_discord_id, &message)
                .await
            {
                Ok(_) => notified += 1,
                Err(e) => warn!(
                    "Failed to deliver closure notice to {} for chatroom {room_id}: {e:#}",
                    participant.user_discord_id
                ),
            }
        }

        // Archive the channel: rename and relocate, both best-effort.
        let closed_name = match self.directory.channel(&room.channel_id).await {
            Ok(Some(channel)) => format!("closed-{}", channel.name),
            _ => format!("closed-chatroom-{room_id}"),
        };
        if let Err(e) = self
            .directory
            .edit_channel(&room.channel_id, Some(&closed_name), self.archive_category_id.as_deref())
            .await
        {
            warn!("Failed to archive channel {} for chatroom {room_id}: {e:#}", room.channel_id);
        }

        self.with_db(move |db| {
            db.set_room_status(room_id, RoomStatus::Closed.as_i64())?;
            Ok(())
        })
        .await?;

        info!(
            "Closed chatroom {room_id} ({}): {notified}/{} participants notified",
            room.channel_id,
            participants.len()
        );

        self.events.emit(LifecycleEvent::ChatroomClose {
            room_id,
            channel_id: room.channel_id,
            participants: participants.len(),
            notified,
        });

        Ok(Some(ClosedRoom { room_id, participants: participants.len(), notified }))
    }

    /// Registered participant identities in first-seen order, `None` when
    /// the room is unknown.
    pub async fn participants(&self, room_id: RoomId) -> RelayResult<Option<Vec<String>>> {
        let result = self
            .with_db(move |db| {
                if db.room_by_id(room_id)?.is_none() {
                    return Ok(None);
                }
                let ids = db
                    .participants(room_id)?
                    .into_iter()
                    .map(|p| p.user_discord_id)
                    .collect();
                Ok(Some(ids))
            })
            .await?;
        Ok(result)
    }
}

fn room_status(row: &RoomRow) -> anyhow::Result<RoomStatus> {
    RoomStatus::from_i64(row.status)
        .ok_or_else(|| anyhow::anyhow!("room {} has unknown status {}", row.id, row.status))
}

fn record_from_row(row: RoomRow) -> anyhow::Result<RoomRecord> {
    let status = room_status(&row)?;
    Ok(RoomRecord {
        id: row.id,
        guild_id: row.guild_id,
        channel_id: row.channel_id,
        creator_username: row.creator_username,
        creator_id: row.creator_discord_id,
        status,
        status_name: row.status_name,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlatform;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use ghostchat_platform::transcript::{ChannelLogExporter, Transcript};

    const GUILD: &str = "g1";
    const CATEGORY: &str = "c1";
    const CREATOR: &str = "u1";
    const RESPONDER: &str = "u2";

    fn platform() -> MockPlatform {
        MockPlatform::new()
            .with_guild(GUILD, "Ghost Guild")
            .with_member(GUILD, CREATOR, "Alice")
            .with_member(GUILD, RESPONDER, "Bob")
            .with_category(CATEGORY, "chatrooms")
            .with_category("archive", "closed")
    }

    fn manager_on(platform: MockPlatform) -> ChatroomManager {
        let messenger = Arc::new(platform.clone());
        ChatroomManager::new(
            Arc::new(Database::open_in_memory().unwrap()),
            Arc::new(platform),
            messenger.clone(),
            Arc::new(ChannelLogExporter::new(messenger)),
            LifecycleBus::new(),
            Some("archive".to_string()),
        )
    }

    fn manager() -> (ChatroomManager, MockPlatform) {
        let platform = platform();
        (manager_on(platform.clone()), platform)
    }

    fn author_name(message: &OutboundMessage) -> &str {
        message.embeds[0].author.as_ref().map(|a| a.name.as_str()).unwrap()
    }

    #[tokio::test]
    async fn unknown_rooms_are_null_not_errors() {
        let (manager, _) = manager();

        assert!(manager.get(RoomSearch::Id(42)).await.unwrap().is_none());
        assert!(manager.get(RoomSearch::Creator("ghost".into())).await.unwrap().is_none());
        assert!(manager.creator("no-such-channel").await.unwrap().is_none());
        assert!(manager.reply(42, RESPONDER, "hello", true).await.unwrap().is_none());
        assert!(manager.close(42).await.unwrap().is_none());
        assert!(manager.participants(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_provisions_channel_and_room() {
        let (manager, platform) = manager();
        let mut events = manager.events().subscribe();

        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();
        assert_eq!(created.channel_name, "chatroom-alice");

        let channel = platform.channel_named("chatroom-alice").unwrap();
        assert_eq!(channel.id, created.channel_id);
        assert_eq!(channel.parent_id.as_deref(), Some(CATEGORY));

        // announcement sent, pinned, close button attached
        let sends = platform.channel_sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, created.channel_id);
        assert_eq!(sends[0].1.buttons[0].custom_id, "chatroom.close");
        assert_eq!(platform.pinned().len(), 1);

        // the store row is Opened and the creator is already a participant
        let rooms = manager
            .get(RoomSearch::Creator(CREATOR.into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].status, RoomStatus::Opened);
        assert_eq!(rooms[0].status_name, "Opened");
        assert_eq!(rooms[0].creator_id, CREATOR);
        assert_eq!(
            manager.participants(created.room_id).await.unwrap().unwrap(),
            vec![CREATOR.to_string()]
        );

        // reverse mapping and lifecycle event
        assert_eq!(
            manager.creator(&created.channel_id).await.unwrap().as_deref(),
            Some(CREATOR)
        );
        match events.try_recv().unwrap() {
            LifecycleEvent::ChatroomCreate { room_id, creator_username, .. } => {
                assert_eq!(room_id, created.room_id);
                assert_eq!(creator_username, "Alice");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_fails_on_unresolvable_references() {
        let (manager, _) = manager();

        let err = manager.create("missing", CREATOR, CATEGORY).await.unwrap_err();
        assert!(matches!(err, RelayError::Resolution { what: "guild", .. }));

        let err = manager.create(GUILD, "stranger", CATEGORY).await.unwrap_err();
        assert!(matches!(err, RelayError::Resolution { what: "member", .. }));

        let err = manager.create(GUILD, CREATOR, "missing").await.unwrap_err();
        assert!(matches!(err, RelayError::Resolution { what: "category", .. }));
    }

    #[tokio::test]
    async fn reply_relays_twice_and_redacts_when_anonymous() {
        let (manager, platform) = manager();
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();

        let delivery = manager
            .reply(created.room_id, RESPONDER, "hello", true)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(delivery.channel_message_id, delivery.direct_message_id);

        // one relay into the channel (after the announcement), one DM to the creator
        let channel_sends = platform.channel_sends();
        assert_eq!(channel_sends.len(), 2);
        let (channel_id, relayed) = &channel_sends[1];
        assert_eq!(channel_id, &created.channel_id);
        assert_eq!(author_name(relayed), ANONYMOUS_PERSONA);
        assert_eq!(relayed.embeds[0].description.as_deref(), Some("hello"));

        let dms = platform.direct_sends_to(CREATOR);
        assert_eq!(dms.len(), 1);
        assert_eq!(author_name(&dms[0]), ANONYMOUS_PERSONA);

        // first reply flips Opened -> InProgress and registers the sender
        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::InProgress);
        assert_eq!(
            manager.participants(created.room_id).await.unwrap().unwrap(),
            vec![CREATOR.to_string(), RESPONDER.to_string()]
        );
    }

    #[tokio::test]
    async fn non_anonymous_reply_shows_the_sender() {
        let (manager, platform) = manager();
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();

        manager
            .reply(created.room_id, CREATOR, "it's me", false)
            .await
            .unwrap()
            .unwrap();

        let (_, relayed) = platform.channel_sends().last().cloned().unwrap();
        assert_eq!(author_name(&relayed), "Alice");
        assert!(relayed.embeds[0].author.as_ref().unwrap().icon_url.is_some());
    }

    #[tokio::test]
    async fn repeated_replies_do_not_duplicate_state() {
        let (manager, _) = manager();
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();

        manager.reply(created.room_id, RESPONDER, "one", true).await.unwrap().unwrap();
        manager.reply(created.room_id, RESPONDER, "two", true).await.unwrap().unwrap();

        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::InProgress);
        assert_eq!(
            manager.participants(created.room_id).await.unwrap().unwrap(),
            vec![CREATOR.to_string(), RESPONDER.to_string()]
        );
    }

    #[tokio::test]
    async fn close_notifies_participants_and_archives() {
        let (manager, platform) = manager();
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();
        manager.reply(created.room_id, RESPONDER, "hello", true).await.unwrap().unwrap();

        let closed = manager.close(created.room_id).await.unwrap().unwrap();
        assert_eq!(closed.participants, 2);
        assert_eq!(closed.notified, 2);

        // each participant got the transcript exactly once
        for user in [CREATOR, RESPONDER] {
            let notices: Vec<_> = platform
                .direct_sends_to(user)
                .into_iter()
                .filter(|m| {
                    m.embeds
                        .first()
                        .and_then(|e| e.title.as_deref())
                        .is_some_and(|t| t == "Chatroom Closed")
                })
                .collect();
            assert_eq!(notices.len(), 1, "expected one closure notice for {user}");
            assert!(notices[0].content.as_ref().unwrap().contains("hello"));
        }

        // channel renamed with the closed- prefix and moved to the archive
        let (channel_id, name, parent) = platform.channel_edits().pop().unwrap();
        assert_eq!(channel_id, created.channel_id);
        assert_eq!(name.as_deref(), Some("closed-chatroom-alice"));
        assert_eq!(parent.as_deref(), Some("archive"));

        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::Closed);
    }

    #[tokio::test]
    async fn second_close_is_a_failure_with_no_side_effects() {
        let (manager, platform) = manager();
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();

        assert!(manager.close(created.room_id).await.unwrap().is_some());
        let dms_after_first = platform.direct_sends().len();
        let edits_after_first = platform.channel_edits().len();

        assert!(manager.close(created.room_id).await.unwrap().is_none());
        assert_eq!(platform.direct_sends().len(), dms_after_first);
        assert_eq!(platform.channel_edits().len(), edits_after_first);
    }

    #[tokio::test]
    async fn reply_on_closed_room_is_inert() {
        let (manager, platform) = manager();
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();
        manager.close(created.room_id).await.unwrap().unwrap();

        let sends_before = platform.channel_sends().len();
        let dms_before = platform.direct_sends().len();

        assert!(
            manager
                .reply(created.room_id, RESPONDER, "too late", true)
                .await
                .unwrap()
                .is_none()
        );

        assert_eq!(platform.channel_sends().len(), sends_before);
        assert_eq!(platform.direct_sends().len(), dms_before);
        assert_eq!(
            manager.participants(created.room_id).await.unwrap().unwrap(),
            vec![CREATOR.to_string()]
        );
        // status never regresses out of Closed
        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::Closed);
    }

    #[tokio::test]
    async fn failed_fanout_never_blocks_the_status_mutation() {
        let platform = platform().fail_direct_messages_to(RESPONDER);
        let manager = manager_on(platform.clone());
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();
        manager.reply(created.room_id, RESPONDER, "hi", true).await.unwrap().unwrap();

        let closed = manager.close(created.room_id).await.unwrap().unwrap();
        assert_eq!(closed.participants, 2);
        assert_eq!(closed.notified, 1);

        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::Closed);
    }

    struct FailingExporter;

    #[async_trait]
    impl TranscriptExporter for FailingExporter {
        async fn export(&self, _: &str, _: &ExportOptions) -> anyhow::Result<Transcript> {
            Err(anyhow!("exporter offline"))
        }
    }

    #[tokio::test]
    async fn failed_export_still_closes_and_notifies() {
        let platform = platform();
        let messenger = Arc::new(platform.clone());
        let manager = ChatroomManager::new(
            Arc::new(Database::open_in_memory().unwrap()),
            Arc::new(platform.clone()),
            messenger,
            Arc::new(FailingExporter),
            LifecycleBus::new(),
            None,
        );

        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();
        let closed = manager.close(created.room_id).await.unwrap().unwrap();
        assert_eq!(closed.notified, 1);

        // notice delivered without transcript content
        let notices = platform.direct_sends_to(CREATOR);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].content.is_none());

        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::Closed);
    }

    #[tokio::test]
    async fn full_relay_scenario() {
        let (manager, platform) = manager();

        // create: Opened, participants = [creator]
        let created = manager.create(GUILD, CREATOR, CATEGORY).await.unwrap();
        let room = &manager.get(RoomSearch::Creator(CREATOR.into())).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::Opened);
        assert_eq!(
            manager.participants(created.room_id).await.unwrap().unwrap(),
            vec![CREATOR.to_string()]
        );

        // anonymous reply from the responder: InProgress, both deliveries redacted
        manager.reply(created.room_id, RESPONDER, "hello", true).await.unwrap().unwrap();
        let room = &manager.get(RoomSearch::Id(created.room_id)).await.unwrap().unwrap()[0];
        assert_eq!(room.status, RoomStatus::InProgress);
        assert_eq!(
            manager.participants(created.room_id).await.unwrap().unwrap(),
            vec![CREATOR.to_string(), RESPONDER.to_string()]
        );
        let (_, relayed) = platform.channel_sends().last().cloned().unwrap();
        assert_eq!(author_name(&relayed), ANONYMOUS_PERSONA);
        assert_eq!(author_name(&platform.direct_sends_to(CREATOR)[0]), ANONYMOUS_PERSONA);

        // close: Closed, one transcript notice per participant, second close fails
        let closed = manager.close(created.room_id).await.unwrap().unwrap();
        assert_eq!((closed.participants, closed.notified), (2, 2));
        assert!(manager.close(created.room_id).await.unwrap().is_none());
    }
}
