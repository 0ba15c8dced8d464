use async_trait::async_trait;
use tracing::{error, warn};

use ghostchat_types::embeds::{
    ActionButton, COLOR_ERROR, COLOR_SUCCESS, Embed, FOOTER_TEXT,
};
use ghostchat_types::error::RelayError;
use ghostchat_types::models::{RoomRecord, RoomSearch};

use crate::interaction::{Interaction, InteractionResponse, TextInput};
use crate::registry::{Context, InteractionHandler};

fn error_embed(title: &str, description: &str) -> Embed {
    Embed::new()
        .title(title)
        .description(description)
        .color(COLOR_ERROR)
        .footer(FOOTER_TEXT)
        .timestamp_now()
}

fn unexpected_error() -> InteractionResponse {
    InteractionResponse::ephemeral(error_embed(
        "Unexpected Error",
        "An unexpected error occurred. Please try again later.",
    ))
}

fn room_not_found() -> InteractionResponse {
    InteractionResponse::ephemeral(error_embed(
        "Chatroom Does Not Exist",
        "The chatroom you are trying to send a message to does not exist. Please try again.",
    ))
}

/// The caller's open (non-Closed) room, if any.
async fn open_room(ctx: &Context, creator_id: &str) -> Result<Option<RoomRecord>, RelayError> {
    let rooms = ctx.manager.get(RoomSearch::Creator(creator_id.to_string())).await?;
    Ok(rooms
        .into_iter()
        .flatten()
        .find(|room| !room.status.is_closed()))
}

/// `chat create` — only from the user's private context, and only when they
/// have no open chatroom yet.
pub struct ChatCreate;

#[async_trait]
impl InteractionHandler for ChatCreate {
    async fn run(&self, ctx: &Context, interaction: &Interaction) -> InteractionResponse {
        if interaction.in_guild() {
            return InteractionResponse::ephemeral(error_embed(
                "Invalid Channel",
                "This command can only be used in DMs. Please try again in my DMs.",
            ));
        }

        match open_room(ctx, &interaction.user.id).await {
            Ok(Some(_)) => {
                return InteractionResponse::ephemeral(error_embed(
                    "Already in Chatroom",
                    "You are already in a chatroom. Please close your current chatroom \
                     before creating a new one.",
                ));
            }
            Ok(None) => {}
            Err(e) => {
                error!("Failed to look up rooms for {}: {e:#}", interaction.user.id);
                return unexpected_error();
            }
        }

        match ctx
            .manager
            .create(&ctx.guild_id, &interaction.user.id, &ctx.category_id)
            .await
        {
            Ok(_) => InteractionResponse::message(
                Embed::new()
                    .title("Chatroom Created")
                    .description(
                        "Your chatroom has been created. Messages sent here will be relayed \
                         back to the recipients automatically. You can close the chatroom at \
                         any time by clicking the button below.",
                    )
                    .color(ghostchat_types::embeds::COLOR_RELAY)
                    .footer(FOOTER_TEXT)
                    .timestamp_now(),
            )
            .with_button(ActionButton::close()),
            Err(e) => {
                error!("Chatroom creation failed for {}: {e:#}", interaction.user.id);
                InteractionResponse::ephemeral(error_embed(
                    "Unexpected Error",
                    "An unexpected error occurred while creating your chatroom. \
                     Please try again later.",
                ))
            }
        }
    }
}

/// `chat reply` — answers with the text-entry modal.
pub struct ChatReply;

#[async_trait]
impl InteractionHandler for ChatReply {
    async fn run(&self, _ctx: &Context, _interaction: &Interaction) -> InteractionResponse {
        InteractionResponse::Modal {
            custom_id: "reply.modal".to_string(),
            title: "Reply".to_string(),
            inputs: vec![TextInput {
                custom_id: "replyInput".to_string(),
                label: "Message".to_string(),
                placeholder: "Enter your message here...".to_string(),
                required: true,
                paragraph: true,
                min_length: 1,
            }],
        }
    }
}

/// `reply.modal` submit — where the message originated decides everything:
/// in-guild submissions resolve the creator through the channel and are
/// anonymized; private-context submissions come from the creator and are not.
pub struct ReplyModal;

#[async_trait]
impl InteractionHandler for ReplyModal {
    async fn run(&self, ctx: &Context, interaction: &Interaction) -> InteractionResponse {
        let Some(body) = interaction.fields.get("replyInput").filter(|s| !s.is_empty()) else {
            return unexpected_error();
        };

        let creator_id = if interaction.in_guild() {
            let Some(channel_id) = interaction.channel_id.as_deref() else {
                return room_not_found();
            };
            match ctx.manager.creator(channel_id).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    warn!("Reply from channel {channel_id} with no chatroom behind it");
                    return room_not_found();
                }
                Err(e) => {
                    error!("Creator lookup failed for channel {channel_id}: {e:#}");
                    return unexpected_error();
                }
            }
        } else {
            interaction.user.id.clone()
        };

        let room = match open_room(ctx, &creator_id).await {
            Ok(Some(room)) => room,
            Ok(None) => {
                warn!("Tried to reply for creator {creator_id}, but no open chatroom exists");
                return room_not_found();
            }
            Err(e) => {
                error!("Room lookup failed for creator {creator_id}: {e:#}");
                return unexpected_error();
            }
        };

        let anonymous = interaction.in_guild();
        match ctx
            .manager
            .reply(room.id, &interaction.user.id, body, anonymous)
            .await
        {
            Ok(Some(_)) => InteractionResponse::ephemeral(
                Embed::new()
                    .title("Message Sent")
                    .description("Your message has been successfully sent.")
                    .color(COLOR_SUCCESS)
                    .footer(FOOTER_TEXT)
                    .timestamp_now(),
            ),
            Ok(None) => room_not_found(),
            Err(e) => {
                error!("Relay failed for chatroom {}: {e:#}", room.id);
                unexpected_error()
            }
        }
    }
}

/// `chatroom.close` button — works from inside the chatroom channel and from
/// the creator's private context.
pub struct CloseButton;

#[async_trait]
impl InteractionHandler for CloseButton {
    async fn run(&self, ctx: &Context, interaction: &Interaction) -> InteractionResponse {
        let creator_id = if interaction.in_guild() {
            let Some(channel_id) = interaction.channel_id.as_deref() else {
                return room_not_found();
            };
            match ctx.manager.creator(channel_id).await {
                Ok(Some(id)) => id,
                Ok(None) => return room_not_found(),
                Err(e) => {
                    error!("Creator lookup failed for channel {channel_id}: {e:#}");
                    return unexpected_error();
                }
            }
        } else {
            interaction.user.id.clone()
        };

        let room = match open_room(ctx, &creator_id).await {
            Ok(Some(room)) => room,
            Ok(None) => {
                return InteractionResponse::ephemeral(error_embed(
                    "Chatroom Already Closed",
                    "There is no open chatroom to close.",
                ));
            }
            Err(e) => {
                error!("Room lookup failed for creator {creator_id}: {e:#}");
                return unexpected_error();
            }
        };

        match ctx.manager.close(room.id).await {
            Ok(Some(closed)) => InteractionResponse::message(
                Embed::new()
                    .title("Chatroom Closed")
                    .description(format!(
                        "The chatroom has been closed and the transcript was sent to \
                         {} participant(s).",
                        closed.notified
                    ))
                    .color(ghostchat_types::embeds::COLOR_RELAY)
                    .footer(FOOTER_TEXT)
                    .timestamp_now(),
            ),
            Ok(None) => InteractionResponse::ephemeral(error_embed(
                "Chatroom Already Closed",
                "This chatroom is already closed.",
            )),
            Err(e) => {
                error!("Close failed for chatroom {}: {e:#}", room.id);
                unexpected_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use ghostchat_db::Database;
    use ghostchat_platform::transcript::ChannelLogExporter;
    use ghostchat_relay::testing::MockPlatform;
    use ghostchat_relay::{ChatroomManager, LifecycleBus};
    use ghostchat_types::embeds::ANONYMOUS_PERSONA;

    use crate::interaction::{Interaction, InteractionKind, InteractionResponse, InteractionUser};
    use crate::registry::{Context, Registry};

    const GUILD: &str = "g1";
    const CATEGORY: &str = "c1";

    fn context() -> (Context, MockPlatform) {
        let platform = MockPlatform::new()
            .with_guild(GUILD, "Ghost Guild")
            .with_member(GUILD, "u1", "Alice")
            .with_member(GUILD, "u2", "Bob")
            .with_category(CATEGORY, "chatrooms");
        let messenger = Arc::new(platform.clone());
        let manager = ChatroomManager::new(
            Arc::new(Database::open_in_memory().unwrap()),
            Arc::new(platform.clone()),
            messenger.clone(),
            Arc::new(ChannelLogExporter::new(messenger)),
            LifecycleBus::new(),
            None,
        );
        (
            Context {
                manager: Arc::new(manager),
                guild_id: GUILD.to_string(),
                category_id: CATEGORY.to_string(),
            },
            platform,
        )
    }

    fn user(id: &str, username: &str) -> InteractionUser {
        InteractionUser { id: id.into(), username: username.into(), avatar_url: None }
    }

    fn dm_command(name: &str, uid: &str) -> Interaction {
        Interaction {
            kind: InteractionKind::Command,
            name: name.into(),
            guild_id: None,
            channel_id: None,
            user: user(uid, uid),
            fields: HashMap::new(),
        }
    }

    fn modal_submit(uid: &str, guild_channel: Option<&str>, body: &str) -> Interaction {
        Interaction {
            kind: InteractionKind::ModalSubmit,
            name: "reply.modal".into(),
            guild_id: guild_channel.map(|_| GUILD.to_string()),
            channel_id: guild_channel.map(str::to_string),
            user: user(uid, uid),
            fields: HashMap::from([("replyInput".to_string(), body.to_string())]),
        }
    }

    fn title(response: &InteractionResponse) -> &str {
        match response {
            InteractionResponse::Message { embeds, .. } => {
                embeds[0].title.as_deref().unwrap_or_default()
            }
            InteractionResponse::Modal { title, .. } => title,
        }
    }

    #[tokio::test]
    async fn unknown_interaction_gets_failure_embed() {
        let (ctx, _) = context();
        let registry = Registry::standard();
        let response = registry.dispatch(&ctx, &dm_command("chat nonsense", "u1")).await;
        assert_eq!(title(&response), "Failed To Execute");
    }

    #[tokio::test]
    async fn create_is_dm_only() {
        let (ctx, _) = context();
        let registry = Registry::standard();

        let mut in_guild = dm_command("chat create", "u1");
        in_guild.guild_id = Some(GUILD.into());
        in_guild.channel_id = Some("somewhere".into());

        let response = registry.dispatch(&ctx, &in_guild).await;
        assert_eq!(title(&response), "Invalid Channel");
    }

    #[tokio::test]
    async fn create_then_duplicate_create_is_rejected() {
        let (ctx, _) = context();
        let registry = Registry::standard();

        let response = registry.dispatch(&ctx, &dm_command("chat create", "u1")).await;
        assert_eq!(title(&response), "Chatroom Created");
        match &response {
            InteractionResponse::Message { buttons, .. } => {
                assert_eq!(buttons[0].custom_id, "chatroom.close");
            }
            _ => panic!("expected message response"),
        }

        let response = registry.dispatch(&ctx, &dm_command("chat create", "u1")).await;
        assert_eq!(title(&response), "Already in Chatroom");
    }

    #[tokio::test]
    async fn reply_command_opens_the_modal() {
        let (ctx, _) = context();
        let registry = Registry::standard();

        let response = registry.dispatch(&ctx, &dm_command("chat reply", "u1")).await;
        match response {
            InteractionResponse::Modal { custom_id, inputs, .. } => {
                assert_eq!(custom_id, "reply.modal");
                assert_eq!(inputs[0].custom_id, "replyInput");
                assert!(inputs[0].required && inputs[0].paragraph);
            }
            _ => panic!("expected modal response"),
        }
    }

    #[tokio::test]
    async fn origin_decides_anonymity() {
        let (ctx, platform) = context();
        let registry = Registry::standard();

        registry.dispatch(&ctx, &dm_command("chat create", "u1")).await;
        let channel = platform.channel_named("chatroom-alice").unwrap();

        // responder inside the guild channel: redacted
        let response = registry
            .dispatch(&ctx, &modal_submit("u2", Some(&channel.id), "hello"))
            .await;
        assert_eq!(title(&response), "Message Sent");
        let (_, relayed) = platform.channel_sends().last().cloned().unwrap();
        assert_eq!(
            relayed.embeds[0].author.as_ref().unwrap().name,
            ANONYMOUS_PERSONA
        );

        // creator from their private context: shown as themselves
        let response = registry.dispatch(&ctx, &modal_submit("u1", None, "hi back")).await;
        assert_eq!(title(&response), "Message Sent");
        let (_, relayed) = platform.channel_sends().last().cloned().unwrap();
        assert_eq!(relayed.embeds[0].author.as_ref().unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn modal_without_room_reports_missing_chatroom() {
        let (ctx, _) = context();
        let registry = Registry::standard();

        let response = registry.dispatch(&ctx, &modal_submit("u1", None, "hello")).await;
        assert_eq!(title(&response), "Chatroom Does Not Exist");
    }

    #[tokio::test]
    async fn close_button_closes_once() {
        let (ctx, platform) = context();
        let registry = Registry::standard();

        registry.dispatch(&ctx, &dm_command("chat create", "u1")).await;
        let channel = platform.channel_named("chatroom-alice").unwrap();

        let mut press = dm_command("chatroom.close", "u2");
        press.kind = InteractionKind::Button;
        press.guild_id = Some(GUILD.into());
        press.channel_id = Some(channel.id.clone());

        let response = registry.dispatch(&ctx, &press).await;
        assert_eq!(title(&response), "Chatroom Closed");

        let response = registry.dispatch(&ctx, &press).await;
        assert_eq!(title(&response), "Chatroom Already Closed");
    }
}
