use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use ghostchat_relay::ChatroomManager;
use ghostchat_types::embeds::{COLOR_ERROR, Embed, FOOTER_TEXT};

use crate::handlers;
use crate::interaction::{Interaction, InteractionKind, InteractionResponse};

/// Shared dependencies handed to every handler.
pub struct Context {
    pub manager: Arc<ChatroomManager>,
    /// Guild chatrooms are created in.
    pub guild_id: String,
    /// Category new chatroom channels are parented under.
    pub category_id: String,
}

#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn run(&self, ctx: &Context, interaction: &Interaction) -> InteractionResponse;
}

/// The interaction routing tables: commands, buttons, and modals keyed by
/// string ID. Built once at startup and passed by reference into the router;
/// nothing here is mutable afterwards.
pub struct Registry {
    commands: HashMap<String, Arc<dyn InteractionHandler>>,
    buttons: HashMap<String, Arc<dyn InteractionHandler>>,
    modals: HashMap<String, Arc<dyn InteractionHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            buttons: HashMap::new(),
            modals: HashMap::new(),
        }
    }

    /// The standard Ghost Chat surface: `chat create`, `chat reply`, the
    /// `reply.modal` prompt, and the `chatroom.close` button.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register_command("chat create", Arc::new(handlers::ChatCreate));
        registry.register_command("chat reply", Arc::new(handlers::ChatReply));
        registry.register_modal("reply.modal", Arc::new(handlers::ReplyModal));
        registry.register_button("chatroom.close", Arc::new(handlers::CloseButton));
        registry
    }

    pub fn register_command(&mut self, name: &str, handler: Arc<dyn InteractionHandler>) {
        self.commands.insert(name.to_string(), handler);
    }

    pub fn register_button(&mut self, custom_id: &str, handler: Arc<dyn InteractionHandler>) {
        self.buttons.insert(custom_id.to_string(), handler);
    }

    pub fn register_modal(&mut self, custom_id: &str, handler: Arc<dyn InteractionHandler>) {
        self.modals.insert(custom_id.to_string(), handler);
    }

    pub async fn dispatch(&self, ctx: &Context, interaction: &Interaction) -> InteractionResponse {
        let table = match interaction.kind {
            InteractionKind::Command => &self.commands,
            InteractionKind::Button => &self.buttons,
            InteractionKind::ModalSubmit => &self.modals,
        };

        match table.get(&interaction.name) {
            Some(handler) => handler.run(ctx, interaction).await,
            None => {
                warn!("No handler registered for {:?} {}", interaction.kind, interaction.name);
                InteractionResponse::ephemeral(
                    Embed::new()
                        .title("Failed To Execute")
                        .description("I can't execute that action for you.")
                        .color(COLOR_ERROR)
                        .footer(FOOTER_TEXT)
                        .timestamp_now(),
                )
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
