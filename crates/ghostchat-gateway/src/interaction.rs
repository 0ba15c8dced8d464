use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ghostchat_types::embeds::{ActionButton, Embed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Command,
    Button,
    ModalSubmit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// An inbound user action from the messaging platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// Command name (with subcommand, e.g. `chat create`) or the component /
    /// modal custom ID.
    pub name: String,
    /// Present only when the interaction happened inside a guild channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub user: InteractionUser,
    /// Modal text inputs keyed by their custom IDs.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

impl Interaction {
    /// Whether the action originated inside the guild rather than the user's
    /// private context. This is the anonymization signal.
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

/// A text input inside a modal prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub placeholder: String,
    pub required: bool,
    pub paragraph: bool,
    pub min_length: u32,
}

/// What the surface answers an interaction with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InteractionResponse {
    Message {
        embeds: Vec<Embed>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        buttons: Vec<ActionButton>,
        ephemeral: bool,
    },
    Modal {
        custom_id: String,
        title: String,
        inputs: Vec<TextInput>,
    },
}

impl InteractionResponse {
    pub fn message(embed: Embed) -> Self {
        Self::Message { embeds: vec![embed], buttons: vec![], ephemeral: false }
    }

    pub fn ephemeral(embed: Embed) -> Self {
        Self::Message { embeds: vec![embed], buttons: vec![], ephemeral: true }
    }

    pub fn with_button(self, button: ActionButton) -> Self {
        match self {
            Self::Message { embeds, mut buttons, ephemeral } => {
                buttons.push(button);
                Self::Message { embeds, buttons, ephemeral }
            }
            modal => modal,
        }
    }
}
