use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Dark red used on relay and announcement embeds.
pub const COLOR_RELAY: u32 = 0x8B0000;
/// Red used on user-facing failure embeds.
pub const COLOR_ERROR: u32 = 0xED4245;
/// Green used on delivery confirmations.
pub const COLOR_SUCCESS: u32 = 0x57F287;

/// Fixed persona shown in place of a redacted sender.
pub const ANONYMOUS_PERSONA: &str = "Anonymous";

/// Footer branding on every embed the relay produces.
pub const FOOTER_TEXT: &str = "Ghost Chat";

/// A rich-embed payload in the platform's wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor { name: name.into(), icon_url });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into(), icon_url: None });
        self
    }

    pub fn timestamp_now(mut self) -> Self {
        self.timestamp = Some(Utc::now().to_rfc3339());
        self
    }
}

/// An action button attached to a message, keyed by the custom ID the
/// interaction router dispatches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionButton {
    pub custom_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl ActionButton {
    /// The "Close" affordance pinned into every chatroom.
    pub fn close() -> Self {
        Self {
            custom_id: "chatroom.close".into(),
            label: "Close".into(),
            emoji: Some("\u{1F512}".into()),
        }
    }
}

/// A full outbound message: plain content, embeds, buttons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub buttons: Vec<ActionButton>,
}

impl OutboundMessage {
    pub fn from_embed(embed: Embed) -> Self {
        Self { embeds: vec![embed], ..Default::default() }
    }

    pub fn with_button(mut self, button: ActionButton) -> Self {
        self.buttons.push(button);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_skipped_on_the_wire() {
        let embed = Embed::new().title("Message Sent").color(COLOR_SUCCESS);
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["title"], "Message Sent");
        assert!(json.get("description").is_none());
        assert!(json.get("author").is_none());
    }

    #[test]
    fn close_button_custom_id_matches_router_key() {
        assert_eq!(ActionButton::close().custom_id, "chatroom.close");
    }
}
