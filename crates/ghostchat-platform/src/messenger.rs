use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ghostchat_types::embeds::OutboundMessage;

/// A message read back from a channel's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub timestamp: String,
    /// Attachment URLs, in upload order.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Platform-generated notice (e.g. the pin announcement), not user
    /// content.
    #[serde(default)]
    pub system: bool,
}

/// The notification sink: per-channel and per-user message delivery, plus the
/// history read used for transcript export. Send operations return the
/// delivered message's platform ID.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_channel_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<String>;

    /// Deliver into the user's private context.
    async fn send_direct_message(
        &self,
        user_id: &str,
        message: &OutboundMessage,
    ) -> Result<String>;

    async fn pin_message(&self, channel_id: &str, message_id: &str) -> Result<()>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()>;

    /// Channel history, oldest first. `limit = None` fetches everything.
    async fn channel_messages(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChannelMessage>>;
}
