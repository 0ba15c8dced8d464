use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A guild (workspace) resolved through the platform directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

/// A guild member with the display fields the relay needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// The platform directory: resolve entities by opaque ID, create and edit
/// channels. Absent entities resolve to `None`; transport failures are `Err`.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn guild(&self, guild_id: &str) -> Result<Option<Guild>>;

    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Option<Member>>;

    async fn channel(&self, channel_id: &str) -> Result<Option<Channel>>;

    async fn create_text_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<Channel>;

    /// Rename and/or relocate a channel.
    async fn edit_channel(
        &self,
        channel_id: &str,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<()>;
}
