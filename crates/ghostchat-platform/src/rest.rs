use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use ghostchat_types::embeds::OutboundMessage;

use crate::directory::{Channel, ChannelKind, Directory, Guild, Member};
use crate::messenger::{ChannelMessage, Messenger};

/// REST client against the messaging platform's HTTP API, implementing both
/// the directory and the notification sink with bot-token bearer auth.
pub struct RestPlatform {
    http: reqwest::Client,
    base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct WireGuild {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    username: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMember {
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireChannel {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    author: WireUser,
    #[serde(default)]
    content: String,
    timestamp: String,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
    /// Non-default message types are platform notices.
    #[serde(rename = "type", default)]
    kind: u8,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    url: String,
}

#[derive(Debug, Serialize)]
struct CreateChannelBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    parent_id: &'a str,
}

const CHANNEL_TYPE_TEXT: u8 = 0;
const CHANNEL_TYPE_CATEGORY: u8 = 4;

impl RestPlatform {
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET a resource; 404 becomes `Ok(None)`.
    async fn get_optional<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status().with_context(|| format!("GET {path}"))?;
        Ok(Some(resp.json().await?))
    }

    async fn expect_ok(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("{what} failed: {status} {body}");
        }
        Ok(resp)
    }

    async fn send_message_to(&self, path: &str, message: &OutboundMessage) -> Result<String> {
        let mut body = json!({ "embeds": message.embeds });
        if let Some(content) = &message.content {
            body["content"] = json!(content);
        }
        if !message.buttons.is_empty() {
            body["components"] = json!([{
                "type": 1,
                "components": message.buttons.iter().map(|b| json!({
                    "type": 2,
                    "style": 4,
                    "custom_id": b.custom_id,
                    "label": b.label,
                    "emoji": b.emoji.as_ref().map(|e| json!({ "name": e })),
                })).collect::<Vec<_>>(),
            }]);
        }

        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        let resp = Self::expect_ok(resp, "message send").await?;

        let sent: WireMessage = resp.json().await?;
        debug!("Delivered message {} via {}", sent.id, path);
        Ok(sent.id)
    }
}

impl From<WireChannel> for Channel {
    fn from(w: WireChannel) -> Self {
        Channel {
            id: w.id,
            name: w.name,
            kind: if w.kind == CHANNEL_TYPE_CATEGORY {
                ChannelKind::Category
            } else {
                ChannelKind::Text
            },
            parent_id: w.parent_id,
        }
    }
}

impl From<WireMessage> for ChannelMessage {
    fn from(w: WireMessage) -> Self {
        ChannelMessage {
            id: w.id,
            author_id: w.author.id,
            author_username: w.author.username,
            content: w.content,
            timestamp: w.timestamp,
            attachments: w.attachments.into_iter().map(|a| a.url).collect(),
            system: w.kind != 0,
        }
    }
}

#[async_trait]
impl Directory for RestPlatform {
    async fn guild(&self, guild_id: &str) -> Result<Option<Guild>> {
        let guild: Option<WireGuild> = self.get_optional(&format!("/guilds/{guild_id}")).await?;
        Ok(guild.map(|g| Guild { id: g.id, name: g.name }))
    }

    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Option<Member>> {
        let member: Option<WireMember> = self
            .get_optional(&format!("/guilds/{guild_id}/members/{user_id}"))
            .await?;
        Ok(member.map(|m| Member {
            id: m.user.id,
            username: m.user.username,
            avatar_url: m.user.avatar_url,
        }))
    }

    async fn channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        let channel: Option<WireChannel> =
            self.get_optional(&format!("/channels/{channel_id}")).await?;
        Ok(channel.map(Channel::from))
    }

    async fn create_text_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<Channel> {
        let path = format!("/guilds/{guild_id}/channels");
        let resp = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .json(&CreateChannelBody { name, kind: CHANNEL_TYPE_TEXT, parent_id })
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        let resp = Self::expect_ok(resp, "channel create").await?;

        let channel: WireChannel = resp.json().await?;
        Ok(channel.into())
    }

    async fn edit_channel(
        &self,
        channel_id: &str,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<()> {
        let mut body = json!({});
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        if let Some(parent_id) = parent_id {
            body["parent_id"] = json!(parent_id);
        }

        let path = format!("/channels/{channel_id}");
        let resp = self
            .http
            .patch(self.url(&path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("PATCH {path}"))?;
        Self::expect_ok(resp, "channel edit").await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for RestPlatform {
    async fn send_channel_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<String> {
        self.send_message_to(&format!("/channels/{channel_id}/messages"), message)
            .await
    }

    async fn send_direct_message(
        &self,
        user_id: &str,
        message: &OutboundMessage,
    ) -> Result<String> {
        // Open (or reuse) the DM channel, then deliver into it.
        let resp = self
            .http
            .post(self.url("/users/@me/channels"))
            .bearer_auth(&self.token)
            .json(&json!({ "recipient_id": user_id }))
            .send()
            .await
            .context("POST /users/@me/channels")?;
        let resp = Self::expect_ok(resp, "DM channel open").await?;

        let dm: WireChannel = resp.json().await?;
        self.send_message_to(&format!("/channels/{}/messages", dm.id), message)
            .await
    }

    async fn pin_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let path = format!("/channels/{channel_id}/pins/{message_id}");
        let resp = self
            .http
            .put(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("PUT {path}"))?;
        Self::expect_ok(resp, "message pin").await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        let resp = self
            .http
            .delete(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("DELETE {path}"))?;
        Self::expect_ok(resp, "message delete").await?;
        Ok(())
    }

    async fn channel_messages(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChannelMessage>> {
        // The API pages newest-first in batches of 100; walk backwards until
        // the limit (or the start of history) is reached.
        let mut collected: Vec<WireMessage> = Vec::new();
        let mut before: Option<String> = None;

        loop {
            let page_size = match limit {
                Some(l) => (l as usize - collected.len()).min(100),
                None => 100,
            };
            if page_size == 0 {
                break;
            }

            let mut path = format!("/channels/{channel_id}/messages?limit={page_size}");
            if let Some(before) = &before {
                path.push_str(&format!("&before={before}"));
            }

            let page: Vec<WireMessage> = self
                .get_optional(&path)
                .await?
                .unwrap_or_default();
            let done = page.len() < page_size;
            before = page.last().map(|m| m.id.clone());
            collected.extend(page);

            if done {
                break;
            }
        }

        collected.reverse();
        Ok(collected.into_iter().map(ChannelMessage::from).collect())
    }
}
