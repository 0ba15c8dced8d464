//! In-memory platform mock for tests.
//!
//! Follows the recorded-calls pattern: every outbound call is captured and
//! can be asserted on afterwards; fixtures are seeded with `with_*` builders.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use ghostchat_platform::directory::{Channel, ChannelKind, Directory, Guild, Member};
use ghostchat_platform::messenger::{ChannelMessage, Messenger};
use ghostchat_types::embeds::OutboundMessage;

#[derive(Default)]
struct State {
    guilds: HashMap<String, Guild>,
    members: HashMap<(String, String), Member>,
    channels: HashMap<String, Channel>,
    history: HashMap<String, Vec<ChannelMessage>>,

    channel_sends: Vec<(String, OutboundMessage)>,
    direct_sends: Vec<(String, OutboundMessage)>,
    pins: Vec<(String, String)>,
    deletes: Vec<(String, String)>,
    edits: Vec<(String, Option<String>, Option<String>)>,

    fail_dms_to: HashSet<String>,
    next_id: u64,
}

/// Fake platform implementing both the directory and the notification sink.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<State>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().guilds.insert(
            id.to_string(),
            Guild { id: id.to_string(), name: name.to_string() },
        );
        self
    }

    pub fn with_member(self, guild_id: &str, id: &str, username: &str) -> Self {
        self.state.lock().unwrap().members.insert(
            (guild_id.to_string(), id.to_string()),
            Member {
                id: id.to_string(),
                username: username.to_string(),
                avatar_url: Some(format!("https://cdn.example/avatars/{id}.png")),
            },
        );
        self
    }

    pub fn with_category(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().channels.insert(
            id.to_string(),
            Channel {
                id: id.to_string(),
                name: name.to_string(),
                kind: ChannelKind::Category,
                parent_id: None,
            },
        );
        self
    }

    /// Make direct deliveries to this user fail.
    pub fn fail_direct_messages_to(self, user_id: &str) -> Self {
        self.state.lock().unwrap().fail_dms_to.insert(user_id.to_string());
        self
    }

    // -- Recorded calls --

    pub fn channel_sends(&self) -> Vec<(String, OutboundMessage)> {
        self.state.lock().unwrap().channel_sends.clone()
    }

    pub fn direct_sends(&self) -> Vec<(String, OutboundMessage)> {
        self.state.lock().unwrap().direct_sends.clone()
    }

    pub fn direct_sends_to(&self, user_id: &str) -> Vec<OutboundMessage> {
        self.state
            .lock()
            .unwrap()
            .direct_sends
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn pinned(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pins.clone()
    }

    pub fn channel_edits(&self) -> Vec<(String, Option<String>, Option<String>)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn channel_named(&self, name: &str) -> Option<Channel> {
        self.state
            .lock()
            .unwrap()
            .channels
            .values()
            .find(|c| c.name == name)
            .cloned()
    }
}

fn fresh_id(state: &mut State, prefix: &str) -> String {
    state.next_id += 1;
    format!("{prefix}-{}", state.next_id)
}

#[async_trait]
impl Directory for MockPlatform {
    async fn guild(&self, guild_id: &str) -> Result<Option<Guild>> {
        Ok(self.state.lock().unwrap().guilds.get(guild_id).cloned())
    }

    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Option<Member>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        Ok(self.state.lock().unwrap().channels.get(channel_id).cloned())
    }

    async fn create_text_channel(
        &self,
        _guild_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<Channel> {
        let mut state = self.state.lock().unwrap();
        let id = fresh_id(&mut state, "chan");
        let channel = Channel {
            id: id.clone(),
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id: Some(parent_id.to_string()),
        };
        state.channels.insert(id, channel.clone());
        Ok(channel)
    }

    async fn edit_channel(
        &self,
        channel_id: &str,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.edits.push((
            channel_id.to_string(),
            name.map(str::to_string),
            parent_id.map(str::to_string),
        ));
        if let Some(channel) = state.channels.get_mut(channel_id) {
            if let Some(name) = name {
                channel.name = name.to_string();
            }
            if let Some(parent_id) = parent_id {
                channel.parent_id = Some(parent_id.to_string());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for MockPlatform {
    async fn send_channel_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let id = fresh_id(&mut state, "msg");
        let rendered = message
            .embeds
            .first()
            .and_then(|e| e.description.clone())
            .or_else(|| message.content.clone())
            .unwrap_or_default();
        let author = message
            .embeds
            .first()
            .and_then(|e| e.author.as_ref())
            .map(|a| a.name.clone())
            .unwrap_or_else(|| "ghost".to_string());

        state.history.entry(channel_id.to_string()).or_default().push(ChannelMessage {
            id: id.clone(),
            author_id: format!("id-{author}"),
            author_username: author,
            content: rendered,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            attachments: vec![],
            system: false,
        });
        state.channel_sends.push((channel_id.to_string(), message.clone()));
        Ok(id)
    }

    async fn send_direct_message(
        &self,
        user_id: &str,
        message: &OutboundMessage,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_dms_to.contains(user_id) {
            return Err(anyhow!("user {user_id} has direct messages disabled"));
        }
        let id = fresh_id(&mut state, "dm");
        state.direct_sends.push((user_id.to_string(), message.clone()));
        Ok(id)
    }

    async fn pin_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.pins.push((channel_id.to_string(), message_id.to_string()));

        // The platform writes a system pin notice into the channel.
        let id = fresh_id(&mut state, "sys");
        state.history.entry(channel_id.to_string()).or_default().push(ChannelMessage {
            id,
            author_id: "platform".to_string(),
            author_username: "platform".to_string(),
            content: "pinned a message to this channel".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            attachments: vec![],
            system: true,
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push((channel_id.to_string(), message_id.to_string()));
        if let Some(history) = state.history.get_mut(channel_id) {
            history.retain(|m| m.id != message_id);
        }
        Ok(())
    }

    async fn channel_messages(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChannelMessage>> {
        let state = self.state.lock().unwrap();
        let history = state.history.get(channel_id).cloned().unwrap_or_default();
        Ok(match limit {
            // Newest `n` messages, still oldest first.
            Some(n) => history
                .iter()
                .rev()
                .take(n as usize)
                .rev()
                .cloned()
                .collect(),
            None => history,
        })
    }
}
