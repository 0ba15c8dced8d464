use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::messenger::Messenger;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// `None` exports the whole history.
    pub limit: Option<u32>,
    pub filename: String,
    pub preserve_images: bool,
}

impl ExportOptions {
    /// The options closure uses: unbounded history, images preserved.
    pub fn full(filename: impl Into<String>) -> Self {
        Self {
            limit: None,
            filename: filename.into(),
            preserve_images: true,
        }
    }
}

/// An archival rendering of a channel's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub filename: String,
    pub body: String,
    pub message_count: usize,
}

/// Converts a channel's message history into an archival document.
#[async_trait]
pub trait TranscriptExporter: Send + Sync {
    async fn export(&self, channel_id: &str, options: &ExportOptions) -> Result<Transcript>;
}

/// Default exporter: reads the history through the messenger and renders a
/// plain-text log, oldest first. Platform notices are skipped; attachment
/// URLs are kept when `preserve_images` is set.
pub struct ChannelLogExporter {
    messenger: Arc<dyn Messenger>,
}

impl ChannelLogExporter {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl TranscriptExporter for ChannelLogExporter {
    async fn export(&self, channel_id: &str, options: &ExportOptions) -> Result<Transcript> {
        let messages = self.messenger.channel_messages(channel_id, options.limit).await?;

        let mut body = String::new();
        let mut count = 0usize;
        for msg in &messages {
            if msg.system {
                continue;
            }
            body.push_str(&format!(
                "[{}] {}: {}\n",
                msg.timestamp, msg.author_username, msg.content
            ));
            if options.preserve_images {
                for url in &msg.attachments {
                    body.push_str(&format!("    [image] {url}\n"));
                }
            }
            count += 1;
        }

        Ok(Transcript {
            filename: options.filename.clone(),
            body,
            message_count: count,
        })
    }
}
