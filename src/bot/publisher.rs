//! Channel publisher: the single outbound post of a confirmed bet

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, Recipient};
use tracing::info;

use crate::pending_store::PhotoRef;

/// Destination for confirmed bets
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Post `photo` with `caption` to `channel`
    async fn publish_photo(&self, channel: &str, photo: &PhotoRef, caption: &str) -> Result<()>;
}

/// Publishes to a Telegram channel by re-sending the already uploaded photo
#[derive(Clone)]
pub struct TelegramPublisher {
    bot: Bot,
}

impl TelegramPublisher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Parse a channel identifier: numeric chat id or `@username`
pub fn channel_recipient(channel: &str) -> Recipient {
    match channel.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => {
            let name = channel.trim();
            if name.starts_with('@') {
                Recipient::ChannelUsername(name.to_string())
            } else {
                Recipient::ChannelUsername(format!("@{name}"))
            }
        }
    }
}

#[async_trait]
impl ChannelPublisher for TelegramPublisher {
    async fn publish_photo(&self, channel: &str, photo: &PhotoRef, caption: &str) -> Result<()> {
        let sent = self
            .bot
            .send_photo(
                channel_recipient(channel),
                InputFile::file_id(FileId(photo.as_str().to_string())),
            )
            .caption(caption)
            .await?;

        info!(channel, message_id = sent.id.0, "Bet posted to channel");
        Ok(())
    }
}
