//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, FileId, PhotoSize};
use tracing::{debug, error, info, warn};

// Import configuration
use crate::config::BotConfig;

// Import dialogue types
use crate::dialogue::Notice;
use crate::extraction::normalize_to_png;
use crate::extraction_errors::ExtractionError;
use crate::pending_store::{PhotoRef, UserId};

use super::dialogue_manager::{DialogueManager, InboundEvent};
use super::ui_builder::render_notice;

/// Commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
}

/// Recognize `/start`, `/help` and `/cancel`, with or without an `@botname` suffix
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    match name.to_lowercase().as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "cancel" => Some(Command::Cancel),
        _ => None,
    }
}

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let file_path = file.path;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file_path
    );

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    Ok(bytes.to_vec())
}

async fn handle_text_message(manager: &DialogueManager, user_id: UserId, text: &str) -> Vec<Notice> {
    debug!(user_id = %user_id, message_length = text.len(), "Received text message from user");

    let event = match parse_command(text) {
        Some(Command::Start) => InboundEvent::StartCommand { user_id },
        Some(Command::Help) => InboundEvent::HelpCommand { user_id },
        Some(Command::Cancel) => InboundEvent::CancelCommand { user_id },
        None => InboundEvent::TextReceived {
            user_id,
            text: text.to_string(),
        },
    };

    manager.handle(event).await
}

async fn handle_photo_message(
    bot: &Bot,
    msg: &Message,
    manager: &DialogueManager,
    config: &BotConfig,
    user_id: UserId,
    photos: &[PhotoSize],
) -> Vec<Notice> {
    // Telegram lists sizes smallest first
    let Some(largest_photo) = photos.last() else {
        return vec![Notice::SendScreenshot];
    };

    debug!(user_id = %user_id, width = largest_photo.width, height = largest_photo.height, "Received photo message from user");

    if let Err(e) = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await {
        warn!(user_id = %user_id, error = %e, "Failed to send typing indicator");
    }

    let event = prepare_photo_event(bot, user_id, largest_photo, config.extraction.max_image_bytes).await;
    manager.handle(event).await
}

/// Turn the largest photo size into the event for the dialogue manager
///
/// Screenshots that cannot be used still produce an event, so the manager
/// retires whatever slip the user was replacing.
async fn prepare_photo_event(bot: &Bot, user_id: UserId, photo: &PhotoSize, max_bytes: usize) -> InboundEvent {
    let photo_ref = PhotoRef(photo.file.id.0.clone());

    if let Some(error) = check_photo_size(photo.file.size, max_bytes) {
        warn!(user_id = %user_id, size = photo.file.size, "Screenshot exceeds size limit");
        return InboundEvent::PhotoRejected {
            user_id,
            photo: photo_ref,
            error,
        };
    }

    let bytes = match download_file(bot, photo.file.id.clone()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to download image for user");
            return InboundEvent::PhotoDownloadFailed { user_id };
        }
    };

    // Decoding and re-encoding is CPU bound
    let normalized = tokio::task::spawn_blocking(move || normalize_to_png(&bytes, max_bytes))
        .await
        .unwrap_or_else(|e| Err(ExtractionError::InvalidImage(e.to_string())));

    match normalized {
        Ok(image_png) => {
            info!(user_id = %user_id, png_bytes = image_png.len(), "Screenshot ready for extraction");
            InboundEvent::PhotoReceived {
                user_id,
                photo: photo_ref,
                image_png,
            }
        }
        Err(error) => {
            warn!(user_id = %user_id, error = %error, "Screenshot rejected before extraction");
            InboundEvent::PhotoRejected {
                user_id,
                photo: photo_ref,
                error,
            }
        }
    }
}

/// Reject a screenshot whose reported size is over the limit
pub fn check_photo_size(size: u32, max_bytes: usize) -> Option<ExtractionError> {
    (size as usize > max_bytes).then(|| {
        ExtractionError::InvalidImage(format!("screenshot is {size} bytes, limit is {max_bytes}"))
    })
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    manager: Arc<DialogueManager>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without a sender");
        return Ok(());
    };
    let user_id = UserId(user.id.0);
    let language_code = user.language_code.as_deref();

    let notices = if let Some(text) = msg.text() {
        handle_text_message(&manager, user_id, text).await
    } else if let Some(photos) = msg.photo() {
        handle_photo_message(&bot, &msg, &manager, &config, user_id, photos).await
    } else {
        debug!(user_id = %user_id, "Received unsupported message type from user");
        vec![Notice::SendScreenshot]
    };

    for notice in &notices {
        bot.send_message(msg.chat.id, render_notice(notice, language_code))
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/help"), Some(Command::Help));
        assert_eq!(parse_command("/cancel"), Some(Command::Cancel));
        assert_eq!(parse_command("/cancel@BetRelayBot"), Some(Command::Cancel));
        assert_eq!(parse_command("  /START now"), Some(Command::Start));
    }

    #[test]
    fn test_photo_size_limit() {
        assert_eq!(check_photo_size(10, 10), None);
        assert!(matches!(
            check_photo_size(5000, 10),
            Some(ExtractionError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_command("5%"), None);
        assert_eq!(parse_command("cancel"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
    }
}
