//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Turns incoming text and photo messages into conversation events
//! - `dialogue_manager`: Drives the conversation and applies its effects
//! - `publisher`: Posts confirmed bets to the destination channel
//! - `ui_builder`: Renders notices as reply text

pub mod dialogue_manager;
pub mod message_handler;
pub mod publisher;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use message_handler::message_handler;

// Re-export the types needed to wire the bot together
pub use dialogue_manager::{DialogueManager, InboundEvent};
pub use publisher::{ChannelPublisher, TelegramPublisher};
pub use ui_builder::{format_preview, render_notice};
