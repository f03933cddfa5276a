//! # Bet Slip Relay Telegram Bot
//!
//! A Telegram bot that reads bet slip screenshots with an image-understanding
//! service, asks the sender for a stake percentage and posts the confirmed
//! bet to a restricted channel.

pub mod bet_slip;
pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod dialogue;
pub mod extraction;
pub mod extraction_errors;
pub mod localization;
pub mod pending_store;
pub mod slip_parser;
