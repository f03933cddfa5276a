//! # Configuration Module
//!
//! This module defines configuration structures for the relay bot: the
//! extraction service settings, failure recovery tunables and the bootstrap
//! values read from the environment.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

// Constants for extraction configuration
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024; // 10MB limit for screenshots

// Constants for conversation state
pub const DEFAULT_PENDING_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Recovery configuration for extraction failures
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Timeout for one extraction request in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            operation_timeout_secs: 60,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Configuration for the image-understanding service
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Messages endpoint
    pub api_url: String,
    /// Value of the `anthropic-version` header
    pub api_version: String,
    /// Credential; `None` makes every extraction fail with `NotConfigured`
    pub api_key: Option<String>,
    /// Model identifier sent with each request
    pub model: String,
    /// Upper bound on the response length
    pub max_tokens: u32,
    /// Screenshots larger than this are rejected before upload
    pub max_image_bytes: usize,
    /// Timeout and circuit breaker settings
    pub recovery: RecoveryConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_image_bytes: MAX_IMAGE_BYTES,
            recovery: RecoveryConfig::default(),
        }
    }
}

/// Everything the process needs at startup
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    /// Destination channel (`-100...` id or `@name`); `None` is reported per request
    pub destination_channel: Option<String>,
    pub extraction: ExtractionConfig,
    /// Age after which a pending bet is treated as absent
    pub pending_ttl: Duration,
    /// Period of the expired-entry sweep
    pub sweep_interval: Duration,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Blank values are treated as unset. Only `TELEGRAM_BOT_TOKEN` is required;
    /// the extraction credential and the destination channel are checked per
    /// request instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram_token =
            var("TELEGRAM_BOT_TOKEN").ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        let mut extraction = ExtractionConfig {
            api_key: var("ANTHROPIC_API_KEY"),
            ..ExtractionConfig::default()
        };
        if let Some(url) = var("EXTRACTION_API_URL") {
            extraction.api_url = url;
        }
        if let Some(model) = var("EXTRACTION_MODEL") {
            extraction.model = model;
        }
        if let Some(timeout) = var("EXTRACTION_TIMEOUT_SECS") {
            extraction.recovery.operation_timeout_secs = parse_secs("EXTRACTION_TIMEOUT_SECS", &timeout)?;
        }

        let pending_ttl = match var("PENDING_BET_TTL_SECS") {
            Some(v) => parse_secs("PENDING_BET_TTL_SECS", &v)?,
            None => DEFAULT_PENDING_TTL_SECS,
        };
        let sweep_interval = match var("PENDING_SWEEP_INTERVAL_SECS") {
            Some(v) => parse_secs("PENDING_SWEEP_INTERVAL_SECS", &v)?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        Ok(Self {
            telegram_token,
            destination_channel: var("VIP_CHANNEL_ID"),
            extraction,
            pending_ttl: Duration::from_secs(pending_ttl),
            sweep_interval: Duration::from_secs(sweep_interval.max(1)),
            json_logs: var("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_environment_uses_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.telegram_token, "123:abc");
        assert!(config.destination_channel.is_none());
        assert!(config.extraction.api_key.is_none());
        assert_eq!(config.extraction.api_url, DEFAULT_API_URL);
        assert_eq!(config.extraction.max_tokens, 1024);
        assert_eq!(config.pending_ttl, Duration::from_secs(DEFAULT_PENDING_TTL_SECS));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = BotConfig::from_lookup(lookup(&[("VIP_CHANNEL_ID", "@vip")])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("VIP_CHANNEL_ID", "   "),
            ("ANTHROPIC_API_KEY", ""),
        ]))
        .unwrap();

        assert!(config.destination_channel.is_none());
        assert!(config.extraction.api_key.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("VIP_CHANNEL_ID", "-1001234"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("EXTRACTION_MODEL", "vision-model"),
            ("EXTRACTION_TIMEOUT_SECS", "15"),
            ("PENDING_BET_TTL_SECS", "120"),
            ("PENDING_SWEEP_INTERVAL_SECS", "0"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.destination_channel.as_deref(), Some("-1001234"));
        assert_eq!(config.extraction.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.extraction.model, "vision-model");
        assert_eq!(config.extraction.recovery.operation_timeout_secs, 15);
        assert_eq!(config.pending_ttl, Duration::from_secs(120));
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert!(config.json_logs);
    }

    #[test]
    fn test_unparsable_number_is_rejected() {
        let result = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("PENDING_BET_TTL_SECS", "half an hour"),
        ]));
        assert!(result.is_err());
    }
}
