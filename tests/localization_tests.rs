//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality and the
//! rendering of conversation notices into reply text.

use betslip_relay::bet_slip::{BetSlip, GameLeg};
use betslip_relay::bot::{format_preview, render_notice};
use betslip_relay::dialogue::{Notice, StakeError};
use betslip_relay::extraction_errors::ExtractionError;
use betslip_relay::localization::LocalizationManager;
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new()
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("bet-posted", "en", None);
        assert_eq!(message, "✅ Bet posted to VIP channel!");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_unsupported_language_falls_back_to_english() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("cancelled", "de", None);
        assert_eq!(message, "Cancelled.");
    }

    #[test]
    fn test_regional_language_code() {
        let manager = setup_localization();

        assert_eq!(manager.resolve_language(Some("fr-FR")), "fr");
        assert_eq!(manager.resolve_language(Some("FR")), "fr");
        assert_eq!(manager.resolve_language(Some("pt-BR")), "en");
        assert_eq!(manager.resolve_language(None), "en");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("message", "Overloaded");

        let message = manager.get_message_in_language("error-api", "en", Some(&args));
        assert_eq!(message, "❌ API Error: Overloaded");
    }

    #[test]
    fn test_french_localization() {
        let manager = setup_localization();

        let french = manager.get_message_in_language("cancelled", "fr", None);
        let english = manager.get_message_in_language("cancelled", "en", None);
        assert_eq!(french, "Annulé.");
        assert_ne!(french, english);
    }

    #[test]
    fn test_every_english_key_has_a_french_translation() {
        let manager = setup_localization();
        let keys = [
            "welcome",
            "help",
            "send-screenshot",
            "cancelled",
            "preview-prompt",
            "preview-no-games",
            "stake-unparsable",
            "stake-out-of-range",
            "bet-posted",
            "bet-expired",
            "channel-not-configured",
            "error-transport",
            "error-empty-response",
            "error-invalid-image",
            "error-not-configured",
            "error-parse",
            "error-download-failed",
        ];

        for key in keys {
            for language in ["en", "fr"] {
                let message = manager.get_message_in_language(key, language, None);
                assert!(!message.starts_with("Missing"), "{language}/{key} is missing");
                assert!(!message.is_empty());
            }
        }
    }

    #[test]
    fn test_preview_format() {
        let slip = BetSlip::new(
            "Football",
            vec![
                GameLeg::new("Arsenal vs Chelsea", "Arsenal to win"),
                GameLeg::new("Inter vs Milan", "BTTS"),
            ],
        );

        assert_eq!(
            format_preview(&slip, Some("en")),
            "🏆 Football — 2 Leg Parlay\n⚽ Arsenal vs Chelsea — Arsenal to win\n⚽ Inter vs Milan — BTTS\n\nWhat % of your bank?"
        );
    }

    #[test]
    fn test_preview_without_games_warns() {
        let preview = format_preview(&BetSlip::unknown(), None);
        assert!(preview.starts_with("🏆 Unknown — 0 Leg Parlay\n⚠️"));
        assert!(preview.ends_with("What % of your bank?"));
    }

    #[test]
    fn test_service_error_is_shown_verbatim() {
        let notice = Notice::ExtractionFailed(ExtractionError::ServiceError(
            "Your credit balance is too low".to_string(),
        ));
        assert_eq!(
            render_notice(&notice, Some("en")),
            "❌ API Error: Your credit balance is too low"
        );
    }

    #[test]
    fn test_stake_rejections_have_distinct_messages() {
        let unparsable = render_notice(&Notice::StakeRejected(StakeError::Unparsable), None);
        let out_of_range = render_notice(&Notice::StakeRejected(StakeError::OutOfRange(150.0)), None);

        assert_eq!(unparsable, "Please enter a valid percentage (e.g. 5 or 5.5)");
        assert_ne!(unparsable, out_of_range);
    }

    #[test]
    fn test_publish_failure_includes_reason() {
        let message = render_notice(&Notice::PublishFailed("chat not found".to_string()), Some("en"));
        assert_eq!(message, "❌ Error: chat not found");
    }
}
