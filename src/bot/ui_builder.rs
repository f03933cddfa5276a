//! UI Builder module for turning notices into reply text

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::bet_slip::BetSlip;
use crate::dialogue::{Notice, StakeError};
use crate::extraction_errors::ExtractionError;

/// Format the slip preview followed by the stake prompt
pub fn format_preview(slip: &BetSlip, language_code: Option<&str>) -> String {
    let mut lines = vec![slip.header()];
    lines.extend(slip.leg_lines());
    if slip.games.is_empty() {
        lines.push(t_lang("preview-no-games", language_code));
    }
    lines.push(String::new());
    lines.push(t_lang("preview-prompt", language_code));
    lines.join("\n")
}

fn format_extraction_error(error: &ExtractionError, language_code: Option<&str>) -> String {
    match error {
        ExtractionError::ServiceError(message) => {
            t_args_lang("error-api", &[("message", message.as_str())], language_code)
        }
        ExtractionError::TransportFailure(_) => t_lang("error-transport", language_code),
        ExtractionError::EmptyResponse => t_lang("error-empty-response", language_code),
        ExtractionError::InvalidImage(_) => t_lang("error-invalid-image", language_code),
        ExtractionError::NotConfigured => t_lang("error-not-configured", language_code),
    }
}

/// Render a notice as the text sent back to the user
pub fn render_notice(notice: &Notice, language_code: Option<&str>) -> String {
    match notice {
        Notice::Welcome => t_lang("welcome", language_code),
        Notice::Help => t_lang("help", language_code),
        Notice::SendScreenshot => t_lang("send-screenshot", language_code),
        Notice::Preview(slip) => format_preview(slip, language_code),
        Notice::ExtractionFailed(error) => format_extraction_error(error, language_code),
        Notice::ParseFailed => t_lang("error-parse", language_code),
        Notice::DownloadFailed => t_lang("error-download-failed", language_code),
        Notice::StakeRejected(StakeError::Unparsable) => t_lang("stake-unparsable", language_code),
        Notice::StakeRejected(StakeError::OutOfRange(_)) => t_lang("stake-out-of-range", language_code),
        Notice::Expired => t_lang("bet-expired", language_code),
        Notice::ChannelNotConfigured => t_lang("channel-not-configured", language_code),
        Notice::Posted => t_lang("bet-posted", language_code),
        Notice::PublishFailed(reason) => t_args_lang("error-publish", &[("reason", reason.as_str())], language_code),
        Notice::Cancelled => t_lang("cancelled", language_code),
    }
}
