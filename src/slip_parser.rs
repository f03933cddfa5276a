//! # Slip Parser Module
//!
//! Turns the free-form text returned by the vision service into a [`BetSlip`].
//!
//! The service is asked for bare JSON but regularly wraps it in prose or code
//! fences, so parsing runs a fallback chain where the first success wins:
//!
//! 1. strict parse of the whole (trimmed) text
//! 2. strict parse of the greedy span from the first `{` to the last `}`
//! 3. [`BetSlip::unknown`], so the user still gets a preview
//!
//! Missing `sport` becomes [`DEFAULT_SPORT`], missing `games` becomes an empty
//! list. A leg without a usable `match` or `bet` is dropped.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::bet_slip::{BetSlip, GameLeg, DEFAULT_SPORT};

/// Error type for slip parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The response could not be turned into a slip, not even the fallback one
    Malformed(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Malformed(msg) => write!(f, "Malformed extraction response: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

lazy_static! {
    // Greedy on purpose: first '{' through last '}'
    static ref OBJECT_SPAN: Regex =
        Regex::new(r"(?s)\{.*\}").expect("Object span pattern should be valid");
}

#[derive(Debug, Deserialize)]
struct RawSlip {
    #[serde(default)]
    sport: Option<String>,
    #[serde(default)]
    games: Option<Vec<RawLeg>>,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default, rename = "match")]
    match_name: Option<String>,
    #[serde(default)]
    bet: Option<String>,
}

/// Parse an extraction response into a bet slip
///
/// # Examples
///
/// ```rust
/// use betslip_relay::slip_parser::parse;
///
/// let raw = r#"Sure! {"sport":"Tennis","games":[{"match":"A vs B","bet":"A wins"}]} Hope that helps"#;
/// let slip = parse(raw).unwrap();
/// assert_eq!(slip.sport, "Tennis");
/// assert_eq!(slip.parlay_label(), "Single Bet");
/// ```
pub fn parse(raw_text: &str) -> Result<BetSlip, ParseError> {
    let trimmed = raw_text.trim();

    if let Some(slip) = parse_strict(trimmed) {
        debug!("Parsed extraction response as strict JSON");
        return Ok(slip);
    }

    if let Some(span) = OBJECT_SPAN.find(trimmed) {
        if let Some(slip) = parse_strict(span.as_str()) {
            debug!(
                "Recovered JSON object from wrapped response (span {}..{} of {} chars)",
                span.start(),
                span.end(),
                trimmed.len()
            );
            return Ok(slip);
        }
    }

    warn!(
        "Could not read bet slip from extraction response ({} chars), using unknown slip",
        trimmed.len()
    );
    Ok(BetSlip::unknown())
}

fn parse_strict(text: &str) -> Option<BetSlip> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    // serde would also accept a positional array for the struct
    if !value.is_object() {
        return None;
    }
    let raw: RawSlip = serde_json::from_value(value).ok()?;
    Some(into_slip(raw))
}

fn into_slip(raw: RawSlip) -> BetSlip {
    let sport = raw.sport.unwrap_or_else(|| DEFAULT_SPORT.to_string());

    let games = raw
        .games
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, leg)| {
            let match_name = non_blank(leg.match_name);
            let bet = non_blank(leg.bet);
            match (match_name, bet) {
                (Some(match_name), Some(bet)) => Some(GameLeg { match_name, bet }),
                (match_name, bet) => {
                    warn!(
                        "Dropping incomplete leg #{} (match present: {}, bet present: {})",
                        index + 1,
                        match_name.is_some(),
                        bet.is_some()
                    );
                    None
                }
            }
        })
        .collect();

    BetSlip { sport, games }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json() {
        let raw = r#"{"sport":"Basketball","games":[{"match":"Lakers vs Celtics","bet":"Lakers -4.5"}]}"#;
        let slip = parse(raw).unwrap();

        assert_eq!(slip.sport, "Basketball");
        assert_eq!(slip.games, vec![GameLeg::new("Lakers vs Celtics", "Lakers -4.5")]);
    }

    #[test]
    fn test_code_fenced_json() {
        let raw = "```json\n{\"sport\": \"Football\", \"games\": []}\n```";
        let slip = parse(raw).unwrap();

        assert_eq!(slip.sport, "Football");
        assert!(slip.games.is_empty());
    }

    #[test]
    fn test_garbage_falls_back_to_unknown() {
        assert_eq!(parse("I cannot read this image.").unwrap(), BetSlip::unknown());
        assert_eq!(parse("").unwrap(), BetSlip::unknown());
        assert_eq!(parse("{ not json }").unwrap(), BetSlip::unknown());
    }

    #[test]
    fn test_missing_fields_default() {
        let slip = parse("{}").unwrap();
        assert_eq!(slip.sport, DEFAULT_SPORT);
        assert!(slip.games.is_empty());

        let slip = parse(r#"{"sport": null, "games": null}"#).unwrap();
        assert_eq!(slip.sport, DEFAULT_SPORT);
        assert!(slip.games.is_empty());
    }

    #[test]
    fn test_incomplete_legs_are_dropped() {
        let raw = r#"{"sport":"Tennis","games":[
            {"match":"A vs B","bet":"A wins"},
            {"match":"C vs D"},
            {"bet":"E wins"},
            {"match":"  ","bet":"F wins"},
            {"match":" G vs H ","bet":" H wins "}
        ]}"#;
        let slip = parse(raw).unwrap();

        assert_eq!(
            slip.games,
            vec![GameLeg::new("A vs B", "A wins"), GameLeg::new("G vs H", "H wins")]
        );
    }
}
