//! # Bet Slip Data Model
//!
//! This module defines the structured representation of a bet slip as
//! extracted from a screenshot, together with the text rendering shared by
//! the preview reply and the channel caption.
//!
//! ## Usage
//!
//! ```rust
//! use betslip_relay::bet_slip::{BetSlip, GameLeg};
//!
//! let slip = BetSlip::new(
//!     "Football",
//!     vec![
//!         GameLeg::new("Arsenal vs Chelsea", "Arsenal to win"),
//!         GameLeg::new("Inter vs Milan", "Over 2.5 goals"),
//!     ],
//! );
//! assert_eq!(slip.parlay_label(), "2 Leg Parlay");
//! assert_eq!(slip.caption(5.5), "🏆 Football — 2 Leg Parlay\n⚽ Arsenal vs Chelsea — Arsenal to win\n⚽ Inter vs Milan — Over 2.5 goals\n💰 5.5% of your bank");
//! ```

use serde::Serialize;
use std::fmt;

/// Sport used when the extraction omits it
pub const DEFAULT_SPORT: &str = "Sports";

/// Sport used when the extraction response could not be read at all
pub const UNKNOWN_SPORT: &str = "Unknown";

/// One game/bet pairing within a wager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameLeg {
    /// The fixture, e.g. "Team A vs Team B"
    #[serde(rename = "match")]
    pub match_name: String,
    /// The selection, e.g. "Team A to win"
    pub bet: String,
}

impl GameLeg {
    pub fn new(match_name: impl Into<String>, bet: impl Into<String>) -> Self {
        Self {
            match_name: match_name.into(),
            bet: bet.into(),
        }
    }

    /// Display line used in previews and captions
    pub fn line(&self) -> String {
        format!("⚽ {} — {}", self.match_name, self.bet)
    }
}

/// A parsed bet slip; immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetSlip {
    pub sport: String,
    /// Legs in extraction order
    pub games: Vec<GameLeg>,
}

impl BetSlip {
    pub fn new(sport: impl Into<String>, games: Vec<GameLeg>) -> Self {
        Self {
            sport: sport.into(),
            games,
        }
    }

    /// The slip returned when nothing could be recovered from the response
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_SPORT, Vec::new())
    }

    pub fn leg_count(&self) -> usize {
        self.games.len()
    }

    /// Label derived from the number of legs
    pub fn parlay_label(&self) -> String {
        match self.leg_count() {
            1 => "Single Bet".to_string(),
            n => format!("{n} Leg Parlay"),
        }
    }

    /// First line of both the preview and the caption
    pub fn header(&self) -> String {
        format!("🏆 {} — {}", self.sport, self.parlay_label())
    }

    pub fn leg_lines(&self) -> Vec<String> {
        self.games.iter().map(GameLeg::line).collect()
    }

    /// Final announcement text posted with the photo
    pub fn caption(&self, percentage: f64) -> String {
        let mut lines = Vec::with_capacity(self.leg_count() + 2);
        lines.push(self.header());
        lines.extend(self.leg_lines());
        lines.push(format!("💰 {}% of your bank", format_percentage(percentage)));
        lines.join("\n")
    }
}

impl fmt::Display for BetSlip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())?;
        for line in self.leg_lines() {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Shortest decimal form of a stake percentage (`5`, `5.5`, `0.25`)
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage}")
}
