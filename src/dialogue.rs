//! Bet slip dialogue module: conversation states, stake validation and the
//! pure transition function driving a user's flow.
//!
//! A user is `Idle` until a screenshot has been extracted and parsed, then
//! `AwaitingStake` until they send a valid percentage or cancel. Every flow
//! ends in a [`Outcome`] and re-enters `Idle`.
//!
//! [`transition`] performs no I/O. It maps the current state and one event to
//! the resulting [`Phase`] and the [`Effect`]s the caller must apply; the
//! extraction request happens before the event is built, the publish request
//! when the `Publish` effect is applied.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::bet_slip::BetSlip;
use crate::extraction_errors::ExtractionError;
use crate::pending_store::{PendingBet, PhotoRef, UserId};
use crate::slip_parser::{self, ParseError};

lazy_static! {
    static ref STAKE_NUMBER: Regex =
        Regex::new(r"-?(?:\d+(?:\.\d+)?|\.\d+)").expect("Stake pattern should be valid");
}

/// Reasons a stake message is rejected
#[derive(Debug, Clone, PartialEq)]
pub enum StakeError {
    /// No number found in the message
    Unparsable,
    /// A number was found but is not in `(0, 100]`
    OutOfRange(f64),
}

impl std::fmt::Display for StakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StakeError::Unparsable => write!(f, "no percentage found"),
            StakeError::OutOfRange(value) => write!(f, "{value} is not between 0 and 100"),
        }
    }
}

impl std::error::Error for StakeError {}

/// Validates a stake percentage input
///
/// Accepts a bare number or one with an embedded `%` sign; the first decimal
/// number in the text is used and must satisfy `0 < value <= 100`.
pub fn validate_stake(input: &str) -> Result<f64, StakeError> {
    let number = STAKE_NUMBER.find(input.trim()).ok_or(StakeError::Unparsable)?;
    let value: f64 = number
        .as_str()
        .parse()
        .map_err(|_| StakeError::Unparsable)?;

    if value > 0.0 && value <= 100.0 {
        Ok(value)
    } else {
        Err(StakeError::OutOfRange(value))
    }
}

/// Conversation state of one user, derived from the pending bet store
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingStake(PendingBet),
}

impl ConversationState {
    pub fn from_pending(pending: Option<PendingBet>) -> Self {
        pending.map_or(ConversationState::Idle, ConversationState::AwaitingStake)
    }
}

/// How a flow ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Posted,
    Cancelled,
    /// A stake arrived but the pending bet was gone
    Expired,
    /// The flow was reset because it could never succeed (e.g. no channel)
    Aborted,
}

/// Where a user stands after a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingStake,
    /// Reached a terminal outcome; the user is `Idle` again afterwards
    Terminal(Outcome),
}

/// Input to the state machine
#[derive(Debug)]
pub enum Event<'a> {
    Start,
    Help,
    Cancel,
    /// Result of the extraction request for a screenshot
    Extracted {
        photo: PhotoRef,
        result: Result<String, ExtractionError>,
    },
    /// A screenshot arrived but its bytes could not be fetched
    DownloadFailed,
    Text(&'a str),
}

/// Typed user-facing reply; rendered and localized by the transport
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Welcome,
    Help,
    SendScreenshot,
    Preview(BetSlip),
    ExtractionFailed(ExtractionError),
    ParseFailed,
    DownloadFailed,
    StakeRejected(StakeError),
    Expired,
    ChannelNotConfigured,
    Posted,
    PublishFailed(String),
    Cancelled,
}

/// Side effect requested by a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Store (or replace) the user's pending bet
    SavePending(PendingBet),
    /// Drop the user's pending bet if any
    ClearPending,
    /// Claim the pending bet and post it; the caller replies with the result
    Publish {
        channel: String,
        photo: PhotoRef,
        caption: String,
    },
    Reply(Notice),
}

/// Result of one transition
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub phase: Phase,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(phase: Phase, effects: Vec<Effect>) -> Self {
        Self { phase, effects }
    }
}

/// Values a transition needs besides the state and the event
#[derive(Clone, Debug)]
pub struct TransitionContext<'a> {
    pub user_id: UserId,
    pub channel: Option<&'a str>,
    pub now: DateTime<Utc>,
}

/// Compute the next phase and effects for `event`
pub fn transition(state: &ConversationState, event: Event<'_>, ctx: &TransitionContext<'_>) -> Transition {
    let current = match state {
        ConversationState::Idle => Phase::Idle,
        ConversationState::AwaitingStake(_) => Phase::AwaitingStake,
    };

    match event {
        Event::Start => Transition::new(current, vec![Effect::Reply(Notice::Welcome)]),
        Event::Help => Transition::new(current, vec![Effect::Reply(Notice::Help)]),
        Event::Cancel => Transition::new(
            Phase::Terminal(Outcome::Cancelled),
            vec![Effect::ClearPending, Effect::Reply(Notice::Cancelled)],
        ),
        Event::Extracted { photo, result } => on_extracted(photo, result, ctx),
        Event::DownloadFailed => Transition::new(
            Phase::Idle,
            vec![Effect::ClearPending, Effect::Reply(Notice::DownloadFailed)],
        ),
        Event::Text(text) => match state {
            ConversationState::Idle => on_text_while_idle(text),
            ConversationState::AwaitingStake(pending) => on_stake(pending, text, ctx),
        },
    }
}

fn on_extracted(photo: PhotoRef, result: Result<String, ExtractionError>, ctx: &TransitionContext<'_>) -> Transition {
    // A failed screenshot also retires the previous one, so a later stake
    // can never post a slip the user meant to replace.
    let raw = match result {
        Ok(raw) => raw,
        Err(e) => {
            return Transition::new(
                Phase::Idle,
                vec![Effect::ClearPending, Effect::Reply(Notice::ExtractionFailed(e))],
            )
        }
    };

    match slip_parser::parse(&raw) {
        Ok(slip) => {
            let pending = PendingBet::new(ctx.user_id, photo, slip.clone(), ctx.now);
            Transition::new(
                Phase::AwaitingStake,
                vec![Effect::SavePending(pending), Effect::Reply(Notice::Preview(slip))],
            )
        }
        Err(ParseError::Malformed(_)) => Transition::new(
            Phase::Idle,
            vec![Effect::ClearPending, Effect::Reply(Notice::ParseFailed)],
        ),
    }
}

fn on_text_while_idle(text: &str) -> Transition {
    match validate_stake(text) {
        // Looks like a stake for a bet that has been swept or replaced
        Ok(_) => Transition::new(Phase::Terminal(Outcome::Expired), vec![Effect::Reply(Notice::Expired)]),
        Err(_) => Transition::new(Phase::Idle, vec![Effect::Reply(Notice::SendScreenshot)]),
    }
}

fn on_stake(pending: &PendingBet, text: &str, ctx: &TransitionContext<'_>) -> Transition {
    let percentage = match validate_stake(text) {
        Ok(percentage) => percentage,
        Err(e) => {
            return Transition::new(Phase::AwaitingStake, vec![Effect::Reply(Notice::StakeRejected(e))])
        }
    };

    let Some(channel) = ctx.channel else {
        return Transition::new(
            Phase::Terminal(Outcome::Aborted),
            vec![Effect::ClearPending, Effect::Reply(Notice::ChannelNotConfigured)],
        );
    };

    Transition::new(
        Phase::Terminal(Outcome::Posted),
        vec![Effect::Publish {
            channel: channel.to_string(),
            photo: pending.photo.clone(),
            caption: pending.slip.caption(percentage),
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stake_validation() {
        // Valid stakes
        assert_eq!(validate_stake("5"), Ok(5.0));
        assert_eq!(validate_stake("5.5%"), Ok(5.5));
        assert_eq!(validate_stake("  2 % "), Ok(2.0));
        assert_eq!(validate_stake("stake 3.25% please"), Ok(3.25));
        assert_eq!(validate_stake("100"), Ok(100.0));
        assert_eq!(validate_stake(".5"), Ok(0.5));

        // Invalid stakes
        assert_eq!(validate_stake("0"), Err(StakeError::OutOfRange(0.0)));
        assert_eq!(validate_stake("150"), Err(StakeError::OutOfRange(150.0)));
        assert_eq!(validate_stake("-5"), Err(StakeError::OutOfRange(-5.0)));
        assert_eq!(validate_stake("abc"), Err(StakeError::Unparsable));
        assert_eq!(validate_stake(""), Err(StakeError::Unparsable));
    }

    #[test]
    fn test_first_number_wins() {
        assert_eq!(validate_stake("5% then 50%"), Ok(5.0));
        assert_eq!(validate_stake("200 or 2"), Err(StakeError::OutOfRange(200.0)));
    }
}
