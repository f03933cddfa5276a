//! # Slip Parser Tests
//!
//! Tests for reading bet slips out of extraction service answers, including
//! answers wrapped in prose and answers that cannot be read at all.

use betslip_relay::bet_slip::{BetSlip, GameLeg};
use betslip_relay::slip_parser::parse;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_object_inside_prose() {
        let raw = r#"Sure! {"sport":"Tennis","games":[{"match":"A vs B","bet":"A wins"}]} Hope that helps"#;
        let slip = parse(raw).unwrap();

        assert_eq!(slip, BetSlip::new("Tennis", vec![GameLeg::new("A vs B", "A wins")]));
        assert_eq!(slip.parlay_label(), "Single Bet");
    }

    #[test]
    fn test_preserves_leg_order() {
        let raw = r#"{"sport":"Football","games":[
            {"match":"Leg 1","bet":"Home"},
            {"match":"Leg 2","bet":"Draw"},
            {"match":"Leg 3","bet":"Away"},
            {"match":"Leg 4","bet":"BTTS"}
        ]}"#;
        let slip = parse(raw).unwrap();

        let matches: Vec<&str> = slip.games.iter().map(|g| g.match_name.as_str()).collect();
        assert_eq!(matches, vec!["Leg 1", "Leg 2", "Leg 3", "Leg 4"]);
        assert_eq!(slip.parlay_label(), "4 Leg Parlay");
    }

    #[test]
    fn test_multiline_answer_with_fences_and_commentary() {
        let raw = "I found the following bets:\n\n```json\n{\n  \"sport\": \"Basketball\",\n  \"games\": [\n    {\"match\": \"Lakers vs Celtics\", \"bet\": \"Lakers +3.5\"},\n    {\"match\": \"Bulls vs Heat\", \"bet\": \"Under 201\"}\n  ]\n}\n```\n\nLet me know if you need anything else.";
        let slip = parse(raw).unwrap();

        assert_eq!(slip.sport, "Basketball");
        assert_eq!(slip.parlay_label(), "2 Leg Parlay");
        assert_eq!(slip.games[1], GameLeg::new("Bulls vs Heat", "Under 201"));
    }

    #[test]
    fn test_unparsable_text_never_fails() {
        for raw in [
            "",
            "   ",
            "no json here",
            "{",
            "}{",
            "{\"sport\": 42}",
            "[\"Tennis\"]",
            "first {\"sport\":\"A\"} second {\"sport\":\"B\"}",
        ] {
            assert_eq!(parse(raw).unwrap(), BetSlip::unknown(), "input: {raw:?}");
        }
    }

    #[test]
    fn test_partial_shape_defaults() {
        let slip = parse(r#"{"games":[{"match":"X vs Y","bet":"X"}]}"#).unwrap();
        assert_eq!(slip.sport, "Sports");
        assert_eq!(slip.leg_count(), 1);

        let slip = parse(r#"{"sport":"Golf"}"#).unwrap();
        assert_eq!(slip, BetSlip::new("Golf", vec![]));
        assert_eq!(slip.parlay_label(), "0 Leg Parlay");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let raw = r#"{"sport":"Hockey","odds":"+250","games":[{"match":"Oilers vs Flames","bet":"Oilers ML","odds":-120}]}"#;
        let slip = parse(raw).unwrap();
        assert_eq!(slip, BetSlip::new("Hockey", vec![GameLeg::new("Oilers vs Flames", "Oilers ML")]));
    }

    #[test]
    fn test_incomplete_leg_is_dropped_and_order_kept() {
        let raw = r#"{"sport":"Football","games":[{"match":"A vs B","bet":"A"},{"match":"C vs D"},{"match":"E vs F","bet":"F"}]}"#;
        let slip = parse(raw).unwrap();

        assert_eq!(
            slip.games,
            vec![GameLeg::new("A vs B", "A"), GameLeg::new("E vs F", "F")]
        );
        assert_eq!(slip.parlay_label(), "2 Leg Parlay");
    }
}
