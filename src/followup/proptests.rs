//! Property-based tests for the follow-up question parser

use super::*;
use proptest::prelude::*;

fn arb_question() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ,']{0,40}\\?"
}

proptest! {
    #[test]
    fn prop_never_more_than_limit(text in ".{0,300}", limit in 0usize..4) {
        prop_assert!(parse_questions(&text, limit).len() <= limit);
    }

    #[test]
    fn prop_well_formed_pair_round_trips(
        preamble in "[A-Za-z ]{0,40}",
        first in arb_question(),
        second in arb_question(),
    ) {
        let text = format!("{preamble}\n1. {first}\n2. {second}\n");
        let parsed = parse_questions(&text, 2);
        prop_assert_eq!(parsed, vec![first.trim().to_string(), second.trim().to_string()]);
    }

    #[test]
    fn prop_questions_are_trimmed_and_non_empty(text in "(( *[12-]\\.? ?)?[a-z ]{0,12}\n){0,6}") {
        for question in parse_questions(&text, 2) {
            prop_assert!(!question.is_empty());
            prop_assert_eq!(question.trim(), question.as_str());
        }
    }
}
