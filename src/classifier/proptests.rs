//! Property-based tests for the classifier

use super::*;
use proptest::prelude::*;

fn arb_filler() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,8}", 0..6).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn prop_classification_is_deterministic(text in ".{0,80}") {
        let classifier = Classifier::new();
        prop_assert_eq!(classifier.classify(&text), classifier.classify(&text));
    }

    #[test]
    fn prop_crisis_phrase_always_wins(
        before in arb_filler(),
        after in arb_filler(),
        anxious in any::<bool>(),
    ) {
        let classifier = Classifier::new();
        let extra = if anxious { "i am anxious and sad" } else { "" };
        let text = format!("{before} {extra} i want to kill myself {after}");
        prop_assert_eq!(classifier.classify(&text), Mood::Crisis);
    }

    #[test]
    fn prop_case_does_not_matter(text in "[a-zA-Z ]{0,60}") {
        let classifier = Classifier::new();
        prop_assert_eq!(
            classifier.classify(&text),
            classifier.classify(&text.to_uppercase())
        );
    }
}
