//! Property-based tests for state merging
//!
//! Whatever sequence of updates the stages produce, the transcript only grows
//! and cancellation never reverts.

use super::*;
use proptest::prelude::*;

fn arb_mood() -> impl Strategy<Value = Mood> {
    prop_oneof![
        Just(Mood::Crisis),
        Just(Mood::Anxiety),
        Just(Mood::Depression),
        Just(Mood::Positive),
        Just(Mood::General),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (any::<bool>(), "[a-zA-Z ]{0,30}").prop_map(|(is_user, content)| {
        if is_user {
            Message::user(content)
        } else {
            Message::assistant(content)
        }
    })
}

fn arb_update() -> impl Strategy<Value = StateUpdate> {
    (
        proptest::collection::vec(arb_message(), 0..4),
        proptest::option::of(arb_mood()),
        any::<bool>(),
        proptest::collection::vec("[a-z ]{1,20}", 0..3),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(
            |(messages, mood, cancelled, retrieved_context, awaiting_follow_up)| StateUpdate {
                messages,
                mood,
                cancelled,
                retrieved_context,
                awaiting_follow_up,
            },
        )
}

proptest! {
    #[test]
    fn prop_messages_never_shrink(updates in proptest::collection::vec(arb_update(), 0..10)) {
        let mut state = ConversationState::new();
        let mut previous = 0;
        for update in updates {
            state.apply(update);
            prop_assert!(state.messages.len() >= previous);
            previous = state.messages.len();
        }
    }

    #[test]
    fn prop_cancelled_stays_true(updates in proptest::collection::vec(arb_update(), 1..10)) {
        let mut state = ConversationState::new();
        let mut seen_cancel = false;
        for update in updates {
            seen_cancel |= update.cancelled;
            state.apply(update);
            prop_assert_eq!(state.cancelled, seen_cancel);
        }
    }

    #[test]
    fn prop_existing_messages_keep_their_position(
        first in arb_update(),
        rest in proptest::collection::vec(arb_update(), 0..5),
    ) {
        let mut state = ConversationState::new();
        state.apply(first);
        let prefix = state.messages.clone();
        for update in rest {
            state.apply(update);
        }
        prop_assert_eq!(&state.messages[..prefix.len()], &prefix[..]);
    }
}
