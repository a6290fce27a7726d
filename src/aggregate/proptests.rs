//! Property-based tests for turn aggregation

use super::*;
use crate::event::Chunk;
use crate::sink::RecordingSink;
use proptest::prelude::*;

fn arb_fragment() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        2 => Just(None),
        1 => Just(Some(String::new())),
        4 => "[a-zA-Z \n]{1,8}".prop_map(Some),
    ]
}

fn arb_events() -> impl Strategy<Value = Vec<Event>> {
    (
        proptest::collection::vec(
            proptest::collection::vec(
                (arb_fragment(), arb_fragment()).prop_map(|(text, thinking)| Chunk {
                    text,
                    thinking,
                    ..Chunk::default()
                }),
                0..3,
            ),
            0..16,
        ),
        proptest::option::of("[a-z ]{1,12}"),
    )
        .prop_map(|(bodies, error)| {
            let mut events: Vec<Event> = bodies
                .into_iter()
                .map(|chunks| Event {
                    chunks,
                    ..Event::default()
                })
                .collect();
            events.push(error.map_or_else(Event::end, Event::failed));
            events
        })
}

proptest! {
    #[test]
    fn visible_text_is_concatenation_of_all_text(events in arb_events(), show in any::<bool>()) {
        let expected: String = events
            .iter()
            .flat_map(|e| e.chunks.iter())
            .filter_map(|c| c.text.as_deref())
            .collect();
        prop_assert_eq!(aggregate(&events, show).visible_text, expected);
    }

    #[test]
    fn visible_text_ignores_display_toggle(events in arb_events()) {
        prop_assert_eq!(
            aggregate(&events, true).visible_text,
            aggregate(&events, false).visible_text
        );
    }

    #[test]
    fn hidden_thinking_yields_empty_thinking_text(events in arb_events()) {
        prop_assert_eq!(aggregate(&events, false).thinking_text, "");
    }

    #[test]
    fn aggregation_is_idempotent(events in arb_events(), show in any::<bool>()) {
        prop_assert_eq!(aggregate(&events, show), aggregate(&events, show));
    }

    #[test]
    fn errored_matches_terminal_event(events in arb_events(), show in any::<bool>()) {
        let outcome = aggregate(&events, show);
        let last = events.last().unwrap();
        prop_assert!(outcome.completed);
        prop_assert_eq!(outcome.errored, last.error.is_some());
        prop_assert_eq!(outcome.error_message, last.error.clone());
    }

    #[test]
    fn sinks_see_every_event_once(events in arb_events(), show in any::<bool>()) {
        let mut recorder = RecordingSink::new();
        let mut aggregator = Aggregator::new(show);
        for event in &events {
            aggregator.observe(event, &mut [&mut recorder]);
        }
        prop_assert_eq!(recorder.events, events);
    }
}
