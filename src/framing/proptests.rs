//! Property-based tests for the framer
//!
//! These tests verify the framing invariants hold for arbitrary chunk
//! sequences, with and without reasoning display.

use super::*;
use crate::event::{Chunk, Event};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_fragment() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        2 => Just(None),
        1 => Just(Some(String::new())),
        4 => "[a-z ]{1,8}".prop_map(Some),
    ]
}

fn arb_chunk() -> impl Strategy<Value = Chunk> {
    (arb_fragment(), arb_fragment()).prop_map(|(text, thinking)| Chunk {
        text,
        thinking,
        ..Chunk::default()
    })
}

/// Non-final events followed by one terminal event, optionally errored
fn arb_events() -> impl Strategy<Value = Vec<Event>> {
    (
        proptest::collection::vec(proptest::collection::vec(arb_chunk(), 0..3), 0..12),
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
            events.push(match error {
                Some(message) => Event::failed(message),
                None => Event::end(),
            });
            events
        })
}

fn frame_all(events: &[Event], show_thinking: bool) -> Vec<Frame> {
    let mut framer = Framer::new(show_thinking);
    events.iter().flat_map(|e| framer.observe(e)).collect()
}

fn all_chunks(events: &[Event]) -> impl Iterator<Item = &Chunk> {
    events.iter().flat_map(|e| e.chunks.iter())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn end_of_stream_exactly_once_and_last(events in arb_events(), show in any::<bool>()) {
        let frames = frame_all(&events, show);
        let ends = frames.iter().filter(|f| **f == Frame::EndOfStream).count();
        prop_assert_eq!(ends, 1);
        prop_assert_eq!(frames.last(), Some(&Frame::EndOfStream));
    }

    #[test]
    fn text_frames_preserve_every_fragment_in_order(events in arb_events(), show in any::<bool>()) {
        let framed: String = frame_all(&events, show)
            .into_iter()
            .filter_map(|f| match f {
                Frame::Text(t) => Some(t),
                _ => None,
            })
            .collect();
        let expected: String = all_chunks(&events).filter_map(|c| c.text.clone()).collect();
        prop_assert_eq!(framed, expected);
    }

    #[test]
    fn hidden_thinking_emits_no_thinking_frames(events in arb_events()) {
        prop_assert!(frame_all(&events, false).iter().all(|f| !f.is_thinking()));
    }

    #[test]
    fn thinking_span_is_well_formed(events in arb_events()) {
        let frames = frame_all(&events, true);
        let begins: Vec<usize> = frames
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == Frame::BeginThinking)
            .map(|(i, _)| i)
            .collect();
        let ends: Vec<usize> = frames
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == Frame::EndThinking)
            .map(|(i, _)| i)
            .collect();

        prop_assert!(begins.len() <= 1);
        prop_assert_eq!(begins.len(), ends.len());
        if let (Some(&begin), Some(&end)) = (begins.first(), ends.first()) {
            prop_assert!(begin < end);
            // every thinking fragment sits inside the span, no text before it closes
            for (i, frame) in frames.iter().enumerate() {
                match frame {
                    Frame::Thinking(_) => prop_assert!(begin < i && i < end),
                    Frame::Text(_) => prop_assert!(i > end),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn thinking_frames_are_the_pre_text_reasoning(events in arb_events()) {
        let framed: Vec<String> = frame_all(&events, true)
            .into_iter()
            .filter_map(|f| match f {
                Frame::Thinking(t) => Some(t),
                _ => None,
            })
            .collect();

        let mut expected = Vec::new();
        for chunk in all_chunks(&events) {
            if let Some(t) = chunk.reasoning() {
                expected.push(t.to_string());
            }
            if chunk.visible().is_some() {
                break;
            }
        }
        prop_assert_eq!(framed, expected);
    }

    #[test]
    fn error_is_surfaced_before_end(events in arb_events(), show in any::<bool>()) {
        let frames = frame_all(&events, show);
        let error = events.last().and_then(|e| e.error.clone());
        match error {
            Some(message) => {
                let n = frames.len();
                prop_assert!(n >= 2);
                prop_assert_eq!(&frames[n - 2], &Frame::Error(message));
            }
            None => prop_assert!(!frames.iter().any(|f| matches!(f, Frame::Error(_)))),
        }
    }

    #[test]
    fn transition_is_deterministic(events in arb_events(), show in any::<bool>()) {
        prop_assert_eq!(frame_all(&events, show), frame_all(&events, show));
    }
}
