//! Turn aggregation
//!
//! Wraps the framer so that a single pass over a turn's events both drives
//! the sinks and reduces the turn to its final thinking and visible strings.

#[cfg(test)]
mod proptests;

use crate::event::Event;
use crate::framing::{Frame, Framer};
use crate::sink::Sink;
use serde::Serialize;

/// Reduced result of one turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// Forwarded reasoning fragments, empty when thinking display is off
    pub thinking_text: String,
    /// Every chunk's text, in arrival order
    pub visible_text: String,
    pub errored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// A final event was observed
    pub completed: bool,
}

impl TurnOutcome {
    /// Visible text as persisted in the conversation
    #[must_use]
    pub fn assistant_text(&self) -> &str {
        self.visible_text.trim()
    }
}

/// Framer plus running concatenations
#[derive(Debug)]
pub struct Aggregator {
    framer: Framer,
    outcome: TurnOutcome,
}

impl Aggregator {
    #[must_use]
    pub fn new(show_thinking: bool) -> Self {
        Self {
            framer: Framer::new(show_thinking),
            outcome: TurnOutcome::default(),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outcome.completed
    }

    /// Dispatch one event to the sinks and fold it into the running result.
    /// Events after the final one are ignored.
    pub fn observe(&mut self, event: &Event, sinks: &mut [&mut dyn Sink]) {
        if self.is_closed() {
            return;
        }

        for sink in sinks.iter_mut() {
            sink.event(event);
        }

        for chunk in &event.chunks {
            if let Some(text) = &chunk.text {
                self.outcome.visible_text.push_str(text);
            }
        }

        for frame in self.framer.observe(event) {
            if let Frame::Thinking(fragment) = &frame {
                self.outcome.thinking_text.push_str(fragment);
            }
            for sink in sinks.iter_mut() {
                sink.frame(&frame);
            }
        }

        if event.is_final {
            self.outcome.completed = true;
            self.outcome.errored = event.is_error();
            self.outcome.error_message.clone_from(&event.error);
        }
    }

    #[must_use]
    pub fn finish(self) -> TurnOutcome {
        self.outcome
    }
}

/// Aggregate an already-materialized event sequence without sinks
#[must_use]
pub fn aggregate(events: &[Event], show_thinking: bool) -> TurnOutcome {
    let mut aggregator = Aggregator::new(show_thinking);
    for event in events {
        aggregator.observe(event, &mut []);
    }
    aggregator.finish()
}
