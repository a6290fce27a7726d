//! Stateful driver over the pure transition function

use super::{transition, Frame, FrameInput, FramerState};
use crate::event::Event;

/// Consumes one turn's events exactly once, separating reasoning from text
#[derive(Debug, Clone)]
pub struct Framer {
    state: FramerState,
    show_thinking: bool,
}

impl Framer {
    #[must_use]
    pub fn new(show_thinking: bool) -> Self {
        Self {
            state: FramerState::Idle,
            show_thinking,
        }
    }

    #[must_use]
    pub fn state(&self) -> FramerState {
        self.state
    }

    pub fn feed(&mut self, input: FrameInput<'_>) -> Vec<Frame> {
        let result = transition(self.state, input, self.show_thinking);
        self.state = result.new_state;
        result.frames
    }

    /// Frame every chunk of an event, then close the stream if it is final
    pub fn observe(&mut self, event: &Event) -> Vec<Frame> {
        let mut frames = Vec::new();
        for chunk in &event.chunks {
            frames.extend(self.feed(FrameInput::Chunk(chunk)));
        }
        if event.is_final {
            frames.extend(self.feed(FrameInput::Finish {
                error: event.error.as_deref(),
            }));
        }
        frames
    }
}
