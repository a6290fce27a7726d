//! Pure framer transition function
//!
//! Given the same state, input and display toggle, `transition` always
//! produces the same next state and frames, with no I/O.

use super::{Frame, FrameInput, FramerState};

/// Result of a framer transition
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: FramerState,
    pub frames: Vec<Frame>,
}

impl TransitionResult {
    #[must_use]
    pub fn new(state: FramerState) -> Self {
        Self {
            new_state: state,
            frames: vec![],
        }
    }

    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }
}

/// Pure transition function
#[must_use]
pub fn transition(
    state: FramerState,
    input: FrameInput<'_>,
    show_thinking: bool,
) -> TransitionResult {
    match (state, input) {
        // Closed never reopens
        (FramerState::Closed, _) => TransitionResult::new(FramerState::Closed),

        (state, FrameInput::Chunk(chunk)) => {
            let mut result = TransitionResult::new(state);

            if let Some(thinking) = chunk.reasoning().filter(|_| show_thinking) {
                let current = result.new_state;
                result = match current {
                    FramerState::Idle => TransitionResult::new(FramerState::ThinkingOpen)
                        .with_frame(Frame::BeginThinking)
                        .with_frame(Frame::Thinking(thinking.to_string())),
                    FramerState::ThinkingOpen => {
                        result.with_frame(Frame::Thinking(thinking.to_string()))
                    }
                    // Span already closed by visible text
                    FramerState::TextFlowing | FramerState::Closed => result,
                };
            }

            if let Some(text) = chunk.visible() {
                if result.new_state == FramerState::ThinkingOpen {
                    result = result.with_frame(Frame::EndThinking);
                }
                result.new_state = FramerState::TextFlowing;
                result = result.with_frame(Frame::Text(text.to_string()));
            }

            result
        }

        (state, FrameInput::Finish { error }) => {
            let mut result = TransitionResult::new(FramerState::Closed);
            match state {
                FramerState::ThinkingOpen => result = result.with_frame(Frame::EndThinking),
                FramerState::TextFlowing => result = result.with_frame(Frame::Separator),
                FramerState::Idle | FramerState::Closed => {}
            }
            if let Some(message) = error {
                result = result.with_frame(Frame::Error(message.to_string()));
            }
            result.with_frame(Frame::EndOfStream)
        }
    }
}
