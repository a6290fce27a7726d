//! Thinking/text framing state machine
//!
//! Implements the Elm Architecture pattern: a pure `transition` from
//! (state, input) to (state, frames), wrapped by a stateful [`Framer`].

mod frame;
mod framer;
mod input;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use frame::Frame;
pub use framer::Framer;
pub use input::FrameInput;
pub use state::FramerState;
pub use transition::{transition, TransitionResult};
