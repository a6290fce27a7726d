//! Inputs that drive framer transitions

use crate::event::Chunk;

/// One step of input, in arrival order
#[derive(Debug, Clone, Copy)]
pub enum FrameInput<'a> {
    /// A chunk from a non-terminal position in the event sequence
    Chunk(&'a Chunk),
    /// The final event was observed
    Finish { error: Option<&'a str> },
}
