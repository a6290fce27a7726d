//! Output sinks
//!
//! A sink receives each raw [`Event`] as it arrives, followed by the frames
//! the framer derived from it. Both hooks default to no-ops so a sink only
//! implements what it renders.

mod channel;
mod console;
mod recording;
mod wire;

pub use channel::EventChannelSink;
pub use console::ConsoleSink;
pub use recording::RecordingSink;
pub use wire::{sse_frame, WireSink};

use crate::event::Event;
use crate::framing::Frame;

/// Consumer of framed turn output
pub trait Sink: Send {
    /// Raw event, delivered before its frames
    fn event(&mut self, _event: &Event) {}

    /// Framed output derived from the latest event
    fn frame(&mut self, _frame: &Frame) {}
}
