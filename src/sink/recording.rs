//! Sink that remembers everything it was given

use super::Sink;
use crate::event::Event;
use crate::framing::Frame;

#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<Event>,
    pub frames: Vec<Frame>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for RecordingSink {
    fn event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    fn frame(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }
}
