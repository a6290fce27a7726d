//! Terminal renderer

use super::Sink;
use crate::framing::Frame;
use std::io::{self, Write};

const BEGIN_THINKING: &str = "----------\nBegin thinking\n----------------\n";
const END_THINKING: &str = "\n----------\nEnd thinking\n--------------\n";
const END_OF_STREAM: &str = "-- end of stream --\n";

/// Streams frames to a writer, flushing after every fragment
pub struct ConsoleSink<W: Write + Send> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        match frame {
            Frame::BeginThinking => self.out.write_all(BEGIN_THINKING.as_bytes())?,
            Frame::Thinking(text) | Frame::Text(text) => self.out.write_all(text.as_bytes())?,
            Frame::EndThinking => self.out.write_all(END_THINKING.as_bytes())?,
            Frame::Separator => self.out.write_all(b"\n")?,
            Frame::Error(message) => writeln!(self.out, "[error] {message}")?,
            Frame::EndOfStream => self.out.write_all(END_OF_STREAM.as_bytes())?,
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn frame(&mut self, frame: &Frame) {
        if let Err(e) = self.render(frame) {
            tracing::warn!(error = %e, "Console write failed");
        }
    }
}
