//! Server-push wire encoding

use super::Sink;
use crate::event::Event;
use std::io::Write;

/// Encode one event as a server-push frame: `data: <json>` and a blank line
#[must_use]
pub fn sse_frame(event: &Event) -> String {
    // Event contains only strings, numbers and JSON values; encoding cannot fail
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    format!("data: {json}\n\n")
}

/// Writes each event as a server-push frame
pub struct WireSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> WireSink<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Sink for WireSink<W> {
    fn event(&mut self, event: &Event) {
        let written = self
            .out
            .write_all(sse_frame(event).as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "Wire write failed");
        }
    }
}
