//! Incremental Server-Sent Events decoder for provider responses
//!
//! Bytes are buffered until a full line is available so multi-byte UTF-8
//! sequences split across network reads decode correctly. `data:` lines are
//! accumulated and dispatched as one frame at the blank line ending an event.

/// Buffered SSE event decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Option<String>,
}

impl SseDecoder {
    /// Upper bound on a single unterminated line or event
    const MAX_BUFFER_SIZE: usize = 1024 * 1024;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every event completed by them
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        let pending = self.buffer.len() + self.data.as_ref().map_or(0, String::len);
        if pending > Self::MAX_BUFFER_SIZE {
            tracing::warn!(bytes = pending, "SSE event exceeded buffer limit, discarding");
            self.buffer.clear();
            self.data = None;
        }

        frames
    }

    /// Dispatch whatever the body left behind without a closing blank line
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        if let Some(frame) = self.process_line(&rest) {
            return Some(frame);
        }
        self.data.take().map(|data| SseFrame { data })
    }

    #[must_use]
    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty() || self.data.is_some()
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<SseFrame> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\n', '\r']);

        if line.is_empty() {
            return self.data.take().map(|data| SseFrame { data });
        }

        // Comments, event names and ids carry nothing we use
        let value = line.strip_prefix("data:")?;
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut self.data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
        None
    }
}

/// One event's `data` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub data: String,
}

impl SseFrame {
    /// `[DONE]` sentinel closing an `OpenAI`-style stream
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// First 200 characters, for log lines
    #[must_use]
    pub fn preview(&self) -> String {
        self.data.chars().take(200).collect()
    }
}
