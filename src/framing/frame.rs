//! Framed output delivered to sinks

/// Framed output, emitted in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    BeginThinking,
    Thinking(String),
    EndThinking,
    Text(String),
    /// Trailing line break after visible text
    Separator,
    /// Terminal failure reported by the producer
    Error(String),
    EndOfStream,
}

impl Frame {
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        matches!(
            self,
            Frame::BeginThinking | Frame::Thinking(_) | Frame::EndThinking
        )
    }
}
