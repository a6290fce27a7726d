//! Framer state

/// Where the framer is within one turn's output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramerState {
    /// Nothing forwarded yet
    #[default]
    Idle,
    /// A reasoning span is open
    ThinkingOpen,
    /// Visible text has started; reasoning can no longer open a span
    TextFlowing,
    /// End of stream reached; further input is ignored
    Closed,
}

impl FramerState {
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, FramerState::Closed)
    }
}
