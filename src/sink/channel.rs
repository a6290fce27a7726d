//! Forwards raw events to an async consumer

use super::Sink;
use crate::event::Event;
use tokio::sync::mpsc;

/// Pushes every event into an unbounded channel
///
/// Used by push transports (SSE, WebSocket) that serialize whole events.
/// Once the receiver is gone further events are dropped silently.
pub struct EventChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventChannelSink {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Sink for EventChannelSink {
    fn event(&mut self, event: &Event) {
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!("Event receiver dropped");
        }
    }
}
