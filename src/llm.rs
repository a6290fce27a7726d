//! LLM producer abstraction
//!
//! A producer turns a conversation into a lazy, single-pass [`EventStream`].
//! Producers never fail past their boundary: every failure is delivered as a
//! terminal error [`Event`](crate::event::Event).

mod config;
mod error;
mod moonshot;
mod sse;

#[cfg(test)]
pub mod testing;

pub use config::{LlmConfig, API_KEY_ENV};
pub use error::{LlmError, LlmErrorKind};
pub use moonshot::{
    ByteStream, ChatMessage, ChatRequest, ChatTransport, HttpTransport, MoonshotProducer,
};
pub use sse::{SseDecoder, SseFrame};

use crate::conversation::Message;
use crate::event::EventStream;
use futures::stream::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for event producers
pub trait EventProducer: Send + Sync {
    /// Open a turn over the full ordered conversation
    fn stream(&self, messages: &[Message]) -> EventStream;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

impl<T: EventProducer + ?Sized> EventProducer for Arc<T> {
    fn stream(&self, messages: &[Message]) -> EventStream {
        (**self).stream(messages)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for producers
pub struct LoggingProducer {
    inner: Arc<dyn EventProducer>,
    model_id: String,
}

impl LoggingProducer {
    #[must_use]
    pub fn new(inner: Arc<dyn EventProducer>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

impl EventProducer for LoggingProducer {
    fn stream(&self, messages: &[Message]) -> EventStream {
        let inner = self.inner.stream(messages);
        let model = self.model_id.clone();
        let sent = messages.len();

        Box::pin(async_stream::stream! {
            let start = Instant::now();
            let mut chunks = 0usize;
            let mut inner = inner;

            while let Some(event) = inner.next().await {
                chunks += event.chunks.len();
                if event.is_final {
                    let duration_ms = start.elapsed().as_millis();
                    match &event.error {
                        None => tracing::info!(
                            model = %model,
                            messages = sent,
                            duration_ms = %duration_ms,
                            chunks,
                            "LLM stream completed"
                        ),
                        Some(error) => tracing::error!(
                            model = %model,
                            messages = sent,
                            duration_ms = %duration_ms,
                            chunks,
                            error = %error,
                            "LLM stream failed"
                        ),
                    }
                }
                yield event;
            }
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProducer;
    use super::*;
    use crate::event::{Chunk, Event};

    #[tokio::test]
    async fn test_logging_producer_is_transparent() {
        let script = vec![
            Event::chunk(Chunk::thinking("hmm")),
            Event::chunk(Chunk::text("Hi")),
            Event::end(),
        ];
        let inner = Arc::new(ScriptedProducer::new(script.clone()));
        let producer = LoggingProducer::new(inner.clone());

        let events: Vec<Event> = producer.stream(&[Message::user("x")]).collect().await;
        assert_eq!(events, script);
        assert_eq!(producer.model_id(), "scripted");
        assert_eq!(inner.call_count(), 1);
    }
}
