//! Turn controller
//!
//! One turn: validate the prompt, append the user message, stream the
//! producer's events through the aggregator and sinks, then persist the
//! assistant reply when the turn finished cleanly with visible text.

use crate::aggregate::{Aggregator, TurnOutcome};
use crate::conversation::Message;
use crate::event::fuse_final;
use crate::llm::EventProducer;
use crate::sink::Sink;
use crate::store::ConversationSlot;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Reasons a turn produces no outcome
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("a turn is already in progress for this conversation")]
    Busy,
    #[error("turn cancelled")]
    Cancelled,
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub id: Uuid,
    pub outcome: TurnOutcome,
    /// Trimmed visible text
    pub assistant_text: String,
    /// Whether an assistant message was added to the conversation
    pub appended: bool,
    /// Conversation after the turn
    pub conversation: Vec<Message>,
}

/// Drives turns against a producer
#[derive(Clone)]
pub struct TurnController {
    producer: Arc<dyn EventProducer>,
    show_thinking: bool,
}

impl TurnController {
    #[must_use]
    pub fn new(producer: Arc<dyn EventProducer>, show_thinking: bool) -> Self {
        Self {
            producer,
            show_thinking,
        }
    }

    /// Run one turn on `slot`.
    ///
    /// Producer failures are reported inside the outcome, never as `Err`.
    /// Cancelling drops the producer stream and leaves only the user message
    /// behind.
    ///
    /// # Errors
    ///
    /// - [`TurnError::EmptyPrompt`]: the prompt is blank
    /// - [`TurnError::Busy`]: the slot already has a turn running
    /// - [`TurnError::Cancelled`]: `cancel` fired before the stream closed
    pub async fn run(
        &self,
        slot: &ConversationSlot,
        prompt: &str,
        sinks: &mut [&mut dyn Sink],
        cancel: &CancellationToken,
    ) -> Result<TurnReport, TurnError> {
        if prompt.trim().is_empty() {
            return Err(TurnError::EmptyPrompt);
        }

        let turn = slot.begin_turn()?;
        let id = Uuid::new_v4();
        tracing::info!(
            turn_id = %id,
            session = %slot.session(),
            model = %self.producer.model_id(),
            "Turn started"
        );

        let messages = slot.append(&turn, Message::user(prompt)).await;
        let mut stream = fuse_final(self.producer.stream(&messages));
        let mut aggregator = Aggregator::new(self.show_thinking);

        while !aggregator.is_closed() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(turn_id = %id, session = %slot.session(), "Turn cancelled");
                    return Err(TurnError::Cancelled);
                }
                next = stream.next() => match next {
                    Some(event) => aggregator.observe(&event, sinks),
                    None => break,
                },
            }
        }
        drop(stream);

        let outcome = aggregator.finish();
        let assistant_text = outcome.assistant_text().to_string();
        let appended = outcome.completed && !outcome.errored && !assistant_text.is_empty();

        let conversation = if appended {
            slot.append(&turn, Message::assistant(assistant_text.clone()))
                .await
        } else {
            slot.snapshot().await
        };

        tracing::info!(
            turn_id = %id,
            session = %slot.session(),
            errored = outcome.errored,
            appended,
            visible_len = outcome.visible_text.len(),
            thinking_len = outcome.thinking_text.len(),
            "Turn finished"
        );

        Ok(TurnReport {
            id,
            outcome,
            assistant_text,
            appended,
            conversation,
        })
    }
}
