//! HTTP API
//!
//! Request/response, server-push and socket transports over one
//! conversation store.

mod handlers;
mod sse;
mod types;
mod ws;

#[cfg(test)]
mod testing;

pub use handlers::create_router;
pub use types::*;

use crate::llm::EventProducer;
use crate::store::ConversationStore;
use crate::turn::TurnController;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConversationStore>,
    pub controller: TurnController,
}

impl AppState {
    #[must_use]
    pub fn new(
        producer: Arc<dyn EventProducer>,
        system_prompt: &str,
        show_thinking: bool,
    ) -> Self {
        Self {
            store: Arc::new(ConversationStore::new(system_prompt)),
            controller: TurnController::new(producer, show_thinking),
        }
    }
}
