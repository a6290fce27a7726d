//! Test fixtures for the HTTP and socket transports

use super::{create_router, AppState};
use crate::event::{Chunk, Event};
use crate::llm::testing::ScriptedProducer;
use crate::store::ConversationSlot;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub producer: Arc<ScriptedProducer>,
}

pub fn app(producer: ScriptedProducer) -> TestApp {
    let producer = Arc::new(producer);
    let state = AppState::new(producer.clone(), "You are Kimi.", true);
    TestApp {
        router: create_router(state.clone()),
        state,
        producer,
    }
}

/// Thinking, two text fragments, clean end
pub fn hello() -> Vec<Event> {
    vec![
        Event::chunk(Chunk::thinking("hmm")),
        Event::chunk(Chunk::text("Hel")),
        Event::chunk(Chunk::text("lo")),
        Event::end(),
    ]
}

/// One text fragment, then the producer never finishes
pub fn stalled() -> ScriptedProducer {
    ScriptedProducer::hanging(vec![Event::chunk(Chunk::text("partial"))])
}

/// Wait for a background turn on `slot` to release its lock
pub async fn wait_until_idle(slot: &ConversationSlot) {
    for _ in 0..400 {
        if !slot.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("turn on {} never finished", slot.session());
}
