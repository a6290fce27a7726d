//! Conversation store
//!
//! One conversation per session id. Each conversation carries its own turn
//! lock so at most one turn is in flight per conversation, while distinct
//! sessions run fully in parallel. Conversations are append-only; resetting a
//! session replaces its conversation with a fresh one.

use crate::conversation::{Conversation, Message};
use crate::turn::TurnError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Session used when a caller does not name one
pub const DEFAULT_SESSION: &str = "default";

/// Registry of conversations keyed by session id
pub struct ConversationStore {
    system_prompt: String,
    slots: RwLock<HashMap<String, Arc<ConversationSlot>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn fresh_slot(&self, session: &str) -> Arc<ConversationSlot> {
        Arc::new(ConversationSlot::new(
            session,
            Conversation::new(self.system_prompt.clone()),
        ))
    }

    /// Get the slot for a session, creating it seeded with the system prompt
    pub async fn slot(&self, session: &str) -> Arc<ConversationSlot> {
        if let Some(slot) = self.slots.read().await.get(session) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().await;
        let slot = slots.entry(session.to_string()).or_insert_with(|| {
            tracing::info!(session = %session, "Created conversation");
            self.fresh_slot(session)
        });
        Arc::clone(slot)
    }

    /// Look up an existing session without creating it
    pub async fn get(&self, session: &str) -> Option<Arc<ConversationSlot>> {
        self.slots.read().await.get(session).cloned()
    }

    /// Start the session over with a new conversation.
    ///
    /// The old conversation is left untouched. Returns `Ok(None)` for an
    /// unknown session.
    ///
    /// # Errors
    ///
    /// [`TurnError::Busy`] while a turn is running on the session.
    pub async fn reset(&self, session: &str) -> Result<Option<Arc<ConversationSlot>>, TurnError> {
        let mut slots = self.slots.write().await;
        let Some(old) = slots.get(session).cloned() else {
            return Ok(None);
        };
        let _turn = old.begin_turn()?;

        let fresh = self.fresh_slot(session);
        slots.insert(session.to_string(), Arc::clone(&fresh));
        tracing::info!(session = %session, "Conversation reset");
        Ok(Some(fresh))
    }

    pub async fn session_count(&self) -> usize {
        self.slots.read().await.len()
    }
}

/// One conversation plus its turn lock
pub struct ConversationSlot {
    session: String,
    conversation: RwLock<Conversation>,
    turn: Mutex<()>,
}

/// Held for the duration of a turn
pub type TurnGuard<'a> = MutexGuard<'a, ()>;

impl ConversationSlot {
    #[must_use]
    pub fn new(session: impl Into<String>, conversation: Conversation) -> Self {
        Self {
            session: session.into(),
            conversation: RwLock::new(conversation),
            turn: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Claim the turn lock, failing fast if a turn is already running
    ///
    /// # Errors
    ///
    /// [`TurnError::Busy`] if the lock is held.
    pub fn begin_turn(&self) -> Result<TurnGuard<'_>, TurnError> {
        self.turn.try_lock().map_err(|_| TurnError::Busy)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.turn.try_lock().is_err()
    }

    /// Read-only copy of the message log
    pub async fn snapshot(&self) -> Vec<Message> {
        self.conversation.read().await.snapshot()
    }

    /// Append under the turn lock held by the caller
    pub(crate) async fn append(&self, _turn: &TurnGuard<'_>, message: Message) -> Vec<Message> {
        let mut conversation = self.conversation.write().await;
        conversation.append(message);
        conversation.snapshot()
    }
}
