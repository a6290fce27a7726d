//! API request and response types

use crate::conversation::Message;
use crate::event::Event;
use crate::store::DEFAULT_SESSION;
use crate::turn::TurnReport;
use serde::{Deserialize, Serialize};

/// `?session=` selector shared by every endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

impl SessionQuery {
    #[must_use]
    pub fn session(&self) -> &str {
        self.session
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION)
    }
}

/// Query for the server-push endpoint
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub prompt: String,
    #[serde(flatten)]
    pub session: SessionQuery,
}

/// Body of a request/response turn, also the socket client message
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Result of a request/response turn
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub thinking_text: String,
    pub visible_text: String,
    pub assistant_text: String,
    pub errored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub messages: Vec<Message>,
}

impl From<TurnReport> for ReplyResponse {
    fn from(report: TurnReport) -> Self {
        Self {
            thinking_text: report.outcome.thinking_text,
            visible_text: report.outcome.visible_text,
            assistant_text: report.assistant_text,
            errored: report.outcome.errored,
            error: report.outcome.error_message,
            messages: report.conversation,
        }
    }
}

/// Conversation snapshot
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Messages pushed over the socket
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Chunk { event: Event },
    Complete(ReplyResponse),
    Error { error: String },
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
