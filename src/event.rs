//! Streaming output data model
//!
//! A turn's output is a finite, ordered sequence of [`Event`]s, each carrying
//! zero or more [`Chunk`]s. Exactly one event per turn is final, and it is the
//! last one.

use crate::conversation::Role;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

/// Error attached when a producer stops without a final event
pub const INCOMPLETE_STREAM: &str = "stream ended before completion";

/// One fragment of model output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Visible answer fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Reasoning fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Provider payload, diagnostic only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl Chunk {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn thinking(thinking: impl Into<String>) -> Self {
        Self {
            thinking: Some(thinking.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::Assistant)
    }

    /// Visible fragment, if non-empty
    #[must_use]
    pub fn visible(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Reasoning fragment, if non-empty
    #[must_use]
    pub fn reasoning(&self) -> Option<&str> {
        self.thinking.as_deref().filter(|t| !t.is_empty())
    }
}

/// One delivery unit from a producer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Event {
    /// Non-final event wrapping a single chunk
    #[must_use]
    pub fn chunk(chunk: Chunk) -> Self {
        Self {
            chunks: vec![chunk],
            ..Self::default()
        }
    }

    /// Pure end-of-stream marker
    #[must_use]
    pub fn end() -> Self {
        Self {
            is_final: true,
            ..Self::default()
        }
    }

    /// Terminal error event; an error always ends the turn
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            chunks: Vec::new(),
            id: None,
            is_final: true,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Lazy, single-pass sequence of events for one turn
pub type EventStream = BoxStream<'static, Event>;

/// Enforce single termination on an arbitrary event stream.
///
/// Events pass through up to and including the first final one; anything the
/// inner stream yields afterwards is dropped. An event carrying an error is
/// promoted to final. If the inner stream runs dry without a final event, a
/// terminal error event is appended.
#[must_use]
pub fn fuse_final(inner: EventStream) -> EventStream {
    Box::pin(async_stream::stream! {
        let mut inner = inner;
        while let Some(mut event) = inner.next().await {
            if event.error.is_some() {
                event.is_final = true;
            }
            let done = event.is_final;
            yield event;
            if done {
                return;
            }
        }
        yield Event::failed(INCOMPLETE_STREAM);
    })
}

/// Build an event stream from an already-materialized sequence
#[must_use]
pub fn from_events(events: Vec<Event>) -> EventStream {
    futures::stream::iter(events).boxed()
}
