//! Mock producers and transports for testing
//!
//! These mocks exercise the pipeline without real network I/O, plus a
//! loopback server for the transports that need a real socket.

use super::moonshot::{ByteStream, ChatRequest, ChatTransport};
use super::{EventProducer, LlmError};
use crate::conversation::Message;
use crate::event::{Event, EventStream};
use async_trait::async_trait;
use futures::stream::StreamExt;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Local endpoints
// ============================================================================

/// Serve `router` on an ephemeral loopback port for the rest of the test
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

// ============================================================================
// Transports
// ============================================================================

/// Transport that fails the test if a connection is ever attempted
pub struct UnreachableTransport;

#[async_trait]
impl ChatTransport for UnreachableTransport {
    async fn open(&self, _api_key: &str, _request: &ChatRequest) -> Result<ByteStream, LlmError> {
        panic!("transport must not be contacted");
    }
}

/// Transport replaying canned body reads
pub struct CannedTransport {
    body: Mutex<Option<Vec<Result<Vec<u8>, LlmError>>>>,
    open_error: Option<LlmError>,
    requests: Mutex<VecDeque<ChatRequest>>,
}

impl CannedTransport {
    pub fn new(body: Vec<Result<Vec<u8>, LlmError>>) -> Self {
        Self {
            body: Mutex::new(Some(body)),
            open_error: None,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Transport whose connection attempt itself fails
    pub fn failing(error: LlmError) -> Self {
        Self {
            body: Mutex::new(None),
            open_error: Some(error),
            requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().back().cloned()
    }
}

#[async_trait]
impl ChatTransport for CannedTransport {
    async fn open(&self, _api_key: &str, request: &ChatRequest) -> Result<ByteStream, LlmError> {
        self.requests.lock().unwrap().push_back(request.clone());
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        let body = self.body.lock().unwrap().take().unwrap_or_default();
        Ok(futures::stream::iter(body).boxed())
    }
}

// ============================================================================
// Producers
// ============================================================================

/// Producer replaying a fixed event script
pub struct ScriptedProducer {
    events: Vec<Event>,
    hang: bool,
    calls: Mutex<Vec<Vec<Message>>>,
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ScriptedProducer {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            hang: false,
            calls: Mutex::new(Vec::new()),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Yield the script, then never produce another event
    pub fn hanging(events: Vec<Event>) -> Self {
        Self {
            hang: true,
            ..Self::new(events)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Conversation passed to the most recent `stream` call
    pub fn last_call(&self) -> Option<Vec<Message>> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Whether the most recently produced stream has been dropped
    pub fn stream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl EventProducer for ScriptedProducer {
    fn stream(&self, messages: &[Message]) -> EventStream {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.dropped.store(false, Ordering::SeqCst);

        let events = self.events.clone();
        let hang = self.hang;
        let guard = DropFlag(Arc::clone(&self.dropped));

        Box::pin(async_stream::stream! {
            let _guard = guard;
            for event in events {
                yield event;
            }
            if hang {
                futures::future::pending::<()>().await;
            }
        })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}
