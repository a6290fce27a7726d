//! Moonshot (`OpenAI`-compatible chat completions) streaming producer

use super::config::{LlmConfig, API_KEY_ENV};
use super::sse::{SseDecoder, SseFrame};
use super::{EventProducer, LlmError};
use crate::conversation::{Message, Role};
use crate::event::{from_events, Chunk, Event, EventStream};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Raw response body, one network read per item
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, LlmError>>;

/// Opens the streaming connection to the remote endpoint
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// # Errors
    ///
    /// Connection failures and non-success statuses, classified as [`LlmError`].
    async fn open(&self, api_key: &str, request: &ChatRequest) -> Result<ByteStream, LlmError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.completions_url(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, api_key: &str, request: &ChatRequest) -> Result<ByteStream, LlmError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|r| r.error.message())
                .unwrap_or(body);
            return Err(LlmError::from_status(status, &message));
        }

        Ok(response
            .bytes_stream()
            .map(|read| read.map(|bytes| bytes.to_vec()).map_err(LlmError::from))
            .boxed())
    }
}

/// Streams a conversation through the Moonshot chat completions API
pub struct MoonshotProducer {
    config: LlmConfig,
    transport: Arc<dyn ChatTransport>,
}

impl MoonshotProducer {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    #[must_use]
    pub fn with_transport(config: LlmConfig, transport: Arc<dyn ChatTransport>) -> Self {
        Self { config, transport }
    }

    fn build_request(&self, messages: &[Message]) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: m.text.clone(),
                })
                .collect(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: true,
        }
    }
}

impl EventProducer for MoonshotProducer {
    fn stream(&self, messages: &[Message]) -> EventStream {
        let Some(api_key) = self.config.api_key.clone() else {
            let err = LlmError::config(format!("{API_KEY_ENV} is not set"));
            tracing::warn!(error = %err, "Refusing to contact provider");
            return from_events(vec![Event::failed(err.message)]);
        };

        let request = self.build_request(messages);
        let transport = Arc::clone(&self.transport);

        Box::pin(async_stream::stream! {
            let mut body = match transport.open(&api_key, &request).await {
                Ok(body) => body,
                Err(e) => {
                    log_failure(&e);
                    yield Event::failed(e.message);
                    return;
                }
            };

            let mut decoder = SseDecoder::new();
            let mut index = 0u64;

            while let Some(read) = body.next().await {
                let bytes = match read {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log_failure(&e);
                        yield Event::failed(e.message);
                        return;
                    }
                };
                for frame in decoder.push(&bytes) {
                    match translate(&frame, &mut index) {
                        Translated::Event(event) => {
                            yield event;
                        }
                        Translated::Skip => {}
                        Translated::Done => {
                            yield Event::end();
                            return;
                        }
                        Translated::Failed(e) => {
                            log_failure(&e);
                            yield Event::failed(e.message);
                            return;
                        }
                    }
                }
            }

            if let Some(frame) = decoder.finish() {
                match translate(&frame, &mut index) {
                    Translated::Event(event) => {
                        yield event;
                    }
                    Translated::Failed(e) => {
                        log_failure(&e);
                        yield Event::failed(e.message);
                        return;
                    }
                    Translated::Skip | Translated::Done => {}
                }
            }

            yield Event::end();
        })
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

fn log_failure(e: &LlmError) {
    tracing::warn!(
        kind = ?e.kind,
        retryable = e.kind.is_retryable(),
        error = %e,
        "Provider stream failed"
    );
}

/// What a single SSE frame contributes to the event sequence
#[derive(Debug)]
enum Translated {
    Event(Event),
    Skip,
    Done,
    Failed(LlmError),
}

fn translate(frame: &SseFrame, index: &mut u64) -> Translated {
    if frame.is_done() {
        return Translated::Done;
    }

    let chunk: CompletionChunk = match serde_json::from_str(&frame.data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!(
                error = %e,
                data = %frame.preview(),
                "Skipping malformed stream fragment"
            );
            return Translated::Skip;
        }
    };

    if let Some(error) = chunk.error {
        return Translated::Failed(LlmError::server_error(error.message()));
    }

    // Only the first choice is ever requested
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Translated::Skip;
    };

    let delta = StreamDelta::deserialize(&choice.delta).unwrap_or_default();
    let out = Chunk {
        text: delta.content,
        thinking: delta.reasoning_content,
        index: Some(*index),
        role: Some(Role::Assistant),
        raw: (!choice.delta.is_null()).then_some(choice.delta),
    };
    *index += 1;

    let event = Event::chunk(out);
    Translated::Event(match chunk.id {
        Some(id) => event.with_id(id),
        None => event,
    })
}

// Request types

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: Value,
}

/// The delta fields we understand; anything else is ignored
#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default, deserialize_with = "lenient_string")]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    reasoning_content: Option<String>,
}

/// Providers report errors either as a bare string or as an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderError {
    Text(String),
    Detail {
        #[serde(default, deserialize_with = "lenient_string")]
        message: Option<String>,
        #[serde(default, rename = "type", deserialize_with = "lenient_string")]
        kind: Option<String>,
    },
    Other(Value),
}

impl ProviderError {
    fn message(&self) -> String {
        match self {
            Self::Text(message)
            | Self::Detail {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            Self::Detail {
                kind: Some(kind), ..
            } => format!("Provider error: {kind}"),
            _ => "Provider reported an error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ProviderError,
}

/// Non-string values count as absent rather than failing the whole frame
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
