//! WebSocket turn transport
//!
//! The client sends `{"prompt": ...}`; the server answers with one `chunk`
//! message per event, then `complete`, or `error` when the turn cannot run.
//! Closing the socket mid-turn cancels the turn.

use super::types::{PromptRequest, ReplyResponse, ServerMessage};
use super::AppState;
use crate::sink::EventChannelSink;
use crate::turn::TurnError;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

/// Socket closed by the peer or failed
struct Disconnected;

pub async fn handle_socket(socket: WebSocket, state: &AppState, session: &str) {
    let connected = Instant::now();
    let (mut sender, mut receiver) = socket.split();
    tracing::info!(session = %session, "WebSocket client connected");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let request = match serde_json::from_str::<PromptRequest>(&text) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to parse client message");
                        let error = ServerMessage::Error {
                            error: "Invalid message format".to_string(),
                        };
                        if send(&mut sender, &error).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };
                if run_turn(state, session, request.prompt, &mut sender, &mut receiver)
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, session = %session, "WebSocket error");
                break;
            }
        }
    }

    tracing::info!(
        session = %session,
        duration_ms = %connected.elapsed().as_millis(),
        "WebSocket connection closed"
    );
}

async fn run_turn(
    state: &AppState,
    session: &str,
    prompt: String,
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
) -> Result<(), Disconnected> {
    let slot = state.store.slot(session).await;
    let controller = state.controller.clone();
    let cancel = CancellationToken::new();
    let (sink, mut rx) = EventChannelSink::channel();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let mut sink = sink;
            controller.run(&slot, &prompt, &mut [&mut sink], &cancel).await
        }
    });
    let _guard = cancel.clone().drop_guard();

    // Forward events until the turn drops its sink
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    if send(sender, &ServerMessage::Chunk { event }).await.is_err() {
                        return Err(Disconnected);
                    }
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(_))) => {
                    let busy = ServerMessage::Error {
                        error: TurnError::Busy.to_string(),
                    };
                    if send(sender, &busy).await.is_err() {
                        return Err(Disconnected);
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => return Err(Disconnected),
                Some(Ok(_)) => {}
            },
        }
    }

    let reply = match task.await {
        Ok(Ok(report)) => ServerMessage::Complete(ReplyResponse::from(report)),
        Ok(Err(e)) => ServerMessage::Error {
            error: e.to_string(),
        },
        Err(e) => {
            tracing::error!(error = %e, "Turn task failed");
            ServerMessage::Error {
                error: "internal error".to_string(),
            }
        }
    };
    send(sender, &reply).await.map_err(|_| Disconnected)
}

async fn send(sender: &mut WsSender, msg: &ServerMessage) -> Result<(), Disconnected> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode socket message");
            return Ok(());
        }
    };
    sender.send(Message::Text(json)).await.map_err(|e| {
        tracing::debug!(error = %e, "Socket send failed");
        Disconnected
    })
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{app, hello, stalled, wait_until_idle};
    use crate::conversation::Role;
    use crate::event::Event;
    use crate::llm::testing::{serve, ScriptedProducer};
    use crate::turn::TurnError;
    use futures::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn connect(addr: std::net::SocketAddr) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        client
    }

    async fn send_prompt(client: &mut Client, prompt: &str) {
        let body = json!({ "prompt": prompt }).to_string();
        client.send(WsMessage::text(body)).await.unwrap();
    }

    async fn recv_json(client: &mut Client) -> Value {
        loop {
            let msg = client.next().await.unwrap().unwrap();
            if msg.is_text() {
                return serde_json::from_str(msg.to_text().unwrap()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_blank_prompt_gets_error_message() {
        let test = app(ScriptedProducer::new(hello()));
        let mut client = connect(serve(test.router).await).await;

        send_prompt(&mut client, "   ").await;
        assert_eq!(
            recv_json(&mut client).await,
            json!({"type": "error", "error": "prompt must not be empty"})
        );
        assert_eq!(test.producer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_message_keeps_socket_open() {
        let test = app(ScriptedProducer::new(hello()));
        let mut client = connect(serve(test.router).await).await;

        client.send(WsMessage::text("not json".to_string())).await.unwrap();
        assert_eq!(recv_json(&mut client).await["type"], "error");

        send_prompt(&mut client, "Hi").await;
        assert_eq!(recv_json(&mut client).await["type"], "chunk");
    }

    #[tokio::test]
    async fn test_turn_streams_chunks_then_complete() {
        let test = app(ScriptedProducer::new(hello()));
        let mut client = connect(serve(test.router).await).await;

        send_prompt(&mut client, "Hi").await;

        let mut events = Vec::new();
        let complete = loop {
            let msg = recv_json(&mut client).await;
            match msg["type"].as_str() {
                Some("chunk") => {
                    events.push(serde_json::from_value::<Event>(msg["event"].clone()).unwrap());
                }
                Some("complete") => break msg,
                other => panic!("unexpected message type {other:?}"),
            }
        };

        assert_eq!(events, hello());
        assert_eq!(complete["thinking_text"], "hmm");
        assert_eq!(complete["visible_text"], "Hello");
        assert_eq!(complete["assistant_text"], "Hello");
        assert_eq!(complete["errored"], false);
        assert_eq!(complete["messages"].as_array().unwrap().len(), 3);

        let stored = test.state.store.slot("default").await.snapshot().await;
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_second_prompt_mid_turn_is_busy_and_close_cancels() {
        let test = app(stalled());
        let mut client = connect(serve(test.router).await).await;

        send_prompt(&mut client, "Hi").await;
        let first = recv_json(&mut client).await;
        assert_eq!(first["type"], "chunk");
        assert_eq!(first["event"]["chunks"][0]["text"], "partial");

        send_prompt(&mut client, "again").await;
        assert_eq!(
            recv_json(&mut client).await,
            json!({"type": "error", "error": TurnError::Busy.to_string()})
        );

        client.close(None).await.unwrap();
        let slot = test.state.store.slot("default").await;
        wait_until_idle(&slot).await;

        assert!(test.producer.stream_dropped());
        assert_eq!(test.producer.call_count(), 1);
        let messages = slot.snapshot().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "Hi");
    }
}
