//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, MessagesResponse, PromptRequest, ReplyResponse, SessionQuery, StreamQuery,
};
use super::ws::handle_socket;
use super::AppState;
use crate::event::Event;
use crate::sink::{EventChannelSink, Sink};
use crate::turn::TurnError;
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;

/// Create the API router
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversation snapshot
        .route("/api/messages", get(get_messages))
        // Request/response turn
        .route("/api/reply", post(reply))
        // Server-push turn
        .route("/api/stream", get(stream_turn))
        .route("/api/reset", post(reset))
        // Socket turns
        .route("/ws", get(ws_upgrade))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Snapshot
// ============================================================

async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<MessagesResponse> {
    let slot = state.store.slot(query.session()).await;
    Json(MessagesResponse {
        messages: slot.snapshot().await,
    })
}

async fn reset(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<MessagesResponse>, AppError> {
    let session = query.session();
    let slot = state
        .store
        .reset(session)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown session: {session}")))?;
    Ok(Json(MessagesResponse {
        messages: slot.snapshot().await,
    }))
}

// ============================================================
// Turns
// ============================================================

async fn reply(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    let slot = state.store.slot(query.session()).await;
    let report = state
        .controller
        .run(&slot, &request.prompt, &mut [], &CancellationToken::new())
        .await?;
    Ok(Json(ReplyResponse::from(report)))
}

async fn stream_turn(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, AppError> {
    if query.prompt.trim().is_empty() {
        return Err(TurnError::EmptyPrompt.into());
    }
    let slot = state.store.slot(query.session.session()).await;
    if slot.is_busy() {
        return Err(TurnError::Busy.into());
    }

    let (sink, rx) = EventChannelSink::channel();
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let controller = state.controller.clone();
    let prompt = query.prompt;

    tokio::spawn(async move {
        let mut sink = sink;
        match controller.run(&slot, &prompt, &mut [&mut sink], &cancel).await {
            Ok(report) => tracing::debug!(turn_id = %report.id, "Stream turn done"),
            Err(TurnError::Cancelled) => {}
            // Lost the race for the turn lock after the busy check
            Err(e) => sink.event(&Event::failed(e.to_string())),
        }
    });

    Ok(sse_stream(rx, guard).into_response())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let session = query.session().to_string();
    ws.on_upgrade(move |socket| async move { handle_socket(socket, &state, &session).await })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("moonchat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::EmptyPrompt => AppError::BadRequest(e.to_string()),
            TurnError::Busy | TurnError::Cancelled => AppError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
