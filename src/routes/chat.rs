use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, Sse},
    },
};
use futures_util::Stream;
use futures_util::StreamExt;
use tokio::fs::read_to_string;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    services::{
        assistant::{self, TurnEvent},
        session_manager::MessageRole,
    },
    state::SharedState,
};
use crate::services::metrics_manager::MetricsData;

/// One turn. Attachment turns (PDF, image) resolve synchronously with a
/// JSON reply; plain-text turns stream the assistant reply as SSE.
pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let session_id = resolve_session(&state, payload.session_id.as_deref()).await;

    // Only the first attachment of a turn is processed; the suffix match is
    // case-insensitive.
    if let Some(attachment) = payload.attachments.first() {
        let name = attachment.name.to_lowercase();
        let result = if name.ends_with(".pdf") {
            assistant::handle_pdf(&state, &session_id, attachment).await
        } else if name.ends_with(".jpg") || name.ends_with(".jpeg") || name.ends_with(".png") {
            assistant::handle_image(&state, &session_id, attachment, &payload.message).await
        } else {
            Err(AppError::UnsupportedAttachment(attachment.name.clone()))
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                state.metrics.increment_error(err.category()).await;
                return Err(err);
            }
        };
        return Ok(Json(ChatResponse { session_id, reply }).into_response());
    }

    let trimmed = payload.message.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    // Append user message, then stream the generated reply.
    state
        .sessions
        .append_message(&session_id, MessageRole::User, trimmed)
        .await;

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(assistant::stream_reply(
        state.clone(),
        session_id.clone(),
        trimmed.to_string(),
        "text",
        tx,
    ));

    Ok(turn_sse(session_id, rx).into_response())
}

/// End a conversation and discard its in-memory state.
pub async fn end_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.sessions.remove_session(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub(crate) async fn resolve_session(state: &SharedState, session_id: Option<&str>) -> String {
    match session_id {
        Some(s) if !s.trim().is_empty() => state.sessions.ensure_session(s).await,
        _ => state.sessions.create_session().await,
    }
}

/// Bridge a turn-event channel onto an SSE response. The `done` event
/// carries the session id so newly created sessions learn theirs.
pub(crate) fn turn_sse(
    session_id: String,
    rx: mpsc::Receiver<TurnEvent>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = ReceiverStream::new(rx).map(move |event| {
        Ok(match event {
            TurnEvent::Message(text) => SseEvent::default().event("message").data(text),
            TurnEvent::Token(token) => SseEvent::default().event("token").data(token),
            TurnEvent::Error(text) => SseEvent::default().event("error").data(text),
            TurnEvent::Done => SseEvent::default().event("done").data(session_id.clone()),
        })
    });
    Sse::new(stream)
}

// Read the request log and return it as a JSON array.
pub async fn get_requests_handler(State(state): State<SharedState>) -> Json<Vec<serde_json::Value>> {
    let content = read_to_string(&state.config.request_log_path)
        .await
        .unwrap_or_default();
    let requests = content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    Json(requests)
}

// Get Metrics
pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}
