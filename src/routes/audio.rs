// src/routes/audio.rs
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;

use crate::{
    error::AppError,
    message::{AudioChunkRequest, AudioEndRequest},
    services::{
        assistant::{self, TurnEvent},
        session_manager::MessageRole,
    },
    state::SharedState,
};

use super::chat::turn_sse;

/// Buffer one chunk of an incoming audio stream against the session.
pub async fn audio_chunk_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AudioChunkRequest>,
) -> Result<StatusCode, AppError> {
    let session_id = state.sessions.ensure_session(&payload.session_id).await;

    let bytes = BASE64
        .decode(&payload.data)
        .map_err(|e| AppError::AudioProcessing(e.into()))?;

    if payload.is_start {
        state.sessions.start_audio(&session_id, &payload.mime_type).await;
    }
    state
        .sessions
        .append_audio(&session_id, &payload.mime_type, &bytes)
        .await;

    Ok(StatusCode::ACCEPTED)
}

/// Stream end: transcribe the buffered bytes, echo the transcript, then
/// feed it through the response generator exactly like a plain-text turn.
pub async fn audio_end_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AudioEndRequest>,
) -> Result<Response, AppError> {
    let session_id = payload.session_id;

    let Some(buffer) = state.sessions.take_audio(&session_id).await else {
        return Err(AppError::BadRequest(
            "No buffered audio for this session".to_string(),
        ));
    };

    let extension = buffer.mime_type.split('/').next_back().unwrap_or("m4a");
    let file_name = format!("input_audio.{extension}");

    let transcript = match state.llm.transcribe(&file_name, buffer.data).await {
        Ok(text) => text,
        Err(err) => {
            state.metrics.increment_error("audio").await;
            return Err(AppError::AudioProcessing(err));
        }
    };

    state
        .sessions
        .append_message(&session_id, MessageRole::User, &transcript)
        .await;

    let (tx, rx) = mpsc::channel(64);
    // Echo the transcript before any reply tokens; the channel has room.
    let _ = tx
        .send(TurnEvent::Message(format!("🗣️ [Audio Query] {transcript}")))
        .await;

    tokio::spawn(assistant::stream_reply(
        state.clone(),
        session_id.clone(),
        transcript,
        "audio",
        tx,
    ));

    Ok(turn_sse(session_id, rx).into_response())
}
