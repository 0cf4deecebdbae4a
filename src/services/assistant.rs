// src/services/assistant.rs
//! Turn handlers: retrieval-augmented streamed replies for text turns and
//! the synchronous PDF/image attachment paths.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde_json::json;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::message::Attachment;
use crate::services::chunker;
use crate::services::llm::ChatSettings;
use crate::services::session_manager::MessageRole;
use crate::state::SharedState;

/// Number of chunks retrieved per query.
const RETRIEVAL_K: usize = 3;

/// Events forwarded to the caller while a streamed turn runs. The route
/// layer maps these onto SSE events.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    /// A complete message (transcript echo, summaries).
    Message(String),
    /// One incremental token of the assistant reply, in arrival order.
    Token(String),
    /// The turn failed; no assistant message was appended.
    Error(String),
    /// The turn is over.
    Done,
}

/// Run the response generator for an already-appended user turn and stream
/// the reply through `tx`.
///
/// Top-3 relevant chunks are fetched for the raw query; when any exist they
/// ride along as an ephemeral system message that is never persisted in the
/// session. If the caller goes away mid-stream the partial text produced so
/// far is still appended to the session.
pub async fn stream_reply(
    state: SharedState,
    session_id: String,
    query: String,
    turn_kind: &'static str,
    tx: mpsc::Sender<TurnEvent>,
) {
    let retrieved = state.knowledge.query(&query, RETRIEVAL_K).await;
    let context = if retrieved.is_empty() {
        None
    } else {
        Some(format!(
            "Here is relevant information from the uploaded PDFs:\n{}\n\nPlease use this information along with your knowledge to answer the question.",
            retrieved.join("\n")
        ))
    };

    let history = state
        .sessions
        .get_history(&session_id)
        .await
        .unwrap_or_default();

    let mut tokens = match state
        .llm
        .chat_stream(&history, context.as_deref(), ChatSettings::default())
        .await
    {
        Ok(rx) => rx,
        Err(err) => {
            state.metrics.increment_error("query").await;
            let message = AppError::QueryProcessing(err).to_string();
            let _ = tx.send(TurnEvent::Error(message)).await;
            let _ = tx.send(TurnEvent::Done).await;
            return;
        }
    };

    let mut reply = String::new();
    let mut cancelled = false;
    while let Some(token) = tokens.recv().await {
        reply.push_str(&token);
        if tx.send(TurnEvent::Token(token)).await.is_err() {
            // Caller cancelled; stop forwarding but keep what we have.
            tracing::debug!(session_id, "turn cancelled by caller");
            cancelled = true;
            break;
        }
    }

    // A turn that ran to completion always gets its assistant message,
    // even when the model produced nothing; a cancelled turn persists
    // only the partial text it actually produced.
    if !cancelled || !reply.is_empty() {
        state
            .sessions
            .append_message(&session_id, MessageRole::Assistant, &reply)
            .await;
        state.metrics.increment_turn(turn_kind).await;
        log_request(&state, &session_id, &query, &reply).await;
    }

    let _ = tx.send(TurnEvent::Done).await;
}

/// PDF turn: extract, chunk, store, and reply with a summary. Terminal for
/// the turn; no model call happens.
pub async fn handle_pdf(
    state: &SharedState,
    session_id: &str,
    attachment: &Attachment,
) -> Result<String, AppError> {
    let bytes = BASE64
        .decode(&attachment.data)
        .map_err(|e| AppError::PdfProcessing(e.into()))?;

    let pages = chunker::extract_pdf_pages(&bytes).map_err(AppError::PdfProcessing)?;
    let chunks = chunker::chunk_pages(&pages);

    state
        .knowledge
        .store(&chunks, &attachment.name)
        .await
        .map_err(AppError::PdfProcessing)?;

    state
        .sessions
        .append_message(
            session_id,
            MessageRole::User,
            format!("[PDF uploaded] {}", attachment.name),
        )
        .await;

    let reply = format!(
        "📄 Successfully processed PDF: {}\nExtracted {} text chunks.\nYou can now ask questions about this document!",
        attachment.name,
        chunks.len()
    );
    state
        .sessions
        .append_message(session_id, MessageRole::Assistant, &reply)
        .await;
    state.metrics.increment_turn("pdf").await;

    Ok(reply)
}

/// Image turn: base64-encode and describe synchronously via the vision
/// model, then record both sides of the exchange.
pub async fn handle_image(
    state: &SharedState,
    session_id: &str,
    attachment: &Attachment,
    message: &str,
) -> Result<String, AppError> {
    let bytes = BASE64
        .decode(&attachment.data)
        .map_err(|e| AppError::ImageProcessing(e.into()))?;

    let mime = if attachment.name.to_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    };
    let data_url = format!("data:{};base64,{}", mime, BASE64.encode(&bytes));

    let prompt = if message.trim().is_empty() {
        "Please describe this image."
    } else {
        message.trim()
    };

    let reply = state
        .llm
        .describe_image(prompt, &data_url)
        .await
        .map_err(AppError::ImageProcessing)?;

    state
        .sessions
        .append_message(
            session_id,
            MessageRole::User,
            format!("[Image uploaded] {}", attachment.name),
        )
        .await;
    state
        .sessions
        .append_message(session_id, MessageRole::Assistant, &reply)
        .await;
    state.metrics.increment_turn("image").await;

    Ok(reply)
}

/// Append one JSONL line per completed generation. Failures are reported
/// but never fail the turn.
async fn log_request(state: &SharedState, session_id: &str, query: &str, response: &str) {
    let line = json!({
        "session_id": session_id,
        "model": state.llm.chat_model(),
        "query": query,
        "response": response,
        "date_time": Utc::now().to_rfc3339(),
    });

    if let Err(err) = append_line(&state.config.request_log_path, &line.to_string()).await {
        tracing::warn!(error = %err, "failed to write request log");
    }
}

async fn append_line(path: &str, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}
