// src/message.rs
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Only the first attachment of a turn is processed.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Deserialize)]
pub struct Attachment {
    pub name: String,
    /// Base64-encoded file contents.
    pub data: String,
}

/// Reply for turns that resolve synchronously (PDF and image attachments).
/// Text and audio turns stream their reply over SSE instead.
#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
}

#[derive(Deserialize)]
pub struct AudioChunkRequest {
    pub session_id: String,
    pub mime_type: String,
    /// Base64-encoded raw audio bytes.
    pub data: String,
    #[serde(default)]
    pub is_start: bool,
}

#[derive(Deserialize)]
pub struct AudioEndRequest {
    pub session_id: String,
}
