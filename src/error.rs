// src/error.rs
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Handler-boundary error. External-service failures are wrapped into one
/// of the processing categories and surfaced to the user as a single
/// message; there is no retry and no finer taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unsupported attachment type: {0}")]
    UnsupportedAttachment(String),

    #[error("Error processing PDF: {0}")]
    PdfProcessing(anyhow::Error),

    #[error("Error processing image: {0}")]
    ImageProcessing(anyhow::Error),

    #[error("Error processing audio: {0}")]
    AudioProcessing(anyhow::Error),

    #[error("Error processing query: {0}")]
    QueryProcessing(anyhow::Error),
}

impl AppError {
    /// Short label used for error metrics.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::UnsupportedAttachment(_) => "unsupported_attachment",
            AppError::PdfProcessing(_) => "pdf",
            AppError::ImageProcessing(_) => "image",
            AppError::AudioProcessing(_) => "audio",
            AppError::QueryProcessing(_) => "query",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedAttachment(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
