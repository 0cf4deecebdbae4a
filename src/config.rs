// src/config.rs
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. You can answer questions based on the PDFs that have been uploaded and your general knowledge.";

/// Runtime configuration, read once at startup from the environment
/// (with `.env` support via dotenvy in `main`).
#[derive(Clone, Debug)]
pub struct Config {
    /// API key for the chat/vision/transcription provider. Required.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API (overridable for tests).
    pub llm_base_url: String,
    /// Base URL of the vector store HTTP service.
    pub vector_store_url: String,
    pub collection_name: String,
    pub chat_model: String,
    pub vision_model: String,
    pub transcription_model: String,
    pub system_prompt: String,
    /// Key expected in the `x-admin-key` header for /admin routes.
    pub admin_key: String,
    pub session_ttl: Duration,
    pub bind_addr: String,
    /// JSONL file that receives one line per completed generation.
    pub request_log_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("LLM_API_KEY").context("LLM_API_KEY must be set")?;

        Ok(Self {
            api_key,
            llm_base_url: var_or("LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            vector_store_url: var_or("VECTOR_STORE_URL", "http://localhost:8000"),
            collection_name: var_or("VECTOR_COLLECTION", "pdf_collection"),
            chat_model: var_or("CHAT_MODEL", "llama-3.2-90b-vision-preview"),
            vision_model: var_or("VISION_MODEL", "llama-3.2-90b-vision-preview"),
            transcription_model: var_or("TRANSCRIPTION_MODEL", "whisper-large-v3-turbo"),
            system_prompt: var_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            admin_key: var_or("ADMIN_KEY", "secret123"),
            session_ttl: Duration::from_secs(
                env::var("SESSION_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            request_log_path: var_or("REQUEST_LOG_PATH", "requests.jsonl"),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
