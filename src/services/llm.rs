// src/services/llm.rs
//! Client for the OpenAI-compatible chat, vision, and transcription
//! endpoints. Chat replies stream over SSE and are forwarded token by
//! token through an mpsc channel.

use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::session_manager::Message;

/// Generation parameters for streamed text turns.
#[derive(Clone, Copy, Debug)]
pub struct ChatSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 7000,
            top_p: 1.0,
        }
    }
}

pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    vision_model: String,
    transcription_model: String,
}

impl LlmClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        vision_model: impl Into<String>,
        transcription_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            chat_model: chat_model.into(),
            vision_model: vision_model.into(),
            transcription_model: transcription_model.into(),
        }
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// Start a streaming chat completion. The request is sent and its
    /// status checked before returning; tokens then arrive on the receiver
    /// in order until the stream ends or the receiver is dropped.
    pub async fn chat_stream(
        &self,
        messages: &[Message],
        extra_context: Option<&str>,
        settings: ChatSettings,
    ) -> Result<mpsc::Receiver<String>> {
        let mut payload: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        if let Some(context) = extra_context {
            payload.push(json!({ "role": "system", "content": context }));
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.chat_model,
                "messages": payload,
                "temperature": settings.temperature,
                "max_tokens": settings.max_tokens,
                "top_p": settings.top_p,
                "stream": true,
            }))
            .send()
            .await
            .context("chat completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion returned HTTP {status}: {body}"));
        }

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            // SSE lines can split across network chunks; carry the tail.
            let mut pending = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(err) => {
                        tracing::warn!(error = %err, "chat stream interrupted");
                        return;
                    }
                };
                pending.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = pending.find('\n') {
                    let line = pending[..newline].trim().to_string();
                    pending.drain(..=newline);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    if let Ok(parsed) = serde_json::from_str::<Value>(data) {
                        if let Some(token) = parsed["choices"][0]["delta"]["content"].as_str() {
                            if !token.is_empty() && tx.send(token.to_string()).await.is_err() {
                                // Receiver gone: the turn was cancelled.
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    /// Describe an image synchronously (no streaming). The image travels
    /// inline as a base64 data URL.
    pub async fn describe_image(&self, prompt: &str, image_data_url: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.vision_model,
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        { "type": "image_url", "image_url": { "url": image_data_url } },
                    ],
                }],
                "temperature": 0,
                "max_tokens": 6000,
                "top_p": 1,
                "stream": false,
            }))
            .send()
            .await
            .context("vision request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("vision request returned HTTP {}", response.status()));
        }

        let body: Value = response.json().await.context("invalid vision response")?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("vision response missing content"))
    }

    /// Transcribe buffered audio bytes via the speech-to-text endpoint.
    pub async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<String> {
        let form = Form::new()
            .part("file", Part::bytes(audio).file_name(file_name.to_string()))
            .text("model", self.transcription_model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("transcription request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "transcription returned HTTP {}",
                response.status()
            ));
        }

        let body: Value = response.json().await.context("invalid transcription response")?;
        body["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("transcription response missing text"))
    }
}
