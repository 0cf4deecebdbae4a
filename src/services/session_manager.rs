// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire name expected by the chat-completion API.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Audio bytes accumulated across `/audio/chunk` calls until stream end.
#[derive(Clone, Debug, Default)]
pub struct AudioBuffer {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub audio: Option<AudioBuffer>,
    pub last_active: Instant,
}

impl Session {
    /// A session's history always starts with exactly one system message.
    pub fn new(id: impl Into<String>, system_prompt: &str) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            messages: vec![Message {
                role: MessageRole::System,
                content: system_prompt.to_string(),
                timestamp: now,
            }],
            audio: None,
            last_active: now,
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    system_prompt: Arc<str>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    // Create a new manager
    pub fn new(ttl: Duration, system_prompt: impl Into<String>) -> Self {
        let system_prompt: String = system_prompt.into();
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            system_prompt: system_prompt.into(),
            ttl,
        }
    }

    // Create a fresh session and return its id.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), &self.system_prompt);

        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), session);
        id
    }

    // Ensure there's a session with this id.
    pub async fn ensure_session(&self, id: &str) -> String {
        {
            let guard = self.inner.read().await;
            if guard.contains_key(id) {
                return id.to_string();
            }
        }
        let mut guard = self.inner.write().await;
        let session = Session::new(id.to_string(), &self.system_prompt);
        guard.insert(id.to_string(), session);
        id.to_string()
    }

    // Append a message to a session's history and touch last_active.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: impl Into<String>,
    ) -> usize {
        let mut guard = self.inner.write().await;
        let entry = guard
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id.to_string(), &self.system_prompt));
        let msg = Message {
            role,
            content: content.into(),
            timestamp: Instant::now(),
        };
        entry.messages.push(msg);
        entry.last_active = Instant::now();
        entry.messages.len()
    }

    /// Get a copy of the session history
    pub async fn get_history(&self, session_id: &str) -> Option<Vec<Message>> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.messages.clone())
    }

    /// Reset the session's audio buffer for a new incoming stream.
    pub async fn start_audio(&self, session_id: &str, mime_type: &str) {
        let mut guard = self.inner.write().await;
        if let Some(session) = guard.get_mut(session_id) {
            session.audio = Some(AudioBuffer {
                mime_type: mime_type.to_string(),
                data: Vec::new(),
            });
            session.last_active = Instant::now();
        }
    }

    /// Append raw bytes to the session's audio buffer. Starts a buffer if
    /// none exists so a missed `is_start` chunk is not lost.
    pub async fn append_audio(&self, session_id: &str, mime_type: &str, bytes: &[u8]) -> usize {
        let mut guard = self.inner.write().await;
        let Some(session) = guard.get_mut(session_id) else {
            return 0;
        };
        let buffer = session.audio.get_or_insert_with(|| AudioBuffer {
            mime_type: mime_type.to_string(),
            data: Vec::new(),
        });
        buffer.data.extend_from_slice(bytes);
        session.last_active = Instant::now();
        buffer.data.len()
    }

    /// Take the buffered audio out of the session, leaving it empty.
    pub async fn take_audio(&self, session_id: &str) -> Option<AudioBuffer> {
        let mut guard = self.inner.write().await;
        guard.get_mut(session_id).and_then(|s| s.audio.take())
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn basic_session_flow() {
        let mgr = SessionManager::new(Duration::from_secs(60), "You are a helpful assistant.");
        let sid = mgr.create_session().await;
        assert!(!sid.is_empty());
        let len = mgr.append_message(&sid, MessageRole::User, "hello").await;
        // system message + the user message
        assert_eq!(len, 2);
        let history = mgr.get_history(&sid).await.unwrap();
        assert_eq!(history[0].role, MessageRole::System);
        assert_eq!(history[1].content, "hello");
        assert!(mgr.remove_session(&sid).await);
    }

    #[tokio::test]
    async fn audio_buffer_accumulates() {
        let mgr = SessionManager::new(Duration::from_secs(60), "prompt");
        let sid = mgr.create_session().await;
        mgr.start_audio(&sid, "audio/m4a").await;
        mgr.append_audio(&sid, "audio/m4a", b"abc").await;
        let total = mgr.append_audio(&sid, "audio/m4a", b"def").await;
        assert_eq!(total, 6);
        let buf = mgr.take_audio(&sid).await.unwrap();
        assert_eq!(buf.data, b"abcdef");
        assert!(mgr.take_audio(&sid).await.is_none());
    }
}
