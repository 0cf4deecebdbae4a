use assistant_backend::services::session_manager::{MessageRole, SessionManager};
use std::time::Duration;
use tokio::time::sleep;

const PROMPT: &str = "You are a helpful assistant.";

#[tokio::test]
async fn new_session_starts_with_one_system_message() {
    let mgr = SessionManager::new(Duration::from_secs(60), PROMPT);
    let sid = mgr.create_session().await;

    let history = mgr.get_history(&sid).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, MessageRole::System);
    assert_eq!(history[0].content, PROMPT);
}

#[tokio::test]
async fn message_count_is_one_plus_two_n_after_n_turns() {
    let mgr = SessionManager::new(Duration::from_secs(60), PROMPT);
    let sid = mgr.create_session().await;

    let n = 4;
    for i in 0..n {
        mgr.append_message(&sid, MessageRole::User, format!("question {i}"))
            .await;
        mgr.append_message(&sid, MessageRole::Assistant, format!("answer {i}"))
            .await;
    }

    let history = mgr.get_history(&sid).await.unwrap();
    assert_eq!(history.len(), 1 + 2 * n);
    assert_eq!(history[0].role, MessageRole::System);
}

#[tokio::test]
async fn ensure_session_is_idempotent() {
    let mgr = SessionManager::new(Duration::from_secs(60), PROMPT);
    let sid = mgr.ensure_session("abc").await;
    mgr.append_message(&sid, MessageRole::User, "hello").await;

    // Second ensure must not reset the history.
    mgr.ensure_session("abc").await;
    assert_eq!(mgr.get_history("abc").await.unwrap().len(), 2);
    assert_eq!(mgr.len().await, 1);
}

#[tokio::test]
async fn test_session_expiration() {
    let mgr = SessionManager::new(Duration::from_millis(10), PROMPT);
    let sid = mgr.create_session().await;

    // Wait for expiration
    sleep(Duration::from_millis(20)).await;

    let removed_count = mgr.purge_expired().await;
    assert_eq!(removed_count, 1, "Should have removed 1 expired session");
    assert!(
        !mgr.remove_session(&sid).await,
        "Session should already be gone"
    );
}

#[tokio::test]
async fn audio_buffer_restarts_on_new_stream() {
    let mgr = SessionManager::new(Duration::from_secs(60), PROMPT);
    let sid = mgr.create_session().await;

    mgr.append_audio(&sid, "audio/m4a", b"old").await;
    mgr.start_audio(&sid, "audio/webm").await;
    mgr.append_audio(&sid, "audio/webm", b"new").await;

    let buf = mgr.take_audio(&sid).await.unwrap();
    assert_eq!(buf.mime_type, "audio/webm");
    assert_eq!(buf.data, b"new");
}
