//! End-to-end turn flow against the durable TOML store.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use panelist_core::agent::{ChatAgent, ReplyChunks};
use panelist_core::error::{PanelistError, Result};
use panelist_core::session::ConversationController;
use panelist_core::transcript::{MessageRole, TranscriptMessage, TranscriptStore};
use panelist_infrastructure::TomlTranscriptStore;
use std::sync::Arc;
use tempfile::TempDir;

/// Replies with a fixed chunk script, optionally failing mid-stream.
struct ScriptedAgent {
    chunks: Vec<&'static str>,
    fail_after: Option<usize>,
}

#[async_trait]
impl ChatAgent for ScriptedAgent {
    async fn stream_reply(&self, _history: Vec<TranscriptMessage>) -> Result<ReplyChunks> {
        let mut items: Vec<Result<String>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(chunk.to_string()))
            .collect();
        if let Some(after) = self.fail_after {
            items.truncate(after);
            items.push(Err(PanelistError::model_unavailable("backend dropped")));
        }
        Ok(stream::iter(items).boxed())
    }
}

#[tokio::test]
async fn interview_turn_round_trips_through_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TomlTranscriptStore::new(temp_dir.path()).unwrap());
    let agent = Arc::new(ScriptedAgent {
        chunks: vec!["Thanks Alex. ", "What drew you to software?"],
        fail_after: None,
    });
    let controller = ConversationController::new(store.clone(), agent);

    controller.start_session("s1").await.unwrap();
    let turn = controller.submit_turn("s1", "My name is Alex").await.unwrap();
    let reply = turn.collect_reply().await.unwrap();
    assert_eq!(reply, "Thanks Alex. What drew you to software?");

    // A fresh store instance over the same directory sees the same turn
    let reopened = TomlTranscriptStore::new(temp_dir.path()).unwrap();
    let messages = reopened.load("s1").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "My name is Alex");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, reply);
}

#[tokio::test]
async fn failed_turn_leaves_no_assistant_message_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TomlTranscriptStore::new(temp_dir.path()).unwrap());
    let agent = Arc::new(ScriptedAgent {
        chunks: vec!["Hel", "lo"],
        fail_after: Some(2),
    });
    let controller = ConversationController::new(store.clone(), agent);

    let mut turn = controller.submit_turn("s1", "hi").await.unwrap();
    let mut saw_error = false;
    while let Some(chunk) = turn.next_chunk().await {
        if chunk.is_err() {
            saw_error = true;
        }
    }
    assert!(saw_error);

    let messages = store.load("s1").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);

    // The next turn is usable after the failure
    let agent = Arc::new(ScriptedAgent {
        chunks: vec!["Welcome back."],
        fail_after: None,
    });
    let controller = ConversationController::new(store.clone(), agent);
    let turn = controller.submit_turn("s1", "still there?").await.unwrap();
    turn.collect_reply().await.unwrap();

    let messages = store.load("s1").await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, "Welcome back.");
}
