//! In-memory TranscriptStore implementation.
//!
//! Backs `--ephemeral` runs and tests that don't care about durability.

use async_trait::async_trait;
use panelist_core::error::Result;
use panelist_core::transcript::{TranscriptMessage, TranscriptStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A transcript store that keeps everything in a process-local map.
///
/// Satisfies the same ordering and isolation contract as the durable store;
/// contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    transcripts: RwLock<HashMap<String, Vec<TranscriptMessage>>>,
}

impl MemoryTranscriptStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn load(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let transcripts = self.transcripts.read().await;
        Ok(transcripts.get(session_id).cloned().unwrap_or_default())
    }

    async fn append(&self, session_id: &str, message: &TranscriptMessage) -> Result<()> {
        let mut transcripts = self.transcripts.write().await;
        transcripts
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let mut transcripts = self.transcripts.write().await;
        transcripts.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelist_core::transcript::MessageRole;

    #[tokio::test]
    async fn test_append_load_clear() {
        let store = MemoryTranscriptStore::new();

        store
            .append("s", &TranscriptMessage::user("hello"))
            .await
            .unwrap();
        store
            .append("s", &TranscriptMessage::assistant("hi"))
            .await
            .unwrap();

        let messages = store.load("s").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);

        store.clear("s").await.unwrap();
        assert!(store.load("s").await.unwrap().is_empty());
    }
}
