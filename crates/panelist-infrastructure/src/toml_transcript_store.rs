//! TOML-based TranscriptStore implementation.

use crate::dto::{MessageDto, TranscriptDto};
use crate::paths::PanelistPaths;
use async_trait::async_trait;
use panelist_core::error::{PanelistError, Result};
use panelist_core::transcript::{TranscriptMessage, TranscriptStore};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// A store implementation that keeps each session's transcript in a TOML
/// file.
///
/// - Transcripts live at `<base_dir>/transcripts/<session_id>.toml`
/// - A missing file loads as an empty transcript (sessions are created
///   implicitly on first append)
/// - Writes go through a temporary file, fsync, and an atomic rename, so a
///   crash mid-write never leaves a truncated transcript behind
pub struct TomlTranscriptStore {
    base_dir: PathBuf,
}

impl TomlTranscriptStore {
    /// Creates a new `TomlTranscriptStore` rooted at the given directory.
    ///
    /// The `transcripts/` subdirectory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory structure cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let transcripts_dir = base_dir.join("transcripts");
        fs::create_dir_all(&transcripts_dir).map_err(|err| {
            PanelistError::storage(format!(
                "Failed to create transcripts directory {transcripts_dir:?}: {err}"
            ))
        })?;

        Ok(Self { base_dir })
    }

    /// Creates a store at the default location (`~/.config/panelist`).
    ///
    /// # Errors
    ///
    /// Returns a storage error if the config directory cannot be determined
    /// or created.
    pub fn default_location() -> Result<Self> {
        let base_dir = PanelistPaths::config_dir()
            .map_err(|err| PanelistError::storage(err.to_string()))?;
        Self::new(base_dir)
    }

    /// Returns the file path for a given session ID.
    ///
    /// Session ids become file names, so anything that could escape the
    /// transcripts directory is rejected up front.
    fn transcript_file_path(&self, session_id: &str) -> Result<PathBuf> {
        if session_id.is_empty()
            || session_id == "."
            || session_id == ".."
            || session_id.contains(['/', '\\'])
        {
            return Err(PanelistError::storage(format!(
                "invalid session id '{session_id}'"
            )));
        }

        Ok(self
            .base_dir
            .join("transcripts")
            .join(format!("{session_id}.toml")))
    }

    fn read_transcript(path: &Path) -> Result<TranscriptDto> {
        if !path.exists() {
            return Ok(TranscriptDto::default());
        }

        let content = fs::read_to_string(path).map_err(|err| {
            PanelistError::storage(format!("Failed to read transcript file {path:?}: {err}"))
        })?;

        let dto: TranscriptDto = toml::from_str(&content)?;
        Ok(dto)
    }

    /// Writes the transcript through a tmp file and an atomic rename.
    fn write_transcript(path: &Path, dto: &TranscriptDto) -> Result<()> {
        let content = toml::to_string_pretty(dto)?;

        let tmp_path = path.with_extension("toml.tmp");
        {
            let mut file = File::create(&tmp_path).map_err(|err| {
                PanelistError::storage(format!("Failed to create {tmp_path:?}: {err}"))
            })?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path).map_err(|err| {
            PanelistError::storage(format!("Failed to replace transcript file {path:?}: {err}"))
        })?;

        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for TomlTranscriptStore {
    async fn load(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let path = self.transcript_file_path(session_id)?;
        let dto = Self::read_transcript(&path)?;

        tracing::debug!(session_id = %session_id, messages = dto.messages.len(), "loaded transcript");
        dto.messages
            .into_iter()
            .map(MessageDto::into_domain)
            .collect()
    }

    async fn append(&self, session_id: &str, message: &TranscriptMessage) -> Result<()> {
        let path = self.transcript_file_path(session_id)?;

        // Read-modify-write; the rename keeps the file consistent even if
        // the process dies mid-append. A retried append after a reported
        // failure may duplicate the trailing message (accepted edge case).
        let mut dto = Self::read_transcript(&path)?;
        dto.messages.push(MessageDto::from(message));
        Self::write_transcript(&path, &dto)?;

        tracing::debug!(session_id = %session_id, messages = dto.messages.len(), "appended message");
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let path = self.transcript_file_path(session_id)?;

        if path.exists() {
            fs::remove_file(&path).map_err(|err| {
                PanelistError::storage(format!(
                    "Failed to delete transcript file {path:?}: {err}"
                ))
            })?;
        }

        tracing::debug!(session_id = %session_id, "cleared transcript");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelist_core::transcript::MessageRole;
    use tempfile::TempDir;

    fn message(role: MessageRole, content: &str) -> TranscriptMessage {
        TranscriptMessage {
            role,
            content: content.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_and_load_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();

        store
            .append("s", &message(MessageRole::User, "first"))
            .await
            .unwrap();
        store
            .append("s", &message(MessageRole::Assistant, "second"))
            .await
            .unwrap();
        store
            .append("s", &message(MessageRole::User, "third"))
            .await
            .unwrap();

        let messages = store.load("s").await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[2].content, "third");
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_order_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();
            store
                .append("s", &message(MessageRole::User, "hello"))
                .await
                .unwrap();
            store
                .append("s", &message(MessageRole::Assistant, "hi there"))
                .await
                .unwrap();
        }

        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();
        let messages = store.load("s").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_unknown_session_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();

        let messages = store.load("never-seen").await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();

        store
            .append("s", &message(MessageRole::User, "hello"))
            .await
            .unwrap();

        let first = store.load("s").await.unwrap();
        let second = store.load("s").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_clear_removes_all_messages() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();

        store
            .append("s", &message(MessageRole::User, "hello"))
            .await
            .unwrap();
        store.clear("s").await.unwrap();

        assert!(store.load("s").await.unwrap().is_empty());

        // Clearing an already-empty session is a no-op
        store.clear("s").await.unwrap();
        store.clear("never-seen").await.unwrap();
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();

        store
            .append("a", &message(MessageRole::User, "for a"))
            .await
            .unwrap();
        store
            .append("b", &message(MessageRole::User, "for b"))
            .await
            .unwrap();

        store.clear("a").await.unwrap();

        assert!(store.load("a").await.unwrap().is_empty());
        let b = store.load("b").await.unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].content, "for b");
    }

    #[tokio::test]
    async fn test_rejects_path_escaping_session_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlTranscriptStore::new(temp_dir.path()).unwrap();

        for bad in ["", "..", "a/b", "a\\b"] {
            let err = store.load(bad).await.unwrap_err();
            assert!(err.is_storage(), "expected storage error for {bad:?}");
        }
    }
}
