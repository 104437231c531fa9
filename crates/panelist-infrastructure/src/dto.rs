//! On-disk transcript representation.
//!
//! DTOs are kept separate from the domain model so the storage format can
//! evolve without touching core types.

use panelist_core::error::{PanelistError, Result};
use panelist_core::transcript::{MessageRole, TranscriptMessage};
use serde::{Deserialize, Serialize};

/// The stored transcript for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptDto {
    #[serde(default, rename = "message")]
    pub messages: Vec<MessageDto>,
}

/// One stored message. Roles are plain strings on disk and validated on
/// the way back into the domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

impl From<&TranscriptMessage> for MessageDto {
    fn from(message: &TranscriptMessage) -> Self {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: message.content.clone(),
            timestamp: message.timestamp.clone(),
        }
    }
}

impl MessageDto {
    /// Converts the DTO back into the domain model.
    ///
    /// # Errors
    ///
    /// Returns a storage error for an unknown role string.
    pub fn into_domain(self) -> Result<TranscriptMessage> {
        let role = match self.role.as_str() {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => {
                return Err(PanelistError::storage(format!(
                    "unknown message role '{other}' in stored transcript"
                )));
            }
        };
        Ok(TranscriptMessage {
            role,
            content: self.content,
            timestamp: self.timestamp,
        })
    }
}
