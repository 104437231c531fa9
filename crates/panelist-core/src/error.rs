//! Error types for the panelist application.

use thiserror::Error;

/// A shared error type for the entire panelist application.
///
/// The taxonomy is intentionally small: storage faults, model collaborator
/// faults, and turn re-entrancy violations. Unexpected collaborator errors
/// are wrapped into one of these rather than leaked as raw transport errors.
#[derive(Error, Debug, Clone)]
pub enum PanelistError {
    /// Durable store unreachable or a write failed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Model collaborator failed, disconnected mid-stream, or timed out.
    #[error("Model unavailable: {message}")]
    ModelUnavailable { message: String },

    /// A turn was submitted while the previous one was still streaming.
    #[error("A turn is already in flight for session '{session_id}'")]
    TurnInFlight { session_id: String },
}

impl PanelistError {
    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a ModelUnavailable error.
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
        }
    }

    /// Creates a TurnInFlight error.
    pub fn turn_in_flight(session_id: impl Into<String>) -> Self {
        Self::TurnInFlight {
            session_id: session_id.into(),
        }
    }

    /// Check if this is a Storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Check if this is a ModelUnavailable error.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. })
    }

    /// Check if this is a TurnInFlight error.
    pub fn is_turn_in_flight(&self) -> bool {
        matches!(self, Self::TurnInFlight { .. })
    }
}

impl From<std::io::Error> for PanelistError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PanelistError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage {
            message: format!("JSON: {err}"),
        }
    }
}

impl From<toml::de::Error> for PanelistError {
    fn from(err: toml::de::Error) -> Self {
        Self::Storage {
            message: format!("TOML: {err}"),
        }
    }
}

impl From<toml::ser::Error> for PanelistError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Storage {
            message: format!("TOML: {err}"),
        }
    }
}

/// A type alias for `Result<T, PanelistError>`.
pub type Result<T> = std::result::Result<T, PanelistError>;
