//! Transcript store trait.
//!
//! Defines the interface for durable transcript persistence.

use super::message::TranscriptMessage;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for the durable, append-only transcript of a session.
///
/// This trait defines the contract for persisting and retrieving transcript
/// messages, decoupling the conversation logic from the specific storage
/// mechanism (TOML files, an embedded database, an in-memory map, ...).
///
/// Sessions are created implicitly: loading an unknown `session_id` returns
/// an empty sequence rather than an error. Messages within a session are
/// totally ordered by append sequence, and `load` must return them in that
/// order.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Loads the full transcript for a session, in append order.
    ///
    /// # Returns
    ///
    /// - `Ok(messages)`: the stored sequence; empty if the session is unknown
    /// - `Err(_)`: only on storage-layer faults, never for a missing session
    async fn load(&self, session_id: &str) -> Result<Vec<TranscriptMessage>>;

    /// Durably appends one message to the end of the session's transcript.
    ///
    /// Implementations must be safe against at-most-one retry of a failed
    /// call: a retry may produce a duplicate trailing message, which is an
    /// accepted edge case and is not deduplicated by the store.
    async fn append(&self, session_id: &str, message: &TranscriptMessage) -> Result<()>;

    /// Deletes all messages for the session. No-op if the session has none.
    async fn clear(&self, session_id: &str) -> Result<()>;
}
