//! Model collaborator boundary.
//!
//! The conversation controller treats the language model as a black box
//! behind [`ChatAgent`]: prior turns in, a finite stream of reply chunks out.

use crate::error::Result;
use crate::transcript::TranscriptMessage;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A finite, non-restartable stream of reply text chunks.
///
/// Chunks arrive in emission order with arbitrary per-chunk latency. The
/// stream is consumed by a single subscriber and ends either at the natural
/// end of the reply or with a `ModelUnavailable` error.
pub type ReplyChunks = BoxStream<'static, Result<String>>;

/// The model invocation collaborator.
///
/// Implementations receive the ordered prior turns (including the user
/// message that triggered this turn) and produce the reply as a chunk
/// stream. Transport and backend failures must surface as
/// `PanelistError::ModelUnavailable`.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Starts a reply for the given conversation context.
    async fn stream_reply(&self, history: Vec<TranscriptMessage>) -> Result<ReplyChunks>;
}
