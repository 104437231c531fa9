//! Transcript domain module.
//!
//! # Module Structure
//!
//! - `message`: transcript message types (`MessageRole`, `TranscriptMessage`)
//! - `store`: store trait for transcript persistence (`TranscriptStore`)

mod message;
mod store;

// Re-export public API
pub use message::{MessageRole, TranscriptMessage};
pub use store::TranscriptStore;
