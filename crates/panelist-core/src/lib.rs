//! Core domain for panelist: interview sessions, transcripts, and the
//! conversation controller that keeps both in lockstep.

pub mod agent;
pub mod error;
pub mod session;
pub mod transcript;

// Re-export common error type
pub use error::PanelistError;
