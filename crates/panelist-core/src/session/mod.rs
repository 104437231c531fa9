//! Session domain module.
//!
//! # Module Structure
//!
//! - `controller`: session lifecycle and turn orchestration
//!   (`ConversationController`, `TurnStream`)

mod controller;

// Re-export public API
pub use controller::{ConversationController, TurnStream};
