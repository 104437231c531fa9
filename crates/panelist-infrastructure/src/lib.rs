//! Persistence layer for panelist: durable transcript storage and path
//! resolution.

pub mod dto;
pub mod memory;
pub mod paths;
pub mod toml_transcript_store;

pub use memory::MemoryTranscriptStore;
pub use paths::PanelistPaths;
pub use toml_transcript_store::TomlTranscriptStore;
