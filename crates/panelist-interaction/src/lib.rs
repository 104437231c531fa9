//! Model collaborator implementations for panelist.

pub mod config;
pub mod ollama_chat_agent;
pub mod prompt;

pub use config::OllamaConfig;
pub use ollama_chat_agent::OllamaChatAgent;
pub use prompt::INTERVIEWER_PROMPT;
