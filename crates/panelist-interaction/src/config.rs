//! Ollama endpoint configuration.
//!
//! The endpoint and model are a static, process-wide setting: environment
//! variables override the defaults, and nothing changes them at runtime.

use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2:3b";

/// Where and what to talk to.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model identifier to request.
    pub model: String,
}

impl OllamaConfig {
    /// Loads configuration from `OLLAMA_BASE_URL` / `OLLAMA_MODEL_NAME`,
    /// falling back to a local server and the default model.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            model: env::var("OLLAMA_MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        }
    }
}
