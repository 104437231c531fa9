//! OllamaChatAgent - streaming REST implementation for a local Ollama server.
//!
//! This agent calls the Ollama chat API directly with `stream: true` and
//! decodes the newline-delimited JSON chunk frames as they arrive.

use crate::config::OllamaConfig;
use crate::prompt::INTERVIEWER_PROMPT;
use async_trait::async_trait;
use futures::StreamExt;
use panelist_core::agent::{ChatAgent, ReplyChunks};
use panelist_core::error::{PanelistError, Result};
use panelist_core::transcript::{MessageRole, TranscriptMessage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Buffered chunks between the frame decoder and the reply stream.
const FRAME_CHANNEL_CAPACITY: usize = 16;

/// Agent implementation that talks to the Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaChatAgent {
    client: Client,
    config: OllamaConfig,
    system_prompt: String,
}

impl OllamaChatAgent {
    /// Creates a new agent for the given endpoint configuration, using the
    /// interviewer persona prompt.
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            system_prompt: INTERVIEWER_PROMPT.to_string(),
        }
    }

    /// Creates an agent configured from the environment
    /// (`OLLAMA_BASE_URL`, `OLLAMA_MODEL_NAME`).
    pub fn from_env() -> Self {
        Self::new(OllamaConfig::from_env())
    }

    /// Overrides the system prompt after construction.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, history: &'a [TranscriptMessage]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: &self.system_prompt,
        });
        for message in history {
            messages.push(WireMessage {
                role: wire_role(message.role),
                content: &message.content,
            });
        }

        ChatRequest {
            model: &self.config.model,
            messages,
            stream: true,
        }
    }
}

#[async_trait]
impl ChatAgent for OllamaChatAgent {
    async fn stream_reply(&self, history: Vec<TranscriptMessage>) -> Result<ReplyChunks> {
        let request = self.build_request(&history);

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                PanelistError::model_unavailable(format!("Ollama request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(PanelistError::model_unavailable(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        tracing::debug!(model = %self.config.model, "streaming chat response");
        let body = Box::pin(response.bytes_stream());
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        tokio::spawn(pump_frames(body, tx));

        Ok(receiver_stream(rx))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// One NDJSON frame of a streaming chat response.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

fn wire_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn parse_frame(line: &str) -> Result<ChatChunk> {
    serde_json::from_str(line)
        .map_err(|err| PanelistError::model_unavailable(format!("malformed stream frame: {err}")))
}

enum LineOutcome {
    Continue,
    Done,
    Abort,
}

/// Handles one complete NDJSON line: forwards content, spots the terminal
/// `done` frame, and surfaces inline backend errors.
async fn process_line(raw: &[u8], tx: &mpsc::Sender<Result<String>>) -> LineOutcome {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim(),
        Err(err) => {
            let _ = tx
                .send(Err(PanelistError::model_unavailable(format!(
                    "invalid UTF-8 in stream frame: {err}"
                ))))
                .await;
            return LineOutcome::Abort;
        }
    };

    if line.is_empty() {
        return LineOutcome::Continue;
    }

    let chunk = match parse_frame(line) {
        Ok(chunk) => chunk,
        Err(err) => {
            let _ = tx.send(Err(err)).await;
            return LineOutcome::Abort;
        }
    };

    if let Some(error) = chunk.error {
        let _ = tx
            .send(Err(PanelistError::model_unavailable(format!(
                "Ollama backend error: {error}"
            ))))
            .await;
        return LineOutcome::Abort;
    }

    if let Some(message) = chunk.message {
        if !message.content.is_empty() && tx.send(Ok(message.content)).await.is_err() {
            // Consumer went away; nothing left to deliver
            return LineOutcome::Abort;
        }
    }

    if chunk.done {
        LineOutcome::Done
    } else {
        LineOutcome::Continue
    }
}

/// Reassembles NDJSON frames from the raw byte stream and forwards parsed
/// chunks. The channel closes on the `done` frame (normal termination) or
/// after an error item.
async fn pump_frames<S, B>(mut body: S, tx: mpsc::Sender<Result<String>>)
where
    S: futures::Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(piece) = body.next().await {
        let piece = match piece {
            Ok(piece) => piece,
            Err(err) => {
                let _ = tx
                    .send(Err(PanelistError::model_unavailable(format!(
                        "connection lost mid-stream: {err}"
                    ))))
                    .await;
                return;
            }
        };

        buffer.extend_from_slice(piece.as_ref());
        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            match process_line(&line[..pos], &tx).await {
                LineOutcome::Continue => {}
                LineOutcome::Done | LineOutcome::Abort => return,
            }
        }
    }

    // The body ended; a final frame may lack a trailing newline.
    if !buffer.is_empty() {
        match process_line(&buffer, &tx).await {
            LineOutcome::Done | LineOutcome::Abort => return,
            LineOutcome::Continue => {}
        }
    }

    // EOF without a done frame means the reply was truncated.
    let _ = tx
        .send(Err(PanelistError::model_unavailable(
            "stream ended before completion",
        )))
        .await;
}

fn receiver_stream(rx: mpsc::Receiver<Result<String>>) -> ReplyChunks {
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn drain(frames: Vec<reqwest::Result<Vec<u8>>>) -> Vec<Result<String>> {
        let (tx, mut rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        pump_frames(stream::iter(frames), tx).await;

        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_parse_content_frame() {
        let chunk = parse_frame(r#"{"message":{"content":"Hel"},"done":false}"#).unwrap();
        assert_eq!(chunk.message.unwrap().content, "Hel");
        assert!(!chunk.done);
        assert!(chunk.error.is_none());
    }

    #[test]
    fn test_parse_done_frame_ignores_extra_fields() {
        let chunk =
            parse_frame(r#"{"message":{"content":""},"done":true,"total_duration":12345}"#)
                .unwrap();
        assert!(chunk.done);
    }

    #[test]
    fn test_parse_malformed_frame() {
        let err = parse_frame("not json").unwrap_err();
        assert!(err.is_model_unavailable());
    }

    #[tokio::test]
    async fn test_pump_reassembles_split_frames() {
        let frames: Vec<reqwest::Result<Vec<u8>>> = vec![
            Ok(br#"{"message":{"content":"Hel"},"done":false}"#
                .iter()
                .chain(b"\n{\"mess")
                .copied()
                .collect()),
            Ok(b"age\":{\"content\":\"lo\"},\"done\":false}\n".to_vec()),
            Ok(br#"{"message":{"content":""},"done":true}"#.to_vec()),
        ];

        let items = drain(frames).await;
        let chunks: Vec<String> = items.into_iter().map(|item| item.unwrap()).collect();
        assert_eq!(chunks, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_pump_surfaces_backend_error() {
        let frames: Vec<reqwest::Result<Vec<u8>>> =
            vec![Ok(b"{\"error\":\"model not found\"}\n".to_vec())];

        let items = drain(frames).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_model_unavailable());
    }

    #[tokio::test]
    async fn test_pump_flags_truncated_stream() {
        let frames: Vec<reqwest::Result<Vec<u8>>> =
            vec![Ok(b"{\"message\":{\"content\":\"Hel\"},\"done\":false}\n".to_vec())];

        let items = drain(frames).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Hel");
        assert!(items[1].as_ref().unwrap_err().is_model_unavailable());
    }

    #[test]
    fn test_request_prepends_system_prompt() {
        let agent = OllamaChatAgent::new(OllamaConfig::default()).with_system_prompt("be brief");
        let history = vec![
            TranscriptMessage::user("hi"),
            TranscriptMessage::assistant("hello"),
        ];

        let request = agent.build_request(&history);
        let value = serde_json::to_value(&request).unwrap();

        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "be brief");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(value["stream"], true);
    }
}
