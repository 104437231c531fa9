//! Conversation controller.
//!
//! Orchestrates one interview session: keeps the in-memory history view in
//! lockstep with the durable [`TranscriptStore`], drives the model
//! collaborator's chunk stream, and commits the finished reply.

use crate::agent::{ChatAgent, ReplyChunks};
use crate::error::{PanelistError, Result};
use crate::transcript::{TranscriptMessage, TranscriptStore};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, mpsc};

/// Buffered chunks between the driving task and the consumer.
const TURN_CHANNEL_CAPACITY: usize = 16;

/// Per-session mutable state owned by the controller.
///
/// `history` is the in-memory projection of the session's transcript; it
/// matches the durable store at all times except the brief window between a
/// completed reply and its commit. `turn_gate` enforces at most one
/// in-flight turn per session.
struct SessionState {
    history: RwLock<Vec<TranscriptMessage>>,
    turn_gate: Arc<Mutex<()>>,
}

/// The produced side of one turn: a finite, non-restartable sequence of
/// reply chunks.
///
/// Dropping the stream mid-turn cancels the turn: the controller stops
/// pulling chunks from the model and discards the partial reply without
/// committing it.
#[derive(Debug)]
pub struct TurnStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl TurnStream {
    /// Waits for the next chunk. Returns `None` once the reply is complete
    /// and committed; an `Err` item ends the turn without a commit.
    pub async fn next_chunk(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }

    /// Drains the stream and returns the concatenated reply text.
    pub async fn collect_reply(mut self) -> Result<String> {
        let mut reply = String::new();
        while let Some(chunk) = self.next_chunk().await {
            reply.push_str(&chunk?);
        }
        Ok(reply)
    }
}

/// Orchestrates interview sessions over a transcript store and a chat agent.
///
/// `ConversationController` is responsible for:
/// - Hydrating the per-session history view from the store on first access
/// - Resetting a session's transcript (view and store together)
/// - Running one turn at a time per session: append the user message,
///   stream the reply, commit the assistant message on completion
///
/// State is held per `session_id`; distinct sessions proceed concurrently
/// with no cross-session locking.
pub struct ConversationController {
    store: Arc<dyn TranscriptStore>,
    agent: Arc<dyn ChatAgent>,
    /// In-memory session state, keyed by session ID
    sessions: RwLock<HashMap<String, Arc<SessionState>>>,
    /// Optional bound on the silence between two chunks
    chunk_timeout: Option<Duration>,
}

impl ConversationController {
    /// Creates a new controller over the given store and agent backends.
    pub fn new(store: Arc<dyn TranscriptStore>, agent: Arc<dyn ChatAgent>) -> Self {
        Self {
            store,
            agent,
            sessions: RwLock::new(HashMap::new()),
            chunk_timeout: None,
        }
    }

    /// Aborts a turn with `ModelUnavailable` when the model stays silent for
    /// longer than `timeout` between chunks. Off by default.
    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = Some(timeout);
        self
    }

    /// Returns the session's current history view, in append order.
    ///
    /// Unknown sessions hydrate as empty rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error if first-access hydration from the store fails.
    pub async fn history(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let state = self.session_state(session_id).await?;
        let history = state.history.read().await;
        Ok(history.clone())
    }

    /// Starts a fresh interview: clears the durable transcript and the
    /// in-memory view for `session_id`.
    ///
    /// The store is cleared and the view reset under the session's history
    /// write lock, so no reader observes one side cleared without the other.
    ///
    /// # Errors
    ///
    /// Returns `TurnInFlight` if a turn is still streaming, or a storage
    /// error if the clear fails (the view is left untouched in that case).
    pub async fn start_session(&self, session_id: &str) -> Result<()> {
        let state = self.session_state(session_id).await?;
        let _permit = state
            .turn_gate
            .clone()
            .try_lock_owned()
            .map_err(|_| PanelistError::turn_in_flight(session_id))?;

        let mut history = state.history.write().await;
        self.store.clear(session_id).await?;
        history.clear();
        tracing::info!(session_id = %session_id, "session reset");
        Ok(())
    }

    /// Submits one user turn and returns the reply as a chunk stream.
    ///
    /// The user message is committed to the view and the store before the
    /// model is invoked; it stays committed even if the reply fails. The
    /// assistant message is committed only once the chunk stream is
    /// exhausted, never partially.
    ///
    /// At most one turn may be in flight per session: calling this again
    /// before the previous [`TurnStream`] completes or fails returns
    /// `TurnInFlight`.
    pub async fn submit_turn(&self, session_id: &str, user_text: &str) -> Result<TurnStream> {
        let state = self.session_state(session_id).await?;
        let permit = state
            .turn_gate
            .clone()
            .try_lock_owned()
            .map_err(|_| PanelistError::turn_in_flight(session_id))?;

        let user_message = TranscriptMessage::user(user_text);
        let context = {
            let mut history = state.history.write().await;
            self.store.append(session_id, &user_message).await?;
            history.push(user_message);
            history.clone()
        };

        tracing::debug!(session_id = %session_id, turns = context.len(), "invoking model");
        let chunks = self.agent.stream_reply(context).await?;

        let (tx, rx) = mpsc::channel(TURN_CHANNEL_CAPACITY);
        let turn = TurnDriver {
            store: Arc::clone(&self.store),
            state,
            session_id: session_id.to_string(),
            chunk_timeout: self.chunk_timeout,
            _permit: permit,
        };
        tokio::spawn(turn.run(chunks, tx));

        Ok(TurnStream { rx })
    }

    /// Looks up or creates the in-memory state for a session, hydrating the
    /// history view from the store on first access.
    async fn session_state(&self, session_id: &str) -> Result<Arc<SessionState>> {
        if let Some(state) = self.sessions.read().await.get(session_id) {
            return Ok(Arc::clone(state));
        }

        // Hydrate outside the write lock; on a race the first insert wins.
        let messages = self.store.load(session_id).await?;
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(SessionState {
                    history: RwLock::new(messages),
                    turn_gate: Arc::new(Mutex::new(())),
                })
            });
        Ok(Arc::clone(state))
    }
}

/// Drives one turn to completion on a background task.
///
/// Holds the session's turn permit for the whole turn; dropping the driver
/// (commit, failure, or cancellation) releases it.
struct TurnDriver {
    store: Arc<dyn TranscriptStore>,
    state: Arc<SessionState>,
    session_id: String,
    chunk_timeout: Option<Duration>,
    _permit: OwnedMutexGuard<()>,
}

impl TurnDriver {
    async fn run(self, mut chunks: ReplyChunks, tx: mpsc::Sender<Result<String>>) {
        let mut reply = String::new();

        loop {
            let next = tokio::select! {
                next = self.next_with_timeout(&mut chunks) => next,
                // Consumer dropped the TurnStream: stop pulling chunks and
                // discard the partial reply uncommitted.
                _ = tx.closed() => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        "turn consumer disconnected; discarding partial reply"
                    );
                    return;
                }
            };

            match next {
                Some(Ok(chunk)) => {
                    reply.push_str(&chunk);
                    if tx.send(Ok(chunk)).await.is_err() {
                        tracing::warn!(
                            session_id = %self.session_id,
                            "turn consumer disconnected; discarding partial reply"
                        );
                        return;
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        error = %err,
                        "model stream failed; discarding partial reply"
                    );
                    let _ = tx.send(Err(err)).await;
                    return;
                }
                None => break,
            }
        }

        // Stream exhausted: commit the assistant message to store and view.
        let assistant = TranscriptMessage::assistant(reply);
        let mut history = self.state.history.write().await;
        if let Err(err) = self.store.append(&self.session_id, &assistant).await {
            tracing::warn!(
                session_id = %self.session_id,
                error = %err,
                "failed to commit assistant message"
            );
            let _ = tx.send(Err(err)).await;
            return;
        }
        history.push(assistant);
        tracing::debug!(session_id = %self.session_id, "turn committed");
    }

    async fn next_with_timeout(&self, chunks: &mut ReplyChunks) -> Option<Result<String>> {
        match self.chunk_timeout {
            Some(limit) => match tokio::time::timeout(limit, chunks.next()).await {
                Ok(next) => next,
                Err(_) => Some(Err(PanelistError::model_unavailable(format!(
                    "no output from the model for {}s",
                    limit.as_secs()
                )))),
            },
            None => chunks.next().await,
        }
    }
}
