//! Session store
//!
//! The single writer of session state. Every operation becomes an event run
//! through the pure transition function; the store then executes the
//! resulting effects, notifies observers, and hands durable snapshots to the
//! configured sink.

mod projection;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use projection::project;
pub use traits::*;

use crate::codec::{self, CodecError, ExportDocument};
use crate::reply::{ReplyError, ReplyProvider, ReplyRequest};
use crate::session::message::{reply_message_id, user_message_id};
use crate::session::{
    transition, Effect, Event, ImportPolicy, Message, MessageStatus, SessionState, Settings,
    SettingsPatch,
};
use chrono::Utc;
use futures::Stream;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

const OBSERVER_CAPACITY: usize = 128;

/// A round trip whose optimistic phase has been applied
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub message_id: String,
    pub request: ReplyRequest,
}

/// How a send or retry ended
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Empty content, unknown id, or a message that cannot be retried
    Ignored,
    /// The message reached `sent`; `reply_id` names the appended reply, if any
    Delivered {
        message_id: String,
        reply_id: Option<String>,
    },
    /// The message reached `error`
    Failed {
        message_id: String,
        error: ReplyError,
    },
    /// The message vanished (clear or import) before its round trip resolved
    Dropped { message_id: String },
}

struct Applied {
    /// Message count before the transition
    prior_messages: usize,
    snapshot: Arc<SessionState>,
    effects: Vec<Effect>,
}

struct StoreInner<P> {
    state: Mutex<Arc<SessionState>>,
    provider: P,
    sink: Option<Arc<dyn SnapshotSink>>,
    broadcast_tx: broadcast::Sender<Arc<SessionState>>,
}

/// Handle to a chat session. Clones share the same state.
pub struct SessionStore<P> {
    inner: Arc<StoreInner<P>>,
}

impl<P> Clone for SessionStore<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: ReplyProvider> SessionStore<P> {
    #[allow(dead_code)] // Used in tests
    pub fn new(initial: SessionState, provider: P) -> Self {
        Self::build(initial, provider, None)
    }

    /// Store whose durable changes are written to `sink`
    pub fn with_sink(initial: SessionState, provider: P, sink: Arc<dyn SnapshotSink>) -> Self {
        Self::build(initial, provider, Some(sink))
    }

    fn build(initial: SessionState, provider: P, sink: Option<Arc<dyn SnapshotSink>>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(OBSERVER_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(Arc::new(initial)),
                provider,
                sink,
                broadcast_tx,
            }),
        }
    }

    // ============================================================
    // Reads
    // ============================================================

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.lock_state().clone()
    }

    /// Receive a snapshot after every applied transition
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SessionState>> {
        self.inner.broadcast_tx.subscribe()
    }

    pub fn watch_state(&self) -> impl Stream<Item = SessionState> + Send + 'static {
        let rx = self.subscribe();
        project(&self.snapshot(), rx, SessionState::clone)
    }

    pub fn watch_messages(&self) -> impl Stream<Item = Vec<Message>> + Send + 'static {
        let rx = self.subscribe();
        project(&self.snapshot(), rx, |s| s.messages.clone())
    }

    pub fn watch_loading(&self) -> impl Stream<Item = bool> + Send + 'static {
        let rx = self.subscribe();
        project(&self.snapshot(), rx, |s| s.is_loading)
    }

    pub fn watch_error(&self) -> impl Stream<Item = Option<String>> + Send + 'static {
        let rx = self.subscribe();
        project(&self.snapshot(), rx, |s| s.error.clone())
    }

    pub fn watch_settings(&self) -> impl Stream<Item = Settings> + Send + 'static {
        let rx = self.subscribe();
        project(&self.snapshot(), rx, |s| s.settings.clone())
    }

    /// Build the export document for the current messages
    pub fn export(&self, title: impl Into<String>) -> ExportDocument {
        ExportDocument {
            title: title.into(),
            messages: self.snapshot().messages.clone(),
            export_date: Utc::now(),
        }
    }

    // ============================================================
    // Round trips
    // ============================================================

    /// Send a user message and wait for the reply
    #[allow(dead_code)] // The HTTP surface resolves in the background
    pub async fn send_message(&self, content: &str) -> SendOutcome {
        match self.begin_send(content) {
            Some(pending) => self.resolve(pending).await,
            None => SendOutcome::Ignored,
        }
    }

    /// Retry a delivered or failed message
    #[allow(dead_code)] // The HTTP surface resolves in the background
    pub async fn retry_message(&self, message_id: &str) -> SendOutcome {
        match self.begin_retry(message_id) {
            Some(pending) => self.resolve(pending).await,
            None => SendOutcome::Ignored,
        }
    }

    /// Optimistic phase of a send: the message is visible with status
    /// `sending` before this returns
    pub fn begin_send(&self, content: &str) -> Option<PendingReply> {
        let applied = self.apply(Event::UserMessage {
            message_id: user_message_id(),
            content: content.to_string(),
            timestamp: Utc::now(),
        })?;
        pending_from(applied.effects)
    }

    /// Optimistic phase of a retry
    pub fn begin_retry(&self, message_id: &str) -> Option<PendingReply> {
        let applied = self.apply(Event::Retry {
            message_id: message_id.to_string(),
        })?;
        pending_from(applied.effects)
    }

    /// Await the provider and apply the terminal state change.
    ///
    /// Always resolves: there is no cancellation and no built-in timeout.
    pub async fn resolve(&self, pending: PendingReply) -> SendOutcome {
        let PendingReply {
            message_id,
            request,
        } = pending;

        match self.inner.provider.reply(&request).await {
            Ok(text) => {
                let reply = Message::reply(reply_message_id(), text, Utc::now());
                let reply_id = reply.id.clone();
                let applied = self.apply(Event::ReplyReceived {
                    message_id: message_id.clone(),
                    reply,
                });
                match applied {
                    Some(applied) if applied.snapshot.message(&message_id).is_some() => {
                        let reply_id = applied
                            .snapshot
                            .message(&reply_id)
                            .map(|m| m.id.clone());
                        SendOutcome::Delivered {
                            message_id,
                            reply_id,
                        }
                    }
                    _ => SendOutcome::Dropped { message_id },
                }
            }
            Err(error) => {
                let applied = self.apply(Event::ReplyFailed {
                    message_id: message_id.clone(),
                    message: error.message.clone(),
                });
                match applied {
                    Some(applied) if applied.snapshot.message(&message_id).is_some() => {
                        SendOutcome::Failed { message_id, error }
                    }
                    _ => SendOutcome::Dropped { message_id },
                }
            }
        }
    }

    // ============================================================
    // Synchronous operations
    // ============================================================

    /// Empty the message list and clear the error. Settings survive.
    pub fn clear_messages(&self) {
        self.apply(Event::ClearMessages);
    }

    pub fn update_settings(&self, patch: SettingsPatch) {
        self.apply(Event::UpdateSettings(patch));
    }

    /// Append a fully formed message. Returns false if the id is taken.
    pub fn add_message(&self, message: Message) -> bool {
        self.apply(Event::AddMessage(message)).is_some()
    }

    /// Set one message's status. Returns false if the id is unknown.
    pub fn update_message_status(&self, message_id: &str, status: Option<MessageStatus>) -> bool {
        self.apply(Event::UpdateStatus {
            message_id: message_id.to_string(),
            status,
        })
        .is_some()
    }

    pub fn set_loading(&self, loading: bool) {
        self.apply(Event::SetLoading(loading));
    }

    pub fn set_error(&self, error: Option<String>) {
        self.apply(Event::SetError(error));
    }

    /// Load a parsed document's messages. Returns how many were added.
    pub fn import(&self, document: ExportDocument, policy: ImportPolicy) -> usize {
        let Some(applied) = self.apply(Event::Import {
            messages: document.messages,
            policy,
        }) else {
            return 0;
        };
        let total = applied.snapshot.messages.len();
        match policy {
            ImportPolicy::Replace => total,
            ImportPolicy::Append => total.saturating_sub(applied.prior_messages),
        }
    }

    /// Parse and load an export document. State is untouched on failure.
    pub fn import_json(&self, text: &str, policy: ImportPolicy) -> Result<usize, CodecError> {
        let document = codec::import_json(text)?;
        Ok(self.import(document, policy))
    }

    // ============================================================
    // Transition execution
    // ============================================================

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Arc<SessionState>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one event. Persisting and notifying happen under the state lock
    /// so observers and the sink see transitions in order.
    fn apply(&self, event: Event) -> Option<Applied> {
        let event_name = event.name();
        let mut state = self.lock_state();
        let prior_messages = state.messages.len();

        let result = match transition(&state, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(event = event_name, reason = %e, "Operation ignored");
                return None;
            }
        };

        let snapshot = Arc::new(result.new_state);
        *state = snapshot.clone();

        tracing::debug!(
            event = event_name,
            messages = snapshot.messages.len(),
            is_loading = snapshot.is_loading,
            pending_replies = snapshot.pending_replies(),
            "Applied transition"
        );

        if result.effects.contains(&Effect::PersistSnapshot) {
            self.persist(&snapshot);
        }

        // No receivers is fine
        let _ = self.inner.broadcast_tx.send(snapshot.clone());

        Some(Applied {
            prior_messages,
            snapshot,
            effects: result.effects,
        })
    }

    fn persist(&self, snapshot: &SessionState) {
        let Some(sink) = &self.inner.sink else {
            return;
        };
        if let Err(e) = sink.save_snapshot(&snapshot.persisted()) {
            tracing::warn!(error = %e, "Failed to persist session snapshot");
        }
    }
}

fn pending_from(effects: Vec<Effect>) -> Option<PendingReply> {
    effects.into_iter().find_map(|effect| match effect {
        Effect::RequestReply {
            message_id,
            content,
            history,
        } => Some(PendingReply {
            message_id,
            request: ReplyRequest { content, history },
        }),
        Effect::PersistSnapshot => None,
    })
}
