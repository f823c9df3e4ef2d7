//! Mock implementations for testing
//!
//! These mocks let the store run without a real provider or database.

use super::traits::SnapshotSink;
use crate::reply::{ReplyError, ReplyProvider, ReplyRequest};
use crate::session::PersistedState;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

// ============================================================================
// Mock Reply Provider
// ============================================================================

/// Mock provider that returns queued replies
pub struct MockReplyProvider {
    replies: Mutex<VecDeque<Result<String, ReplyError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ReplyRequest>>,
}

#[allow(dead_code)]
impl MockReplyProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: ReplyError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ReplyRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockReplyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyProvider for MockReplyProvider {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, ReplyError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ReplyError::unavailable("No mock reply queued")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Gated Reply Provider (holds each round trip open until released)
// ============================================================================

/// Provider whose replies are released by the test, one gate per call
pub struct GatedReplyProvider {
    gates: Mutex<VecDeque<oneshot::Receiver<Result<String, ReplyError>>>>,
    /// Notified when a request starts waiting on its gate
    pub request_started: Arc<Notify>,
}

/// Test-side handle releasing one gated round trip
pub struct Gate(oneshot::Sender<Result<String, ReplyError>>);

impl Gate {
    pub fn reply(self, reply: impl Into<String>) {
        let _ = self.0.send(Ok(reply.into()));
    }

    pub fn fail(self, error: ReplyError) {
        let _ = self.0.send(Err(error));
    }
}

impl GatedReplyProvider {
    pub fn new() -> Self {
        Self {
            gates: Mutex::new(VecDeque::new()),
            request_started: Arc::new(Notify::new()),
        }
    }

    /// Register the gate for the next request
    pub fn gate(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        Gate(tx)
    }
}

#[async_trait]
impl ReplyProvider for GatedReplyProvider {
    async fn reply(&self, _request: &ReplyRequest) -> Result<String, ReplyError> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.request_started.notify_one();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ReplyError::unknown("gate dropped"))),
            None => Err(ReplyError::unavailable("No gate registered")),
        }
    }

    fn name(&self) -> &str {
        "gated"
    }
}

// ============================================================================
// In-Memory Snapshot Sink
// ============================================================================

/// Sink that keeps every saved snapshot
#[derive(Default)]
pub struct InMemorySink {
    saved: Mutex<Vec<PersistedState>>,
    fail: Mutex<bool>,
}

#[allow(dead_code)]
impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<PersistedState> {
        self.saved.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<PersistedState> {
        self.saved.lock().unwrap().last().cloned()
    }

    /// Make subsequent saves fail
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl SnapshotSink for InMemorySink {
    fn save_snapshot(&self, snapshot: &PersistedState) -> Result<(), String> {
        if *self.fail.lock().unwrap() {
            return Err("disk full".to_string());
        }
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReplyRequest {
        ReplyRequest {
            content: "hello".to_string(),
            history: vec![],
        }
    }

    #[tokio::test]
    async fn test_mock_provider_drains_queue() {
        let mock = MockReplyProvider::new();
        mock.queue_reply("Hello");

        assert_eq!(mock.reply(&request()).await.unwrap(), "Hello");
        // Second call should fail (nothing queued)
        assert!(mock.reply(&request()).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_gated_provider_waits_for_release() {
        let provider = Arc::new(GatedReplyProvider::new());
        let gate = provider.gate();

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.reply(&request()).await }
        });
        provider.request_started.notified().await;
        assert!(!task.is_finished());

        gate.reply("released");
        assert_eq!(task.await.unwrap().unwrap(), "released");
    }

    #[test]
    fn test_in_memory_sink_can_fail() {
        let sink = InMemorySink::new();
        sink.save_snapshot(&PersistedState::default()).unwrap();
        sink.set_failing(true);
        assert!(sink.save_snapshot(&PersistedState::default()).is_err());
        assert_eq!(sink.saved().len(), 1);
    }
}
