//! Reply provider abstraction
//!
//! The store asks a provider for the assistant's answer to a user message.
//! Providers are swappable, may be slow, and may fail.

mod error;
mod simulated;

pub use error::{ReplyError, ReplyErrorKind};
pub use simulated::{SimulatedReplyProvider, DEFAULT_REPLY_DELAY};

use crate::session::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// What the store hands a provider for one round trip
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyRequest {
    /// Content of the message being answered
    pub content: String,
    /// Messages preceding it, oldest first
    pub history: Vec<Message>,
}

/// Common interface for reply providers
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Produce the assistant's reply text
    async fn reply(&self, request: &ReplyRequest) -> Result<String, ReplyError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ReplyProvider + ?Sized> ReplyProvider for Arc<T> {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, ReplyError> {
        (**self).reply(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for reply providers
pub struct LoggingProvider {
    inner: Arc<dyn ReplyProvider>,
    name: String,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn ReplyProvider>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl ReplyProvider for LoggingProvider {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, ReplyError> {
        let start = std::time::Instant::now();
        let result = self.inner.reply(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    provider = %self.name,
                    duration_ms = %duration.as_millis(),
                    history_len = request.history.len(),
                    reply_chars = reply.chars().count(),
                    "Reply received"
                );
            }
            Err(e) => {
                tracing::error!(
                    provider = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    transient = e.kind.is_transient(),
                    "Reply failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
