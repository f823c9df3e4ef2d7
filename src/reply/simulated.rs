//! Placeholder provider that answers after a fixed delay

use super::{ReplyError, ReplyProvider, ReplyRequest};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

/// Echoes the request back after `delay`. Stands in for a real model.
#[derive(Debug, Clone)]
pub struct SimulatedReplyProvider {
    delay: Duration,
}

impl SimulatedReplyProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedReplyProvider {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_DELAY)
    }
}

#[async_trait]
impl ReplyProvider for SimulatedReplyProvider {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, ReplyError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!(
            "This is a simulated response to: \"{}\"",
            request.content
        ))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
