//! API request and response types

use crate::session::MessageStatus;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub content: String,
}

/// Response for a send or retry; the reply arrives over the stream
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub message_id: String,
    pub queued: bool,
}

/// Request to set a message's status. `null` settles the message.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<MessageStatus>,
}

/// Direct override of the loading flag
#[derive(Debug, Deserialize)]
pub struct LoadingRequest {
    pub loading: bool,
}

/// Direct override of the error string. `null` clears it.
#[derive(Debug, Deserialize)]
pub struct ErrorRequest {
    pub error: Option<String>,
}

/// Response for an import
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// Which projection a stream follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamView {
    #[default]
    All,
    Messages,
    Loading,
    Error,
    Settings,
}

/// Response for mutating actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
