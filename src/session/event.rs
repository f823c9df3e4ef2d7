//! Events that can occur in a session

use super::message::{Message, MessageStatus};
use super::settings::SettingsPatch;
use chrono::{DateTime, Utc};

/// How imported messages combine with the current list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Imported messages become the whole list
    #[default]
    Replace,
    /// Imported messages are appended, skipping ids already present
    Append,
}

/// Events that trigger state transitions.
///
/// Ids and timestamps are chosen by the caller so that `transition` stays pure.
#[derive(Debug, Clone)]
pub enum Event {
    // Caller events
    UserMessage {
        message_id: String,
        content: String,
        timestamp: DateTime<Utc>,
    },
    Retry {
        message_id: String,
    },
    ClearMessages,
    UpdateSettings(SettingsPatch),
    Import {
        messages: Vec<Message>,
        policy: ImportPolicy,
    },

    // Primitive mutators
    AddMessage(Message),
    UpdateStatus {
        message_id: String,
        status: Option<MessageStatus>,
    },
    SetLoading(bool),
    SetError(Option<String>),

    // Reply provider events
    ReplyReceived {
        message_id: String,
        reply: Message,
    },
    ReplyFailed {
        message_id: String,
        message: String,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::Retry { .. } => "retry",
            Event::ClearMessages => "clear_messages",
            Event::UpdateSettings(_) => "update_settings",
            Event::Import { .. } => "import",
            Event::AddMessage(_) => "add_message",
            Event::UpdateStatus { .. } => "update_status",
            Event::SetLoading(_) => "set_loading",
            Event::SetError(_) => "set_error",
            Event::ReplyReceived { .. } => "reply_received",
            Event::ReplyFailed { .. } => "reply_failed",
        }
    }
}
