//! Session state and its durable projection

use super::message::{Message, MessageStatus};
use super::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical state of one chat session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Creation order, never re-sorted
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub settings: Settings,
    /// Round trips started but not yet resolved, by message id
    #[serde(skip)]
    pub(crate) in_flight: BTreeMap<String, u32>,
}

impl SessionState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Rebuild a session from what survived a restart.
    ///
    /// Loading and error always start cleared. A message persisted while its
    /// round trip was outstanding can never resolve, so it comes back as
    /// `error` and becomes retry-eligible.
    pub fn restore(persisted: PersistedState) -> Self {
        let messages = persisted
            .messages
            .into_iter()
            .map(interrupted_to_error)
            .collect();
        Self {
            messages,
            is_loading: false,
            error: None,
            settings: persisted.settings,
            in_flight: BTreeMap::new(),
        }
    }

    /// The subset of state that survives a restart
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            messages: self.messages.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub(crate) fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    pub fn pending_replies(&self) -> u32 {
        self.in_flight.values().sum()
    }

    /// Whether a round trip for `id` is still outstanding
    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains_key(id)
    }
}

fn interrupted_to_error(mut message: Message) -> Message {
    if message.status == Some(MessageStatus::Sending) {
        message.status = Some(MessageStatus::Error);
    }
    message
}

/// Durable projection: `messages` and `settings` only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub messages: Vec<Message>,
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::Role;
    use crate::session::settings::Theme;
    use chrono::Utc;

    #[test]
    fn test_persisted_drops_transient_fields() {
        let mut state = SessionState::default();
        state.messages.push(Message::new("m1", Role::User, "hi"));
        state.is_loading = true;
        state.error = Some("boom".to_string());
        state.in_flight.insert("m1".to_string(), 1);

        let persisted = state.persisted();
        let value = serde_json::to_value(&persisted).unwrap();

        assert_eq!(persisted.messages.len(), 1);
        assert!(value.get("isLoading").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_restore_resets_transient_fields() {
        let mut settings = Settings::default();
        settings.theme = Theme::Dark;
        let persisted = PersistedState {
            messages: vec![
                Message::outgoing("m1", "in flight", Utc::now()),
                Message::new("m2", Role::Assistant, "done").with_status(MessageStatus::Sent),
                Message::new("m3", Role::System, "note"),
            ],
            settings: settings.clone(),
        };

        let state = SessionState::restore(persisted);

        assert!(!state.is_loading);
        assert_eq!(state.error, None);
        assert_eq!(state.pending_replies(), 0);
        assert_eq!(state.settings, settings);
        assert_eq!(state.messages[0].status, Some(MessageStatus::Error));
        assert_eq!(state.messages[1].status, Some(MessageStatus::Sent));
        assert_eq!(state.messages[2].status, None);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let value = serde_json::to_value(SessionState::default()).unwrap();
        assert_eq!(value["isLoading"], false);
        assert!(value["error"].is_null());
        assert!(value.get("pendingReplies").is_none());
        assert_eq!(value["settings"]["theme"], "auto");
    }
}
