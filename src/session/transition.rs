//! Pure state transition function
//!
//! Every store operation is expressed as an [`Event`] applied here. The
//! function performs no I/O; the store executes the returned effects.

use super::message::{Message, MessageStatus, Role};
use super::state::SessionState;
use super::{Effect, Event, ImportPolicy};
use std::collections::HashSet;
use thiserror::Error;

/// Store-level error text when a provider fails without saying why
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to send message";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The reply request this transition started, if any
    #[cfg(test)]
    pub fn reply_request(&self) -> Option<&Effect> {
        self.effects
            .iter()
            .find(|e| matches!(e, Effect::RequestReply { .. }))
    }
}

/// Validation failures. The store treats all of these as silent no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message content is empty")]
    EmptyContent,
    #[error("Unknown message: {0}")]
    UnknownMessage(String),
    #[error("Message {id} cannot be retried while {status}")]
    NotRetryable { id: String, status: String },
    #[error("Message already exists: {0}")]
    DuplicateMessage(String),
}

/// Pure transition function
pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Round trips
        // ============================================================
        Event::UserMessage {
            message_id,
            content,
            timestamp,
        } => {
            if content.trim().is_empty() {
                return Err(TransitionError::EmptyContent);
            }
            if state.message(&message_id).is_some() {
                return Err(TransitionError::DuplicateMessage(message_id));
            }

            let message = Message::outgoing(message_id, content, timestamp);
            let request = Effect::request_reply(&message, &state.messages);

            let mut next = state.clone();
            begin_round_trip(&mut next, &message.id);
            next.messages.push(message);
            next.error = None;

            Ok(TransitionResult::new(next)
                .with_effect(request)
                .with_effect(Effect::PersistSnapshot))
        }

        Event::Retry { message_id } => {
            let position = state
                .position(&message_id)
                .ok_or_else(|| TransitionError::UnknownMessage(message_id.clone()))?;
            let target = &state.messages[position];
            match target.status {
                Some(MessageStatus::Error | MessageStatus::Sent) => {}
                // No outstanding round trip will ever resolve it
                Some(MessageStatus::Sending) if !state.is_in_flight(&message_id) => {}
                Some(MessageStatus::Sending) => {
                    return Err(TransitionError::NotRetryable {
                        id: message_id,
                        status: MessageStatus::Sending.to_string(),
                    })
                }
                None => {
                    return Err(TransitionError::NotRetryable {
                        id: message_id,
                        status: "settled".to_string(),
                    })
                }
            }

            let request = Effect::request_reply(target, &state.messages[..position]);

            let mut next = state.clone();
            next.messages[position].status = Some(MessageStatus::Sending);
            next.error = None;
            begin_round_trip(&mut next, &message_id);

            Ok(TransitionResult::new(next)
                .with_effect(request)
                .with_effect(Effect::PersistSnapshot))
        }

        Event::ReplyReceived { message_id, reply } => {
            let mut next = state.clone();
            end_round_trip(&mut next, &message_id);

            // Cleared or replaced while in flight: the reply has nowhere to go
            let Some(position) = next.position(&message_id) else {
                return Ok(TransitionResult::new(next));
            };
            let origin = &mut next.messages[position];
            origin.status = Some(MessageStatus::Sent);
            let answers_user = origin.role == Role::User;

            if answers_user && next.message(&reply.id).is_none() {
                next.messages.push(reply);
            }

            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        Event::ReplyFailed {
            message_id,
            message,
        } => {
            let mut next = state.clone();
            end_round_trip(&mut next, &message_id);

            let Some(position) = next.position(&message_id) else {
                return Ok(TransitionResult::new(next));
            };
            next.messages[position].status = Some(MessageStatus::Error);
            next.error = Some(if message.trim().is_empty() {
                DEFAULT_FAILURE_MESSAGE.to_string()
            } else {
                message
            });

            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        // ============================================================
        // Synchronous operations
        // ============================================================

        // Outstanding round trips are not cancelled; they resolve as orphans
        Event::ClearMessages => {
            let mut next = state.clone();
            next.messages.clear();
            next.error = None;
            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        Event::UpdateSettings(patch) => {
            let mut next = state.clone();
            next.settings = state.settings.merged(patch);
            let changed = next.settings != state.settings;
            let result = TransitionResult::new(next);
            Ok(if changed {
                result.with_effect(Effect::PersistSnapshot)
            } else {
                result
            })
        }

        Event::Import { messages, policy } => {
            let mut next = state.clone();
            let imported = messages.into_iter();
            match policy {
                ImportPolicy::Replace => {
                    next.messages = imported.collect();
                }
                ImportPolicy::Append => {
                    let mut seen: HashSet<String> =
                        state.messages.iter().map(|m| m.id.clone()).collect();
                    next.messages
                        .extend(imported.filter(|m| seen.insert(m.id.clone())));
                }
            }
            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        Event::AddMessage(message) => {
            if state.message(&message.id).is_some() {
                return Err(TransitionError::DuplicateMessage(message.id));
            }
            let mut next = state.clone();
            next.messages.push(message);
            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        Event::UpdateStatus { message_id, status } => {
            let mut next = state.clone();
            let target = next
                .message_mut(&message_id)
                .ok_or(TransitionError::UnknownMessage(message_id))?;
            target.status = status;
            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        // Overridden by the next round-trip resolution
        Event::SetLoading(loading) => {
            let mut next = state.clone();
            next.is_loading = loading;
            Ok(TransitionResult::new(next))
        }

        Event::SetError(error) => {
            let mut next = state.clone();
            next.error = error;
            Ok(TransitionResult::new(next))
        }
    }
}

fn begin_round_trip(state: &mut SessionState, message_id: &str) {
    *state.in_flight.entry(message_id.to_string()).or_insert(0) += 1;
    state.is_loading = true;
}

fn end_round_trip(state: &mut SessionState, message_id: &str) {
    if let Some(count) = state.in_flight.get_mut(message_id) {
        *count -= 1;
        if *count == 0 {
            state.in_flight.remove(message_id);
        }
    }
    state.is_loading = !state.in_flight.is_empty();
}
