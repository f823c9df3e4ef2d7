//! Effects produced by state transitions

use super::message::Message;

/// Effects to be executed by the store after a transition is applied
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the reply provider to answer `content`
    RequestReply {
        message_id: String,
        content: String,
        /// Messages preceding the one being answered
        history: Vec<Message>,
    },

    /// Durable fields changed; hand the projection to the snapshot sink
    PersistSnapshot,
}

impl Effect {
    pub fn request_reply(message: &Message, history: &[Message]) -> Self {
        Effect::RequestReply {
            message_id: message.id.clone(),
            content: message.content.clone(),
            history: history.to_vec(),
        }
    }
}
