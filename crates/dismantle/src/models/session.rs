use uuid::Uuid;

use super::message::Message;

/// Caller-owned conversation state.
///
/// The identifier is sent with every agent call so the remote agent can keep
/// context between turns. It is fixed for the lifetime of the conversation and
/// replaced only when the transcript is cleared.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    messages: Vec<Message>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Resume a conversation the remote agent already knows about.
    pub fn with_id<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop the transcript and start a new conversation with the agent.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.id = Uuid::new_v4().to_string();
    }
}
