//! Append-only chat history for the current run.

use super::message::{Message, MessageRole};

/// Ordered user/assistant history.
///
/// Messages are only ever appended; the whole transcript is dropped on
/// logout or session expiry.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Append a message and return a reference to it.
    pub fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages sent by `role`.
    pub fn count(&self, role: MessageRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
