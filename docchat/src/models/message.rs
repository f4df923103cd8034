//! Message model representing one turn in the chat transcript.

use chrono::{DateTime, Utc};

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// Question typed by the user.
    User,
    /// Answer (or error text) shown on behalf of the backend.
    Assistant,
}

impl MessageRole {
    /// Convert role to its display string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who sent the message.
    pub role: MessageRole,
    /// Text content of the message.
    pub content: String,
    /// When the message was appended.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}
