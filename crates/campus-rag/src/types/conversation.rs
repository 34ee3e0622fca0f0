//! Conversation history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a conversation message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    Student,
    /// The engine's previous answers
    Assistant,
}

impl Role {
    /// Label used when rendering history into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Assistant => "Assistant",
        }
    }
}

/// A single message of conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the message was written
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a message stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a student message
    pub fn student(content: impl Into<String>) -> Self {
        Self::new(Role::Student, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
