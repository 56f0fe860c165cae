use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::attachment::FileAttachment;

/// Unique message identifier
pub type MessageId = String;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A chat message as held by a session.
///
/// While `is_streaming` is set, `streamed_content` carries the partial text
/// revealed so far and is the authoritative display text; once the message
/// settles, `content` is authoritative and `streamed_content` is cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streamed_content: Option<String>,
    #[serde(default)]
    pub is_streaming: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
    #[serde(default)]
    pub error: bool,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            streamed_content: None,
            is_streaming: false,
            timestamp: Utc::now(),
            files: None,
            error: false,
        }
    }

    /// Create a user message carrying attachments
    pub fn user_with_files(content: impl Into<String>, files: Vec<FileAttachment>) -> Self {
        Self {
            files: Some(files),
            ..Self::user(content)
        }
    }

    /// Create a settled assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            streamed_content: None,
            is_streaming: false,
            timestamp: Utc::now(),
            files: None,
            error: false,
        }
    }

    /// Create the in-flight placeholder an assistant reply streams into
    pub fn streaming_placeholder() -> Self {
        Self {
            streamed_content: Some(String::new()),
            is_streaming: true,
            ..Self::assistant("")
        }
    }

    /// Create an assistant message carrying a user-facing error
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::assistant(content)
        }
    }

    /// Text to display for this message in its current state
    pub fn display_text(&self) -> &str {
        if self.is_streaming {
            self.streamed_content.as_deref().unwrap_or("")
        } else {
            &self.content
        }
    }

    /// Settle a streaming message with its final text
    pub fn settle(&mut self, final_text: impl Into<String>) {
        self.content = final_text.into();
        self.is_streaming = false;
        self.streamed_content = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.display_text(), "Hello!");
        assert!(!msg.is_streaming);
    }

    #[test]
    fn test_placeholder_displays_streamed_content() {
        let mut msg = Message::streaming_placeholder();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.is_streaming);
        assert_eq!(msg.display_text(), "");

        msg.streamed_content = Some("Hel".to_string());
        assert_eq!(msg.display_text(), "Hel");
    }

    #[test]
    fn test_settle_clears_streaming_state() {
        let mut msg = Message::streaming_placeholder();
        msg.streamed_content = Some("Hello".to_string());
        msg.settle("Hello");

        assert!(!msg.is_streaming);
        assert_eq!(msg.streamed_content, None);
        assert_eq!(msg.display_text(), "Hello");
    }

    #[test]
    fn test_error_message() {
        let msg = Message::error("something broke");
        assert!(msg.error);
        assert_eq!(msg.role, Role::Assistant);
    }
}
