//! Domain entities for Conversations domain
//!
//! Chat messages as the user sees them, and the suggested-question carousel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    User,
    Bot,
}

impl std::fmt::Display for MessageAuthor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageAuthor::User => write!(f, "user"),
            MessageAuthor::Bot => write!(f, "bot"),
        }
    }
}

/// Chat message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub author: MessageAuthor,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, MessageAuthor::User)
    }

    /// Create a new bot message
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, MessageAuthor::Bot)
    }

    fn new(text: impl Into<String>, author: MessageAuthor) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author,
            timestamp: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.author == MessageAuthor::User
    }
}

/// Suggested questions shown one at a time, wrapping in both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionCarousel {
    questions: Vec<String>,
    index: usize,
}

impl SuggestionCarousel {
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            questions,
            index: 0,
        }
    }

    /// Question currently on display, `None` when the carousel is empty
    pub fn current(&self) -> Option<&str> {
        self.questions.get(self.index).map(String::as_str)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Advance one slide, wrapping past the end
    pub fn next_slide(&mut self) -> Option<&str> {
        if !self.questions.is_empty() {
            self.index = (self.index + 1) % self.questions.len();
        }
        self.current()
    }

    /// Step back one slide, wrapping before the start
    pub fn prev_slide(&mut self) -> Option<&str> {
        if !self.questions.is_empty() {
            let len = self.questions.len();
            self.index = (self.index + len - 1) % len;
        }
        self.current()
    }
}
