//! Conversations domain: chat session history, suggestions, turn handling
//!
//! The session model behind a chat screen, without any presentation:
//! message history seeded with a welcome message, a draft input, a carousel
//! of suggested questions, and one-turn-at-a-time delivery to a chat backend.

pub mod content;
pub mod domain;
pub mod session;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{ChatMessage, MessageAuthor, SuggestionCarousel};
pub use domain::state::{SessionEvent, SessionState, SessionStateMachine, StateError};
pub use session::ChatSession;
