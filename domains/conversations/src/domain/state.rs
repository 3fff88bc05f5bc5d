//! State machine for chat session turns
//!
//! Session states: Idle → AwaitingReply → Idle

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },
}

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingReply,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingReply => write!(f, "awaiting_reply"),
        }
    }
}

/// Events that trigger session state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// A user message was sent to the backend
    Submit,
    /// The backend answered, possibly with the fallback text
    ReplyReceived,
    /// The pending turn was dropped before it finished
    Abandon,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::ReplyReceived => write!(f, "reply_received"),
            Self::Abandon => write!(f, "abandon"),
        }
    }
}

/// Session state machine
pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: SessionState,
        event: SessionEvent,
    ) -> Result<SessionState, StateError> {
        match (current, event) {
            (SessionState::Idle, SessionEvent::Submit) => Ok(SessionState::AwaitingReply),
            (SessionState::AwaitingReply, SessionEvent::ReplyReceived)
            | (SessionState::AwaitingReply, SessionEvent::Abandon) => Ok(SessionState::Idle),
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }
}
