//! Chat session: history, draft input and turn delivery
//!
//! Holds everything a chat screen needs between turns, including the
//! conversation handle returned by the backend. Turns take `&mut self`, so a
//! session can only ever have one turn in flight.

use std::sync::Arc;

use healthchat_assistant::{ChatBackend, ConversationHandle};

use crate::content::{default_suggestions, WELCOME_MESSAGE};
use crate::domain::entities::{ChatMessage, SuggestionCarousel};
use crate::domain::state::{SessionEvent, SessionState, SessionStateMachine, StateError};

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    messages: Vec<ChatMessage>,
    conversation_handle: Option<ConversationHandle>,
    state: SessionState,
    draft: String,
    suggestions: SuggestionCarousel,
}

impl ChatSession {
    /// Create a session with the default welcome message and suggestions
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self::with_suggestions(backend, default_suggestions())
    }

    pub fn with_suggestions(backend: Arc<dyn ChatBackend>, suggestions: Vec<String>) -> Self {
        Self {
            backend,
            messages: vec![ChatMessage::bot(WELCOME_MESSAGE)],
            conversation_handle: None,
            state: SessionState::Idle,
            draft: String::new(),
            suggestions: SuggestionCarousel::new(suggestions),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation_handle(&self) -> Option<&ConversationHandle> {
        self.conversation_handle.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while a turn is waiting on the backend
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::AwaitingReply
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn suggestions(&self) -> &SuggestionCarousel {
        &self.suggestions
    }

    pub fn suggestions_mut(&mut self) -> &mut SuggestionCarousel {
        &mut self.suggestions
    }

    /// Copy the suggestion on display into the draft
    pub fn choose_suggestion(&mut self) -> Option<&str> {
        let question = self.suggestions.current()?.to_string();
        self.draft = question;
        Some(&self.draft)
    }

    /// Send the draft, clearing it first. Blank drafts are left untouched.
    pub async fn submit_draft(&mut self) -> Result<Option<ChatMessage>, StateError> {
        if self.draft.trim().is_empty() {
            return Ok(None);
        }
        let text = std::mem::take(&mut self.draft);
        self.submit(&text).await
    }

    /// Send one user message and record the reply.
    ///
    /// Blank input is ignored without calling the backend. Backend failures
    /// still produce a bot message carrying the fallback text.
    pub async fn submit(&mut self, text: &str) -> Result<Option<ChatMessage>, StateError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        self.state = SessionStateMachine::transition(self.state, SessionEvent::Submit)?;
        self.messages.push(ChatMessage::user(text));

        let reply = self
            .backend
            .send_message(text, self.conversation_handle.clone())
            .await;

        if let Some(error) = &reply.failure {
            tracing::warn!(provider = self.backend.provider(), kind = %error.kind(), "Chat turn degraded");
        }

        if self.conversation_handle.is_none() {
            if let Some(handle) = reply.conversation_handle {
                tracing::debug!(conversation_handle = %handle, "Adopted conversation handle");
                self.conversation_handle = Some(handle);
            }
        }

        let message = ChatMessage::bot(reply.reply);
        self.messages.push(message.clone());
        self.state = SessionStateMachine::transition(self.state, SessionEvent::ReplyReceived)?;

        Ok(Some(message))
    }

    /// Return to idle after a turn future was dropped before it finished.
    ///
    /// Until this is called, further submits fail with [`StateError::InvalidTransition`].
    /// The user message of the dropped turn stays in the history without a reply.
    pub fn abandon_turn(&mut self) -> Result<(), StateError> {
        self.state = SessionStateMachine::transition(self.state, SessionEvent::Abandon)?;
        Ok(())
    }
}
