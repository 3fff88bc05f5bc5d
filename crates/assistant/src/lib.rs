//! Healthchat Assistant Service
//!
//! Forwards user utterances to a chat backend and returns display-ready replies:
//! - OpenAI Assistants thread/run integration with bounded status polling
//! - Workflow webhook integration for single-shot deployments
//! - Mock backends for testing and development
//!
//! Every backend degrades to [`FALLBACK_REPLY`] instead of returning an error
//! to the caller. The failure that caused it is kept on [`ChatReply::failure`].

pub mod mock;
pub mod openai;
pub mod run;
pub mod text;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::{
    AssistantApi, AssistantConversationClient, AssistantCredentials, OpenAiAssistantsApi,
    ThreadMessage, ThreadRole, Turn, TurnFailure,
};
pub use run::{PollPolicy, RunStatus};
pub use webhook::WebhookChatBackend;

/// User-facing apology shown whenever a turn cannot produce a real answer.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong while generating a response.";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Chat configuration error: {0}")]
    Configuration(String),

    #[error("Chat request error: {0}")]
    Request(String),

    #[error("Chat response error: {0}")]
    Response(String),

    #[error("Chat rate limit exceeded")]
    RateLimit,

    #[error("Assistant run {run_id} failed")]
    RunFailed { run_id: String },

    #[error("Assistant run {run_id} timed out after {attempts} polls")]
    Timeout { run_id: String, attempts: u32 },

    #[error("Assistant run ended with unexpected status: {0}")]
    UnexpectedRunStatus(String),

    #[error("No assistant response found in thread {thread_id}")]
    MissingResponse { thread_id: String },
}

/// Coarse failure categories, used for logging and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    RunFailure,
    Timeout,
    MissingResponse,
    UnknownStatus,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Transport => write!(f, "transport"),
            Self::RunFailure => write!(f, "run_failure"),
            Self::Timeout => write!(f, "timeout"),
            Self::MissingResponse => write!(f, "missing_response"),
            Self::UnknownStatus => write!(f, "unknown_status"),
        }
    }
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Configuration(_) => ErrorKind::Configuration,
            ChatError::Request(_) | ChatError::Response(_) | ChatError::RateLimit => {
                ErrorKind::Transport
            }
            ChatError::RunFailed { .. } => ErrorKind::RunFailure,
            ChatError::Timeout { .. } => ErrorKind::Timeout,
            ChatError::UnexpectedRunStatus(_) => ErrorKind::UnknownStatus,
            ChatError::MissingResponse { .. } => ErrorKind::MissingResponse,
        }
    }
}

/// Opaque identifier of one conversation thread on the assistant service.
///
/// Owned by the caller and passed back in on every turn; backends never keep it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHandle(String);

impl ConversationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Result of one turn, always displayable.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Text to show the user: the cleaned answer, or [`FALLBACK_REPLY`]
    pub reply: String,
    /// Thread handle to pass into the next turn, when one was established
    pub conversation_handle: Option<ConversationHandle>,
    /// Why the reply was degraded, if it was
    pub failure: Option<ChatError>,
}

impl ChatReply {
    pub fn answered(reply: String, conversation_handle: Option<ConversationHandle>) -> Self {
        Self {
            reply,
            conversation_handle,
            failure: None,
        }
    }

    pub fn degraded(error: ChatError, conversation_handle: Option<ConversationHandle>) -> Self {
        Self {
            reply: FALLBACK_REPLY.to_string(),
            conversation_handle,
            failure: Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Chat backend trait for the interchangeable backend implementations
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one utterance and wait for the reply.
    ///
    /// Never fails: transport, run and configuration problems come back as a
    /// degraded [`ChatReply`].
    async fn send_message(
        &self,
        utterance: &str,
        conversation_handle: Option<ConversationHandle>,
    ) -> ChatReply;

    /// Provider name, as accepted by [`ChatServiceFactory`]
    fn provider(&self) -> &'static str;
}

/// Chat backend configuration
#[derive(Clone)]
pub struct ChatConfig {
    /// Backend provider (openai, webhook, mock)
    pub provider: String,
    /// OpenAI API key
    pub api_key: Option<String>,
    /// Assistant to run against each thread
    pub assistant_id: Option<String>,
    /// Base URL for the OpenAI API
    pub base_url: String,
    /// Workflow webhook endpoint
    pub webhook_url: Option<String>,
    /// Run status polling cadence and bound
    pub poll: PollPolicy,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("assistant_id", &self.assistant_id)
            .field("base_url", &self.base_url)
            .field("webhook_url", &self.webhook_url)
            .field("poll", &self.poll)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            assistant_id: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            webhook_url: None,
            poll: PollPolicy::default(),
        }
    }
}

impl ChatConfig {
    /// Create chat config from environment variables
    pub fn from_env() -> Result<Self, ChatError> {
        dotenvy::dotenv().ok();

        let provider = non_empty_var("CHAT_PROVIDER")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "openai".to_string());
        let api_key = non_empty_var("OPENAI_API_KEY");
        let assistant_id = non_empty_var("OPENAI_ASSISTANT_ID");
        let base_url = non_empty_var("OPENAI_BASE_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        let webhook_url = non_empty_var("CHAT_WEBHOOK_URL");

        let defaults = PollPolicy::default();
        let interval = match non_empty_var("ASSISTANT_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_number("ASSISTANT_POLL_INTERVAL_MS", &raw)?),
            None => defaults.interval,
        };
        let max_attempts = match non_empty_var("ASSISTANT_MAX_POLL_ATTEMPTS") {
            Some(raw) => parse_number("ASSISTANT_MAX_POLL_ATTEMPTS", &raw)?,
            None => defaults.max_attempts,
        };

        Ok(Self {
            provider,
            api_key,
            assistant_id,
            base_url,
            webhook_url,
            poll: PollPolicy::new(interval, max_attempts),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ChatError> {
    raw.trim()
        .parse()
        .map_err(|_| ChatError::Configuration(format!("{name} must be a number, got {raw:?}")))
}

/// Factory for creating ChatBackend implementations
pub struct ChatServiceFactory;

impl ChatServiceFactory {
    /// Create a ChatBackend based on configuration
    pub fn create(config: ChatConfig) -> Result<Arc<dyn ChatBackend>, ChatError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!("Creating OpenAI Assistants chat backend");
                if config.api_key.is_none() || config.assistant_id.is_none() {
                    return Err(ChatError::Configuration(
                        "OPENAI_API_KEY and OPENAI_ASSISTANT_ID are required for openai provider"
                            .to_string(),
                    ));
                }
                Ok(Arc::new(AssistantConversationClient::from_config(config)))
            }
            "webhook" => {
                tracing::info!("Creating webhook chat backend");
                if config.webhook_url.is_none() {
                    return Err(ChatError::Configuration(
                        "CHAT_WEBHOOK_URL is required for webhook provider".to_string(),
                    ));
                }
                Ok(Arc::new(WebhookChatBackend::new(config.webhook_url)))
            }
            "mock" => {
                tracing::info!("Creating mock chat backend");
                Ok(Arc::new(mock::MockChatBackend::new()))
            }
            provider => Err(ChatError::Configuration(format!(
                "Unknown chat provider: {}. Supported providers: openai, webhook, mock",
                provider
            ))),
        }
    }
}
