//! OpenAI Assistants API Implementation
//!
//! Drives one conversation turn through the thread/message/run lifecycle of
//! the Assistants API (https://api.openai.com/v1/threads) using reqwest:
//! create thread (first turn only) → add message → create run → poll run
//! status → list messages → clean the newest assistant reply.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::run::{wait_for_run, PollPolicy, RunStatus};
use crate::text::clean_reply;
use crate::{ChatBackend, ChatConfig, ChatError, ChatReply, ConversationHandle, FALLBACK_REPLY};

const ASSISTANTS_BETA: &str = "assistants=v2";

/// API key plus the assistant to run, both required for every turn
#[derive(Clone)]
pub struct AssistantCredentials {
    pub api_key: String,
    pub assistant_id: String,
}

impl AssistantCredentials {
    pub fn new(api_key: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
        }
    }
}

impl std::fmt::Debug for AssistantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantCredentials")
            .field("api_key", &"[REDACTED]")
            .field("assistant_id", &self.assistant_id)
            .finish()
    }
}

/// Message author as reported by the thread message list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadRole {
    User,
    Assistant,
}

/// One message from `GET /threads/{id}/messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: ThreadRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Assistant message with a single text block
    pub fn assistant_text(value: impl Into<String>) -> Self {
        Self {
            role: ThreadRole::Assistant,
            content: vec![MessageContent::text(value)],
        }
    }

    /// User message with a single text block
    pub fn user_text(value: impl Into<String>) -> Self {
        Self {
            role: ThreadRole::User,
            content: vec![MessageContent::text(value)],
        }
    }

    /// Value of the first content block, if that block carries non-empty text
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|block| block.text.as_ref())
            .map(|text| text.value.as_str())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: Some(TextContent {
                value: value.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// Thread/run operations of the assistant service
#[async_trait::async_trait]
pub trait AssistantApi: Send + Sync {
    /// `POST /threads`, returns the new thread id
    async fn create_thread(&self, credentials: &AssistantCredentials) -> Result<String, ChatError>;

    /// `POST /threads/{thread_id}/messages` with role `user`
    async fn add_message(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
        content: &str,
    ) -> Result<(), ChatError>;

    /// `POST /threads/{thread_id}/runs`, returns the run id
    async fn create_run(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
    ) -> Result<String, ChatError>;

    /// `GET /threads/{thread_id}/runs/{run_id}`
    async fn run_status(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, ChatError>;

    /// `GET /threads/{thread_id}/messages`, newest first
    async fn list_messages(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, ChatError>;
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    data: Vec<ThreadMessage>,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    message: String,
}

/// reqwest transport for the Assistants API
#[derive(Debug, Clone)]
pub struct OpenAiAssistantsApi {
    client: Client,
    base_url: String,
}

impl OpenAiAssistantsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder, credentials: &AssistantCredentials) -> RequestBuilder {
        builder
            .bearer_auth(&credentials.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .header("content-type", "application/json")
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        credentials: &AssistantCredentials,
        operation: &'static str,
    ) -> Result<T, ChatError> {
        tracing::debug!(operation, "Sending Assistants API request");

        let response = self
            .authorized(builder, credentials)
            .send()
            .await
            .map_err(|e| ChatError::Request(format!("{operation}: HTTP request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(ChatError::Response(format!(
                    "{operation}: OpenAI API error ({}, {}): {}",
                    status,
                    error_response.error.error_type.as_deref().unwrap_or("unknown"),
                    error_response.error.message
                )));
            }

            return Err(ChatError::Response(format!(
                "{operation}: OpenAI API returned {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChatError::Response(format!("{operation}: failed to parse response: {e}")))
    }
}

#[async_trait::async_trait]
impl AssistantApi for OpenAiAssistantsApi {
    async fn create_thread(&self, credentials: &AssistantCredentials) -> Result<String, ChatError> {
        let builder = self.client.post(self.url("/threads"));
        let thread: IdResponse = self.execute(builder, credentials, "create thread").await?;
        Ok(thread.id)
    }

    async fn add_message(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
        content: &str,
    ) -> Result<(), ChatError> {
        let builder = self
            .client
            .post(self.url(&format!("/threads/{thread_id}/messages")))
            .json(&CreateMessageRequest {
                role: "user",
                content,
            });
        let _: serde_json::Value = self.execute(builder, credentials, "add message").await?;
        Ok(())
    }

    async fn create_run(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
    ) -> Result<String, ChatError> {
        let builder = self
            .client
            .post(self.url(&format!("/threads/{thread_id}/runs")))
            .json(&CreateRunRequest {
                assistant_id: &credentials.assistant_id,
            });
        let run: IdResponse = self.execute(builder, credentials, "create run").await?;
        Ok(run.id)
    }

    async fn run_status(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, ChatError> {
        let builder = self
            .client
            .get(self.url(&format!("/threads/{thread_id}/runs/{run_id}")));
        let run: RunResponse = self.execute(builder, credentials, "get run").await?;
        Ok(run.status)
    }

    async fn list_messages(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, ChatError> {
        let builder = self
            .client
            .get(self.url(&format!("/threads/{thread_id}/messages")));
        let list: MessageListResponse = self.execute(builder, credentials, "list messages").await?;
        Ok(list.data)
    }
}

/// A turn that produced an assistant answer
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub reply: String,
    pub conversation_handle: ConversationHandle,
    pub run_id: String,
    pub polls: u32,
}

/// A turn that failed, with the thread handle if one was established first
#[derive(Debug, Clone, PartialEq)]
pub struct TurnFailure {
    pub error: ChatError,
    pub conversation_handle: Option<ConversationHandle>,
}

impl TurnFailure {
    fn before_thread(error: ChatError) -> Self {
        Self {
            error,
            conversation_handle: None,
        }
    }
}

/// Assistants-backed chat backend
///
/// Holds no per-conversation state: the thread handle comes in with every
/// call and goes back out with the reply. Turns on the same handle must not
/// overlap; the caller serializes them.
pub struct AssistantConversationClient<A = OpenAiAssistantsApi> {
    api: A,
    api_key: Option<String>,
    assistant_id: Option<String>,
    poll: PollPolicy,
}

impl AssistantConversationClient<OpenAiAssistantsApi> {
    /// Create a client talking to the configured OpenAI base URL
    pub fn from_config(config: ChatConfig) -> Self {
        Self::new(
            OpenAiAssistantsApi::new(config.base_url),
            config.api_key,
            config.assistant_id,
            config.poll,
        )
    }
}

impl<A: AssistantApi> AssistantConversationClient<A> {
    pub fn new(
        api: A,
        api_key: Option<String>,
        assistant_id: Option<String>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            api,
            api_key,
            assistant_id,
            poll,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn credentials(&self) -> Result<AssistantCredentials, ChatError> {
        match (&self.api_key, &self.assistant_id) {
            (Some(api_key), Some(assistant_id)) => {
                Ok(AssistantCredentials::new(api_key.clone(), assistant_id.clone()))
            }
            _ => Err(ChatError::Configuration(
                "OpenAI API key or assistant id is not configured".to_string(),
            )),
        }
    }

    /// Run one turn, keeping the failure cause.
    pub async fn try_send(
        &self,
        utterance: &str,
        conversation_handle: Option<ConversationHandle>,
    ) -> Result<Turn, TurnFailure> {
        let credentials = self.credentials().map_err(TurnFailure::before_thread)?;

        let handle = match conversation_handle {
            Some(handle) => handle,
            None => {
                let thread_id = self
                    .api
                    .create_thread(&credentials)
                    .await
                    .map_err(TurnFailure::before_thread)?;
                tracing::debug!(thread_id = %thread_id, "Created assistant thread");
                ConversationHandle::new(thread_id)
            }
        };

        let fail = |error: ChatError| TurnFailure {
            error,
            conversation_handle: Some(handle.clone()),
        };
        let thread_id = handle.as_str();

        self.api
            .add_message(&credentials, thread_id, utterance)
            .await
            .map_err(fail)?;

        let run_id = self
            .api
            .create_run(&credentials, thread_id)
            .await
            .map_err(fail)?;

        let polls = wait_for_run(&self.api, &credentials, thread_id, &run_id, self.poll)
            .await
            .map_err(fail)?;

        let messages = self
            .api
            .list_messages(&credentials, thread_id)
            .await
            .map_err(fail)?;

        let answer = messages
            .iter()
            .find(|message| message.role == ThreadRole::Assistant)
            .ok_or_else(|| {
                fail(ChatError::MissingResponse {
                    thread_id: thread_id.to_string(),
                })
            })?;

        let reply = clean_reply(answer.first_text().unwrap_or(FALLBACK_REPLY));

        Ok(Turn {
            reply,
            conversation_handle: handle.clone(),
            run_id,
            polls,
        })
    }
}

#[async_trait::async_trait]
impl<A: AssistantApi> ChatBackend for AssistantConversationClient<A> {
    async fn send_message(
        &self,
        utterance: &str,
        conversation_handle: Option<ConversationHandle>,
    ) -> ChatReply {
        match self.try_send(utterance, conversation_handle).await {
            Ok(turn) => {
                tracing::info!(
                    thread_id = %turn.conversation_handle,
                    run_id = %turn.run_id,
                    polls = turn.polls,
                    "Assistant turn completed"
                );
                ChatReply::answered(turn.reply, Some(turn.conversation_handle))
            }
            Err(failure) => {
                tracing::warn!(
                    kind = %failure.error.kind(),
                    error = %failure.error,
                    "Assistant turn failed, replying with fallback"
                );
                ChatReply::degraded(failure.error, failure.conversation_handle)
            }
        }
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}
