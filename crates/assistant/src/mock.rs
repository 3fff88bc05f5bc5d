//! Mock Chat Implementations
//!
//! Programmable mocks for testing chat workflows:
//! - `ScriptedAssistantApi`: assistant transport with scripted run statuses and call recording
//! - `MockChatBackend`: deterministic backend used by the `mock` provider
//! - `FailStep`: which transport step should fail

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::openai::{AssistantApi, AssistantCredentials, ThreadMessage};
use crate::run::RunStatus;
use crate::{ChatBackend, ChatError, ChatReply, ConversationHandle};

/// A recorded transport call for test assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateThread,
    AddMessage { thread_id: String, content: String },
    CreateRun { thread_id: String, assistant_id: String },
    RunStatus { thread_id: String, run_id: String },
    ListMessages { thread_id: String },
}

/// Transport step that the scripted API should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStep {
    CreateThread,
    AddMessage,
    CreateRun,
    RunStatus,
    ListMessages,
}

/// Assistant transport that replays a script instead of calling the network.
///
/// Statuses are handed out in order; once the script runs dry the last status
/// repeats, so a single `InProgress` keeps the run pending forever.
#[derive(Debug, Clone)]
pub struct ScriptedAssistantApi {
    thread_id: String,
    run_id: String,
    statuses: Arc<Mutex<VecDeque<RunStatus>>>,
    messages: Vec<ThreadMessage>,
    failure: Option<(FailStep, ChatError)>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
}

impl Default for ScriptedAssistantApi {
    fn default() -> Self {
        Self {
            thread_id: "thread_mock".to_string(),
            run_id: "run_mock".to_string(),
            statuses: Arc::new(Mutex::new(VecDeque::from([RunStatus::Completed]))),
            messages: vec![ThreadMessage::assistant_text("Mock answer")],
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ScriptedAssistantApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id returned by `create_thread`
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    /// Id returned by `create_run`
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Statuses returned by successive `run_status` calls
    pub fn with_statuses(self, statuses: Vec<RunStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Messages returned by `list_messages`, newest first
    pub fn with_messages(mut self, messages: Vec<ThreadMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Make one step return `error`
    pub fn failing_on(mut self, step: FailStep, error: ChatError) -> Self {
        self.failure = Some((step, error));
        self
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    /// Number of `run_status` calls made so far
    pub fn status_polls(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::RunStatus { .. }))
    }

    fn record(&self, call: ApiCall) -> Result<(), ChatError> {
        self.calls
            .lock()
            .map_err(|e| ChatError::Request(format!("calls lock poisoned: {e}")))?
            .push(call);
        Ok(())
    }

    fn check(&self, step: FailStep) -> Result<(), ChatError> {
        match &self.failure {
            Some((failing, error)) if *failing == step => Err(error.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl AssistantApi for ScriptedAssistantApi {
    async fn create_thread(&self, _credentials: &AssistantCredentials) -> Result<String, ChatError> {
        self.record(ApiCall::CreateThread)?;
        self.check(FailStep::CreateThread)?;
        Ok(self.thread_id.clone())
    }

    async fn add_message(
        &self,
        _credentials: &AssistantCredentials,
        thread_id: &str,
        content: &str,
    ) -> Result<(), ChatError> {
        self.record(ApiCall::AddMessage {
            thread_id: thread_id.to_string(),
            content: content.to_string(),
        })?;
        self.check(FailStep::AddMessage)
    }

    async fn create_run(
        &self,
        credentials: &AssistantCredentials,
        thread_id: &str,
    ) -> Result<String, ChatError> {
        self.record(ApiCall::CreateRun {
            thread_id: thread_id.to_string(),
            assistant_id: credentials.assistant_id.clone(),
        })?;
        self.check(FailStep::CreateRun)?;
        Ok(self.run_id.clone())
    }

    async fn run_status(
        &self,
        _credentials: &AssistantCredentials,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, ChatError> {
        self.record(ApiCall::RunStatus {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        })?;
        self.check(FailStep::RunStatus)?;

        let mut statuses = self
            .statuses
            .lock()
            .map_err(|e| ChatError::Request(format!("statuses lock poisoned: {e}")))?;
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(status.unwrap_or(RunStatus::Completed))
    }

    async fn list_messages(
        &self,
        _credentials: &AssistantCredentials,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, ChatError> {
        self.record(ApiCall::ListMessages {
            thread_id: thread_id.to_string(),
        })?;
        self.check(FailStep::ListMessages)?;
        Ok(self.messages.clone())
    }
}

/// Mock chat backend with deterministic replies
#[derive(Debug, Clone, Default)]
pub struct MockChatBackend {
    failure: Arc<Mutex<Option<ChatError>>>,
    utterances: Arc<Mutex<Vec<String>>>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following turn degrade with `error`, or succeed again with `None`
    pub fn set_failure(&self, error: Option<ChatError>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Utterances received so far
    pub fn recorded_utterances(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }

    /// Clear recorded utterances
    pub fn reset(&self) {
        self.utterances.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl ChatBackend for MockChatBackend {
    async fn send_message(
        &self,
        utterance: &str,
        conversation_handle: Option<ConversationHandle>,
    ) -> ChatReply {
        tracing::info!("Mock chat backend processing message");

        let turn = {
            let mut utterances = self.utterances.lock().unwrap_or_else(|e| e.into_inner());
            utterances.push(utterance.to_string());
            utterances.len()
        };
        let handle =
            conversation_handle.unwrap_or_else(|| ConversationHandle::new(format!("mock_thread_{turn}")));

        let failure = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match failure {
            Some(error) => ChatReply::degraded(error, Some(handle)),
            None => ChatReply::answered(format!("Mock response to: {}", utterance), Some(handle)),
        }
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}
