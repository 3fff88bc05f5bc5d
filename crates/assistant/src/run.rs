//! Assistant run status and completion polling
//!
//! Run status only ever moves forward: `queued` → `in_progress` → a terminal state.
//! The service exposes it by polling alone, so waiting is a bounded loop with a
//! fixed interval.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::openai::{AssistantApi, AssistantCredentials};
use crate::ChatError;

/// Default pause between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of polls before giving up
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Execution state of one assistant run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// Any status this client does not act on (`requires_action`, `expired`, ...)
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }

    /// Still waiting on the assistant
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often and how long to poll a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            // A zero bound would never fetch a status at all
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_POLL_ATTEMPTS)
    }
}

/// Poll a run until it leaves the pending states.
///
/// Sleeps before every fetch. Returns the number of polls made on completion.
pub async fn wait_for_run<A>(
    api: &A,
    credentials: &AssistantCredentials,
    thread_id: &str,
    run_id: &str,
    policy: PollPolicy,
) -> Result<u32, ChatError>
where
    A: AssistantApi + ?Sized,
{
    let mut attempts = 0;

    loop {
        tokio::time::sleep(policy.interval).await;
        let status = api.run_status(credentials, thread_id, run_id).await?;
        attempts += 1;

        tracing::debug!(run_id = %run_id, status = %status, attempt = attempts, "Polled assistant run");

        match status {
            RunStatus::Completed => return Ok(attempts),
            RunStatus::Failed => {
                return Err(ChatError::RunFailed {
                    run_id: run_id.to_string(),
                })
            }
            RunStatus::Other(raw) => return Err(ChatError::UnexpectedRunStatus(raw)),
            RunStatus::Queued | RunStatus::InProgress if attempts >= policy.max_attempts => {
                return Err(ChatError::Timeout {
                    run_id: run_id.to_string(),
                    attempts,
                })
            }
            RunStatus::Queued | RunStatus::InProgress => {}
        }
    }
}
