//! Common test utilities for integration tests
//!
//! Provides a wiremock stand-in for the Assistants API:
//! - thread, message and run endpoints with fixed ids
//! - a scripted run status sequence (pending statuses, then a final one)
//! - a configurable messages list
#![allow(dead_code)]

use std::time::Duration;

use healthchat_assistant::{ChatConfig, PollPolicy};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const API_KEY: &str = "sk-integration";
pub const ASSISTANT_ID: &str = "asst_health";

/// Scripted Assistants API
pub struct AssistantServer {
    pub server: MockServer,
}

impl AssistantServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Client config pointing at this server with a fast poll interval
    pub fn config(&self, max_attempts: u32) -> ChatConfig {
        ChatConfig {
            provider: "openai".to_string(),
            api_key: Some(API_KEY.to_string()),
            assistant_id: Some(ASSISTANT_ID.to_string()),
            base_url: self.server.uri(),
            webhook_url: None,
            poll: PollPolicy::new(Duration::from_millis(1), max_attempts),
        }
    }

    /// `POST /threads` returns `thread_id`, expected `times` times
    pub async fn expect_create_thread(&self, thread_id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
            .and(header("openai-beta", "assistants=v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": thread_id,
                "object": "thread"
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// `POST /threads/{id}/messages` accepts any user message
    pub async fn accept_messages(&self, thread_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/threads/{thread_id}/messages")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_user",
                "object": "thread.message"
            })))
            .mount(&self.server)
            .await;
    }

    /// `POST /threads/{id}/runs` returns `run_id`
    pub async fn accept_runs(&self, thread_id: &str, run_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/threads/{thread_id}/runs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": run_id,
                "status": "queued"
            })))
            .mount(&self.server)
            .await;
    }

    /// Run status answers `pending` for the first polls, then `last` forever
    pub async fn script_run_statuses(
        &self,
        thread_id: &str,
        run_id: &str,
        pending: &[&str],
        last: &str,
    ) {
        let run_path = format!("/threads/{thread_id}/runs/{run_id}");
        for status in pending {
            Mock::given(method("GET"))
                .and(path(run_path.as_str()))
                .respond_with(run_body(run_id, status))
                .up_to_n_times(1)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(run_path.as_str()))
            .respond_with(run_body(run_id, last))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    /// `GET /threads/{id}/messages` returns `data`, newest first
    pub async fn script_messages(&self, thread_id: &str, data: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/threads/{thread_id}/messages")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": data
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Number of run status polls received
    pub async fn status_polls(&self) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|r| r.method.as_str() == "GET" && r.url.path().contains("/runs/"))
            .count()
    }
}

fn run_body(run_id: &str, status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": run_id,
        "object": "thread.run",
        "status": status
    }))
}

/// Message list entry in the Assistants API shape
pub fn message(role: &str, text: &str) -> Value {
    json!({
        "id": format!("msg_{role}"),
        "object": "thread.message",
        "role": role,
        "content": [{"type": "text", "text": {"value": text, "annotations": []}}]
    })
}
