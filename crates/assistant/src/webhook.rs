//! Workflow Webhook Implementation
//!
//! Single-shot backend: POSTs the utterance to a workflow webhook and reads
//! `{ "output": ... }` back. No threads and no polling; every call stands alone.

use serde::{Deserialize, Serialize};

use crate::{ChatBackend, ChatError, ChatReply, ConversationHandle};

/// Webhook request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    action: &'static str,
    chat_input: &'a str,
    session_id: String,
}

/// Webhook response body
#[derive(Debug, Deserialize)]
struct WebhookResponse {
    output: String,
}

/// Chat backend that forwards each utterance to a workflow webhook
pub struct WebhookChatBackend {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl WebhookChatBackend {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    async fn post(&self, utterance: &str) -> Result<String, ChatError> {
        let url = self.webhook_url.as_deref().ok_or_else(|| {
            ChatError::Configuration("CHAT_WEBHOOK_URL is not configured".to_string())
        })?;

        let body = WebhookRequest {
            action: "sendMessage",
            chat_input: utterance,
            session_id: uuid::Uuid::new_v4().to_string(),
        };

        tracing::debug!(session_id = %body.session_id, "Sending webhook chat request");

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(ChatError::Response(format!(
                "Webhook returned {}: {}",
                status, body
            )));
        }

        let reply: WebhookResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Response(format!("Failed to parse webhook response: {}", e)))?;

        Ok(reply.output)
    }
}

#[async_trait::async_trait]
impl ChatBackend for WebhookChatBackend {
    async fn send_message(
        &self,
        utterance: &str,
        _conversation_handle: Option<ConversationHandle>,
    ) -> ChatReply {
        match self.post(utterance).await {
            Ok(output) => {
                tracing::info!("Webhook turn completed");
                ChatReply::answered(output, None)
            }
            Err(error) => {
                tracing::warn!(kind = %error.kind(), error = %error, "Webhook turn failed, replying with fallback");
                ChatReply::degraded(error, None)
            }
        }
    }

    fn provider(&self) -> &'static str {
        "webhook"
    }
}
