//! End-to-end assistant turns against a scripted Assistants API

use healthchat_assistant::{
    AssistantConversationClient, ChatBackend, ChatConfig, ConversationHandle, ErrorKind,
    FALLBACK_REPLY,
};
use serde_json::json;

use crate::common::{message, AssistantServer};

#[test_log::test(tokio::test)]
async fn test_liver_surgery_question_first_turn() {
    let api = AssistantServer::start().await;
    api.expect_create_thread("thread_abc", 1).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_1").await;
    api.script_run_statuses("thread_abc", "run_1", &["queued", "queued"], "completed")
        .await;
    api.script_messages(
        "thread_abc",
        json!([
            message("assistant", "Avoid alcohol.【3:1†source】 Avoid fried food."),
            message("user", "What foods should I avoid after liver surgery?")
        ]),
    )
    .await;

    let client = AssistantConversationClient::from_config(api.config(60));
    let reply = client
        .send_message("What foods should I avoid after liver surgery?", None)
        .await;

    assert_eq!(reply.reply, "Avoid alcohol. Avoid fried food.");
    assert_eq!(
        reply.conversation_handle,
        Some(ConversationHandle::new("thread_abc"))
    );
    assert!(reply.failure.is_none());
    assert_eq!(api.status_polls().await, 3);

    let requests = api.requests().await;
    let add_message = requests
        .iter()
        .find(|r| r.url.path() == "/threads/thread_abc/messages" && r.method.as_str() == "POST")
        .expect("message posted");
    let body: serde_json::Value = serde_json::from_slice(&add_message.body).unwrap();
    assert_eq!(
        body,
        json!({"role": "user", "content": "What foods should I avoid after liver surgery?"})
    );

    let create_run = requests
        .iter()
        .find(|r| r.url.path() == "/threads/thread_abc/runs")
        .expect("run created");
    let body: serde_json::Value = serde_json::from_slice(&create_run.body).unwrap();
    assert_eq!(body, json!({"assistant_id": "asst_health"}));
}

#[test_log::test(tokio::test)]
async fn test_follow_up_turn_reuses_thread() {
    let api = AssistantServer::start().await;
    // Supplied handle: create thread must never be called
    api.expect_create_thread("thread_unused", 0).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_2").await;
    api.script_run_statuses("thread_abc", "run_2", &["in_progress"], "completed")
        .await;
    api.script_messages(
        "thread_abc",
        json!([
            message("assistant", "Yes, in moderation."),
            message("user", "Is coffee fine?"),
            message("assistant", "Avoid alcohol."),
        ]),
    )
    .await;

    let client = AssistantConversationClient::from_config(api.config(60));
    let reply = client
        .send_message("Is coffee fine?", Some(ConversationHandle::new("thread_abc")))
        .await;

    assert_eq!(reply.reply, "Yes, in moderation.");
    assert_eq!(
        reply.conversation_handle,
        Some(ConversationHandle::new("thread_abc"))
    );
}

#[test_log::test(tokio::test)]
async fn test_failed_run_returns_fallback() {
    let api = AssistantServer::start().await;
    api.expect_create_thread("thread_abc", 1).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_1").await;
    api.script_run_statuses("thread_abc", "run_1", &["queued"], "failed")
        .await;
    api.script_messages("thread_abc", json!([message("assistant", "partial")]))
        .await;

    let client = AssistantConversationClient::from_config(api.config(60));
    let reply = client.send_message("Hello", None).await;

    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert_eq!(reply.failure.map(|e| e.kind()), Some(ErrorKind::RunFailure));
    assert_eq!(api.status_polls().await, 2);
}

#[test_log::test(tokio::test)]
async fn test_pending_run_times_out_at_poll_bound() {
    let api = AssistantServer::start().await;
    api.expect_create_thread("thread_abc", 1).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_1").await;
    api.script_run_statuses("thread_abc", "run_1", &[], "in_progress")
        .await;

    let client = AssistantConversationClient::from_config(api.config(60));
    let reply = client.send_message("Hello", None).await;

    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert_eq!(reply.failure.map(|e| e.kind()), Some(ErrorKind::Timeout));
    assert_eq!(api.status_polls().await, 60);

    let listed = api
        .requests()
        .await
        .iter()
        .filter(|r| r.url.path() == "/threads/thread_abc/messages" && r.method.as_str() == "GET")
        .count();
    assert_eq!(listed, 0);
}

#[test_log::test(tokio::test)]
async fn test_no_assistant_message_returns_fallback() {
    let api = AssistantServer::start().await;
    api.expect_create_thread("thread_abc", 1).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_1").await;
    api.script_run_statuses("thread_abc", "run_1", &[], "completed")
        .await;
    api.script_messages("thread_abc", json!([message("user", "Hello")]))
        .await;

    let client = AssistantConversationClient::from_config(api.config(60));
    let reply = client.send_message("Hello", None).await;

    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert_eq!(
        reply.failure.map(|e| e.kind()),
        Some(ErrorKind::MissingResponse)
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_credentials_make_no_requests() {
    let api = AssistantServer::start().await;

    let config = ChatConfig {
        api_key: None,
        ..api.config(60)
    };
    let client = AssistantConversationClient::from_config(config);
    let reply = client.send_message("Hello", None).await;

    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert!(reply.conversation_handle.is_none());
    assert!(api.requests().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_unrecognized_status_is_not_success() {
    let api = AssistantServer::start().await;
    api.expect_create_thread("thread_abc", 1).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_1").await;
    api.script_run_statuses("thread_abc", "run_1", &["queued"], "requires_action")
        .await;
    api.script_messages("thread_abc", json!([message("assistant", "should not show")]))
        .await;

    let client = AssistantConversationClient::from_config(api.config(60));
    let reply = client.send_message("Hello", None).await;

    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert_eq!(
        reply.failure.map(|e| e.kind()),
        Some(ErrorKind::UnknownStatus)
    );
}

mod common;
