//! Chat sessions wired through the application composition root

use healthchat_app::create_session;
use healthchat_assistant::{ChatConfig, ConversationHandle, FALLBACK_REPLY};
use healthchat_conversations::MessageAuthor;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{message, AssistantServer};

#[test_log::test(tokio::test)]
async fn test_session_keeps_thread_across_turns() -> anyhow::Result<()> {
    let api = AssistantServer::start().await;
    api.expect_create_thread("thread_abc", 1).await;
    api.accept_messages("thread_abc").await;
    api.accept_runs("thread_abc", "run_1").await;
    api.script_run_statuses("thread_abc", "run_1", &["queued"], "completed")
        .await;
    api.script_messages(
        "thread_abc",
        json!([message("assistant", "Stay hydrated【1:0†source】 and rest.")]),
    )
    .await;

    let mut session = create_session(api.config(60))?;

    let first = session
        .submit("I have a cold")
        .await?
        .expect("bot reply appended");
    assert_eq!(first.text, "Stay hydrated and rest.");
    assert_eq!(
        session.conversation_handle(),
        Some(&ConversationHandle::new("thread_abc"))
    );

    session.submit("Anything else?").await?;

    // Two turns, one thread
    let requests = api.requests().await;
    let posted_messages = requests
        .iter()
        .filter(|r| r.url.path() == "/threads/thread_abc/messages" && r.method.as_str() == "POST")
        .count();
    assert_eq!(posted_messages, 2);

    let authors: Vec<_> = session.messages().iter().map(|m| m.author).collect();
    assert_eq!(
        authors,
        vec![
            MessageAuthor::Bot,
            MessageAuthor::User,
            MessageAuthor::Bot,
            MessageAuthor::User,
            MessageAuthor::Bot
        ]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_session_shows_fallback_when_service_errors() {
    let api = AssistantServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&api.server)
        .await;

    let mut session = tokio_test::assert_ok!(create_session(api.config(60)));
    let reply = tokio_test::assert_ok!(session.submit("Hello").await).expect("bot reply appended");

    assert_eq!(reply.text, FALLBACK_REPLY);
    assert!(session.conversation_handle().is_none());
    assert!(!session.is_loading());
}

#[test_log::test(tokio::test)]
async fn test_webhook_session_uses_output_verbatim() {
    let api = AssistantServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/chatbot"))
        .and(body_partial_json(json!({
            "action": "sendMessage",
            "chatInput": "Is fasting safe?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": "Talk to your doctor first."
        })))
        .expect(1)
        .mount(&api.server)
        .await;

    let config = ChatConfig {
        provider: "webhook".to_string(),
        webhook_url: Some(format!("{}/webhook/chatbot", api.server.uri())),
        ..ChatConfig::default()
    };
    let mut session = tokio_test::assert_ok!(create_session(config));

    let reply = session.submit("Is fasting safe?").await.unwrap().unwrap();
    assert_eq!(reply.text, "Talk to your doctor first.");
    assert!(session.conversation_handle().is_none());
}

mod common;
