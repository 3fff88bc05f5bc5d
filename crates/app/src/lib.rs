//! Healthchat application composition root
//!
//! Wires the configured chat backend into a chat session, and parses the
//! console commands used by the `local` binary.

use healthchat_assistant::{ChatConfig, ChatServiceFactory};
use healthchat_conversations::ChatSession;

/// Create a chat session backed by the configured provider
pub fn create_session(config: ChatConfig) -> Result<ChatSession, anyhow::Error> {
    tracing::info!(provider = %config.provider, "Creating chat session");
    let backend = ChatServiceFactory::create(config)?;
    Ok(ChatSession::new(backend))
}

/// Create a chat session from environment configuration
pub fn create_session_from_env() -> Result<ChatSession, anyhow::Error> {
    let config = ChatConfig::from_env()?;
    create_session(config)
}

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the next suggested question
    Next,
    /// Show the previous suggested question
    Prev,
    /// Send the suggested question on display
    Pick,
    Help,
    Quit,
    /// Anything else is a message for the assistant
    Say(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Command::Empty,
            "/next" => Command::Next,
            "/prev" => Command::Prev,
            "/pick" => Command::Pick,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Say(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

pub const HELP: &str = "Type a health question and press Enter.\n\
  /next, /prev  browse suggested questions\n\
  /pick         send the suggested question on display\n\
  /quit         leave";
