// Healthchat - Local Console Chat

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use healthchat_app::{create_session_from_env, Command, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .pretty()
        .init();

    info!("Starting Healthchat local console");

    let mut session = create_session_from_env().map_err(|e| {
        error!("Failed to create chat session: {}", e);
        e
    })?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for message in session.messages() {
        stdout.write_all(format!("bot> {}\n", message.text).as_bytes()).await?;
    }
    if let Some(question) = session.suggestions().current() {
        stdout.write_all(format!("suggestion> {}\n", question).as_bytes()).await?;
    }
    stdout.write_all(b"(type /help for commands)\n").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let output = match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => format!("{}\n", HELP),
            Command::Next => suggestion_line(session.suggestions_mut().next_slide()),
            Command::Prev => suggestion_line(session.suggestions_mut().prev_slide()),
            Command::Pick => {
                if session.choose_suggestion().is_some() {
                    let reply = session.submit_draft().await?;
                    reply_line(reply.map(|m| m.text))
                } else {
                    "no suggestions available\n".to_string()
                }
            }
            Command::Say(text) => {
                let reply = session.submit(&text).await?;
                reply_line(reply.map(|m| m.text))
            }
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("Console session ended");
    Ok(())
}

fn suggestion_line(question: Option<&str>) -> String {
    match question {
        Some(question) => format!("suggestion> {}\n", question),
        None => "no suggestions available\n".to_string(),
    }
}

fn reply_line(reply: Option<String>) -> String {
    match reply {
        Some(text) => format!("bot> {}\n", text),
        None => String::new(),
    }
}
