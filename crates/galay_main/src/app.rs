use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use galay_domain::{ChatConfig, SessionId};
use galay_infra::{GalayHttpTransport, SessionStore, resolve_chat_config};
use galay_stream::{ChatClient, ChatTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::{Cli, TopLevelCommand};
use crate::local_mock::LocalMockTransport;
use crate::probe::probe;
use crate::surface::TerminalSurface;

/// Runs one invocation of the CLI.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(TopLevelCommand::Probe(args)) = &cli.subcommands {
        return probe(args, &mut std::io::stdout()).await;
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = apply_overrides(resolve_chat_config(&cwd), &cli);
    let session = resolve_session(&cli).await?;
    info!(session = %session, base_url = %config.base_url, mock = cli.mock, "Starting chat");

    if cli.mock {
        let client = ChatClient::new(Arc::new(LocalMockTransport::default()), config, session);
        chat(&client, &cli).await
    } else {
        let transport = GalayHttpTransport::new(&config)?;
        let client = ChatClient::new(Arc::new(transport), config, session);
        chat(&client, &cli).await
    }
}

/// CLI flags win over the environment.
fn apply_overrides(mut config: ChatConfig, cli: &Cli) -> ChatConfig {
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if cli.no_memory {
        config.use_memory = false;
    }
    config
}

async fn resolve_session(cli: &Cli) -> anyhow::Result<SessionId> {
    let store = SessionStore::default();
    if cli.reset_session {
        store.clear().await?;
        debug!(path = %store.path().display(), "Session reset");
    }
    match &cli.session {
        Some(id) => Ok(SessionId::new(id.as_str())),
        None => store.load_or_create().await,
    }
}

async fn chat<T: ChatTransport>(client: &ChatClient<T>, cli: &Cli) -> anyhow::Result<()> {
    if let Some(message) = cli.message() {
        return answer(client, message, cli.html).await;
    }
    if !cli.is_interactive() {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            return Ok(());
        };
        if matches!(line.trim(), ":quit" | ":exit") {
            return Ok(());
        }
        answer(client, &line, cli.html).await?;
    }
}

async fn answer<T: ChatTransport>(
    client: &ChatClient<T>,
    message: &str,
    html: bool,
) -> anyhow::Result<()> {
    let mut surface = TerminalSurface::new(std::io::stdout(), html);
    surface.start_progress();
    if let Some(outcome) = client.deliver(message, &mut surface).await {
        surface.finish(&outcome)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_flags_override_config() {
        let fixture = Cli::parse_from(["galay-chat", "--base-url", "https://chat.example.com/ai/", "--no-memory"]);
        let actual = apply_overrides(ChatConfig::default(), &fixture);
        assert_eq!(actual.base_url.as_str(), "https://chat.example.com/ai/");
        assert!(!actual.use_memory);
        assert_eq!(actual.idle_timeout_ms, ChatConfig::default().idle_timeout_ms);
    }

    #[test]
    fn test_without_flags_config_is_unchanged() {
        let fixture = Cli::parse_from(["galay-chat"]);
        let actual = apply_overrides(ChatConfig::default(), &fixture);
        assert_eq!(actual, ChatConfig::default());
    }

    #[tokio::test]
    async fn test_explicit_session_is_used_as_is() {
        let fixture = Cli::parse_from(["galay-chat", "--session", "session_42"]);
        let actual = resolve_session(&fixture).await.unwrap();
        assert_eq!(actual, SessionId::new("session_42"));
    }
}
