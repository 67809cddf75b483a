//! # chatroom
//!
//! Chat server binary: loads settings, installs logging and serves
//! `GET /ws?username=<name>` until ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use chatroom_logging::LogConfig;
use chatroom_server::{ChatServer, ServerConfig};
use chatroom_settings::{ChatSettings, LogFormat, LogLevel};
use clap::Parser;

/// Single-room WebSocket chat server.
#[derive(Parser, Debug)]
#[command(name = "chatroom", about = "Single-room WebSocket chat server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (defaults to `~/.chatroom/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fan-out queue capacity (overrides settings).
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Log level: trace, debug, info, warn or error (overrides settings).
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    LogLevel::parse(raw).ok_or_else(|| format!("unknown log level: {raw}"))
}

impl Cli {
    /// Apply flags on top of loaded settings.
    fn apply(&self, settings: &mut ChatSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(capacity) = self.queue_capacity {
            settings.server.queue_capacity = capacity;
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
        if self.json_logs {
            settings.logging.format = LogFormat::Json;
        }
    }
}

/// Load the settings file, layer the flags on top and validate the result.
fn load_settings(cli: &Cli) -> Result<ChatSettings> {
    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(chatroom_settings::loader::settings_path);
    let mut settings = chatroom_settings::loader::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    cli.apply(&mut settings);
    chatroom_settings::loader::validate(&settings).context("Invalid settings")?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Settings first: the log level comes from them. Warnings about ignored
    // env values go to the bootstrap subscriber.
    let settings = chatroom_logging::with_bootstrap_subscriber(|| load_settings(&cli))?;

    chatroom_logging::init_subscriber(&LogConfig::from(&settings.logging));

    let server = ChatServer::new(ServerConfig::from(&settings.server));
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("chatroom listening on ws://{addr}/ws");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    if !server.shutdown().await {
        tracing::warn!("some connections did not finish before the shutdown timeout");
    }
    let _ = handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "chatroom",
            "--host",
            "127.0.0.1",
            "--port",
            "9001",
            "--queue-capacity",
            "16",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        let mut settings = ChatSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.server.queue_capacity, 16);
        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn no_flags_keep_settings() {
        let cli = Cli::parse_from(["chatroom"]);
        let mut settings = ChatSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
        assert!(cli.config.is_none());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["chatroom", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn load_settings_layers_flags_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server":{"port":7000,"queueCapacity":8}}"#).unwrap();
        let cli = Cli::parse_from([
            "chatroom",
            "--config",
            path.to_str().unwrap(),
            "--queue-capacity",
            "32",
        ]);

        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.server.queue_capacity, 32);
        assert!(settings.server.port == 7000 || std::env::var_os("CHATROOM_PORT").is_some());
    }

    #[test]
    fn load_settings_rejects_invalid_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{}").unwrap();
        let cli = Cli::parse_from([
            "chatroom",
            "--config",
            path.to_str().unwrap(),
            "--queue-capacity",
            "0",
        ]);
        assert!(load_settings(&cli).is_err());
    }

    #[test]
    fn config_path_flag() {
        let cli = Cli::parse_from(["chatroom", "--config", "/tmp/chat.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/chat.json")));
    }
}
