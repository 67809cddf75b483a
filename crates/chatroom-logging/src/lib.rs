//! # chatroom-logging
//!
//! Structured logging with `tracing`. One call at startup installs the
//! global subscriber: an `EnvFilter` (where `RUST_LOG` beats the configured
//! level) in front of either a human-readable or a JSON fmt layer.

#![deny(unsafe_code)]

use chatroom_settings::{LogFormat, LoggingSettings};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration resolved from settings and CLI flags.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Default filter directive, e.g. `"info"` or `"chatroom_server=debug"`.
    pub filter: String,
    /// Emit one JSON object per line instead of pretty text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            filter: settings.level.as_filter_str().into(),
            json: settings.format == LogFormat::Json,
        }
    }
}

/// Installing the global subscriber failed (usually: one is already set).
#[derive(Debug, thiserror::Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct InitError(String);

/// Build the env filter, preferring `RUST_LOG` when it is set and valid.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber, returning an error if one already exists.
pub fn try_init_subscriber(config: &LogConfig) -> Result<(), InitError> {
    let filter = env_filter(config);

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .map_err(|e| InitError(e.to_string()))
}

/// Install the global subscriber. Call once at startup.
///
/// A second call is ignored with a warning on stderr.
pub fn init_subscriber(config: &LogConfig) {
    if let Err(e) = try_init_subscriber(config) {
        eprintln!("chatroom-logging: {e}");
    }
}

/// Run `f` with a temporary stderr subscriber at `warn`, for work that logs
/// before the configured subscriber can be built (loading settings).
///
/// `RUST_LOG` still wins. The subscriber is only the thread default while
/// `f` runs; nothing global is installed.
pub fn with_bootstrap_subscriber<T>(f: impl FnOnce() -> T) -> T {
    let config = LogConfig {
        filter: "warn".into(),
        json: false,
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter(&config));
    let _guard = tracing_subscriber::registry().with(layer).set_default();
    f()
}
