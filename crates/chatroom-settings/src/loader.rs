//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ChatSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `CHATROOM_*` environment overrides
//! 4. Validate

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{ChatSettings, LogFormat, LogLevel};

/// Resolve the default settings file (`~/.chatroom/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".chatroom").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ChatSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or an invalid value is an
/// error.
pub fn load_settings_from_path(path: &Path) -> Result<ChatSettings> {
    let defaults = serde_json::to_value(ChatSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ChatSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Reject values the server cannot run with.
pub fn validate(settings: &ChatSettings) -> Result<()> {
    let zeroes = [
        ("server.queueCapacity", settings.server.queue_capacity == 0),
        ("server.writeTimeoutMs", settings.server.write_timeout_ms == 0),
        ("server.maxMessageSize", settings.server.max_message_size == 0),
    ];
    match zeroes.into_iter().find(|&(_, zero)| zero) {
        Some((key, _)) => Err(SettingsError::MustBePositive { key }),
        None => Ok(()),
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut ChatSettings) {
    if let Some(v) = read_env_string("CHATROOM_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("CHATROOM_PORT", 0, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_usize("CHATROOM_QUEUE_CAPACITY", 1, 1_000_000) {
        settings.server.queue_capacity = v;
    }
    if let Some(v) = read_env_u64("CHATROOM_WRITE_TIMEOUT_MS", 1, 600_000) {
        settings.server.write_timeout_ms = v;
    }
    if let Some(v) = read_env_usize("CHATROOM_MAX_MESSAGE_SIZE", 1, 64 * 1024 * 1024) {
        settings.server.max_message_size = v;
    }
    if let Some(v) = read_env_u64("CHATROOM_SHUTDOWN_TIMEOUT_MS", 0, 600_000) {
        settings.server.shutdown_timeout_ms = v;
    }
    if let Some(v) = read_env_with("CHATROOM_LOG_LEVEL", LogLevel::parse) {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_with("CHATROOM_LOG_FORMAT", LogFormat::parse) {
        settings.logging.format = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_with<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let val = std::env::var(name).ok()?;
    let result = parse(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    read_env_with(name, |v| parse_u16_range(v, min, max))
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    read_env_with(name, |v| parse_u64_range(v, min, max))
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    read_env_with(name, |v| parse_usize_range(v, min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8080, "host": "localhost"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "localhost");
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_array_replaces() {
        let target = serde_json::json!({"a": [1, 2, 3]});
        let source = serde_json::json!({"a": [9]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], serde_json::json!([9]));
    }

    // ── file loading ────────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.server.queue_capacity, 256);
    }

    #[test]
    fn load_partial_file_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"queueCapacity": 32}, "logging": {"format": "json"}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.server.queue_capacity, 32);
        assert_eq!(settings.server.write_timeout_ms, 10_000);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.level, LogLevel::Info);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Parse { path: p, .. } if p == path));
    }

    #[test]
    fn load_wrongly_typed_value_is_shape_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": "high"}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Shape(_)));
    }

    #[test]
    fn load_zero_queue_capacity_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"queueCapacity": 0}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(
            result.unwrap_err(),
            SettingsError::MustBePositive {
                key: "server.queueCapacity"
            }
        ));
    }

    #[test]
    fn validate_defaults_ok() {
        assert!(validate(&ChatSettings::default()).is_ok());
    }

    #[test]
    fn validate_zero_write_timeout() {
        let mut settings = ChatSettings::default();
        settings.server.write_timeout_ms = 0;
        assert!(matches!(
            validate(&settings),
            Err(SettingsError::MustBePositive {
                key: "server.writeTimeoutMs"
            })
        ));
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_u16_valid() {
        assert_eq!(parse_u16_range("9090", 0, 65535), Some(9090));
        assert_eq!(parse_u16_range("0", 0, 65535), Some(0));
    }

    #[test]
    fn parse_u16_invalid() {
        assert_eq!(parse_u16_range("not_a_number", 0, 65535), None);
        assert_eq!(parse_u16_range("99999", 0, 65535), None);
        assert_eq!(parse_u16_range("", 0, 65535), None);
    }

    #[test]
    fn parse_usize_range_bounds() {
        assert_eq!(parse_usize_range("0", 1, 10), None);
        assert_eq!(parse_usize_range("1", 1, 10), Some(1));
        assert_eq!(parse_usize_range("11", 1, 10), None);
    }

    #[test]
    fn parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("500", 1, 1000), Some(500));
        assert_eq!(parse_u64_range("-1", 1, 1000), None);
    }
}
