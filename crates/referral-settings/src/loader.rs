//! Settings loading: compiled defaults, deep-merged with an optional JSON
//! file, then overridden by environment variables.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::Settings;

/// Resolve the path to the optional settings file, from `CONFIG_PATH` or
/// `./settings.json`.
pub fn settings_path() -> PathBuf {
    std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("settings.json"))
}

/// Load settings from the default path, applying environment overrides.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path, applying environment overrides. If
/// the file does not exist, compiled defaults are used in its place; if it
/// exists but contains invalid JSON, the error is surfaced.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values: objects merge key-by-key with
/// `source` taking priority, arrays and scalars are replaced wholesale, and
/// a `null` in `source` leaves the corresponding `target` value untouched.
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

/// Apply environment variable overrides, the highest-priority layer.
/// Invalid values are logged and ignored, falling back to the file/default
/// layer rather than failing startup.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = read_env_u16("PORT") {
        settings.server.port = v;
    }
    if let Some(v) = read_env_string("APP_ENV") {
        match v.parse() {
            Ok(env) => settings.environment = env,
            Err(()) => tracing::warn!(value = %v, "invalid APP_ENV, ignoring"),
        }
    }
    if let Some(v) = read_env_string("DATABASE_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_env_string("AUTH_JWT_SECRET") {
        settings.auth.jwt_secret = v;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = val.parse().ok();
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}
