use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use shared::domain::TelegramId;
use tracing::warn;
use url::Url;

use crate::controller::{
    QueueOptions, DEFAULT_LOW_WATER_MARK, DEFAULT_PREFETCH_BATCH, MAX_PREFETCH_BATCH,
};

pub const DEFAULT_CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Development-only fallback used when no id has been persisted.
    pub dev_telegram_id: Option<TelegramId>,
    pub user_store_path: Option<PathBuf>,
    pub prefetch_batch: usize,
    pub low_water_mark: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".into(),
            request_timeout: Duration::from_secs(10),
            dev_telegram_id: None,
            user_store_path: None,
            prefetch_batch: DEFAULT_PREFETCH_BATCH,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
        }
    }
}

impl ClientSettings {
    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            prefetch_batch: self.prefetch_batch.clamp(1, MAX_PREFETCH_BATCH),
            low_water_mark: self.low_water_mark,
        }
    }
}

/// Defaults, then the TOML file at `config_path` if present, then `env`.
pub fn load_settings_from(
    config_path: impl Into<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings> {
    let config_path = config_path.into();
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(&config_path) {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
            .with_context(|| format!("failed to parse '{}'", config_path.display()))?;
        apply_file_overrides(&mut settings, &file_cfg);
    }

    apply_env_overrides(&mut settings, env);
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn apply_file_overrides(settings: &mut ClientSettings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("request_timeout_secs").and_then(toml::Value::as_integer) {
        if v > 0 {
            settings.request_timeout = Duration::from_secs(v as u64);
        }
    }
    if let Some(v) = file_cfg.get("dev_telegram_id") {
        settings.dev_telegram_id = parse_telegram_id("dev_telegram_id", &toml_scalar(v));
    }
    if let Some(v) = file_cfg.get("user_store_path").and_then(toml::Value::as_str) {
        settings.user_store_path = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg.get("prefetch_batch").and_then(toml::Value::as_integer) {
        let clamped = v.clamp(1, MAX_PREFETCH_BATCH as i64) as usize;
        if clamped as i64 != v {
            warn!(value = v, used = clamped, "prefetch_batch out of range");
        }
        settings.prefetch_batch = clamped;
    }
    if let Some(v) = file_cfg.get("low_water_mark").and_then(toml::Value::as_integer) {
        settings.low_water_mark = v.max(0) as usize;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("DEV_TELEGRAM_ID") {
        settings.dev_telegram_id = parse_telegram_id("DEV_TELEGRAM_ID", &v);
    }
    if let Some(v) = env("APP__DEV_TELEGRAM_ID") {
        settings.dev_telegram_id = parse_telegram_id("APP__DEV_TELEGRAM_ID", &v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) if secs > 0 => settings.request_timeout = Duration::from_secs(secs),
            _ => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    if let Some(v) = env("APP__USER_STORE_PATH") {
        settings.user_store_path = Some(PathBuf::from(v));
    }
}

fn toml_scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_telegram_id(source: &str, raw: &str) -> Option<TelegramId> {
    match raw.parse::<TelegramId>() {
        Ok(id) => Some(id),
        Err(err) => {
            warn!(source, error = %err, "ignoring dev telegram id");
            None
        }
    }
}

/// Validates the base URL and strips the trailing slash so endpoints can be
/// joined with a single `/`.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid API base URL '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "API base URL must use http or https, got '{}'",
            parsed.scheme()
        );
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
