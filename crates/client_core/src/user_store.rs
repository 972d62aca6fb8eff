use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use shared::domain::TelegramId;

const APP_DIR_NAME: &str = "movie-swipe";
const USER_FILE_NAME: &str = "user.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    telegram_id: TelegramId,
}

/// File-backed slot remembering which user this client swipes as.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/movie-swipe/user.json`, or the configured override.
    pub fn open(path_override: Option<&Path>) -> Result<Self> {
        if let Some(path) = path_override {
            return Ok(Self::new(path));
        }
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow!("no platform config directory available for the user store"))?;
        Ok(Self::new(base.join(APP_DIR_NAME).join(USER_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<TelegramId>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read '{}'", self.path.display()))
            }
        };
        let stored: StoredUser = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt user store '{}'", self.path.display()))?;
        Ok(Some(stored.telegram_id))
    }

    pub fn save(&self, telegram_id: TelegramId) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory '{}'", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(&StoredUser { telegram_id })?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write '{}'", self.path.display()))
    }

    /// Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove '{}'", self.path.display()))
            }
        }
    }
}

/// Persisted id first, then the development default.
pub fn resolve_user_id(
    stored: Option<TelegramId>,
    dev_default: Option<TelegramId>,
) -> Option<TelegramId> {
    stored.or(dev_default)
}

#[cfg(test)]
#[path = "tests/user_store_tests.rs"]
mod tests;
