use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Numeric identifier of the swiping user. The backend keys users by their
/// Telegram account, so this is what travels in the `telegram_id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TelegramId(pub i64);

impl fmt::Display for TelegramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTelegramId {
    #[error("telegram id must be a decimal integer, got {0:?}")]
    NotNumeric(String),
    #[error("telegram id must be positive, got {0}")]
    NotPositive(i64),
}

impl FromStr for TelegramId {
    type Err = InvalidTelegramId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| InvalidTelegramId::NotNumeric(trimmed.to_string()))?;
        if value <= 0 {
            return Err(InvalidTelegramId::NotPositive(value));
        }
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub String);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Like,
    Dislike,
}

impl SwipeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Dislike => "dislike",
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie record as served by `GET /random`. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinopoisk_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub title_original: Option<String>,
    pub year: i32,
    pub genre: String,
    pub poster_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Movie {
    /// Original-language title, only when it differs from the display title.
    pub fn distinct_original_title(&self) -> Option<&str> {
        self.title_original
            .as_deref()
            .filter(|original| !original.is_empty() && *original != self.title)
    }
}

/// Accepts RFC 3339 timestamps as well as offset-less ISO timestamps, which the
/// backend emits for naive UTC columns.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}
