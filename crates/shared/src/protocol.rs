use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{deserialize_timestamp, MovieId, SwipeDirection, TelegramId};

/// Body of `POST /swipes`. The submitting user is carried in the
/// `telegram_id` header, never in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeRequest {
    pub movie_id: MovieId,
    pub swipe_type: SwipeDirection,
    pub group_participants: Vec<TelegramId>,
}

impl SwipeRequest {
    /// Builds a request with duplicate participants dropped, first occurrence kept.
    pub fn new(
        movie_id: MovieId,
        swipe_type: SwipeDirection,
        participants: impl IntoIterator<Item = TelegramId>,
    ) -> Self {
        let mut group_participants: Vec<TelegramId> = Vec::new();
        for participant in participants {
            if !group_participants.contains(&participant) {
                group_participants.push(participant);
            }
        }
        Self {
            movie_id,
            swipe_type,
            group_participants,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub id: String,
    pub user_id: String,
    pub movie_id: MovieId,
    pub swipe_type: SwipeDirection,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub swiped_at: DateTime<Utc>,
    #[serde(default)]
    pub group_participants: Vec<TelegramId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_found: Option<bool>,
}

impl SwipeResponse {
    pub fn is_match(&self) -> bool {
        self.match_found.unwrap_or(false)
    }
}

/// Success wrapper used by every backend route: `{ "success": true, "data": T }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: Some(true),
            data: Some(data),
            error: None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
