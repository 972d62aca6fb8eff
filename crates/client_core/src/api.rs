use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Movie, MovieId, SwipeDirection, TelegramId},
    error::{ApiError, NETWORK_ERROR_MESSAGE},
    protocol::{ApiEnvelope, SwipeRequest, SwipeResponse},
};
use tracing::{debug, warn};

use crate::config::ClientSettings;

/// Header carrying the submitting user. It authenticates the call, so it stays
/// out of the request body.
pub const TELEGRAM_ID_HEADER: &str = "telegram_id";

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn fetch_random_movie(&self) -> Result<Movie, ApiError>;
    async fn submit_swipe(
        &self,
        movie_id: &MovieId,
        direction: SwipeDirection,
        user_id: TelegramId,
        participants: &[TelegramId],
    ) -> Result<SwipeResponse, ApiError>;
}

pub struct HttpMovieApi {
    http: Client,
    base_url: String,
}

impl HttpMovieApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::new(settings.api_base_url.clone(), settings.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl MovieApi for HttpMovieApi {
    async fn fetch_random_movie(&self) -> Result<Movie, ApiError> {
        let url = self.endpoint("random");
        debug!(method = "GET", %url, "api request");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        read_envelope(&url, response).await
    }

    async fn submit_swipe(
        &self,
        movie_id: &MovieId,
        direction: SwipeDirection,
        user_id: TelegramId,
        participants: &[TelegramId],
    ) -> Result<SwipeResponse, ApiError> {
        let url = self.endpoint("swipes");
        let body = SwipeRequest::new(movie_id.clone(), direction, participants.iter().copied());
        debug!(
            method = "POST",
            %url,
            movie_id = %body.movie_id,
            swipe_type = %body.swipe_type,
            "api request"
        );
        let response = self
            .http
            .post(&url)
            .header(TELEGRAM_ID_HEADER, user_id.to_string())
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        read_envelope(&url, response).await
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> ApiError {
    warn!(%url, error = %err, "api request failed without response");
    ApiError::network()
}

async fn read_envelope<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|err| {
        warn!(%url, status, error = %err, "api response body could not be read");
        ApiError::new(NETWORK_ERROR_MESSAGE, status, Some(err.to_string()))
    })?;
    debug!(%url, status, "api response");

    if !(200..300).contains(&status) {
        let err = ApiError::from_response(status, &body);
        warn!(%url, status, message = %err.message, "api request rejected");
        return Err(err);
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|err| {
        warn!(%url, status, error = %err, "api response could not be decoded");
        ApiError::malformed(status, format!("{err}: {body}"))
    })?;
    envelope
        .into_data()
        .ok_or_else(|| ApiError::from_response(status, &body))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
