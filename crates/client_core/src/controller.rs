//! Prefetch queue and swipe-advance logic.
//!
//! The controller owns the movie on screen plus a short lookahead queue. All
//! mutation happens under one mutex; network calls run with the lock released,
//! and the phase stays busy for their duration so a second swipe or a reload
//! is rejected instead of racing the first.

use std::{collections::VecDeque, sync::Arc};

use futures::future::try_join_all;
use shared::{
    domain::{Movie, MovieId, SwipeDirection, TelegramId},
    error::ApiError,
    protocol::SwipeResponse,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::api::MovieApi;

pub const DEFAULT_PREFETCH_BATCH: usize = 5;
pub const DEFAULT_LOW_WATER_MARK: usize = 3;
/// Upper bound on concurrent fetches fired by one initialize.
pub const MAX_PREFETCH_BATCH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    /// Movies fetched concurrently on initialize; the first becomes current.
    pub prefetch_batch: usize,
    /// A queue shorter than this after a swipe triggers one top-up fetch.
    pub low_water_mark: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            prefetch_batch: DEFAULT_PREFETCH_BATCH,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Initializing,
    Ready,
    SwipeSubmitting,
    Errored { message: String },
}

impl ControllerPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, ControllerPhase::Initializing)
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ControllerPhase::Initializing | ControllerPhase::SwipeSubmitting
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ControllerPhase::Errored { message } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    PhaseChanged(ControllerPhase),
    CurrentChanged(Option<Movie>),
    SwipeRecorded(SwipeResponse),
    MatchFound { movie_id: MovieId },
    Error(String),
}

/// What happened to a `submit_swipe` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SwipeOutcome {
    /// Guarded: nothing on screen, no user, or another call still running.
    Rejected,
    /// The vote was stored. Follow-up fetch failures surface through the phase.
    Recorded(SwipeResponse),
    /// The vote itself failed; current and queue are untouched.
    Failed(ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub phase: ControllerPhase,
    pub current: Option<Movie>,
    pub queue: Vec<Movie>,
    pub user_id: Option<TelegramId>,
}

struct QueueState {
    phase: ControllerPhase,
    current: Option<Movie>,
    queue: VecDeque<Movie>,
    user_id: Option<TelegramId>,
}

pub struct QueueController {
    api: Arc<dyn MovieApi>,
    options: QueueOptions,
    inner: Mutex<QueueState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl QueueController {
    pub fn new(api: Arc<dyn MovieApi>, user_id: Option<TelegramId>) -> Self {
        Self::with_options(api, user_id, QueueOptions::default())
    }

    pub fn with_options(
        api: Arc<dyn MovieApi>,
        user_id: Option<TelegramId>,
        options: QueueOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            options,
            inner: Mutex::new(QueueState {
                phase: ControllerPhase::Idle,
                current: None,
                queue: VecDeque::new(),
                user_id,
            }),
            events,
        }
    }

    pub fn options(&self) -> QueueOptions {
        self.options
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        let guard = self.inner.lock().await;
        QueueSnapshot {
            phase: guard.phase.clone(),
            current: guard.current.clone(),
            queue: guard.queue.iter().cloned().collect(),
            user_id: guard.user_id,
        }
    }

    pub async fn user_id(&self) -> Option<TelegramId> {
        self.inner.lock().await.user_id
    }

    /// Swiping stays disabled while this is `None`.
    pub async fn set_user_id(&self, user_id: Option<TelegramId>) {
        self.inner.lock().await.user_id = user_id;
        debug!(user_id = ?user_id, "controller user changed");
    }

    /// Fetches the initial batch concurrently and seeds current + queue from it.
    /// Returns `false` when another initialize or a swipe is still running.
    pub async fn initialize(&self) -> bool {
        {
            let mut guard = self.inner.lock().await;
            if guard.phase.is_busy() {
                debug!(phase = ?guard.phase, "initialize ignored while busy");
                return false;
            }
            guard.phase = ControllerPhase::Initializing;
        }
        self.emit(ControllerEvent::PhaseChanged(ControllerPhase::Initializing));

        let batch = (0..self.options.prefetch_batch).map(|_| self.api.fetch_random_movie());
        let result = try_join_all(batch).await;

        let (phase, current) = {
            let mut guard = self.inner.lock().await;
            match result {
                Ok(movies) => {
                    let mut movies = VecDeque::from(movies);
                    guard.current = movies.pop_front();
                    guard.queue = movies;
                    guard.phase = ControllerPhase::Ready;
                    info!(queued = guard.queue.len(), "movie queue initialized");
                }
                Err(err) => {
                    guard.current = None;
                    guard.queue.clear();
                    guard.phase = ControllerPhase::Errored {
                        message: err.message.clone(),
                    };
                    warn!(status = err.status_code, error = %err, "movie queue initialization failed");
                }
            }
            (guard.phase.clone(), guard.current.clone())
        };

        self.emit_phase(phase);
        self.emit(ControllerEvent::CurrentChanged(current));
        true
    }

    /// Records a vote for the current movie and advances to the next one.
    pub async fn submit_swipe(&self, direction: SwipeDirection) -> SwipeOutcome {
        let (movie_id, user_id) = {
            let mut guard = self.inner.lock().await;
            let accepts = matches!(
                guard.phase,
                ControllerPhase::Ready | ControllerPhase::Errored { .. }
            );
            let (Some(current), Some(user_id), true) = (guard.current.as_ref(), guard.user_id, accepts)
            else {
                debug!(phase = ?guard.phase, "swipe ignored");
                return SwipeOutcome::Rejected;
            };
            let movie_id = current.id.clone();
            guard.phase = ControllerPhase::SwipeSubmitting;
            (movie_id, user_id)
        };
        self.emit(ControllerEvent::PhaseChanged(ControllerPhase::SwipeSubmitting));

        let response = match self
            .api
            .submit_swipe(&movie_id, direction, user_id, &[])
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%movie_id, %direction, status = err.status_code, error = %err, "swipe failed");
                self.finish_swipe(Some(&err)).await;
                return SwipeOutcome::Failed(err);
            }
        };

        info!(%movie_id, %direction, matched = response.is_match(), "swipe recorded");
        self.emit(ControllerEvent::SwipeRecorded(response.clone()));
        if response.is_match() {
            self.emit(ControllerEvent::MatchFound {
                movie_id: movie_id.clone(),
            });
        }

        // Both follow-up decisions come from the same post-pop snapshot.
        let (needs_next, needs_top_up, next) = {
            let mut guard = self.inner.lock().await;
            let next = guard.queue.pop_front();
            let needs_next = next.is_none();
            guard.current = next.clone();
            let needs_top_up = guard.queue.len() < self.options.low_water_mark;
            (needs_next, needs_top_up, next)
        };
        self.emit(ControllerEvent::CurrentChanged(next));

        if needs_next {
            match self.api.fetch_random_movie().await {
                Ok(movie) => {
                    self.inner.lock().await.current = Some(movie.clone());
                    self.emit(ControllerEvent::CurrentChanged(Some(movie)));
                }
                Err(err) => {
                    warn!(error = %err, "fetching next movie failed");
                    self.finish_swipe(Some(&err)).await;
                    return SwipeOutcome::Recorded(response);
                }
            }
        }

        if needs_top_up {
            match self.api.fetch_random_movie().await {
                Ok(movie) => {
                    let mut guard = self.inner.lock().await;
                    guard.queue.push_back(movie);
                    debug!(queued = guard.queue.len(), "queue topped up");
                }
                Err(err) => {
                    warn!(error = %err, "queue top-up failed");
                    self.finish_swipe(Some(&err)).await;
                    return SwipeOutcome::Recorded(response);
                }
            }
        }

        self.finish_swipe(None).await;
        SwipeOutcome::Recorded(response)
    }

    async fn finish_swipe(&self, failure: Option<&ApiError>) {
        let phase = match failure {
            Some(err) => ControllerPhase::Errored {
                message: err.message.clone(),
            },
            None => ControllerPhase::Ready,
        };
        self.inner.lock().await.phase = phase.clone();
        self.emit_phase(phase);
    }

    fn emit_phase(&self, phase: ControllerPhase) {
        if let Some(message) = phase.error_message() {
            self.emit(ControllerEvent::Error(message.to_string()));
        }
        self.emit(ControllerEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
