//! Line commands accepted by the interactive session.

use client_core::UserStore;
use shared::domain::{SwipeDirection, TelegramId};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Swipe(SwipeDirection),
    Reload,
    SetUser(TelegramId),
    ClearUser,
    Help,
    Quit,
}

pub fn parse_action(line: &str) -> Option<Action> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    let argument = words.next();

    match (command.as_str(), argument) {
        ("l" | "like" | "y", None) => Some(Action::Swipe(SwipeDirection::Like)),
        ("d" | "dislike" | "n", None) => Some(Action::Swipe(SwipeDirection::Dislike)),
        ("r" | "reload", None) => Some(Action::Reload),
        ("u" | "user", Some("clear")) => Some(Action::ClearUser),
        ("u" | "user", Some(raw)) => raw.parse().ok().map(Action::SetUser),
        ("h" | "help" | "?", None) => Some(Action::Help),
        ("q" | "quit" | "exit", None) => Some(Action::Quit),
        _ => None,
    }
}

/// Saves or clears the stored id. Store failures are logged and the session
/// carries on with the in-memory id; returns whether the store was updated.
pub fn persist_user_id(store: Option<&UserStore>, user_id: Option<TelegramId>) -> bool {
    let Some(store) = store else {
        return false;
    };
    let result = match user_id {
        Some(telegram_id) => store.save(telegram_id),
        None => store.clear().map(|_| ()),
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(path = %store.path().display(), error = %err, "failed to update user store");
            false
        }
    }
}
