use client_core::QueueSnapshot;
use shared::domain::{Movie, MovieId};

pub const HELP: &str =
    "Commands: [l]ike, [d]islike, [r]eload, [u]ser <id>|clear, [h]elp, [q]uit";

const RULE: &str = "------------------------------------------------------------";

pub fn render_card(movie: &Movie) -> String {
    let mut lines = Vec::new();
    let title = match movie.distinct_original_title() {
        Some(original) => format!("{} ({original})", movie.title),
        None => movie.title.clone(),
    };
    lines.push(format!("{title}, {}", movie.year));

    let mut meta = movie.genre.clone();
    if let Some(rating) = movie.rating {
        meta.push_str(&format!(" | rating {rating:.1}/10"));
    }
    lines.push(meta);

    if let Some(description) = movie.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(String::new());
        lines.push(description.to_string());
    }
    lines.push(format!("poster: {}", movie.poster_url));
    lines.join("\n")
}

pub fn render_snapshot(snapshot: &QueueSnapshot) -> String {
    let mut out = Vec::new();

    if snapshot.user_id.is_none() {
        out.push(
            "Telegram ID not set. Swipes are disabled; use `u <id>` or DEV_TELEGRAM_ID."
                .to_string(),
        );
    }
    if let Some(message) = snapshot.phase.error_message() {
        out.push(format!("Error: {message}"));
    }

    match (&snapshot.phase, &snapshot.current) {
        (phase, _) if phase.is_loading() => out.push("Loading movies...".to_string()),
        (_, Some(movie)) => {
            out.push(RULE.to_string());
            out.push(render_card(movie));
            out.push(RULE.to_string());
            out.push(format!("{} queued. {HELP}", snapshot.queue.len()));
        }
        (_, None) => out.push("No movie available. Press `r` to reload.".to_string()),
    }

    out.join("\n")
}

pub fn rejection_reason(snapshot: &QueueSnapshot) -> &'static str {
    if snapshot.phase.is_busy() {
        "Still working on the previous action."
    } else if snapshot.current.is_none() {
        "No movie on screen. Press `r` to reload."
    } else if snapshot.user_id.is_none() {
        "Set a telegram id first: `u <id>`."
    } else {
        "Swipe ignored."
    }
}

pub fn match_banner(movie_id: &MovieId) -> String {
    format!("*** It's a match! Everyone liked movie {movie_id}. ***")
}
