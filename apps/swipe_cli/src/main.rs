use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{normalize_base_url, DEFAULT_CONFIG_FILE},
    load_settings_from, resolve_user_id, ClientSettings, ControllerEvent, HttpMovieApi, MovieApi,
    QueueController, SwipeOutcome, UserStore,
};
use shared::{casing::snake_to_camel_keys, domain::TelegramId};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod render;
mod session;

use session::{parse_action, persist_user_id, Action};

#[derive(Parser, Debug)]
#[command(name = "movie-swipe", about = "Swipe through random movies from the terminal")]
struct Cli {
    /// Overrides `api_base_url` from the config file and environment.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Swipe as this user instead of the persisted one.
    #[arg(long)]
    telegram_id: Option<TelegramId>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    user_store: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive swipe session (default).
    Swipe,
    /// Fetch one random movie and print it as JSON.
    Random,
    /// Inspect or change the persisted user id.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand, Debug)]
enum UserAction {
    Show,
    Set { telegram_id: TelegramId },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings_from(&cli.config, |key| std::env::var(key).ok())?;
    if let Some(url) = &cli.api_base_url {
        settings.api_base_url = normalize_base_url(url)?;
    }
    if let Some(path) = &cli.user_store {
        settings.user_store_path = Some(path.clone());
    }

    match cli.command.unwrap_or(Command::Swipe) {
        Command::Swipe => {
            let store = match UserStore::open(settings.user_store_path.as_deref()) {
                Ok(store) => Some(store),
                Err(err) => {
                    warn!(error = %err, "user store unavailable; ids will not persist");
                    None
                }
            };
            run_session(&settings, store.as_ref(), cli.telegram_id).await
        }
        Command::Random => print_random(&settings).await,
        Command::User { action } => {
            let store = UserStore::open(settings.user_store_path.as_deref())?;
            run_user_action(&store, action)
        }
    }
}

async fn run_session(
    settings: &ClientSettings,
    store: Option<&UserStore>,
    flag_user: Option<TelegramId>,
) -> Result<()> {
    let stored = store.and_then(|store| {
        store.load().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring unreadable user store");
            None
        })
    });
    let user_id = flag_user.or_else(|| resolve_user_id(stored, settings.dev_telegram_id));

    let api = Arc::new(HttpMovieApi::from_settings(settings)?);
    info!(base_url = api.base_url(), user_id = ?user_id, "starting swipe session");
    let controller = QueueController::with_options(api, user_id, settings.queue_options());

    let mut events = controller.subscribe_events();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ControllerEvent::MatchFound { movie_id }) => {
                    println!("{}", render::match_banner(&movie_id));
                }
                Ok(ControllerEvent::Error(message)) => debug!(%message, "controller error"),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("Loading movies...");
    controller.initialize().await;
    println!("{}", render::render_snapshot(&controller.snapshot().await));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_action(&line) {
            Some(Action::Swipe(direction)) => {
                if let SwipeOutcome::Rejected = controller.submit_swipe(direction).await {
                    let snapshot = controller.snapshot().await;
                    println!("{}", render::rejection_reason(&snapshot));
                    continue;
                }
            }
            Some(Action::Reload) => {
                println!("Loading movies...");
                if !controller.initialize().await {
                    println!("Still busy, try again in a moment.");
                    continue;
                }
            }
            Some(Action::SetUser(telegram_id)) => {
                persist_user_id(store, Some(telegram_id));
                controller.set_user_id(Some(telegram_id)).await;
                println!("Swiping as {telegram_id}.");
            }
            Some(Action::ClearUser) => {
                persist_user_id(store, None);
                controller.set_user_id(None).await;
                println!("User id cleared; swipes are disabled.");
            }
            Some(Action::Help) => {
                println!("{}", render::HELP);
                continue;
            }
            Some(Action::Quit) => break,
            None => {
                println!("Unknown command {:?}. {}", line.trim(), render::HELP);
                continue;
            }
        }
        println!("{}", render::render_snapshot(&controller.snapshot().await));
    }

    listener.abort();
    Ok(())
}

async fn print_random(settings: &ClientSettings) -> Result<()> {
    let api = HttpMovieApi::from_settings(settings)?;
    let movie = api.fetch_random_movie().await?;
    let camel = snake_to_camel_keys(serde_json::to_value(&movie)?);
    println!("{}", serde_json::to_string_pretty(&camel)?);
    Ok(())
}

fn run_user_action(store: &UserStore, action: UserAction) -> Result<()> {
    match action {
        UserAction::Show => match store.load()? {
            Some(id) => println!("telegram_id={id} ({})", store.path().display()),
            None => println!("no telegram_id stored at {}", store.path().display()),
        },
        UserAction::Set { telegram_id } => {
            store.save(telegram_id)?;
            println!("stored telegram_id={telegram_id}");
        }
        UserAction::Clear => {
            if store.clear()? {
                println!("cleared stored telegram_id");
            } else {
                println!("nothing to clear");
            }
        }
    }
    Ok(())
}
