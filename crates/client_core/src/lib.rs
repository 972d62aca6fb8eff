pub mod api;
pub mod config;
pub mod controller;
pub mod user_store;

pub use api::{HttpMovieApi, MovieApi, TELEGRAM_ID_HEADER};
pub use config::{load_settings_from, ClientSettings};
pub use controller::{
    ControllerEvent, ControllerPhase, QueueController, QueueOptions, QueueSnapshot, SwipeOutcome,
};
pub use user_store::{resolve_user_id, UserStore};
