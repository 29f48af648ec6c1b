use std::env;

use engine::{resolve_data_dir, PlayerProfile, Seeks, StartupError, SubscriptionStore};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::content::{load_level_defs, ContentError};

use super::Game;

const SEEKS_ENV_VAR: &str = "LINGO_SEEKS";
const LANGUAGE_ENV_VAR: &str = "LINGO_LANGUAGE";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

pub fn build_game() -> Result<Game, BootstrapError> {
    init_tracing();
    info!("=== LoveLingo Startup ===");

    let profile = profile_from_env();
    let data_dir = resolve_data_dir()?;
    let store = SubscriptionStore::open(&data_dir);
    let defs = load_level_defs()?;

    info!(data_dir = %data_dir.display(), subscribed = store.is_subscribed(), "state resolved");
    Ok(Game::new(defs, profile, store))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn profile_from_env() -> PlayerProfile {
    let seeks = match env::var(SEEKS_ENV_VAR).ok().as_deref() {
        Some("boyfriend") | Some("Boyfriend") => Seeks::Boyfriend,
        _ => Seeks::Girlfriend,
    };
    let language = env::var(LANGUAGE_ENV_VAR).unwrap_or_else(|_| "Spanish".to_string());
    PlayerProfile::new(seeks, language)
}
