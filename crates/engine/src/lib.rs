use std::env;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

pub mod app;
pub mod profile;
pub mod storage;

pub use app::{
    normalize_target, parse_command, EventBus, GameEvent, InteractionRegistry, LevelKey,
    ParsedCommand, Scene, SceneCommand, SceneContext, SceneInput, SceneMachine, SceneOutput,
    Scheduler, Sprite, SpriteId, SpriteOrigin, Stage, SubmittedCommand, Subscription, TimerHandle,
    Tint, Vec2, Verb, BOTTOM_ORIGIN_STAND_OFF, FADE_DURATION_SECONDS, TINT_HOVER, TINT_TARGET,
};
pub use profile::{PlayerProfile, Seeks};
pub use storage::{StorageError, SubscriptionStore};

pub const DATA_DIR_ENV_VAR: &str = "LINGO_DATA_DIR";

const DEFAULT_DATA_DIR: &str = ".lingo";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Data directory for persisted player state: `LINGO_DATA_DIR` if set,
/// otherwise `.lingo` under the current directory. Created if missing.
pub fn resolve_data_dir() -> Result<PathBuf, StartupError> {
    let dir = match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) => PathBuf::from(value),
        Err(env::VarError::NotPresent) => PathBuf::from(DEFAULT_DATA_DIR),
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: DATA_DIR_ENV_VAR,
                source,
            })
        }
    };

    fs::create_dir_all(&dir).map_err(|source| StartupError::CreateDataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
