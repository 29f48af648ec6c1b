pub mod command;
pub mod events;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod stage;

pub use command::{normalize_target, parse_command, ParsedCommand, Verb};
pub use events::{EventBus, GameEvent, Subscription};
pub use registry::InteractionRegistry;
pub use scene::{
    LevelKey, Scene, SceneCommand, SceneContext, SceneInput, SceneMachine, SceneOutput,
    SubmittedCommand, FADE_DURATION_SECONDS,
};
pub use scheduler::{Scheduler, TimerHandle};
pub use stage::{
    Sprite, SpriteId, SpriteOrigin, Stage, Tint, Vec2, BOTTOM_ORIGIN_STAND_OFF, TINT_HOVER,
    TINT_TARGET,
};
