use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::profile::PlayerProfile;

use super::command::{parse_command, ParsedCommand};
use super::events::{EventBus, GameEvent};
use super::registry::InteractionRegistry;
use super::stage::Stage;

/// Seconds a scene-to-scene fade takes before the next level activates.
pub const FADE_DURATION_SECONDS: f32 = 0.5;

/// The four levels, in their fixed play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKey {
    Park,
    Cafe,
    Restaurant,
    Home,
}

impl LevelKey {
    pub fn next(self) -> Option<LevelKey> {
        match self {
            Self::Park => Some(Self::Cafe),
            Self::Cafe => Some(Self::Restaurant),
            Self::Restaurant => Some(Self::Home),
            Self::Home => None,
        }
    }

    /// 1-based level number as surfaced to the HUD.
    pub fn level_number(self) -> u32 {
        match self {
            Self::Park => 1,
            Self::Cafe => 2,
            Self::Restaurant => 3,
            Self::Home => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Park => "park",
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Home => "home",
        }
    }
}

/// What a scene asks of the machine after one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    CompleteLevel,
}

/// One submitted input line: the raw text (chat mode consumes it as-is)
/// plus the parse result the dispatcher uses outside dialogue.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedCommand {
    pub raw: String,
    pub parsed: Option<ParsedCommand>,
}

impl SubmittedCommand {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_command(&raw);
        Self { raw, parsed }
    }
}

/// Everything the player did since the last tick, snapshotted the way the
/// scene consumes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneInput {
    pub submitted: Vec<SubmittedCommand>,
    pub advance_dialogue: bool,
    pub begin_chat: bool,
}

impl SceneInput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, raw: impl Into<String>) -> Self {
        self.submitted.push(SubmittedCommand::from_raw(raw));
        self
    }

    pub fn with_advance_dialogue(mut self) -> Self {
        self.advance_dialogue = true;
        self
    }

    pub fn with_begin_chat(mut self) -> Self {
        self.begin_chat = true;
        self
    }
}

/// Presentation-facing lines a scene produced during an update; the shell
/// drains and renders them.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOutput {
    Feedback { success: bool },
    Instruction(String),
    Dialogue(String),
}

/// Mutable scene surroundings for one call: the scene's own stage and
/// registry plus the shared bus and the player profile.
pub struct SceneContext<'a> {
    pub stage: &'a mut Stage,
    pub registry: &'a mut InteractionRegistry,
    pub bus: &'a EventBus,
    pub profile: &'a PlayerProfile,
}

pub trait Scene {
    fn load(&mut self, ctx: &mut SceneContext<'_>);
    fn update(
        &mut self,
        dt_seconds: f32,
        input: &SceneInput,
        ctx: &mut SceneContext<'_>,
    ) -> SceneCommand;
    fn unload(&mut self, ctx: &mut SceneContext<'_>);
    fn drain_output(&mut self) -> Vec<SceneOutput> {
        Vec::new()
    }
    fn is_dialogue_open(&self) -> bool {
        false
    }
    /// False while the scene has self-driven work pending (tweens aside):
    /// running timers, a typewriter mid-reveal. Shells poll this to decide
    /// when ticking without fresh input has stopped changing anything.
    fn is_idle(&self) -> bool {
        true
    }
}

struct LevelRuntime {
    scene: Box<dyn Scene>,
    stage: Stage,
    registry: InteractionRegistry,
    is_loaded: bool,
}

impl LevelRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            stage: Stage::new(),
            registry: InteractionRegistry::new(),
            is_loaded: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    to: LevelKey,
    remaining_seconds: f32,
}

/// Owns the four level runtimes and drives the fixed Park -> Cafe ->
/// Restaurant -> Home sequence, including the fade transition and the
/// subscription gate in front of Home. Exactly one level is active;
/// inactive stages never tick.
pub struct SceneMachine {
    park: LevelRuntime,
    cafe: LevelRuntime,
    restaurant: LevelRuntime,
    home: LevelRuntime,
    active: LevelKey,
    fade: Option<Fade>,
    awaiting_subscription: bool,
    level_complete_published: bool,
    finished: bool,
}

impl SceneMachine {
    pub fn new(
        park: Box<dyn Scene>,
        cafe: Box<dyn Scene>,
        restaurant: Box<dyn Scene>,
        home: Box<dyn Scene>,
    ) -> Self {
        Self {
            park: LevelRuntime::new(park),
            cafe: LevelRuntime::new(cafe),
            restaurant: LevelRuntime::new(restaurant),
            home: LevelRuntime::new(home),
            active: LevelKey::Park,
            fade: None,
            awaiting_subscription: false,
            level_complete_published: false,
            finished: false,
        }
    }

    pub fn active_level(&self) -> LevelKey {
        self.active
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Alpha ramp of the running fade, 0.0 (just started) to 1.0 (black).
    pub fn fade_progress(&self) -> Option<f32> {
        self.fade
            .as_ref()
            .map(|fade| 1.0 - (fade.remaining_seconds / FADE_DURATION_SECONDS).clamp(0.0, 1.0))
    }

    pub fn is_awaiting_subscription(&self) -> bool {
        self.awaiting_subscription
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn active_stage(&self) -> &Stage {
        &self.runtime_ref(self.active).stage
    }

    pub fn active_registry(&self) -> &InteractionRegistry {
        &self.runtime_ref(self.active).registry
    }

    pub fn is_dialogue_open(&self) -> bool {
        self.runtime_ref(self.active).scene.is_dialogue_open()
    }

    /// True when ticking with empty input would be a no-op: no fade, no
    /// in-flight tween, and the active scene reports itself idle.
    pub fn is_settled(&self) -> bool {
        if self.fade.is_some() {
            return false;
        }
        let runtime = self.runtime_ref(self.active);
        !runtime.stage.is_any_moving() && runtime.scene.is_idle()
    }

    /// Loads the first level. Safe to call once before the first tick.
    pub fn start(&mut self, bus: &EventBus, profile: &PlayerProfile) {
        self.load_level(self.active, bus, profile);
    }

    /// One fixed-dt step: progress a running fade, otherwise update the
    /// active scene. Player input arriving during a fade is dropped.
    pub fn advance(
        &mut self,
        dt_seconds: f32,
        input: &SceneInput,
        bus: &EventBus,
        profile: &PlayerProfile,
        subscribed: bool,
    ) {
        if let Some(mut fade) = self.fade.take() {
            fade.remaining_seconds -= dt_seconds;
            if fade.remaining_seconds > 0.0 {
                self.fade = Some(fade);
            } else {
                self.switch_to(fade.to, bus, profile);
            }
            return;
        }

        self.load_level(self.active, bus, profile);
        let runtime = self.runtime_mut(self.active);
        let mut ctx = SceneContext {
            stage: &mut runtime.stage,
            registry: &mut runtime.registry,
            bus,
            profile,
        };
        let command = runtime.scene.update(dt_seconds, input, &mut ctx);
        if command == SceneCommand::CompleteLevel {
            self.complete_level(bus, subscribed);
        }
    }

    /// Releases the level-3 gate. Ignored unless the gate is armed.
    pub fn notify_subscribed(&mut self) {
        if self.awaiting_subscription {
            info!("subscription gate released");
            self.awaiting_subscription = false;
            self.begin_fade(LevelKey::Home);
        }
    }

    pub fn drain_output(&mut self) -> Vec<SceneOutput> {
        self.runtime_mut(self.active).scene.drain_output()
    }

    fn complete_level(&mut self, bus: &EventBus, subscribed: bool) {
        if self.fade.is_some() || self.awaiting_subscription {
            return;
        }
        match self.active {
            LevelKey::Park | LevelKey::Cafe => {
                // Linear sequence; next() is always Some here.
                if let Some(next) = self.active.next() {
                    self.begin_fade(next);
                }
            }
            LevelKey::Restaurant => {
                if !self.level_complete_published {
                    self.level_complete_published = true;
                    bus.publish(GameEvent::LevelComplete {
                        level: self.active.level_number(),
                    });
                }
                if subscribed {
                    self.begin_fade(LevelKey::Home);
                } else {
                    info!("level 3 complete, waiting for subscription");
                    self.awaiting_subscription = true;
                }
            }
            LevelKey::Home => {
                info!("final level complete");
                self.finished = true;
            }
        }
    }

    fn begin_fade(&mut self, to: LevelKey) {
        debug!(from = self.active.as_str(), to = to.as_str(), "fade started");
        self.fade = Some(Fade {
            to,
            remaining_seconds: FADE_DURATION_SECONDS,
        });
    }

    fn switch_to(&mut self, next: LevelKey, bus: &EventBus, profile: &PlayerProfile) {
        self.teardown_level(self.active, bus, profile);
        info!(level = next.as_str(), "entering level");
        self.active = next;
        self.load_level(next, bus, profile);
    }

    fn load_level(&mut self, key: LevelKey, bus: &EventBus, profile: &PlayerProfile) {
        let runtime = self.runtime_mut(key);
        if runtime.is_loaded {
            return;
        }
        let mut ctx = SceneContext {
            stage: &mut runtime.stage,
            registry: &mut runtime.registry,
            bus,
            profile,
        };
        runtime.scene.load(&mut ctx);
        runtime.is_loaded = true;
    }

    /// Scene teardown discipline: unload the scene (which cancels its
    /// timers), then drop every registered object and sprite so a
    /// re-entered level is rebuilt from scratch.
    fn teardown_level(&mut self, key: LevelKey, bus: &EventBus, profile: &PlayerProfile) {
        let runtime = self.runtime_mut(key);
        if !runtime.is_loaded {
            return;
        }
        let mut ctx = SceneContext {
            stage: &mut runtime.stage,
            registry: &mut runtime.registry,
            bus,
            profile,
        };
        runtime.scene.unload(&mut ctx);
        runtime.registry.clear();
        runtime.stage = Stage::new();
        runtime.is_loaded = false;
    }

    fn runtime_ref(&self, key: LevelKey) -> &LevelRuntime {
        match key {
            LevelKey::Park => &self.park,
            LevelKey::Cafe => &self.cafe,
            LevelKey::Restaurant => &self.restaurant,
            LevelKey::Home => &self.home,
        }
    }

    fn runtime_mut(&mut self, key: LevelKey) -> &mut LevelRuntime {
        match key {
            LevelKey::Park => &mut self.park,
            LevelKey::Cafe => &mut self.cafe,
            LevelKey::Restaurant => &mut self.restaurant,
            LevelKey::Home => &mut self.home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Completes the level as soon as it sees any submitted command;
    /// counts loads and unloads for assertions.
    struct ScriptedScene {
        loads: u32,
        unloads: u32,
    }

    impl ScriptedScene {
        fn new() -> Self {
            Self {
                loads: 0,
                unloads: 0,
            }
        }
    }

    impl Scene for ScriptedScene {
        fn load(&mut self, ctx: &mut SceneContext<'_>) {
            self.loads += 1;
            let id = ctx.stage.spawn("marker", Default::default());
            ctx.registry.register("marker", id);
        }

        fn update(
            &mut self,
            _dt_seconds: f32,
            input: &SceneInput,
            _ctx: &mut SceneContext<'_>,
        ) -> SceneCommand {
            if input.submitted.is_empty() {
                SceneCommand::None
            } else {
                SceneCommand::CompleteLevel
            }
        }

        fn unload(&mut self, _ctx: &mut SceneContext<'_>) {
            self.unloads += 1;
        }
    }

    fn machine() -> SceneMachine {
        SceneMachine::new(
            Box::new(ScriptedScene::new()),
            Box::new(ScriptedScene::new()),
            Box::new(ScriptedScene::new()),
            Box::new(ScriptedScene::new()),
        )
    }

    fn complete_input() -> SceneInput {
        SceneInput::empty().with_command("go to marker")
    }

    fn run_fade_out(machine: &mut SceneMachine, bus: &EventBus, profile: &PlayerProfile) {
        let mut guard = 0;
        while machine.is_fading() {
            machine.advance(0.1, &SceneInput::empty(), bus, profile, false);
            guard += 1;
            assert!(guard < 100, "fade never finished");
        }
    }

    #[test]
    fn start_loads_the_first_level_once() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();

        machine.start(&bus, &profile);
        machine.advance(0.1, &SceneInput::empty(), &bus, &profile, false);

        assert_eq!(machine.active_level(), LevelKey::Park);
        assert_eq!(machine.active_registry().len(), 1);
    }

    #[test]
    fn completion_fades_to_the_next_level_in_sequence() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        machine.start(&bus, &profile);

        machine.advance(0.1, &complete_input(), &bus, &profile, false);
        assert!(machine.is_fading());
        assert_eq!(machine.active_level(), LevelKey::Park);

        run_fade_out(&mut machine, &bus, &profile);
        assert_eq!(machine.active_level(), LevelKey::Cafe);
    }

    #[test]
    fn commands_during_a_fade_are_ignored() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        machine.start(&bus, &profile);

        machine.advance(0.1, &complete_input(), &bus, &profile, false);
        assert!(machine.is_fading());

        // This command lands mid-fade and must not reach any scene.
        machine.advance(0.1, &complete_input(), &bus, &profile, false);
        run_fade_out(&mut machine, &bus, &profile);
        assert_eq!(machine.active_level(), LevelKey::Cafe);
        assert!(!machine.is_fading());
    }

    #[test]
    fn fade_progress_ramps_toward_one() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        machine.start(&bus, &profile);

        machine.advance(0.1, &complete_input(), &bus, &profile, false);
        assert_eq!(machine.fade_progress(), Some(0.0));
        machine.advance(
            FADE_DURATION_SECONDS / 2.0,
            &SceneInput::empty(),
            &bus,
            &profile,
            false,
        );
        let progress = machine.fade_progress().expect("fading");
        assert!(progress > 0.4 && progress < 0.6);
    }

    fn drive_to_restaurant_completion(
        machine: &mut SceneMachine,
        bus: &EventBus,
        profile: &PlayerProfile,
        subscribed: bool,
    ) {
        machine.start(bus, profile);
        for _ in 0..2 {
            machine.advance(0.1, &complete_input(), bus, profile, subscribed);
            run_fade_out(machine, bus, profile);
        }
        assert_eq!(machine.active_level(), LevelKey::Restaurant);
        machine.advance(0.1, &complete_input(), bus, profile, subscribed);
    }

    #[test]
    fn level_three_completion_publishes_level_complete_once_and_gates() {
        let bus = EventBus::new();
        let hud_events = bus.subscribe();
        let profile = PlayerProfile::default();
        let mut machine = machine();

        drive_to_restaurant_completion(&mut machine, &bus, &profile, false);

        assert!(machine.is_awaiting_subscription());
        assert!(!machine.is_fading());
        assert_eq!(machine.active_level(), LevelKey::Restaurant);
        assert_eq!(
            hud_events.drain(),
            vec![GameEvent::LevelComplete { level: 3 }]
        );

        // Either stray completions or idle ticks: still gated, no re-emit.
        machine.advance(0.1, &complete_input(), &bus, &profile, false);
        machine.advance(0.1, &SceneInput::empty(), &bus, &profile, false);
        assert!(machine.is_awaiting_subscription());
        assert!(hud_events.drain().is_empty());
    }

    #[test]
    fn gate_releases_on_subscription_signal() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        drive_to_restaurant_completion(&mut machine, &bus, &profile, false);
        assert!(machine.is_awaiting_subscription());

        machine.notify_subscribed();
        assert!(machine.is_fading());
        run_fade_out(&mut machine, &bus, &profile);
        assert_eq!(machine.active_level(), LevelKey::Home);
    }

    #[test]
    fn already_subscribed_skips_the_gate() {
        let bus = EventBus::new();
        let hud_events = bus.subscribe();
        let profile = PlayerProfile::default();
        let mut machine = machine();

        drive_to_restaurant_completion(&mut machine, &bus, &profile, true);

        assert!(!machine.is_awaiting_subscription());
        assert!(machine.is_fading());
        // The paywall event still fires so the HUD can show a receipt state.
        assert_eq!(
            hud_events.drain(),
            vec![GameEvent::LevelComplete { level: 3 }]
        );
        run_fade_out(&mut machine, &bus, &profile);
        assert_eq!(machine.active_level(), LevelKey::Home);
    }

    #[test]
    fn subscription_signal_without_armed_gate_is_ignored() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        machine.start(&bus, &profile);

        machine.notify_subscribed();
        assert_eq!(machine.active_level(), LevelKey::Park);
        assert!(!machine.is_fading());
    }

    #[test]
    fn final_level_completion_finishes_the_game() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        drive_to_restaurant_completion(&mut machine, &bus, &profile, true);
        run_fade_out(&mut machine, &bus, &profile);
        assert_eq!(machine.active_level(), LevelKey::Home);

        machine.advance(0.1, &complete_input(), &bus, &profile, true);
        assert!(machine.is_finished());
        assert!(!machine.is_fading());
        assert_eq!(machine.active_level(), LevelKey::Home);
    }

    #[test]
    fn teardown_clears_registry_and_stage_of_the_left_level() {
        let bus = EventBus::new();
        let profile = PlayerProfile::default();
        let mut machine = machine();
        machine.start(&bus, &profile);

        machine.advance(0.1, &complete_input(), &bus, &profile, false);
        run_fade_out(&mut machine, &bus, &profile);

        assert_eq!(machine.active_level(), LevelKey::Cafe);
        // The park runtime was torn down behind us.
        let park = machine.runtime_ref(LevelKey::Park);
        assert!(!park.is_loaded);
        assert!(park.registry.is_empty());
        assert_eq!(park.stage.sprite_count(), 0);
    }

    #[test]
    fn level_key_sequence_is_linear() {
        assert_eq!(LevelKey::Park.next(), Some(LevelKey::Cafe));
        assert_eq!(LevelKey::Cafe.next(), Some(LevelKey::Restaurant));
        assert_eq!(LevelKey::Restaurant.next(), Some(LevelKey::Home));
        assert_eq!(LevelKey::Home.next(), None);
        assert_eq!(LevelKey::Park.level_number(), 1);
        assert_eq!(LevelKey::Home.level_number(), 4);
    }
}
