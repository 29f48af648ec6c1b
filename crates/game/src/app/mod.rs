pub mod bootstrap;
pub mod gameplay;
pub mod hud;

use std::mem;

use engine::{
    EventBus, GameEvent, LevelKey, PlayerProfile, SceneInput, SceneMachine, SceneOutput,
    StorageError, Subscription, SubscriptionStore, Verb,
};
use tracing::{debug, info};

use crate::content::LevelDefs;

use gameplay::LevelScene;
use hud::{Hud, UnavailableSpeech};

const FEEDBACK_SUCCESS: &str = "Great job! That was correct.";
const FEEDBACK_FAILURE: &str = "Not quite right.";
const PAYWALL_PROMPT: &str =
    "Unlock Level 4: subscribe to continue the story. (type \"subscribe\" or \"later\")";
const FINISHED_LINE: &str = "The end. Thanks for playing!";

/// Ties the whole game together: the bus, the level machine, the HUD model,
/// and the subscription store. The shell talks only to this type.
pub struct Game {
    bus: EventBus,
    inbox: Subscription,
    machine: SceneMachine,
    hud: Hud,
    store: SubscriptionStore,
    profile: PlayerProfile,
    pending_input: SceneInput,
    started: bool,
    paywall_announced: bool,
    finish_announced: bool,
    output: Vec<String>,
}

impl Game {
    pub fn new(defs: LevelDefs, profile: PlayerProfile, store: SubscriptionStore) -> Self {
        let bus = EventBus::new();
        let inbox = bus.subscribe();
        let machine = SceneMachine::new(
            Box::new(LevelScene::new(defs.park)),
            Box::new(LevelScene::new(defs.cafe)),
            Box::new(LevelScene::new(defs.restaurant)),
            Box::new(LevelScene::new(defs.home)),
        );
        let hud = Hud::new(bus.clone(), Box::new(UnavailableSpeech));
        info!(seeks = ?profile.seeks, language = %profile.target_language, "game constructed");
        Self {
            bus,
            inbox,
            machine,
            hud,
            store,
            profile,
            pending_input: SceneInput::empty(),
            started: false,
            paywall_announced: false,
            finish_announced: false,
            output: Vec::new(),
        }
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut Hud {
        &mut self.hud
    }

    pub fn active_level(&self) -> LevelKey {
        self.machine.active_level()
    }

    pub fn is_dialogue_open(&self) -> bool {
        self.machine.is_dialogue_open()
    }

    pub fn is_paywall_open(&self) -> bool {
        self.hud.is_paywall_open()
    }

    pub fn is_finished(&self) -> bool {
        self.machine.is_finished()
    }

    pub fn submit_command(&mut self, line: &str) {
        self.hud.set_draft(line);
        self.submit_draft();
    }

    /// Publishes whatever the HUD draft currently holds.
    pub fn submit_draft(&mut self) {
        let draft = self.hud.draft().to_string();
        self.hud.submit(&draft);
    }

    /// Simulates a click on a stage object: a registered name lands in the
    /// HUD draft through the bus, an unknown name does nothing.
    pub fn click_object(&mut self, name: &str) {
        if let Some(event) = self.machine.active_registry().click(name) {
            self.bus.publish(event);
        }
    }

    /// Simulates a verb button press.
    pub fn click_verb(&mut self, verb: Verb) {
        self.bus.publish(GameEvent::VerbClicked { verb });
    }

    pub fn advance_dialogue(&mut self) {
        self.pending_input.advance_dialogue = true;
    }

    pub fn begin_chat(&mut self) {
        self.pending_input.begin_chat = true;
    }

    pub fn subscribe(&mut self) -> Result<(), StorageError> {
        self.hud.subscribe(&self.store)
    }

    pub fn dismiss_paywall(&mut self) {
        self.hud.dismiss_paywall();
    }

    /// Nothing left to do without fresh player input.
    pub fn is_settled(&self) -> bool {
        self.machine.is_settled()
            && self.inbox.pending() == 0
            && self.pending_input == SceneInput::empty()
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        if !self.started {
            self.started = true;
            self.machine.start(&self.bus, &self.profile);
        }

        let subscribed = self.store.is_subscribed();
        self.route_events(subscribed);
        let input = mem::take(&mut self.pending_input);

        self.machine
            .advance(dt_seconds, &input, &self.bus, &self.profile, subscribed);

        // Events published during the advance (level completion above all)
        // must reach the HUD before the shell decides we're settled.
        self.route_events(subscribed);
        self.collect_output();
    }

    pub fn drain_output(&mut self) -> Vec<String> {
        mem::take(&mut self.output)
    }

    fn route_events(&mut self, subscribed: bool) {
        for event in self.inbox.drain() {
            match event {
                GameEvent::CommandSubmitted { command } => {
                    self.pending_input = mem::take(&mut self.pending_input).with_command(command);
                }
                GameEvent::UserSubscribed => self.machine.notify_subscribed(),
                GameEvent::ObjectClicked { object_name } => self.hud.object_clicked(&object_name),
                GameEvent::VerbClicked { verb } => self.hud.verb_clicked(verb),
                GameEvent::LevelComplete { level } => {
                    self.hud.on_level_complete(level, subscribed)
                }
            }
        }
    }

    fn collect_output(&mut self) {
        for line in self.machine.drain_output() {
            match line {
                SceneOutput::Feedback { success: true } => {
                    self.output.push(FEEDBACK_SUCCESS.to_string())
                }
                SceneOutput::Feedback { success: false } => {
                    self.output.push(FEEDBACK_FAILURE.to_string())
                }
                SceneOutput::Instruction(text) => self.output.push(text),
                SceneOutput::Dialogue(text) => self.output.push(format!("\u{201c}{text}\u{201d}")),
            }
        }

        if let Some(feedback) = self.hud.take_feedback() {
            debug!(success = feedback.success, message = %feedback.message, "hud feedback");
            self.output.push(feedback.message);
        }

        if self.hud.is_paywall_open() {
            if !self.paywall_announced {
                self.paywall_announced = true;
                self.output.push(PAYWALL_PROMPT.to_string());
            }
        } else {
            self.paywall_announced = false;
        }

        if self.machine.is_finished() && !self.finish_announced {
            self.finish_announced = true;
            self.output.push(FINISHED_LINE.to_string());
        }
    }
}
