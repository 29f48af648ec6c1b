//! The one level scene. Every level is this same dispatcher interpreting
//! its own `LevelDef`; nothing here is park- or cafe-specific.

mod chat;
mod dialogue;

use std::collections::HashSet;
use std::mem;

use engine::{
    normalize_target, PlayerProfile, Scene, SceneCommand, SceneContext, SceneInput, SceneOutput,
    Scheduler, SpriteId, SpriteOrigin, Verb, TINT_TARGET,
};
use tracing::{debug, info};

use crate::content::LevelDef;

use chat::ChatTable;
use dialogue::DialogueBox;

const TINT_CLEAR_SECONDS: f32 = 0.5;
const CHAT_HINT: &str = "\n\nPress C to chat with me, or press enter to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneTimer {
    ClearTint(SpriteId),
    Complete,
}

#[derive(Debug, Clone)]
struct PendingMove {
    verb: Verb,
    target_name: String,
    target: SpriteId,
}

pub struct LevelScene {
    def: LevelDef,
    player: Option<SpriteId>,
    npc_name: String,
    pending: Option<PendingMove>,
    steps_completed: u32,
    flags: HashSet<String>,
    dialogue: Option<DialogueBox>,
    in_chat: bool,
    chat: Option<ChatTable>,
    scheduler: Scheduler<SceneTimer>,
    completion_scheduled: bool,
    completion_pending: bool,
    first_move_done: bool,
    output: Vec<SceneOutput>,
}

impl LevelScene {
    pub fn new(def: LevelDef) -> Self {
        let chat = def.chat.as_ref().map(ChatTable::from_def);
        Self {
            def,
            player: None,
            npc_name: String::new(),
            pending: None,
            steps_completed: 0,
            flags: HashSet::new(),
            dialogue: None,
            in_chat: false,
            chat,
            scheduler: Scheduler::new(),
            completion_scheduled: false,
            completion_pending: false,
            first_move_done: false,
            output: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn steps_completed(&self) -> u32 {
        self.steps_completed
    }

    #[cfg(test)]
    pub(crate) fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    #[cfg(test)]
    pub(crate) fn dialogue_text(&self) -> Option<&str> {
        self.dialogue.as_ref().map(|d| d.full_text())
    }

    fn interpolate(&self, text: &str, profile: &PlayerProfile) -> String {
        let pronoun = if self.npc_name == "girl" { "her" } else { "him" };
        text.replace("{language}", &profile.target_language)
            .replace("{npc}", &self.npc_name)
            .replace("{pronoun}", pronoun)
    }

    fn open_dialogue(&mut self, line: String) {
        let finished_instantly = {
            let dialogue = DialogueBox::new(line, self.def.text_speed_chars_per_sec);
            let done = dialogue.is_complete();
            self.dialogue = Some(dialogue);
            done
        };
        if finished_instantly {
            self.announce_dialogue();
        }
    }

    fn announce_dialogue(&mut self) {
        if let Some(dialogue) = &self.dialogue {
            self.output
                .push(SceneOutput::Dialogue(dialogue.full_text().to_string()));
        }
    }

    fn dispatch_command(&mut self, verb: Verb, raw_target: &str, ctx: &mut SceneContext<'_>) {
        let target_name = normalize_target(raw_target).to_string();
        let Some(target) = ctx.registry.lookup(&target_name) else {
            debug!(target = %target_name, "no such object");
            self.output.push(SceneOutput::Feedback { success: false });
            return;
        };
        let Some(player) = self.player else {
            return;
        };

        ctx.stage.set_tint(target, TINT_TARGET);
        self.scheduler
            .schedule(TINT_CLEAR_SECONDS, SceneTimer::ClearTint(target));

        let approach = match ctx.stage.sprite(target) {
            Some(sprite) => sprite.approach_point(),
            None => return,
        };
        let started = ctx.stage.start_move(player, approach, self.def.move_speed);
        match &mut self.pending {
            // Same destination already in flight: keep the tween, adopt
            // the newest verb as the intent on arrival.
            Some(pending) if !started && pending.target == target => {
                pending.verb = verb;
            }
            _ => {
                self.pending = Some(PendingMove {
                    verb,
                    target_name,
                    target,
                });
            }
        }
    }

    fn on_arrival(&mut self, pending: PendingMove, profile: &PlayerProfile) {
        self.output.push(SceneOutput::Feedback { success: true });

        if pending.verb.is_movement() {
            if let Some(first_move) = &self.def.first_move_instruction {
                if !self.first_move_done && first_move.target == pending.target_name {
                    self.first_move_done = true;
                    let text = self.interpolate(&first_move.text, profile);
                    self.output.push(SceneOutput::Instruction(text));
                }
            }
            return;
        }

        if pending.verb.is_conversational() && pending.target_name == self.npc_name {
            self.advance_conversation(profile);
            return;
        }

        self.apply_interaction(&pending, profile);
    }

    fn advance_conversation(&mut self, profile: &PlayerProfile) {
        let step_index = self.steps_completed as usize;
        let (line, instruction) = match self.def.dialogue.steps.get(step_index) {
            Some(step) => {
                let raw = if self.npc_name == "girl" {
                    &step.girl
                } else {
                    &step.boy
                };
                (
                    self.interpolate(raw, profile),
                    step.instruction_after
                        .as_ref()
                        .map(|text| self.interpolate(text, profile)),
                )
            }
            None => (self.def.dialogue.final_line.clone(), None),
        };

        let line = if self.chat.is_some() {
            format!("{line}{CHAT_HINT}")
        } else {
            line
        };
        self.open_dialogue(line);
        self.steps_completed = self.steps_completed.saturating_add(1);
        debug!(steps = self.steps_completed, "conversation advanced");

        if let Some(instruction) = instruction {
            self.output.push(SceneOutput::Instruction(instruction));
        }

        if self.steps_completed >= self.def.required_steps && !self.completion_scheduled {
            self.completion_scheduled = true;
            info!(
                delay = self.def.completion_delay_seconds,
                "conversation goal reached, completion scheduled"
            );
            self.scheduler
                .schedule(self.def.completion_delay_seconds, SceneTimer::Complete);
        }
    }

    fn apply_interaction(&mut self, pending: &PendingMove, profile: &PlayerProfile) {
        let verb_token = pending.verb.as_str();
        let matched = self.def.interactions.iter().find(|interaction| {
            if interaction.verb != verb_token {
                return false;
            }
            if interaction.target == "npc" {
                pending.target_name == self.npc_name
            } else {
                interaction.target == pending.target_name
            }
        });
        let Some(interaction) = matched.cloned() else {
            return;
        };

        if interaction.skip_to_final_step && self.steps_completed < self.def.required_steps {
            self.steps_completed = self.def.required_steps.saturating_sub(1);
            debug!(steps = self.steps_completed, "conversation skipped ahead");
        }
        if let Some(flag) = interaction.set_flag {
            self.flags.insert(flag);
        }
        if let Some(instruction) = interaction.instruction {
            let text = self.interpolate(&instruction, profile);
            self.output.push(SceneOutput::Instruction(text));
        }
    }

    fn update_dialogue(&mut self, input: &SceneInput) {
        if !input.submitted.is_empty() {
            if self.in_chat {
                for submitted in &input.submitted {
                    let response = self
                        .chat
                        .as_ref()
                        .and_then(|chat| chat.respond(&submitted.raw))
                        .map(str::to_string);
                    if let Some(response) = response {
                        self.open_dialogue(response);
                    }
                }
            } else {
                debug!("commands ignored while dialogue is open");
            }
        }

        let complete = self
            .dialogue
            .as_ref()
            .map(|dialogue| dialogue.is_complete())
            .unwrap_or(true);

        if input.begin_chat && !self.in_chat && self.chat.is_some() && complete {
            self.in_chat = true;
            return;
        }

        if input.advance_dialogue {
            if complete {
                self.dialogue = None;
                self.in_chat = false;
            } else if let Some(dialogue) = &mut self.dialogue {
                dialogue.complete_now();
                self.announce_dialogue();
            }
        }
    }
}

impl Scene for LevelScene {
    fn load(&mut self, ctx: &mut SceneContext<'_>) {
        self.player = None;
        self.pending = None;
        self.steps_completed = 0;
        self.flags.clear();
        self.dialogue = None;
        self.in_chat = false;
        self.completion_scheduled = false;
        self.completion_pending = false;
        self.first_move_done = false;
        self.scheduler.cancel_all();
        self.output.clear();

        info!(title = %self.def.title, "loading level");
        self.player = Some(ctx.stage.spawn("player", self.def.player_spawn));
        self.npc_name = ctx.profile.npc_name().to_string();

        for placement in &self.def.placements {
            let origin = if placement.bottom_origin {
                SpriteOrigin::Bottom
            } else {
                SpriteOrigin::Center
            };
            let name = if placement.npc {
                self.npc_name.clone()
            } else {
                placement.name.clone().unwrap_or_default()
            };
            let id = ctx
                .stage
                .spawn_with_origin(name.clone(), placement.position, origin);
            ctx.registry.register(name, id);
        }

        self.output
            .push(SceneOutput::Instruction(self.def.title.clone()));
        let instruction = self.interpolate(&self.def.initial_instruction, ctx.profile);
        self.output.push(SceneOutput::Instruction(instruction));
    }

    fn update(
        &mut self,
        dt_seconds: f32,
        input: &SceneInput,
        ctx: &mut SceneContext<'_>,
    ) -> SceneCommand {
        let mut command = SceneCommand::None;

        for fired in self.scheduler.tick(dt_seconds) {
            match fired {
                SceneTimer::ClearTint(id) => ctx.stage.clear_tint(id),
                SceneTimer::Complete => {
                    if self.dialogue.is_some() {
                        // Don't yank the level away mid-conversation.
                        self.completion_pending = true;
                    } else {
                        command = SceneCommand::CompleteLevel;
                    }
                }
            }
        }

        if self.dialogue.is_some() {
            if let Some(dialogue) = &mut self.dialogue {
                if dialogue.tick(dt_seconds) {
                    self.announce_dialogue();
                }
            }
            self.update_dialogue(input);
            if self.dialogue.is_none() && self.completion_pending {
                self.completion_pending = false;
                command = SceneCommand::CompleteLevel;
            }
        } else {
            for submitted in &input.submitted {
                match &submitted.parsed {
                    Some(parsed) => {
                        let verb = parsed.verb;
                        let target = parsed.target.clone();
                        self.dispatch_command(verb, &target, ctx);
                    }
                    None => debug!(raw = %submitted.raw, "could not parse command"),
                }
            }
        }

        let arrivals = ctx.stage.tick(dt_seconds);
        if let (Some(player), Some(pending)) = (self.player, self.pending.as_ref()) {
            if arrivals.contains(&player) {
                let pending = pending.clone();
                self.pending = None;
                self.on_arrival(pending, ctx.profile);
            }
        }

        command
    }

    fn unload(&mut self, _ctx: &mut SceneContext<'_>) {
        self.scheduler.cancel_all();
        self.pending = None;
        self.dialogue = None;
        self.in_chat = false;
        self.output.clear();
        info!(title = %self.def.title, "level unloaded");
    }

    fn drain_output(&mut self) -> Vec<SceneOutput> {
        mem::take(&mut self.output)
    }

    fn is_dialogue_open(&self) -> bool {
        self.dialogue.is_some()
    }

    fn is_idle(&self) -> bool {
        let reveal_done = self
            .dialogue
            .as_ref()
            .map(|dialogue| dialogue.is_complete())
            .unwrap_or(true);
        self.scheduler.pending_count() == 0 && reveal_done
    }
}
