//! Level definitions. Each level ships as an embedded JSON document and is
//! validated once at startup; everything the shared level scene does is
//! driven by these definitions.

use engine::{LevelKey, Vec2, Verb};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const PARK_JSON: &str = include_str!("levels/park.json");
const CAFE_JSON: &str = include_str!("levels/cafe.json");
const RESTAURANT_JSON: &str = include_str!("levels/restaurant.json");
const HOME_JSON: &str = include_str!("levels/home.json");

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse level definition {level}: {source}")]
    Parse {
        level: &'static str,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("level {level}: duplicate placement name {name:?}")]
    DuplicatePlacement { level: &'static str, name: String },
    #[error("level {level}: placement {index} must have a name or be the npc, not both or neither")]
    AmbiguousPlacement { level: &'static str, index: usize },
    #[error("level {level}: dialogue present but no npc placement")]
    MissingNpc { level: &'static str },
    #[error("level {level}: more than one npc placement")]
    MultipleNpcs { level: &'static str },
    #[error("level {level}: dialogue has no steps")]
    EmptyDialogue { level: &'static str },
    #[error("level {level}: {field} must be positive")]
    NonPositive {
        level: &'static str,
        field: &'static str,
    },
    #[error("level {level}: interaction {index} uses unknown verb {verb:?}")]
    UnknownVerb {
        level: &'static str,
        index: usize,
        verb: String,
    },
    #[error("level {level}: chat entry {index} has an empty keyword")]
    EmptyChatKeyword { level: &'static str, index: usize },
    #[error("level {level}: document declares key {found:?}")]
    KeyMismatch {
        level: &'static str,
        found: LevelKey,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub npc: bool,
    pub position: Vec2,
    #[serde(default)]
    pub bottom_origin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogueStepDef {
    pub girl: String,
    pub boy: String,
    #[serde(default)]
    pub instruction_after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogueDef {
    pub steps: Vec<DialogueStepDef>,
    pub final_line: String,
}

/// Scripted effect for a non-conversational verb landing on a target.
/// `target: "npc"` refers to the level's NPC whatever its resolved name.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionDef {
    pub target: String,
    pub verb: String,
    #[serde(default)]
    pub skip_to_final_step: bool,
    #[serde(default)]
    pub set_flag: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirstMoveDef {
    pub target: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatDef {
    pub responses: Vec<(String, String)>,
    pub default_response: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelDef {
    pub key: LevelKey,
    pub title: String,
    pub initial_instruction: String,
    pub player_spawn: Vec2,
    pub move_speed: f32,
    pub text_speed_chars_per_sec: f32,
    pub required_steps: u32,
    pub completion_delay_seconds: f32,
    pub placements: Vec<PlacementDef>,
    #[serde(default)]
    pub first_move_instruction: Option<FirstMoveDef>,
    pub dialogue: DialogueDef,
    #[serde(default)]
    pub interactions: Vec<InteractionDef>,
    #[serde(default)]
    pub chat: Option<ChatDef>,
}

impl LevelDef {
    fn validate(&self, level: &'static str) -> Result<(), ContentError> {
        let mut seen = Vec::new();
        let mut npc_count = 0usize;
        for (index, placement) in self.placements.iter().enumerate() {
            match (&placement.name, placement.npc) {
                (Some(name), false) => {
                    if seen.contains(&name.as_str()) {
                        return Err(ContentError::DuplicatePlacement {
                            level,
                            name: name.clone(),
                        });
                    }
                    seen.push(name.as_str());
                }
                (None, true) => npc_count += 1,
                _ => return Err(ContentError::AmbiguousPlacement { level, index }),
            }
        }
        if npc_count == 0 {
            return Err(ContentError::MissingNpc { level });
        }
        if npc_count > 1 {
            return Err(ContentError::MultipleNpcs { level });
        }

        if self.dialogue.steps.is_empty() {
            return Err(ContentError::EmptyDialogue { level });
        }
        if self.move_speed <= 0.0 {
            return Err(ContentError::NonPositive {
                level,
                field: "move_speed",
            });
        }
        if self.text_speed_chars_per_sec <= 0.0 {
            return Err(ContentError::NonPositive {
                level,
                field: "text_speed_chars_per_sec",
            });
        }
        if self.required_steps == 0 {
            return Err(ContentError::NonPositive {
                level,
                field: "required_steps",
            });
        }
        if self.completion_delay_seconds <= 0.0 {
            return Err(ContentError::NonPositive {
                level,
                field: "completion_delay_seconds",
            });
        }

        for (index, interaction) in self.interactions.iter().enumerate() {
            if Verb::from_token(&interaction.verb).is_none() {
                return Err(ContentError::UnknownVerb {
                    level,
                    index,
                    verb: interaction.verb.clone(),
                });
            }
        }

        if let Some(chat) = &self.chat {
            for (index, (keyword, _)) in chat.responses.iter().enumerate() {
                if keyword.trim().is_empty() {
                    return Err(ContentError::EmptyChatKeyword { level, index });
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LevelDefs {
    pub park: LevelDef,
    pub cafe: LevelDef,
    pub restaurant: LevelDef,
    pub home: LevelDef,
}

pub fn load_level_defs() -> Result<LevelDefs, ContentError> {
    let defs = LevelDefs {
        park: parse_level(LevelKey::Park, PARK_JSON)?,
        cafe: parse_level(LevelKey::Cafe, CAFE_JSON)?,
        restaurant: parse_level(LevelKey::Restaurant, RESTAURANT_JSON)?,
        home: parse_level(LevelKey::Home, HOME_JSON)?,
    };
    info!("level definitions loaded");
    Ok(defs)
}

fn parse_level(expected: LevelKey, json: &str) -> Result<LevelDef, ContentError> {
    let level = expected.as_str();
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let def: LevelDef = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|source| ContentError::Parse { level, source })?;
    if def.key != expected {
        return Err(ContentError::KeyMismatch {
            level,
            found: def.key,
        });
    }
    def.validate(level)?;
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_shipped_levels_parse_and_validate() {
        let defs = load_level_defs().expect("level defs");
        assert_eq!(defs.park.key, LevelKey::Park);
        assert_eq!(defs.cafe.key, LevelKey::Cafe);
        assert_eq!(defs.restaurant.key, LevelKey::Restaurant);
        assert_eq!(defs.home.key, LevelKey::Home);
    }

    #[test]
    fn every_level_has_exactly_one_npc() {
        let defs = load_level_defs().expect("level defs");
        for def in [&defs.park, &defs.cafe, &defs.restaurant, &defs.home] {
            assert_eq!(
                def.placements.iter().filter(|p| p.npc).count(),
                1,
                "level {:?}",
                def.key
            );
        }
    }

    #[test]
    fn only_the_park_ships_a_chat_table() {
        let defs = load_level_defs().expect("level defs");
        assert!(defs.park.chat.is_some());
        assert!(defs.cafe.chat.is_none());
        assert!(defs.restaurant.chat.is_none());
        assert!(defs.home.chat.is_none());
    }

    #[test]
    fn park_matches_the_shipped_tutorial_content() {
        let defs = load_level_defs().expect("level defs");
        let park = &defs.park;
        assert_eq!(park.required_steps, 3);
        assert_eq!(park.completion_delay_seconds, 10.0);
        assert_eq!(park.move_speed, 200.0);
        assert!(park
            .placements
            .iter()
            .any(|p| p.name.as_deref() == Some("tree")));
        let first_move = park.first_move_instruction.as_ref().expect("first move");
        assert_eq!(first_move.target, "tree");
    }

    #[test]
    fn duplicate_placement_names_are_rejected() {
        let json = r#"{
            "key": "park",
            "title": "t",
            "initial_instruction": "i",
            "player_spawn": { "x": 0.0, "y": 0.0 },
            "move_speed": 200.0,
            "text_speed_chars_per_sec": 33.0,
            "required_steps": 3,
            "completion_delay_seconds": 5.0,
            "placements": [
                { "name": "tree", "position": { "x": 0.0, "y": 0.0 } },
                { "name": "tree", "position": { "x": 1.0, "y": 1.0 } },
                { "npc": true, "position": { "x": 2.0, "y": 2.0 } }
            ],
            "dialogue": { "steps": [{ "girl": "g", "boy": "b" }], "final_line": "f" }
        }"#;
        let error = parse_level(LevelKey::Park, json)
            .expect_err("duplicate should fail");
        assert!(matches!(error, ContentError::DuplicatePlacement { .. }));
    }

    #[test]
    fn missing_npc_is_rejected() {
        let json = r#"{
            "key": "cafe",
            "title": "t",
            "initial_instruction": "i",
            "player_spawn": { "x": 0.0, "y": 0.0 },
            "move_speed": 200.0,
            "text_speed_chars_per_sec": 33.0,
            "required_steps": 3,
            "completion_delay_seconds": 5.0,
            "placements": [
                { "name": "tree", "position": { "x": 0.0, "y": 0.0 } }
            ],
            "dialogue": { "steps": [{ "girl": "g", "boy": "b" }], "final_line": "f" }
        }"#;
        let error = parse_level(LevelKey::Cafe, json)
            .expect_err("missing npc should fail");
        assert!(matches!(error, ContentError::MissingNpc { .. }));
    }

    #[test]
    fn unknown_interaction_verb_is_rejected() {
        let json = r#"{
            "key": "home",
            "title": "t",
            "initial_instruction": "i",
            "player_spawn": { "x": 0.0, "y": 0.0 },
            "move_speed": 200.0,
            "text_speed_chars_per_sec": 33.0,
            "required_steps": 3,
            "completion_delay_seconds": 5.0,
            "placements": [
                { "npc": true, "position": { "x": 0.0, "y": 0.0 } }
            ],
            "dialogue": { "steps": [{ "girl": "g", "boy": "b" }], "final_line": "f" },
            "interactions": [
                { "target": "npc", "verb": "dance" }
            ]
        }"#;
        let error = parse_level(LevelKey::Home, json)
            .expect_err("unknown verb should fail");
        assert!(matches!(error, ContentError::UnknownVerb { .. }));
    }

    #[test]
    fn mismatched_level_key_is_rejected() {
        let json = r#"{
            "key": "home",
            "title": "t",
            "initial_instruction": "i",
            "player_spawn": { "x": 0.0, "y": 0.0 },
            "move_speed": 200.0,
            "text_speed_chars_per_sec": 33.0,
            "required_steps": 3,
            "completion_delay_seconds": 5.0,
            "placements": [
                { "npc": true, "position": { "x": 0.0, "y": 0.0 } }
            ],
            "dialogue": { "steps": [{ "girl": "g", "boy": "b" }], "final_line": "f" }
        }"#;
        let error = parse_level(LevelKey::Park, json).expect_err("key mismatch should fail");
        assert!(matches!(error, ContentError::KeyMismatch { .. }));
    }

    #[test]
    fn parse_errors_carry_the_json_path() {
        let error = parse_level(LevelKey::Park, r#"{ "key": "park", "title": 3 }"#)
            .expect_err("bad type should fail");
        let rendered = error.to_string();
        assert!(rendered.contains("title"), "got: {rendered}");
    }
}
