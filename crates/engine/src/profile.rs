use serde::{Deserialize, Serialize};

/// Which companion the player is looking for; decides the NPC variant
/// every level spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seeks {
    Boyfriend,
    Girlfriend,
}

/// Player preferences supplied by the hosting shell at game construction.
/// Passed explicitly into scene loading instead of living on a global
/// registry; never revalidated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub seeks: Seeks,
    pub target_language: String,
}

impl PlayerProfile {
    pub fn new(seeks: Seeks, target_language: impl Into<String>) -> Self {
        Self {
            seeks,
            target_language: target_language.into(),
        }
    }

    /// The registry name the companion NPC is spawned under.
    pub fn npc_name(&self) -> &'static str {
        match self.seeks {
            Seeks::Boyfriend => "boy",
            Seeks::Girlfriend => "girl",
        }
    }
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::new(Seeks::Girlfriend, "Spanish")
    }
}
