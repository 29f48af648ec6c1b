use serde::{Deserialize, Serialize};
use tracing::warn;

/// World distance a bottom-origin sprite's approach point is shifted
/// downward so an actor stands in front of it instead of inside it.
pub const BOTTOM_ORIGIN_STAND_OFF: f32 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn distance_to(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        Vec2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u64);

/// RGB highlight color applied to a sprite (hover, selected-target pulse).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint(pub u32);

pub const TINT_HOVER: Tint = Tint(0x00ff00);
pub const TINT_TARGET: Tint = Tint(0xffff00);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpriteOrigin {
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: SpriteId,
    pub debug_name: String,
    pub position: Vec2,
    pub origin: SpriteOrigin,
    pub tint: Option<Tint>,
}

impl Sprite {
    /// Where a moving actor should stop when walking to this sprite.
    pub fn approach_point(&self) -> Vec2 {
        match self.origin {
            SpriteOrigin::Center => self.position,
            SpriteOrigin::Bottom => Vec2 {
                x: self.position.x,
                y: self.position.y + BOTTOM_ORIGIN_STAND_OFF,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MoveTween {
    sprite: SpriteId,
    from: Vec2,
    to: Vec2,
    duration_seconds: f32,
    elapsed_seconds: f32,
}

#[derive(Debug, Default)]
struct SpriteIdAllocator {
    next: u64,
}

impl SpriteIdAllocator {
    fn allocate(&mut self) -> SpriteId {
        let id = SpriteId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Owns every sprite of one scene plus the in-flight movement tweens.
/// Movement duration is `distance / speed`; positions advance only through
/// [`Stage::tick`], so an inactive scene's stage is frozen.
#[derive(Debug, Default)]
pub struct Stage {
    allocator: SpriteIdAllocator,
    sprites: Vec<Sprite>,
    tweens: Vec<MoveTween>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, debug_name: impl Into<String>, position: Vec2) -> SpriteId {
        self.spawn_with_origin(debug_name, position, SpriteOrigin::Center)
    }

    pub fn spawn_with_origin(
        &mut self,
        debug_name: impl Into<String>,
        position: Vec2,
        origin: SpriteOrigin,
    ) -> SpriteId {
        let id = self.allocator.allocate();
        self.sprites.push(Sprite {
            id,
            debug_name: debug_name.into(),
            position,
            origin,
            tint: None,
        });
        id
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|sprite| sprite.id == id)
    }

    pub fn sprite_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|sprite| sprite.id == id)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn set_tint(&mut self, id: SpriteId, tint: Tint) {
        match self.sprite_mut(id) {
            Some(sprite) => sprite.tint = Some(tint),
            None => warn!(sprite_id = id.0, "set_tint on unknown sprite"),
        }
    }

    pub fn clear_tint(&mut self, id: SpriteId) {
        if let Some(sprite) = self.sprite_mut(id) {
            sprite.tint = None;
        }
    }

    /// Starts a linear move. Returns `false` without touching the tween
    /// when the sprite is already moving toward the same target (a repeat
    /// command must not restart the interpolation); a different target
    /// replaces the current tween.
    pub fn start_move(&mut self, id: SpriteId, target: Vec2, speed_units_per_sec: f32) -> bool {
        if speed_units_per_sec <= 0.0 {
            warn!(
                sprite_id = id.0,
                speed = speed_units_per_sec,
                "rejecting move with non-positive speed"
            );
            return false;
        }
        let Some(sprite) = self.sprite(id) else {
            warn!(sprite_id = id.0, "start_move on unknown sprite");
            return false;
        };
        if let Some(existing) = self.tweens.iter().find(|tween| tween.sprite == id) {
            if existing.to == target {
                return false;
            }
        }

        let from = sprite.position;
        let duration_seconds = from.distance_to(target) / speed_units_per_sec;
        self.tweens.retain(|tween| tween.sprite != id);
        self.tweens.push(MoveTween {
            sprite: id,
            from,
            to: target,
            duration_seconds,
            elapsed_seconds: 0.0,
        });
        true
    }

    pub fn is_moving(&self, id: SpriteId) -> bool {
        self.tweens.iter().any(|tween| tween.sprite == id)
    }

    pub fn is_any_moving(&self) -> bool {
        !self.tweens.is_empty()
    }

    pub fn move_target(&self, id: SpriteId) -> Option<Vec2> {
        self.tweens
            .iter()
            .find(|tween| tween.sprite == id)
            .map(|tween| tween.to)
    }

    pub fn cancel_move(&mut self, id: SpriteId) {
        self.tweens.retain(|tween| tween.sprite != id);
    }

    /// Advances all tweens and returns the sprites that arrived this tick,
    /// in tween start order.
    pub fn tick(&mut self, dt_seconds: f32) -> Vec<SpriteId> {
        if dt_seconds <= 0.0 {
            return Vec::new();
        }

        let mut arrivals = Vec::new();
        let mut keep = Vec::with_capacity(self.tweens.len());
        for mut tween in self.tweens.drain(..) {
            tween.elapsed_seconds += dt_seconds;
            let done = tween.duration_seconds <= 0.0
                || tween.elapsed_seconds >= tween.duration_seconds;
            let position = if done {
                tween.to
            } else {
                tween
                    .from
                    .lerp(tween.to, tween.elapsed_seconds / tween.duration_seconds)
            };
            if let Some(sprite) = self.sprites.iter_mut().find(|s| s.id == tween.sprite) {
                sprite.position = position;
            }
            if done {
                arrivals.push(tween.sprite);
            } else {
                keep.push(tween);
            }
        }
        self.tweens = keep;
        arrivals
    }
}
