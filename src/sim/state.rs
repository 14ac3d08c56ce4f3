//! World state and core simulation types
//!
//! Everything the simulation mutates lives here. Archetype data is looked up
//! in the catalog by id and never copied into live entities beyond what the
//! entity needs to act on its own.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::catalog::{Ammo, EffectKind, FishKindId, ItemPayload, Loadout, PowerUpId, ToolId};
use crate::normalize_angle;

/// Fish behavior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Patrol,
    Chase,
}

/// A time-limited multiplier on one player attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub source: PowerUpId,
    pub kind: EffectKind,
    pub multiplier: f32,
    pub duration_ticks: u32,
    /// Ticks since collection; the effect ends once this exceeds the duration
    pub elapsed_ticks: u32,
}

impl ActiveEffect {
    pub fn remaining_ticks(&self) -> u32 {
        self.duration_ticks.saturating_sub(self.elapsed_ticks)
    }

    pub fn expired(&self) -> bool {
        self.elapsed_ticks > self.duration_ticks
    }
}

/// The player avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Facing (radians, kept in [-π, π))
    pub angle: f32,
    pub health: i32,
    pub ammo: BTreeMap<Ammo, u32>,
    pub equipped: Option<ToolId>,
    pub tools: BTreeSet<ToolId>,
    /// Ticks until each tool may fire again (absent = ready)
    pub cooldowns: BTreeMap<ToolId, u32>,
    pub effects: Vec<ActiveEffect>,
}

impl Player {
    pub fn from_loadout(loadout: &Loadout, pos: Vec2) -> Self {
        Self {
            pos,
            angle: 0.0,
            health: loadout.health.max(0),
            ammo: loadout.ammo.clone(),
            equipped: loadout.equipped,
            tools: loadout.tools.iter().copied().collect(),
            cooldowns: BTreeMap::new(),
            effects: Vec::new(),
        }
    }

    pub fn ammo(&self, kind: Ammo) -> u32 {
        self.ammo.get(&kind).copied().unwrap_or(0)
    }

    pub fn cooldown(&self, tool: ToolId) -> u32 {
        self.cooldowns.get(&tool).copied().unwrap_or(0)
    }

    pub fn owns(&self, tool: ToolId) -> bool {
        self.tools.contains(&tool)
    }

    /// Equip an owned tool; returns false (and changes nothing) otherwise
    pub fn equip(&mut self, tool: ToolId) -> bool {
        if self.owns(tool) {
            self.equipped = Some(tool);
            true
        } else {
            false
        }
    }

    /// Current multiplier for an attribute (1.0 when no effect is active)
    pub fn multiplier(&self, kind: EffectKind) -> f32 {
        self.effects
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.multiplier)
            .unwrap_or(1.0)
    }

    /// Add an effect, replacing any active effect of the same kind
    pub fn add_effect(&mut self, effect: ActiveEffect) {
        self.effects.retain(|e| e.kind != effect.kind);
        self.effects.push(effect);
    }

    pub fn turn(&mut self, delta: f32) {
        self.angle = normalize_angle(self.angle + delta);
    }
}

/// A live fish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fish {
    pub id: u32,
    pub kind: FishKindId,
    pub pos: Vec2,
    pub health: i32,
    /// Movement direction (radians)
    pub heading: f32,
    pub behavior: Behavior,
    /// Ticks until the behavior is re-evaluated
    pub state_timer: u32,
    /// Ticks until this fish may bite again
    #[serde(default)]
    pub bite_cooldown: u32,
}

/// A player-fired projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub tool: ToolId,
    pub origin: Vec2,
    pub pos: Vec2,
    pub angle: f32,
    /// Distance per tick
    pub speed: f32,
    pub damage: i32,
    /// Distance traveled so far
    pub traveled: f32,
    pub max_range: f32,
    pub splash: Option<f32>,
}

/// A power-up lying in the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpPickup {
    pub id: u32,
    pub power_up: PowerUpId,
    pub pos: Vec2,
    pub effect: EffectKind,
    pub multiplier: f32,
    pub duration_ticks: u32,
    /// Bobbing phase for clients, no gameplay meaning
    pub phase: f32,
}

/// A tool or ammo pickup lying in the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPickup {
    pub id: u32,
    pub pos: Vec2,
    pub payload: ItemPayload,
    pub ttl_ticks: u32,
}

/// Complete world state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Ticks advanced since the session started
    pub tick: u64,
    pub score: u64,
    /// One-way flag; only a reset clears it
    pub terminal: bool,
    pub player: Player,
    /// Live fish, in spawn order
    pub fish: Vec<Fish>,
    pub projectiles: Vec<Projectile>,
    pub power_ups: Vec<PowerUpPickup>,
    pub items: Vec<ItemPickup>,
    /// Where projectiles died this tick (cosmetic)
    pub impacts: Vec<Vec2>,
    pub last_fish_spawn: u64,
    pub last_item_spawn: u64,
    pub last_power_up_spawn: u64,
    /// Next entity ID
    next_id: u32,
}

impl WorldState {
    /// Empty world with a freshly equipped player
    pub fn new(loadout: &Loadout, spawn: Vec2) -> Self {
        Self {
            tick: 0,
            score: 0,
            terminal: false,
            player: Player::from_loadout(loadout, spawn),
            fish: Vec::new(),
            projectiles: Vec::new(),
            power_ups: Vec::new(),
            items: Vec::new(),
            impacts: Vec::new(),
            last_fish_spawn: 0,
            last_item_spawn: 0,
            last_power_up_spawn: 0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Drop the entries flagged in `remove`, keeping the rest in order
pub(crate) fn compact<T>(items: &mut Vec<T>, remove: &[bool]) {
    let mut idx = 0;
    items.retain(|_| {
        let keep = !remove.get(idx).copied().unwrap_or(false);
        idx += 1;
        keep
    });
}
