//! Immutable view of the world handed across the boundary

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{ActiveEffect, Behavior, ItemPickup, PowerUpPickup, Projectile, WorldState};
use crate::catalog::{Ammo, FishKindId, ToolId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub angle: f32,
    pub health: i32,
    pub ammo: BTreeMap<Ammo, u32>,
    pub equipped: Option<ToolId>,
    pub tools: Vec<ToolId>,
    /// Cooldown of the equipped tool
    pub cooldown: u32,
    pub cooldowns: BTreeMap<ToolId, u32>,
    pub effects: Vec<ActiveEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishView {
    pub id: u32,
    pub kind: FishKindId,
    pub pos: Vec2,
    pub health: i32,
    pub behavior: Behavior,
}

/// Everything a client needs to draw one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u64,
    pub terminal: bool,
    pub player: PlayerView,
    pub fish: Vec<FishView>,
    pub projectiles: Vec<Projectile>,
    pub items: Vec<ItemPickup>,
    pub power_ups: Vec<PowerUpPickup>,
    pub impacts: Vec<Vec2>,
}

impl Snapshot {
    pub fn capture(world: &WorldState) -> Self {
        let p = &world.player;
        Self {
            tick: world.tick,
            score: world.score,
            terminal: world.terminal,
            player: PlayerView {
                pos: p.pos,
                angle: p.angle,
                health: p.health,
                ammo: p.ammo.clone(),
                equipped: p.equipped,
                tools: p.tools.iter().copied().collect(),
                cooldown: p.equipped.map(|t| p.cooldown(t)).unwrap_or(0),
                cooldowns: p.cooldowns.clone(),
                effects: p.effects.clone(),
            },
            fish: world
                .fish
                .iter()
                .map(|f| FishView {
                    id: f.id,
                    kind: f.kind,
                    pos: f.pos,
                    health: f.health,
                    behavior: f.behavior,
                })
                .collect(),
            projectiles: world.projectiles.clone(),
            items: world.items.clone(),
            power_ups: world.power_ups.clone(),
            impacts: world.impacts.clone(),
        }
    }
}
