//! Capabilities shared across entity kinds
//!
//! Systems work against these traits instead of poking at concrete fields,
//! so a new entity kind only has to say which capabilities it has.

use glam::Vec2;

use super::state::{Fish, ItemPickup, Player, PowerUpPickup, Projectile};
use crate::catalog::ItemPayload;
use crate::map::GridMap;

/// Something with a position that moves through the grid
pub trait Movable {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, pos: Vec2);

    /// Move by `delta` if the destination is open; otherwise stay put
    fn try_move(&mut self, map: &GridMap, delta: Vec2) -> bool {
        let target = self.position() + delta;
        if map.is_open_at(target) {
            self.set_position(target);
            true
        } else {
            false
        }
    }
}

/// Something with health that can be hurt
pub trait Damageable {
    fn health(&self) -> i32;
    fn health_mut(&mut self) -> &mut i32;

    fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Subtract `damage`; returns true if this blow took health to ≤ 0
    fn apply_damage(&mut self, damage: i32) -> bool {
        let was_alive = self.is_alive();
        let hp = self.health_mut();
        *hp = hp.saturating_sub(damage);
        was_alive && !self.is_alive()
    }
}

/// A world object the player picks up by touching it
pub trait Collectible {
    fn position(&self) -> Vec2;
    /// Hand whatever this object carries to the player
    fn grant(&self, player: &mut Player);
}

impl Movable for Player {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }
}

impl Damageable for Player {
    fn health(&self) -> i32 {
        self.health
    }
    fn health_mut(&mut self) -> &mut i32 {
        &mut self.health
    }

    // Player health never goes negative
    fn apply_damage(&mut self, damage: i32) -> bool {
        let was_alive = self.is_alive();
        self.health = self.health.saturating_sub(damage).max(0);
        was_alive && !self.is_alive()
    }
}

impl Movable for Fish {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }
}

impl Damageable for Fish {
    fn health(&self) -> i32 {
        self.health
    }
    fn health_mut(&mut self) -> &mut i32 {
        &mut self.health
    }
}

impl Movable for Projectile {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }
}

impl Collectible for ItemPickup {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn grant(&self, player: &mut Player) {
        match self.payload {
            ItemPayload::Tool { tool } => {
                player.tools.insert(tool);
                if player.equipped.is_none() {
                    player.equipped = Some(tool);
                }
            }
            ItemPayload::Ammo { ammo, amount } => {
                let pool = player.ammo.entry(ammo).or_insert(0);
                *pool = pool.saturating_add(amount);
            }
        }
    }
}

impl Collectible for PowerUpPickup {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn grant(&self, player: &mut Player) {
        player.add_effect(super::state::ActiveEffect {
            source: self.power_up,
            kind: self.effect,
            multiplier: self.multiplier,
            duration_ticks: self.duration_ticks,
            elapsed_ticks: 0,
        });
    }
}
