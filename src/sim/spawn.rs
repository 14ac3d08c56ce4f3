//! Entity placement and population upkeep
//!
//! Placement is a bounded random search. When every attempt fails it falls
//! back to the nearest acceptable cell center, and gives up (returns `None`)
//! only when the map has no acceptable cell at all.

use glam::Vec2;
use rand::Rng;

use super::ai::{random_heading, roll_timer};
use super::state::{Behavior, Fish, ItemPickup, PowerUpPickup};
use super::Simulation;
use crate::catalog::PowerUpId;
use crate::map::GridMap;

/// Find an open position at least `min_distance` away from `avoid`
pub fn find_spawn_point<R: Rng>(
    map: &GridMap,
    rng: &mut R,
    avoid: Vec2,
    min_distance: f32,
    attempts: u32,
) -> Option<Vec2> {
    let accept = |p: Vec2| p.distance(avoid) >= min_distance;
    let (w, h) = (map.width() as f32, map.height() as f32);
    let mut last = avoid;
    for _ in 0..attempts {
        let candidate = Vec2::new(rng.random_range(0.0..w), rng.random_range(0.0..h));
        if map.is_open_at(candidate) && accept(candidate) {
            return Some(candidate);
        }
        last = candidate;
    }
    map.nearest_open(last, accept)
}

impl Simulation {
    /// Spawn one fish of a weighted-random kind, respecting the population cap
    pub(crate) fn spawn_fish(&mut self) -> bool {
        if self.world.fish.len() >= self.tuning.fish_cap {
            return false;
        }
        let roll = self.rng.random::<f32>();
        let Some(kind) = self.catalog.pick_fish(roll) else {
            return false;
        };
        let Some(archetype) = self.catalog.fish(kind) else {
            return false;
        };
        let health = archetype.health;
        let Some(pos) = find_spawn_point(
            &self.map,
            &mut self.rng,
            self.world.player.pos,
            self.tuning.min_spawn_distance,
            self.tuning.max_spawn_attempts,
        ) else {
            log::warn!("no valid fish spawn point on this map");
            return false;
        };

        let heading = random_heading(&mut self.rng);
        let state_timer = roll_timer(&mut self.rng, self.tuning.patrol_timer);
        let id = self.world.next_entity_id();
        self.world.fish.push(Fish {
            id,
            kind,
            pos,
            health,
            heading,
            behavior: Behavior::Patrol,
            state_timer,
            bite_cooldown: 0,
        });
        self.world.last_fish_spawn = self.world.tick;
        log::debug!("spawned fish {id} ({kind:?}) at {pos}");
        true
    }

    /// Place a random power-up pickup, respecting the cap
    pub(crate) fn spawn_power_up(&mut self) -> bool {
        if self.world.power_ups.len() >= self.tuning.power_up_cap || self.catalog.power_ups.is_empty()
        {
            return false;
        }
        let index = self.rng.random_range(0..self.catalog.power_ups.len());
        let power_up = PowerUpId(index as u16);
        let Some(archetype) = self.catalog.power_up(power_up) else {
            return false;
        };
        let (effect, multiplier, duration_ticks) =
            (archetype.effect, archetype.multiplier, archetype.duration_ticks);
        let Some(pos) = self.pickup_point() else {
            log::warn!("no valid power-up spawn point on this map");
            return false;
        };

        let phase = self.rng.random_range(0.0..std::f32::consts::TAU);
        let id = self.world.next_entity_id();
        self.world.power_ups.push(PowerUpPickup {
            id,
            power_up,
            pos,
            effect,
            multiplier,
            duration_ticks,
            phase,
        });
        self.world.last_power_up_spawn = self.world.tick;
        log::debug!("spawned power-up {id} ({effect:?}) at {pos}");
        true
    }

    /// Place an item pickup from the drop table, at `at` or a random point
    pub(crate) fn spawn_item(&mut self, at: Option<Vec2>) -> bool {
        if self.world.items.len() >= self.tuning.item_cap {
            return false;
        }
        let roll = self.rng.random::<f32>();
        let Some(payload) = self.catalog.pick_drop(roll) else {
            return false;
        };
        let Some(pos) = at.or_else(|| self.pickup_point()) else {
            log::warn!("no valid item spawn point on this map");
            return false;
        };

        let id = self.world.next_entity_id();
        self.world.items.push(ItemPickup {
            id,
            pos,
            payload,
            ttl_ticks: self.tuning.item_lifetime_ticks,
        });
        self.world.last_item_spawn = self.world.tick;
        log::debug!("spawned item {id} ({payload:?}) at {pos}");
        true
    }

    /// Pickups keep out of immediate collection range of the player
    fn pickup_point(&mut self) -> Option<Vec2> {
        find_spawn_point(
            &self.map,
            &mut self.rng,
            self.world.player.pos,
            self.tuning.pickup_radius * 2.0,
            self.tuning.max_spawn_attempts,
        )
    }

    /// Top up each population by at most one entity, throttled per kind
    pub(crate) fn maintain_populations(&mut self) {
        let now = self.world.tick;
        let interval = self.tuning.spawn_interval_ticks;

        if self.world.fish.len() < self.tuning.fish_goal()
            && now.saturating_sub(self.world.last_fish_spawn) >= interval
        {
            self.spawn_fish();
        }
        if self.world.items.len() < self.tuning.item_goal()
            && now.saturating_sub(self.world.last_item_spawn) >= interval
        {
            self.spawn_item(None);
        }
        if self.world.power_ups.len() < self.tuning.power_up_goal()
            && now.saturating_sub(self.world.last_power_up_spawn) >= interval
        {
            self.spawn_power_up();
        }
    }
}
