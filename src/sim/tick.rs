//! One command, one tick
//!
//! Order within a tick: contact carried over from the last tick, player
//! intent, firing, timers, projectiles, fish, pickups, population upkeep,
//! resource exhaustion. A terminal world ignores every command.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Simulation;
use super::ai::{self, AiContext};
use super::capability::{Collectible, Damageable, Movable};
use super::combat::{self, Flight};
use super::snapshot::Snapshot;
use super::state::{Projectile, compact};
use crate::catalog::{AttackPolicy, EffectKind, FiringPattern, ItemPayload, ToolId};
use crate::{heading_vec, normalize_angle};

/// Movement part of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    /// Turn by `amount` radians
    Look,
    /// Also what unknown direction strings decode to
    #[default]
    #[serde(other)]
    None,
}

/// Input for a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub fire: bool,
    #[serde(default = "default_amount")]
    pub amount: f32,
    /// Absolute facing to adopt before moving
    #[serde(default)]
    pub aim: Option<f32>,
    /// Tool to equip before firing
    #[serde(default)]
    pub switch_tool: Option<ToolId>,
}

fn default_amount() -> f32 {
    1.0
}

impl Default for Command {
    fn default() -> Self {
        Self {
            direction: Direction::None,
            fire: false,
            amount: default_amount(),
            aim: None,
            switch_tool: None,
        }
    }
}

impl Command {
    pub fn moving(direction: Direction, amount: f32) -> Self {
        Self {
            direction,
            amount,
            ..Default::default()
        }
    }

    pub fn fire() -> Self {
        Self {
            fire: true,
            ..Default::default()
        }
    }
}

impl Simulation {
    /// Advance the world by exactly one tick
    pub fn tick(&mut self, command: &Command) -> Snapshot {
        if self.world.terminal {
            return self.snapshot();
        }
        self.world.tick += 1;
        self.world.impacts.clear();

        // A fish already within reach gets the player regardless of input
        if self.resolve_contacts() {
            return self.snapshot();
        }

        self.apply_intent(command);
        let fired = if command.fire { self.fire() } else { None };
        self.tick_timers(fired);
        self.advance_projectiles();
        if self.advance_fish() {
            return self.snapshot();
        }
        self.advance_pickups();
        self.maintain_populations();
        self.check_exhaustion();
        self.snapshot()
    }

    fn apply_intent(&mut self, command: &Command) {
        if let Some(tool) = command.switch_tool {
            if !self.world.player.equip(tool) {
                log::debug!("ignoring switch to unowned tool {tool:?}");
            }
        }
        if let Some(aim) = command.aim.filter(|a| a.is_finite()) {
            self.world.player.angle = normalize_angle(aim);
        }

        let amount = if command.amount.is_finite() {
            command.amount
        } else {
            0.0
        };
        let max = self.tuning.max_amount;
        let step = amount.clamp(0.0, max);
        let player = &mut self.world.player;
        match command.direction {
            Direction::Forward | Direction::Backward => {
                let sign = if command.direction == Direction::Forward {
                    1.0
                } else {
                    -1.0
                };
                let distance = step * self.tuning.move_speed * player.multiplier(EffectKind::MoveSpeed);
                let delta = heading_vec(player.angle) * distance * sign;
                player.try_move(&self.map, delta);
            }
            Direction::Left => player.turn(-step * self.tuning.turn_speed),
            Direction::Right => player.turn(step * self.tuning.turn_speed),
            Direction::Look => player.turn(amount.clamp(-max, max)),
            Direction::None => {}
        }
    }

    /// Fire the equipped tool if it is ready and loaded
    fn fire(&mut self) -> Option<ToolId> {
        let tool_id = self.world.player.equipped?;
        let Some(tool) = self.catalog.tool(tool_id) else {
            log::warn!("equipped tool {tool_id:?} missing from catalog");
            return None;
        };
        let player = &mut self.world.player;
        if player.cooldown(tool_id) > 0 || player.ammo(tool.ammo) == 0 {
            return None;
        }

        if let Some(pool) = player.ammo.get_mut(&tool.ammo) {
            *pool -= 1;
        }
        let reload = player.multiplier(EffectKind::Reload);
        let cooldown = if tool.cooldown_ticks == 0 {
            0
        } else {
            ((tool.cooldown_ticks as f32 / reload).ceil() as u32).max(1)
        };
        player.cooldowns.insert(tool_id, cooldown);

        let damage = ((tool.damage as f32 * player.multiplier(EffectKind::Damage)).round() as i32).max(1);
        let (origin, facing) = (player.pos, player.angle);
        let (angles, splash): (Vec<f32>, Option<f32>) = match tool.pattern {
            FiringPattern::Single => (vec![facing], None),
            FiringPattern::Spread { pellets, spread } => {
                let angles = if pellets <= 1 {
                    vec![facing]
                } else {
                    let step = spread / (pellets - 1) as f32;
                    (0..pellets)
                        .map(|i| facing - spread / 2.0 + step * i as f32)
                        .collect()
                };
                (angles, None)
            }
            FiringPattern::Splash { radius } => (vec![facing], Some(radius)),
        };
        let (speed, max_range) = (tool.projectile_speed, tool.max_range);

        for angle in angles {
            let id = self.world.next_entity_id();
            self.world.projectiles.push(Projectile {
                id,
                tool: tool_id,
                origin,
                pos: origin,
                angle: normalize_angle(angle),
                speed,
                damage,
                traveled: 0.0,
                max_range,
                splash,
            });
        }
        log::debug!("fired {tool_id:?} (cooldown {cooldown})");
        Some(tool_id)
    }

    /// Count down cooldowns (except the tool fired this tick) and effects
    ///
    /// Skipping the fired tool keeps its full cooldown in this tick's
    /// snapshot, so a tool with `cooldown_ticks = C` fires every `C + 1` ticks.
    fn tick_timers(&mut self, fired: Option<ToolId>) {
        let player = &mut self.world.player;
        for (tool, cd) in player.cooldowns.iter_mut() {
            if Some(*tool) != fired {
                *cd = cd.saturating_sub(1);
            }
        }
        player.cooldowns.retain(|_, cd| *cd > 0);

        for effect in &mut player.effects {
            effect.elapsed_ticks = effect.elapsed_ticks.saturating_add(1);
        }
        player.effects.retain(|e| {
            if e.expired() {
                log::debug!("{:?} effect expired", e.kind);
            }
            !e.expired()
        });
    }

    fn advance_projectiles(&mut self) {
        let hit_radius = self.tuning.hit_radius;
        let world = &mut self.world;
        let mut spent = vec![false; world.projectiles.len()];
        let mut killed = vec![false; world.fish.len()];

        for (i, projectile) in world.projectiles.iter_mut().enumerate() {
            let flight = combat::advance(projectile, &self.map);
            if flight == Flight::Blocked {
                spent[i] = true;
                world.impacts.push(projectile.pos);
                continue;
            }
            let outcome = combat::resolve_projectile(projectile, &mut world.fish, hit_radius);
            if outcome.consumed() {
                spent[i] = true;
                for index in outcome.kills() {
                    killed[index] = true;
                }
            } else if flight == Flight::Spent {
                spent[i] = true;
                world.impacts.push(projectile.pos);
            }
        }
        compact(&mut world.projectiles, &spent);

        let mut drops = Vec::new();
        let mut kills = 0;
        for (fish, _) in world.fish.iter().zip(&killed).filter(|(_, k)| **k) {
            let points = self.catalog.fish(fish.kind).map(|a| a.points).unwrap_or(0);
            world.score = world.score.saturating_add(points);
            kills += 1;
            drops.push(fish.pos);
            log::debug!("fish {} caught for {points} points", fish.id);
        }
        compact(&mut world.fish, &killed);

        for pos in drops {
            if self.rng.random_bool(self.tuning.drop_chance) {
                self.spawn_item(Some(pos));
            }
        }
        for _ in 0..kills {
            self.spawn_fish();
        }
    }

    /// Move every fish, then check who reached the player
    fn advance_fish(&mut self) -> bool {
        let ctx = AiContext {
            player_pos: self.world.player.pos,
            map: &self.map,
            tuning: &self.tuning,
        };
        for fish in &mut self.world.fish {
            fish.bite_cooldown = fish.bite_cooldown.saturating_sub(1);
            let Some(archetype) = self.catalog.fish(fish.kind) else {
                continue;
            };
            ai::step(fish, archetype, &ctx, &mut self.rng);
        }
        self.resolve_contacts()
    }

    /// Apply each fish's attack policy on contact; true once terminal
    fn resolve_contacts(&mut self) -> bool {
        let radius = self.tuning.contact_radius;
        let world = &mut self.world;
        for fish in &mut world.fish {
            if !ai::in_contact(fish, world.player.pos, radius) {
                continue;
            }
            let Some(archetype) = self.catalog.fish(fish.kind) else {
                continue;
            };
            match archetype.attack {
                AttackPolicy::Contact => {
                    log::info!("player caught by fish {} at tick {}", fish.id, world.tick);
                    world.terminal = true;
                }
                AttackPolicy::Bite { cooldown_ticks } => {
                    if fish.bite_cooldown == 0 {
                        world.player.apply_damage(archetype.damage);
                        fish.bite_cooldown = cooldown_ticks;
                        if world.player.health == 0 {
                            log::info!("player bitten to death at tick {}", world.tick);
                            world.terminal = true;
                        }
                    }
                }
            }
            if world.terminal {
                return true;
            }
        }
        false
    }

    /// Expire and collect pickups near the player
    fn advance_pickups(&mut self) {
        let radius = self.tuning.pickup_radius;
        let world = &mut self.world;
        let player_pos = world.player.pos;

        let mut gone = vec![false; world.items.len()];
        for (i, item) in world.items.iter_mut().enumerate() {
            if combat::within(item.position(), player_pos, radius) {
                item.grant(&mut world.player);
                gone[i] = true;
                log::debug!("collected item {} ({:?})", item.id, item.payload);
                continue;
            }
            item.ttl_ticks = item.ttl_ticks.saturating_sub(1);
            gone[i] = item.ttl_ticks == 0;
        }
        compact(&mut world.items, &gone);

        let mut collected = vec![false; world.power_ups.len()];
        for (i, power_up) in world.power_ups.iter().enumerate() {
            if combat::within(power_up.position(), player_pos, radius) {
                power_up.grant(&mut world.player);
                collected[i] = true;
                log::debug!("collected power-up {} ({:?})", power_up.id, power_up.effect);
            }
        }
        let count = collected.iter().filter(|c| **c).count();
        compact(&mut world.power_ups, &collected);
        for _ in 0..count {
            self.spawn_power_up();
        }
    }

    /// Out of primary ammo with no way left to engage anything
    ///
    /// A fish counts as reachable only while some shot can still be made:
    /// any owned tool loaded, ammo lying on the map, or a projectile still in
    /// flight. Fish positions are not considered.
    fn check_exhaustion(&mut self) {
        let world = &self.world;
        let player = &world.player;
        if player.ammo(self.catalog.primary_ammo) > 0 {
            return;
        }
        let armed = player
            .tools
            .iter()
            .filter_map(|t| self.catalog.tool(*t))
            .any(|t| player.ammo(t.ammo) > 0);
        let resupply = world
            .items
            .iter()
            .any(|i| matches!(i.payload, ItemPayload::Ammo { amount, .. } if amount > 0));
        if !armed && !resupply && world.projectiles.is_empty() {
            log::info!("out of ammo at tick {}", world.tick);
            self.world.terminal = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::f32::consts::PI;
    use std::sync::Arc;

    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::{Ammo, Catalog, FishKindId, PowerUpId};
    use crate::map::GridMap;
    use crate::sim::state::{ActiveEffect, Behavior, Fish, ItemPickup, PowerUpPickup};
    use crate::tuning::Tuning;

    /// No ambient spawns, no AI noise
    fn quiet_tuning() -> Tuning {
        Tuning {
            fish_target: 0,
            item_target: 0,
            power_up_target: 0,
            wander_chance: 0.0,
            chase_chance: 0.0,
            chase_jitter: 0.0,
            bounce_jitter: 0.0,
            drop_chance: 0.0,
            ..Default::default()
        }
    }

    fn sim_with(map: GridMap, tuning: Tuning) -> Simulation {
        Simulation::new(Arc::new(map), Arc::new(Catalog::default()), tuning, 42)
    }

    /// 4×4 open interior inside walls
    fn small_sim() -> Simulation {
        sim_with(GridMap::bordered(6, 6).unwrap(), quiet_tuning())
    }

    fn still_fish(id: u32, kind: u16, pos: Vec2, health: i32) -> Fish {
        Fish {
            id,
            kind: FishKindId(kind),
            pos,
            health,
            heading: 0.0,
            behavior: Behavior::Patrol,
            state_timer: 1000,
            bite_cooldown: 0,
        }
    }

    #[test]
    fn test_fire_scenario() {
        let mut sim = small_sim();
        sim.world.player.pos = Vec2::new(1.0, 1.0);
        sim.world.player.angle = 0.0;
        sim.world.player.ammo = BTreeMap::from([(Ammo::Bait, 1)]);
        sim.world.projectiles.clear();

        // Slow shot so it is still in flight after the tick's integration
        let mut catalog = Catalog::default();
        catalog.tools[0].projectile_speed = 0.0001;
        sim.catalog = Arc::new(catalog);

        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.player.ammo[&Ammo::Bait], 0);
        assert_eq!(snap.projectiles.len(), 1);
        let p = &snap.projectiles[0];
        assert_eq!(p.origin, Vec2::new(1.0, 1.0));
        assert!((p.pos - Vec2::new(1.0, 1.0)).length() < 1e-3);
        assert_eq!(p.angle, 0.0);
        assert_eq!(snap.player.cooldown, sim.catalog.tools[0].cooldown_ticks);
    }

    #[test]
    fn test_fire_blocked_by_cooldown_and_empty_pool() {
        let mut sim = small_sim();
        sim.tick(&Command::fire());
        let ammo = sim.world.player.ammo(Ammo::Bait);
        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.player.ammo[&Ammo::Bait], ammo);
        assert_eq!(snap.player.cooldown, sim.catalog.tools[0].cooldown_ticks - 1);

        let mut sim = small_sim();
        sim.world.player.ammo.clear();
        let snap = sim.tick(&Command::fire());
        assert!(snap.projectiles.is_empty());
        assert_eq!(snap.player.cooldown, 0);
    }

    #[test]
    fn test_cooldown_counts_down_to_ready() {
        let mut sim = sim_with(GridMap::bordered(40, 6).unwrap(), quiet_tuning());
        let cd = sim.catalog.tools[0].cooldown_ticks;
        sim.tick(&Command::fire());
        for _ in 0..cd {
            sim.tick(&Command::default());
        }
        assert_eq!(sim.world.player.cooldown(ToolId(0)), 0);
        let before = sim.world.player.ammo(Ammo::Bait);
        sim.tick(&Command::fire());
        assert_eq!(sim.world.player.ammo(Ammo::Bait), before - 1);
    }

    #[test]
    fn test_spread_fans_pellets() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(10.0, 10.0);
        sim.world.player.tools.insert(ToolId(2));
        sim.world.player.ammo.insert(Ammo::Nets, 1);
        let cmd = Command {
            fire: true,
            switch_tool: Some(ToolId(2)),
            ..Default::default()
        };
        let snap = sim.tick(&cmd);
        assert_eq!(snap.projectiles.len(), 5);
        let first = snap.projectiles.first().unwrap().angle;
        let last = snap.projectiles.last().unwrap().angle;
        assert!((last - first - 0.6).abs() < 1e-5);
        assert_eq!(snap.player.equipped, Some(ToolId(2)));
    }

    #[test]
    fn test_switch_to_unowned_tool_still_applies_rest() {
        let mut sim = small_sim();
        sim.world.player.pos = Vec2::new(2.0, 2.0);
        let cmd = Command {
            direction: Direction::Forward,
            amount: 1.0,
            fire: true,
            switch_tool: Some(ToolId(3)),
            ..Default::default()
        };
        let snap = sim.tick(&cmd);
        assert_eq!(snap.player.equipped, Some(ToolId(0)));
        assert!(snap.player.pos.x > 2.0);
        assert_eq!(snap.player.ammo[&Ammo::Bait], 19);
    }

    #[test]
    fn test_rejected_move_keeps_position() {
        let mut sim = small_sim();
        sim.world.player.pos = Vec2::new(4.9, 2.5);
        sim.world.player.angle = 0.0;
        let snap = sim.tick(&Command::moving(Direction::Forward, 1.0));
        assert_eq!(snap.player.pos, Vec2::new(4.9, 2.5));
    }

    #[test]
    fn test_turning_and_look() {
        let mut sim = small_sim();
        let snap = sim.tick(&Command::moving(Direction::Right, 2.0));
        assert!((snap.player.angle - 2.0 * sim.tuning.turn_speed).abs() < 1e-6);
        let snap = sim.tick(&Command::moving(Direction::Look, -0.5));
        assert!((snap.player.angle - (2.0 * sim.tuning.turn_speed - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_contact_ends_session_regardless_of_command() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(10.0, 10.0);
        sim.world.fish = vec![still_fish(100, 0, Vec2::new(10.3, 10.0), 2)];
        let cmd = Command {
            direction: Direction::Backward,
            amount: 5.0,
            fire: true,
            ..Default::default()
        };
        let snap = sim.tick(&cmd);
        assert!(snap.terminal);
        assert_eq!(snap.player.pos, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_terminal_ignores_commands() {
        let mut sim = small_sim();
        sim.world.terminal = true;
        let before = sim.snapshot();
        let after = sim.tick(&Command::moving(Direction::Forward, 1.0));
        assert_eq!(before, after);
        assert_eq!(sim.switch_tool(ToolId(0)), before);
    }

    #[test]
    fn test_bite_policy_hurts_then_kills() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(10.0, 10.0);
        sim.world.player.health = 20;
        // pike: bites for 15 every 30 ticks
        let mut pike = still_fish(100, 1, Vec2::new(10.2, 10.0), 4);
        pike.heading = std::f32::consts::FRAC_PI_2;
        sim.world.fish = vec![pike];
        let mut catalog = Catalog::default();
        catalog.fish[1].speed = 0.0;
        sim.catalog = Arc::new(catalog);

        let snap = sim.tick(&Command::default());
        assert!(!snap.terminal);
        assert_eq!(snap.player.health, 5);
        // the cooldown counts down once per tick, so the next bite lands on tick 30
        for _ in 0..28 {
            let snap = sim.tick(&Command::default());
            assert_eq!(snap.player.health, 5);
        }
        let snap = sim.tick(&Command::default());
        assert_eq!(snap.player.health, 0);
        assert!(snap.terminal);
    }

    #[test]
    fn test_kill_awards_points_and_respawns() {
        let tuning = Tuning {
            fish_target: 1,
            ..quiet_tuning()
        };
        let mut sim = sim_with(GridMap::bordered(30, 10).unwrap(), tuning);
        sim.world.player.pos = Vec2::new(2.0, 5.0);
        sim.world.player.angle = 0.0;
        // speargun: damage 3
        sim.world.player.tools.insert(ToolId(1));
        sim.world.player.ammo.insert(Ammo::Darts, 1);
        let mut catalog = Catalog::default();
        catalog.tools[1].damage = 2;
        for f in &mut catalog.fish {
            f.speed = 0.0;
        }
        sim.catalog = Arc::new(catalog);
        let target = still_fish(100, 2, Vec2::new(2.0 + 0.9, 5.0), 1);
        sim.world.fish = vec![target];
        let points = sim.catalog.fish[2].points;

        let cmd = Command {
            fire: true,
            switch_tool: Some(ToolId(1)),
            ..Default::default()
        };
        let snap = sim.tick(&cmd);
        assert_eq!(snap.score, points);
        assert!(snap.fish.iter().all(|f| f.id != 100));
        assert_eq!(snap.fish.len(), 1, "replacement spawn attempted");
        assert!(snap.projectiles.is_empty());
    }

    #[test]
    fn test_hit_without_kill_reduces_health_by_damage() {
        let mut sim = sim_with(GridMap::bordered(30, 10).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(2.0, 5.0);
        let mut catalog = Catalog::default();
        catalog.fish[0].speed = 0.0;
        sim.catalog = Arc::new(catalog);
        sim.world.fish = vec![still_fish(100, 0, Vec2::new(2.6, 5.0), 5)];
        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.fish[0].health, 4);
        assert_eq!(snap.score, 0);
        assert!(snap.projectiles.is_empty());
    }

    #[test]
    fn test_projectile_removed_at_wall_with_impact() {
        let mut sim = small_sim();
        sim.world.player.pos = Vec2::new(4.5, 2.5);
        let snap = sim.tick(&Command::fire());
        assert!(snap.projectiles.is_empty());
        assert_eq!(snap.impacts, vec![Vec2::new(4.5, 2.5)]);
    }

    #[test]
    fn test_projectile_removed_at_max_range() {
        let mut sim = sim_with(GridMap::bordered(40, 6).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(1.5, 2.5);
        let tool = sim.catalog.tools[0].clone();
        let ticks = (tool.max_range / tool.projectile_speed).ceil() as usize;
        sim.tick(&Command::fire());
        for _ in 1..ticks - 1 {
            assert_eq!(sim.tick(&Command::default()).projectiles.len(), 1);
        }
        let snap = sim.tick(&Command::default());
        assert!(snap.projectiles.is_empty());
        assert_eq!(snap.impacts.len(), 1);
    }

    #[test]
    fn test_power_up_lifecycle() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(10.0, 10.0);
        sim.world.power_ups = vec![PowerUpPickup {
            id: 500,
            power_up: PowerUpId(0),
            pos: Vec2::new(10.2, 10.0),
            effect: EffectKind::MoveSpeed,
            multiplier: 2.0,
            duration_ticks: 3,
            phase: 0.0,
        }];

        let snap = sim.tick(&Command::default());
        assert!(snap.power_ups.iter().all(|p| p.id != 500));
        assert_eq!(sim.world.player.multiplier(EffectKind::MoveSpeed), 2.0);

        // elapsed 1, 2, 3: still active
        for _ in 0..3 {
            sim.tick(&Command::default());
            assert_eq!(sim.world.player.multiplier(EffectKind::MoveSpeed), 2.0);
        }
        // elapsed 4 > duration 3
        sim.tick(&Command::default());
        assert_eq!(sim.world.player.multiplier(EffectKind::MoveSpeed), 1.0);
        assert!(sim.world.player.effects.is_empty());
    }

    #[test]
    fn test_speed_effect_scales_movement() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(5.0, 5.0);
        sim.world.player.add_effect(crate::sim::state::ActiveEffect {
            source: PowerUpId(0),
            kind: EffectKind::MoveSpeed,
            multiplier: 2.0,
            duration_ticks: 10,
            elapsed_ticks: 0,
        });
        let snap = sim.tick(&Command::moving(Direction::Forward, 1.0));
        let expected = 5.0 + 2.0 * sim.tuning.move_speed;
        assert!((snap.player.pos.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_item_pickup_collect_and_expire() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(10.0, 10.0);
        sim.world.items = vec![
            ItemPickup {
                id: 600,
                pos: Vec2::new(10.1, 10.0),
                payload: ItemPayload::Ammo {
                    ammo: Ammo::Darts,
                    amount: 4,
                },
                ttl_ticks: 10,
            },
            ItemPickup {
                id: 601,
                pos: Vec2::new(15.0, 15.0),
                payload: ItemPayload::Tool { tool: ToolId(1) },
                ttl_ticks: 2,
            },
        ];
        let snap = sim.tick(&Command::default());
        assert_eq!(snap.player.ammo[&Ammo::Darts], 4);
        assert_eq!(snap.items.len(), 1);
        assert_eq!(snap.items[0].ttl_ticks, 1);
        let snap = sim.tick(&Command::default());
        assert!(snap.items.is_empty());
        assert!(!snap.player.tools.contains(&ToolId(1)));
    }

    #[test]
    fn test_exhaustion_ends_session() {
        let mut sim = small_sim();
        sim.world.player.ammo.clear();
        let snap = sim.tick(&Command::default());
        assert!(snap.terminal);
    }

    #[test]
    fn test_ammo_on_map_postpones_exhaustion() {
        let mut sim = small_sim();
        sim.world.player.ammo.clear();
        sim.world.player.pos = Vec2::new(1.5, 1.5);
        sim.world.items = vec![ItemPickup {
            id: 700,
            pos: Vec2::new(4.5, 4.5),
            payload: ItemPayload::Ammo {
                ammo: Ammo::Bait,
                amount: 1,
            },
            ttl_ticks: 100,
        }];
        assert!(!sim.tick(&Command::default()).terminal);
    }

    #[test]
    fn test_reset_twice_is_idempotent() {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), Tuning::default());
        for _ in 0..20 {
            sim.tick(&Command {
                direction: Direction::Forward,
                fire: true,
                ..Default::default()
            });
        }
        let a = sim.reset();
        let b = sim.reset();
        assert_eq!(a, b);
        assert_eq!(a.score, 0);
        assert!(!a.terminal);
        assert_eq!(a.tick, 0);
        assert_eq!(a.player.ammo, sim.catalog.loadout.ammo);
        assert_eq!(a.player.equipped, sim.catalog.loadout.equipped);
    }

    #[test]
    fn test_determinism() {
        let map = Arc::new(GridMap::bordered(24, 16).unwrap());
        let catalog = Arc::new(Catalog::default());
        let mut a = Simulation::new(map.clone(), catalog.clone(), Tuning::default(), 99999);
        let mut b = Simulation::new(map, catalog, Tuning::default(), 99999);
        let commands = [
            Command::moving(Direction::Forward, 2.0),
            Command::fire(),
            Command::moving(Direction::Left, 3.0),
            Command::default(),
        ];
        for i in 0..200 {
            let cmd = &commands[i % commands.len()];
            assert_eq!(a.tick(cmd), b.tick(cmd));
        }
    }

    #[test]
    fn test_unknown_direction_decodes_to_none() {
        let cmd: Command = serde_json::from_str(r#"{ "direction": "SIDEWAYS", "fire": true }"#).unwrap();
        assert_eq!(cmd.direction, Direction::None);
        assert!(cmd.fire);
        assert_eq!(cmd.amount, 1.0);
        let cmd: Command = serde_json::from_str(r#"{ "direction": "LOOK", "amount": 0.25 }"#).unwrap();
        assert_eq!(cmd.direction, Direction::Look);
    }

    #[test]
    fn test_huge_aim_is_wrapped() {
        let mut sim = small_sim();
        let cmd: Command = serde_json::from_str(r#"{ "direction": "NONE", "aim": 1e20 }"#).unwrap();
        let snap = sim.tick(&cmd);
        assert_eq!(snap.tick, 1);
        assert!((-PI..PI).contains(&snap.player.angle));
    }

    #[test]
    fn test_held_trigger_fires_every_cooldown_plus_one_ticks() {
        let mut sim = sim_with(GridMap::bordered(40, 6).unwrap(), quiet_tuning());
        let cd = sim.catalog.tools[0].cooldown_ticks as usize;
        let mut fired_at = Vec::new();
        for tick in 1..=3 * (cd + 1) {
            let before = sim.world.player.ammo(Ammo::Bait);
            sim.tick(&Command::fire());
            if sim.world.player.ammo(Ammo::Bait) < before {
                fired_at.push(tick);
            }
        }
        assert_eq!(fired_at, vec![1, cd + 2, 2 * cd + 3]);
    }

    /// Rod with known stats whose shot stays in flight for the tick
    fn slow_shot_sim() -> Simulation {
        let mut sim = sim_with(GridMap::bordered(20, 20).unwrap(), quiet_tuning());
        sim.world.player.pos = Vec2::new(10.0, 10.0);
        let mut catalog = Catalog::default();
        catalog.tools[0].projectile_speed = 0.0001;
        catalog.tools[0].cooldown_ticks = 4;
        catalog.tools[0].damage = 3;
        sim.catalog = Arc::new(catalog);
        sim
    }

    fn effect(kind: EffectKind, multiplier: f32) -> ActiveEffect {
        ActiveEffect {
            source: PowerUpId(0),
            kind,
            multiplier,
            duration_ticks: 10,
            elapsed_ticks: 0,
        }
    }

    #[test]
    fn test_reload_and_damage_effects_scale_shot() {
        let mut sim = slow_shot_sim();
        sim.world.player.add_effect(effect(EffectKind::Reload, 3.0));
        sim.world.player.add_effect(effect(EffectKind::Damage, 1.5));
        let snap = sim.tick(&Command::fire());
        // 4 / 3 rounds up to 2; 3 * 1.5 rounds to 5
        assert_eq!(snap.player.cooldown, 2);
        assert_eq!(snap.projectiles.len(), 1);
        assert_eq!(snap.projectiles[0].damage, 5);
    }

    #[test]
    fn test_weak_effects_keep_minimum_of_one() {
        let mut sim = slow_shot_sim();
        sim.world.player.add_effect(effect(EffectKind::Reload, 100.0));
        sim.world.player.add_effect(effect(EffectKind::Damage, 0.1));
        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.player.cooldown, 1);
        assert_eq!(snap.projectiles[0].damage, 1);
    }

    /// Player at (2, 5) facing a one-hit perch at (2.9, 5), out of pickup range
    fn kill_setup(tuning: Tuning) -> Simulation {
        let mut sim = sim_with(GridMap::bordered(30, 10).unwrap(), tuning);
        sim.world.player.pos = Vec2::new(2.0, 5.0);
        sim.world.player.angle = 0.0;
        let mut catalog = Catalog::default();
        for f in &mut catalog.fish {
            f.speed = 0.0;
        }
        sim.catalog = Arc::new(catalog);
        sim.world.fish = vec![still_fish(100, 0, Vec2::new(2.9, 5.0), 1)];
        sim
    }

    #[test]
    fn test_kill_drops_item_where_fish_died() {
        let mut sim = kill_setup(Tuning {
            drop_chance: 1.0,
            ..quiet_tuning()
        });
        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.score, sim.catalog.fish[0].points);
        assert_eq!(snap.items.len(), 1);
        assert_eq!(snap.items[0].pos, Vec2::new(2.9, 5.0));
        assert!(sim.catalog.drops.iter().any(|d| d.payload == snap.items[0].payload));
    }

    #[test]
    fn test_kill_drop_respects_item_cap() {
        let mut sim = kill_setup(Tuning {
            drop_chance: 1.0,
            item_cap: 2,
            ..quiet_tuning()
        });
        sim.world.items = (0..2)
            .map(|i| ItemPickup {
                id: 800 + i,
                pos: Vec2::new(20.0 + i as f32, 8.0),
                payload: ItemPayload::Tool { tool: ToolId(1) },
                ttl_ticks: 100,
            })
            .collect();
        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.score, sim.catalog.fish[0].points);
        assert_eq!(snap.items.len(), 2);
        assert!(snap.items.iter().all(|i| i.pos.y == 8.0));
    }

    #[test]
    fn test_kill_replacement_respects_fish_cap() {
        let mut sim = kill_setup(Tuning {
            fish_cap: 1,
            ..quiet_tuning()
        });
        sim.world.fish.push(still_fish(101, 0, Vec2::new(25.0, 8.0), 2));
        let snap = sim.tick(&Command::fire());
        assert_eq!(snap.score, sim.catalog.fish[0].points);
        let ids: Vec<u32> = snap.fish.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![101]);
    }

    #[test]
    fn test_top_up_waits_for_spawn_interval() {
        let tuning = Tuning {
            fish_target: 1,
            spawn_interval_ticks: 5,
            ..quiet_tuning()
        };
        let mut sim = sim_with(GridMap::bordered(30, 30).unwrap(), tuning);
        assert_eq!(sim.world.fish.len(), 1);
        sim.world.fish.clear();
        for tick in 1..5 {
            let snap = sim.tick(&Command::default());
            assert!(snap.fish.is_empty(), "spawned early at tick {tick}");
        }
        let snap = sim.tick(&Command::default());
        assert_eq!(snap.fish.len(), 1);
        assert_eq!(sim.world.last_fish_spawn, 5);
    }

    #[test]
    fn test_top_up_stops_at_cap() {
        let tuning = Tuning {
            fish_target: 6,
            fish_cap: 2,
            power_up_target: 5,
            power_up_cap: 1,
            spawn_interval_ticks: 0,
            ..quiet_tuning()
        };
        let mut sim = sim_with(GridMap::bordered(30, 30).unwrap(), tuning);
        for _ in 0..10 {
            let snap = sim.tick(&Command::default());
            assert!(snap.fish.len() <= 2);
            assert!(snap.power_ups.len() <= 1);
        }
        assert_eq!(sim.world.fish.len(), 2);
        assert_eq!(sim.world.power_ups.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_blocked_moves_leave_player_in_place(
            angle in -3.2f32..3.2,
            amount in 0.0f32..5.0,
            backward in any::<bool>(),
        ) {
            let mut sim = small_sim();
            sim.world.player.angle = normalize_angle(angle);
            let start = sim.world.player.pos;
            let dir = if backward { Direction::Backward } else { Direction::Forward };
            let step = amount * sim.tuning.move_speed;
            let sign = if backward { -1.0 } else { 1.0 };
            let target = start + heading_vec(sim.world.player.angle) * step * sign;
            let snap = sim.tick(&Command::moving(dir, amount));
            if sim.map.is_open_at(target) {
                prop_assert!((snap.player.pos - target).length() < 1e-5);
            } else {
                prop_assert_eq!(snap.player.pos, start);
            }
        }
    }
}
