//! Fish behavior: a two-state patrol/chase machine
//!
//! Each tick a fish counts down its state timer, re-evaluates its behavior
//! when the timer runs out, picks a desired velocity, and tries to move. A
//! fish that runs into a wall turns around and goes back to patrolling.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::capability::Movable;
use super::state::{Behavior, Fish};
use crate::catalog::FishArchetype;
use crate::map::GridMap;
use crate::tuning::{TickRange, Tuning};
use crate::{heading_vec, normalize_angle};

/// What a fish can see this tick
pub struct AiContext<'a> {
    pub player_pos: Vec2,
    pub map: &'a GridMap,
    pub tuning: &'a Tuning,
}

/// Advance one fish by one tick
pub fn step<R: Rng>(fish: &mut Fish, archetype: &FishArchetype, ctx: &AiContext, rng: &mut R) {
    update_behavior(fish, ctx, rng);
    let velocity = desired_velocity(fish, archetype, ctx, rng);
    if !fish.try_move(ctx.map, velocity) {
        bounce(fish, ctx.tuning, rng);
    }
}

/// Count down the state timer and re-roll the behavior when it expires
pub fn update_behavior<R: Rng>(fish: &mut Fish, ctx: &AiContext, rng: &mut R) {
    fish.state_timer = fish.state_timer.saturating_sub(1);
    if fish.state_timer > 0 {
        return;
    }

    let t = ctx.tuning;
    match fish.behavior {
        Behavior::Patrol => {
            let near = fish.pos.distance(ctx.player_pos) < t.chase_distance;
            if near && rng.random_bool(t.chase_chance) {
                fish.behavior = Behavior::Chase;
                fish.state_timer = roll_timer(rng, t.chase_timer);
            } else {
                fish.heading = random_heading(rng);
                fish.state_timer = roll_timer(rng, t.patrol_timer);
            }
        }
        Behavior::Chase => {
            fish.behavior = Behavior::Patrol;
            fish.state_timer = roll_timer(rng, t.patrol_timer);
        }
    }
}

/// Velocity the fish wants this tick; updates its heading as a side effect
pub fn desired_velocity<R: Rng>(
    fish: &mut Fish,
    archetype: &FishArchetype,
    ctx: &AiContext,
    rng: &mut R,
) -> Vec2 {
    let t = ctx.tuning;
    let speed = match fish.behavior {
        Behavior::Patrol => {
            if rng.random_bool(t.wander_chance) {
                fish.heading = random_heading(rng);
            }
            archetype.speed * t.patrol_factor
        }
        Behavior::Chase => {
            let to_player = ctx.player_pos - fish.pos;
            let jitter = rng.random_range(-t.chase_jitter..=t.chase_jitter);
            fish.heading = normalize_angle(to_player.y.atan2(to_player.x) + jitter);
            archetype.speed * t.chase_factor
        }
    };
    heading_vec(fish.heading) * speed
}

/// Reverse with some noise after hitting a wall; always back to patrol
pub fn bounce<R: Rng>(fish: &mut Fish, tuning: &Tuning, rng: &mut R) {
    let jitter = rng.random_range(-tuning.bounce_jitter..=tuning.bounce_jitter);
    fish.heading = normalize_angle(fish.heading + PI + jitter);
    fish.behavior = Behavior::Patrol;
    fish.state_timer = roll_timer(rng, tuning.patrol_timer);
}

/// True when the fish is close enough to reach the player
#[inline]
pub fn in_contact(fish: &Fish, player_pos: Vec2, radius: f32) -> bool {
    fish.pos.distance_squared(player_pos) < radius * radius
}

pub fn random_heading<R: Rng>(rng: &mut R) -> f32 {
    normalize_angle(rng.random_range(0.0..TAU))
}

pub fn roll_timer<R: Rng>(rng: &mut R, range: TickRange) -> u32 {
    rng.random_range(range.min..=range.max)
}
