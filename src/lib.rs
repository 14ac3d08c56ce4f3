//! Fish Hunt - A tick-based arena simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, fish AI, projectiles, pickups)
//! - `map`: Static grid of open/blocked cells
//! - `catalog`: Read-only archetype tables (fish, tools, power-ups)
//! - `tuning`: Data-driven simulation balance
//! - `session`: Serialized command boundary around a simulation
//! - `highscores`: Top-N score table collaborator

pub mod catalog;
pub mod highscores;
pub mod map;
pub mod session;
pub mod sim;
pub mod tuning;

pub use catalog::Catalog;
pub use highscores::{HighScores, ScoreSink};
pub use map::GridMap;
pub use session::{Request, Session};
pub use sim::{Command, Direction, Simulation, Snapshot};
pub use tuning::Tuning;

use glam::Vec2;

/// Normalized angle to [-π, π)
///
/// Non-finite input comes back as NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if (-PI..PI).contains(&angle) {
        return angle;
    }
    // Large magnitudes lose the low bits, so wrap with a remainder, not steps
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= PI {
        (wrapped - TAU).max(-PI)
    } else {
        wrapped
    }
}

/// Unit vector pointing along `angle`
#[inline]
pub fn heading_vec(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
