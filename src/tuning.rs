//! Data-driven simulation balance
//!
//! Every knob has a default, so a tuning file only needs the fields it
//! overrides.

use serde::{Deserialize, Serialize};

/// Inclusive range of tick counts for randomized timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub min: u32,
    pub max: u32,
}

impl TickRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Errors from loading tuning data
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} must be a probability in [0, 1]")]
    Probability(&'static str),

    #[error("{0} must be finite and non-negative")]
    Negative(&'static str),

    #[error("{0} range has min > max")]
    Range(&'static str),

    #[error("max_spawn_attempts must be at least 1")]
    NoSpawnAttempts,
}

/// Simulation tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Collision radii ===
    /// Projectile-vs-fish point hit radius
    pub hit_radius: f32,
    /// Fish-vs-player contact radius
    pub contact_radius: f32,
    /// Player-vs-pickup collection radius
    pub pickup_radius: f32,

    // === Player ===
    /// Distance per unit of command amount
    pub move_speed: f32,
    /// Radians per unit of command amount for LEFT/RIGHT
    pub turn_speed: f32,
    /// Command amounts are clamped to this magnitude
    pub max_amount: f32,

    // === Fish AI ===
    pub chase_distance: f32,
    pub chase_chance: f64,
    pub patrol_factor: f32,
    pub chase_factor: f32,
    pub patrol_timer: TickRange,
    pub chase_timer: TickRange,
    /// Per-tick chance a patrolling fish picks a new heading early
    pub wander_chance: f64,
    /// Max heading noise while chasing (radians, either side)
    pub chase_jitter: f32,
    /// Max heading noise after bouncing off a wall (radians, either side)
    pub bounce_jitter: f32,

    // === Population ===
    pub fish_target: usize,
    pub fish_cap: usize,
    pub item_target: usize,
    pub item_cap: usize,
    pub power_up_target: usize,
    pub power_up_cap: usize,
    /// Minimum ticks between top-up spawns of the same population
    pub spawn_interval_ticks: u64,
    pub item_lifetime_ticks: u32,
    pub min_spawn_distance: f32,
    /// Random placement attempts before falling back to the nearest valid cell
    pub max_spawn_attempts: u32,
    /// Chance a killed fish leaves an item pickup
    pub drop_chance: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hit_radius: 0.5,
            contact_radius: 0.5,
            pickup_radius: 0.6,

            move_speed: 0.15,
            turn_speed: 0.1,
            max_amount: 5.0,

            chase_distance: 10.0,
            chase_chance: 0.3,
            patrol_factor: 0.5,
            chase_factor: 1.0,
            patrol_timer: TickRange::new(60, 180),
            chase_timer: TickRange::new(30, 90),
            wander_chance: 0.02,
            chase_jitter: 0.2,
            bounce_jitter: 0.5,

            fish_target: 6,
            fish_cap: 10,
            item_target: 2,
            item_cap: 4,
            power_up_target: 1,
            power_up_cap: 2,
            spawn_interval_ticks: 60,
            item_lifetime_ticks: 600,
            min_spawn_distance: 4.0,
            max_spawn_attempts: 64,
            drop_chance: 0.25,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning overrides
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        for (name, p) in [
            ("chase_chance", self.chase_chance),
            ("wander_chance", self.wander_chance),
            ("drop_chance", self.drop_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(TuningError::Probability(name));
            }
        }
        for (name, v) in [
            ("hit_radius", self.hit_radius),
            ("contact_radius", self.contact_radius),
            ("pickup_radius", self.pickup_radius),
            ("move_speed", self.move_speed),
            ("turn_speed", self.turn_speed),
            ("max_amount", self.max_amount),
            ("chase_distance", self.chase_distance),
            ("patrol_factor", self.patrol_factor),
            ("chase_factor", self.chase_factor),
            ("chase_jitter", self.chase_jitter),
            ("bounce_jitter", self.bounce_jitter),
            ("min_spawn_distance", self.min_spawn_distance),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(TuningError::Negative(name));
            }
        }
        if self.patrol_timer.min > self.patrol_timer.max {
            return Err(TuningError::Range("patrol_timer"));
        }
        if self.chase_timer.min > self.chase_timer.max {
            return Err(TuningError::Range("chase_timer"));
        }
        if self.max_spawn_attempts == 0 {
            return Err(TuningError::NoSpawnAttempts);
        }
        Ok(())
    }

    /// Effective fish population target (never above the cap)
    pub fn fish_goal(&self) -> usize {
        self.fish_target.min(self.fish_cap)
    }

    pub fn item_goal(&self) -> usize {
        self.item_target.min(self.item_cap)
    }

    pub fn power_up_goal(&self) -> usize {
        self.power_up_target.min(self.power_up_cap)
    }
}
