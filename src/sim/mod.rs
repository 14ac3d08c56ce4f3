//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One command advances exactly one tick
//! - Seeded RNG only; timers count ticks, never wall-clock time
//! - Stable iteration order (storage order, removals compacted after scans)
//! - No I/O or platform dependencies

pub mod ai;
pub mod capability;
pub mod combat;
pub mod simulation;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use capability::{Collectible, Damageable, Movable};
pub use combat::{Flight, Hit, Outcome, advance, resolve_projectile};
pub use simulation::Simulation;
pub use snapshot::{FishView, PlayerView, Snapshot};
pub use spawn::find_spawn_point;
pub use state::{
    ActiveEffect, Behavior, Fish, ItemPickup, Player, PowerUpPickup, Projectile, WorldState,
};
pub use tick::{Command, Direction};
