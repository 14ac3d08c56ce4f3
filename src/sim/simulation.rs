//! The simulation instance: configuration, seeded RNG, and world state

use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::snapshot::Snapshot;
use super::state::WorldState;
use crate::catalog::{Catalog, ToolId};
use crate::map::GridMap;
use crate::tuning::Tuning;

/// Sole owner and mutator of a session's world state
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) map: Arc<GridMap>,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) tuning: Tuning,
    /// Run seed; every reset replays from it
    seed: u64,
    pub(crate) rng: Pcg32,
    pub world: WorldState,
}

impl Simulation {
    /// Start a session on `map` with the given tables and seed
    pub fn new(map: Arc<GridMap>, catalog: Arc<Catalog>, tuning: Tuning, seed: u64) -> Self {
        let world = WorldState::new(&catalog.loadout, map.spawn());
        let mut sim = Self {
            map,
            catalog,
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            world,
        };
        sim.populate();
        log::info!(
            "session started: seed {seed}, {} fish, {} power-ups",
            sim.world.fish.len(),
            sim.world.power_ups.len()
        );
        sim
    }

    /// Discard the session and start over from the run seed
    pub fn reset(&mut self) -> Snapshot {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.world = WorldState::new(&self.catalog.loadout, self.map.spawn());
        self.populate();
        log::info!("session reset (seed {})", self.seed);
        self.snapshot()
    }

    /// Start over with a different run seed
    pub fn reset_with_seed(&mut self, seed: u64) -> Snapshot {
        self.seed = seed;
        self.reset()
    }

    /// Initial population: fish and power-ups up to their targets
    fn populate(&mut self) {
        for _ in 0..self.tuning.fish_goal() {
            if !self.spawn_fish() {
                break;
            }
        }
        for _ in 0..self.tuning.power_up_goal() {
            if !self.spawn_power_up() {
                break;
            }
        }
    }

    /// Equip an owned tool; unknown or unowned tools are ignored
    pub fn switch_tool(&mut self, tool: ToolId) -> Snapshot {
        if !self.world.terminal && self.catalog.tool(tool).is_some() {
            self.world.player.equip(tool);
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.world)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_terminal(&self) -> bool {
        self.world.terminal
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }
}
