//! Serialized boundary around one simulation
//!
//! Request handlers may run on many threads; the simulation must not. Every
//! request takes the simulation lock for its whole duration, so ticks never
//! interleave.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::catalog::ToolId;
use crate::highscores::ScoreSink;
use crate::sim::{Command, Simulation, Snapshot};

/// A request from the outer layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Advance one tick with this command
    Tick(Command),
    /// Equip an owned tool without advancing time
    SwitchTool { tool: ToolId },
    /// Start a new session
    Reset,
    /// Read the current state
    Snapshot,
}

type Sink = Box<dyn ScoreSink + Send>;

pub struct Session {
    sim: Mutex<Simulation>,
    scores: Option<Mutex<Sink>>,
}

impl Session {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim: Mutex::new(sim),
            scores: None,
        }
    }

    /// Report finished sessions to `sink` on reset
    pub fn with_scores(mut self, sink: impl ScoreSink + Send + 'static) -> Self {
        self.scores = Some(Mutex::new(Box::new(sink)));
        self
    }

    pub fn handle(&self, request: &Request) -> Snapshot {
        match request {
            Request::Tick(command) => self.tick(command),
            Request::SwitchTool { tool } => self.switch_tool(*tool),
            Request::Reset => self.reset(),
            Request::Snapshot => self.snapshot(),
        }
    }

    pub fn tick(&self, command: &Command) -> Snapshot {
        self.lock().tick(command)
    }

    pub fn switch_tool(&self, tool: ToolId) -> Snapshot {
        self.lock().switch_tool(tool)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Reset, first recording the old session's score if it had ended
    pub fn reset(&self) -> Snapshot {
        let mut sim = self.lock();
        if sim.world.terminal {
            if let Some(scores) = &self.scores {
                let mut sink = scores.lock().unwrap_or_else(PoisonError::into_inner);
                sink.record(sim.world.score, sim.world.tick);
            }
        }
        sim.reset()
    }

    /// A panicked tick leaves the world as it was mid-tick; keep serving it
    fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.sim.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
