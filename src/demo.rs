//! Demo world driven by the game loop.
//!
//! A handful of wandering agents on a ring, advanced by whatever delta the
//! loop reports. Tracks delta statistics so a run can be summarised.

use log::warn;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

use tickloop::LoopState;

/// Largest step the world integrates in one update, in seconds.
///
/// A stalled host can hand the callback a long delta; agents would otherwise
/// teleport around the ring.
pub const MAX_STEP_SECS: f64 = 0.25;

const RING_LENGTH: f64 = 100.0;

#[derive(Debug, Clone)]
struct Agent {
    position: f64,
    speed: f64,
}

/// Toy simulation: agents moving around a ring at constant speed.
#[derive(Debug, Clone)]
pub struct DriftWorld {
    agents: Vec<Agent>,
    sim_seconds: f64,
    updates: u64,
    min_delta: Option<f64>,
    max_delta: Option<f64>,
    clamped: u64,
}

impl DriftWorld {
    pub fn new(agent_count: usize) -> Self {
        let agents = (0..agent_count)
            .map(|i| Agent {
                position: (i as f64 * 7.0) % RING_LENGTH,
                speed: 1.0 + i as f64 * 0.5,
            })
            .collect();
        Self {
            agents,
            sim_seconds: 0.0,
            updates: 0,
            min_delta: None,
            max_delta: None,
            clamped: 0,
        }
    }

    /// Advance the world by `delta` seconds of wall-clock time.
    pub fn advance(&mut self, delta: f64) {
        self.updates += 1;
        self.min_delta = Some(self.min_delta.map_or(delta, |m| m.min(delta)));
        self.max_delta = Some(self.max_delta.map_or(delta, |m| m.max(delta)));

        let step = if delta > MAX_STEP_SECS {
            self.clamped += 1;
            MAX_STEP_SECS
        } else {
            delta
        };

        for agent in &mut self.agents {
            agent.position = (agent.position + agent.speed * step).rem_euclid(RING_LENGTH);
        }
        self.sim_seconds += step;
    }

    pub fn positions(&self) -> Vec<f64> {
        self.agents.iter().map(|a| a.position).collect()
    }

    pub fn summary(&self, final_state: LoopState) -> RunSummary {
        RunSummary {
            final_state,
            updates: self.updates,
            sim_seconds: self.sim_seconds,
            min_delta_ms: self.min_delta.map(|d| d * 1000.0),
            max_delta_ms: self.max_delta.map(|d| d * 1000.0),
            clamped_steps: self.clamped,
        }
    }
}

/// Lock a shared world, taking it back from a poisoned mutex.
///
/// A panicking update can poison the lock while panic recovery keeps the
/// loop alive; later ticks must still advance the world.
pub fn lock_world(world: &Mutex<DriftWorld>) -> MutexGuard<'_, DriftWorld> {
    world.lock().unwrap_or_else(|poisoned| {
        warn!("World lock poisoned by a panicking update, recovering");
        poisoned.into_inner()
    })
}

/// What a demo run did, for printing.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub final_state: LoopState,
    pub updates: u64,
    pub sim_seconds: f64,
    pub min_delta_ms: Option<f64>,
    pub max_delta_ms: Option<f64>,
    pub clamped_steps: u64,
}
