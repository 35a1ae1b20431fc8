//! Snapshot Types
//!
//! Read-only per-tick projections of the model, for reporting and visualization.
//!
//! Snapshots are derived from agent state after each tick. They are never fed
//! back into the simulation.

use serde::{Deserialize, Serialize};

use crate::BallState;

/// One agent as seen at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: u32,
    pub x: u32,
    pub y: u32,
    pub state: BallState,
    pub state_counter: u32,
    /// Partner matched this tick, if any
    #[serde(default)]
    pub encounter: Option<u32>,
    /// Derived reporting metric, zero outside the frustrated state
    #[serde(default)]
    pub frustration_level: f32,
}

/// Number of agents in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub gratified: usize,
    pub need: usize,
    pub frustrated: usize,
}

impl StateCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more agent in `state`
    pub fn record(&mut self, state: BallState) {
        match state {
            BallState::Gratified => self.gratified += 1,
            BallState::Need => self.need += 1,
            BallState::Frustrated => self.frustrated += 1,
        }
    }

    pub fn get(&self, state: BallState) -> usize {
        match state {
            BallState::Gratified => self.gratified,
            BallState::Need => self.need,
            BallState::Frustrated => self.frustrated,
        }
    }

    pub fn total(&self) -> usize {
        self.gratified + self.need + self.frustrated
    }
}

impl FromIterator<BallState> for StateCounts {
    fn from_iter<I: IntoIterator<Item = BallState>>(iter: I) -> Self {
        let mut counts = Self::new();
        for state in iter {
            counts.record(state);
        }
        counts
    }
}

/// Complete model state at the end of a tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub counts: StateCounts,
    /// Number of encounter pairs formed this tick
    pub encounters: usize,
    /// Agents, in id order when produced by the model
    pub agents: Vec<AgentSnapshot>,
}

impl TickSnapshot {
    /// Look up an agent by id.
    ///
    /// Snapshots built by the model are in id order; hand-edited or foreign
    /// ones may not be, so a failed binary search falls back to a scan.
    pub fn agent(&self, agent_id: u32) -> Option<&AgentSnapshot> {
        match self.agents.binary_search_by_key(&agent_id, |a| a.agent_id) {
            Ok(idx) => self.agents.get(idx),
            Err(_) => self.agents.iter().find(|a| a.agent_id == agent_id),
        }
    }
}
