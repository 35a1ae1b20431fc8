//! Event Types
//!
//! Records of what happened during a tick: encounters and state changes.

use serde::{Deserialize, Serialize};

use crate::BallState;

/// Why an agent changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeCause {
    /// The change was triggered by meeting `partner`
    Encounter { partner: u32 },
    /// The agent stayed in its state for as long as its limit allowed
    Timeout,
}

/// A single simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Two agents shared a cell and were paired for this tick
    Encounter {
        tick: u64,
        agents: [u32; 2],
        x: u32,
        y: u32,
    },
    /// An agent left one state for another
    StateChange {
        tick: u64,
        agent_id: u32,
        from: BallState,
        to: BallState,
        cause: ChangeCause,
    },
}

impl Event {
    /// Tick on which the event happened.
    pub fn tick(&self) -> u64 {
        match self {
            Event::Encounter { tick, .. } | Event::StateChange { tick, .. } => *tick,
        }
    }

    /// Returns true if the event involves the given agent.
    pub fn involves(&self, agent: u32) -> bool {
        match self {
            Event::Encounter { agents, .. } => agents.contains(&agent),
            Event::StateChange { agent_id, .. } => *agent_id == agent,
        }
    }
}
