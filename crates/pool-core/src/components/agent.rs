//! Agent Components
//!
//! Plain-data components for individual balls: identity, thresholds, mood,
//! and the partner matched on the current tick.

use bevy_ecs::prelude::*;
use pool_events::{BallState, ChangeCause};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::TransitionPolicy;

/// Unique identifier for an agent
///
/// Id order is the canonical iteration order for every phase of a tick.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-agent thresholds - fixed at creation
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub gratification_limit: u32,
    pub need_limit: u32,
    pub frustration_limit: u32,
    /// Scales the reported frustration level; never negative
    pub frustration_multiplier: f32,
}

impl Limits {
    /// Ticks an agent may spend in `state` before timing out
    pub fn limit_for(&self, state: BallState) -> u32 {
        match state {
            BallState::Gratified => self.gratification_limit,
            BallState::Need => self.need_limit,
            BallState::Frustrated => self.frustration_limit,
        }
    }
}

/// A state change produced by [`Mood::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BallState,
    pub to: BallState,
    pub cause: ChangeCause,
}

/// Current state and how long the agent has held it
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub state: BallState,
    /// Consecutive ticks in `state`; zero on the tick the state was entered
    pub state_counter: u32,
}

impl Default for Mood {
    fn default() -> Self {
        Self::new(BallState::Gratified)
    }
}

impl Mood {
    pub fn new(state: BallState) -> Self {
        Self {
            state,
            state_counter: 0,
        }
    }

    /// Apply one tick of the transition rule.
    ///
    /// `partner` is the agent matched this tick together with its state as it
    /// was before resolution began. An encounter tick never consults the
    /// timeout limits. The counter resets on every change and otherwise
    /// advances by one.
    pub fn resolve(
        &mut self,
        partner: Option<(AgentId, BallState)>,
        limits: &Limits,
        policy: &dyn TransitionPolicy,
    ) -> Option<Transition> {
        let from = self.state;
        let (next, cause) = match partner {
            Some((partner_id, other)) => (
                policy.on_encounter(from, other),
                ChangeCause::Encounter {
                    partner: partner_id.0,
                },
            ),
            None => {
                let elapsed = self.state_counter.saturating_add(1);
                if elapsed >= limits.limit_for(from) {
                    (policy.on_timeout(from), ChangeCause::Timeout)
                } else {
                    (from, ChangeCause::Timeout)
                }
            }
        };

        if next == from {
            self.state_counter = self.state_counter.saturating_add(1);
            return None;
        }

        self.state = next;
        self.state_counter = 0;
        Some(Transition {
            from,
            to: next,
            cause,
        })
    }

    /// Derived reporting metric for agents still short of their frustration limit
    pub fn frustration_level(&self, limits: &Limits) -> f32 {
        if self.state == BallState::Frustrated && self.state_counter < limits.frustration_limit {
            self.state_counter as f32 * limits.frustration_multiplier
        } else {
            0.0
        }
    }
}

/// Partner matched on the current tick, cleared at the start of every tick
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encounter(pub Option<AgentId>);

impl Encounter {
    pub fn partner(&self) -> Option<AgentId> {
        self.0
    }

    pub fn is_matched(&self) -> bool {
        self.0.is_some()
    }
}
