//! ECS Systems
//!
//! The two phases of a tick. Movement runs first for every agent, then
//! encounters are matched and every agent resolves against the same
//! pre-resolution picture, so no agent's outcome depends on iteration order.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use pool_events::Event;

use crate::error::SimError;

pub mod encounter;
pub mod movement;
pub mod resolve;

pub use encounter::{check_symmetry, index_cells, match_encounters, pair_encounters, verify_encounters};
pub use movement::{choose_step, clear_tick, move_agents};
pub use resolve::resolve_agents;

/// Global simulation state resource
#[derive(Resource, Debug, Default)]
pub struct SimulationState {
    pub current_tick: u64,
}

/// Events generated during the current tick
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pub events: Vec<Event>,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// First fatal error raised during a tick. Once set the model is halted.
#[derive(Resource, Debug, Default)]
pub struct TickFault {
    fault: Option<SimError>,
}

impl TickFault {
    /// Keep the first fault; later ones are consequences of it
    pub fn record(&mut self, err: SimError) {
        if self.fault.is_none() {
            tracing::error!(error = %err, "tick aborted");
            self.fault = Some(err);
        }
    }

    pub fn fault(&self) -> Option<&SimError> {
        self.fault.as_ref()
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

/// Phase 1: clear per-tick state, then move every agent
pub fn movement_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((clear_tick, move_agents).chain());
    schedule
}

/// Phase 2: match encounters once, check them, then resolve every agent
pub fn resolution_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            index_cells,
            match_encounters,
            verify_encounters,
            resolve_agents,
        )
            .chain(),
    );
    schedule
}
