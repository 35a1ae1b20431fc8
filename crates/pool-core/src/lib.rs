//! Social Pool Simulation Library
//!
//! Calhoun's social pool as an encounter-driven agent model: balls wander a
//! grid, pair up when they share a cell, and move between need,
//! gratification and frustration according to a pluggable transition table.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod batch;
pub mod components;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod policy;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::{PolicyConfig, SimulationConfig};
pub use error::{ConfigError, SimError};
pub use model::{Model, RunSummary};
pub use policy::{
    CalhounPolicy, FrustratedEncounter, PairBucketPolicy, PolicyKind, TransitionPolicy,
};
pub use pool_events::{AgentSnapshot, BallState, ChangeCause, Event, StateCounts, TickSnapshot};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
