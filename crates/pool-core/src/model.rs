//! Model
//!
//! Owns the ECS world, the grid, and the two tick schedules. One call to
//! [`Model::step`] is one tick: every agent moves, then encounters are matched
//! and every agent resolves.

use bevy_ecs::prelude::*;
use pool_events::{AgentSnapshot, Event, StateCounts, TickSnapshot};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::components::{Cell, Grid};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::output;
use crate::policy::{ActivePolicy, TransitionPolicy};
use crate::setup;
use crate::systems::{
    movement_schedule, resolution_schedule, SimulationState, TickEvents, TickFault,
};
use crate::SimRng;

/// Aggregate outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub ticks: u64,
    pub final_counts: StateCounts,
    pub total_encounters: u64,
    /// Largest number of agents frustrated at the end of any tick
    pub peak_frustrated: usize,
}

pub struct Model {
    config: SimulationConfig,
    world: World,
    movement: Schedule,
    resolution: Schedule,
    latest: TickSnapshot,
    total_encounters: u64,
    peak_frustrated: usize,
}

impl Model {
    /// Build a model with randomly placed agents
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        Self::build(config, None)
    }

    /// Build a model with one explicit start cell per agent
    pub fn with_placements(config: SimulationConfig, cells: &[Cell]) -> Result<Self, SimError> {
        if cells.len() != config.population_size as usize {
            return Err(SimError::Configuration(format!(
                "{} placements given for a population of {}",
                cells.len(),
                config.population_size
            )));
        }
        let grid = Grid::new(config.grid_width, config.grid_height, config.toroidal);
        if let Some(cell) = cells.iter().find(|cell| !grid.contains(**cell)) {
            return Err(SimError::Configuration(format!(
                "placement ({}, {}) is outside the {}x{} grid",
                cell.x, cell.y, config.grid_width, config.grid_height
            )));
        }
        Self::build(config, Some(cells))
    }

    fn build(config: SimulationConfig, placements: Option<&[Cell]>) -> Result<Self, SimError> {
        config.validate()?;

        let mut world = World::new();
        world.insert_resource(SimulationState::default());
        world.insert_resource(Grid::new(
            config.grid_width,
            config.grid_height,
            config.toroidal,
        ));
        world.insert_resource(ActivePolicy::from_config(&config.policy));
        world.insert_resource(TickEvents::new());
        world.insert_resource(TickFault::default());

        let mut rng = SmallRng::seed_from_u64(config.random_seed);
        setup::spawn_agents(&mut world, &config, &mut rng, placements);
        world.insert_resource(SimRng(rng));

        let latest = output::generate_snapshot(&mut world, 0);
        let peak_frustrated = latest.counts.frustrated;

        info!(
            population = config.population_size,
            width = config.grid_width,
            height = config.grid_height,
            toroidal = config.toroidal,
            seed = config.random_seed,
            policy = world.resource::<ActivePolicy>().policy().name(),
            "model created"
        );

        Ok(Self {
            config,
            world,
            movement: movement_schedule(),
            resolution: resolution_schedule(),
            latest,
            total_encounters: 0,
            peak_frustrated,
        })
    }

    /// Replace the transition table for subsequent ticks
    pub fn set_policy(&mut self, policy: impl TransitionPolicy + 'static) {
        info!(policy = policy.name(), "policy replaced");
        self.world.insert_resource(ActivePolicy(Box::new(policy)));
    }

    /// Run one tick.
    ///
    /// A fault aborts the tick and halts the model: this and every later call
    /// return the same error.
    pub fn step(&mut self) -> Result<&TickSnapshot, SimError> {
        self.check_fault()?;

        let tick = self.tick() + 1;
        self.world.resource_mut::<SimulationState>().current_tick = tick;

        self.movement.run(&mut self.world);
        self.check_fault()?;
        self.resolution.run(&mut self.world);
        self.check_fault()?;

        self.latest = output::generate_snapshot(&mut self.world, tick);
        self.total_encounters += self.latest.encounters as u64;
        self.peak_frustrated = self.peak_frustrated.max(self.latest.counts.frustrated);
        Ok(&self.latest)
    }

    /// Run `ticks` ticks and summarize
    pub fn run(&mut self, ticks: u64) -> Result<RunSummary, SimError> {
        for _ in 0..ticks {
            self.step()?;
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            encounters = summary.total_encounters,
            gratified = summary.final_counts.gratified,
            need = summary.final_counts.need,
            frustrated = summary.final_counts.frustrated,
            "run complete"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.config.random_seed,
            ticks: self.tick(),
            final_counts: self.latest.counts,
            total_encounters: self.total_encounters,
            peak_frustrated: self.peak_frustrated,
        }
    }

    fn check_fault(&self) -> Result<(), SimError> {
        match self.world.resource::<TickFault>().fault() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Current tick number; after a fault, the tick that failed
    pub fn tick(&self) -> u64 {
        self.world.resource::<SimulationState>().current_tick
    }

    /// Snapshot taken at the end of the last tick (tick 0 before any step)
    pub fn snapshot(&self) -> &TickSnapshot {
        &self.latest
    }

    pub fn counts(&self) -> StateCounts {
        self.latest.counts
    }

    /// Events emitted during the last tick
    pub fn events(&self) -> &[Event] {
        &self.world.resource::<TickEvents>().events
    }

    pub fn agent(&self, agent_id: u32) -> Option<&AgentSnapshot> {
        self.latest.agent(agent_id)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn policy_name(&self) -> &'static str {
        self.world.resource::<ActivePolicy>().policy().name()
    }

    pub fn grid(&self) -> &Grid {
        self.world.resource::<Grid>()
    }

    pub fn is_halted(&self) -> bool {
        self.world.resource::<TickFault>().is_faulted()
    }
}
