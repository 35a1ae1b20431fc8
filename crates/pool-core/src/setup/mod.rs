//! Agent Spawning
//!
//! Creates the fixed population with per-agent jitter around the population
//! defaults. Draw order per agent, in id order: gratification offset, need
//! offset, frustration multiplier, then position when none is given.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::components::{AgentId, Cell, Encounter, Grid, Limits, Mood};
use crate::config::SimulationConfig;

/// Uniform integer offset in `[-variation, +variation]`
fn jitter(rng: &mut SmallRng, variation: u32) -> i64 {
    if variation == 0 {
        return 0;
    }
    let v = i64::from(variation);
    rng.gen_range(-v..=v)
}

/// Apply jitter to a population default. The config guarantees `base > variation`.
fn jittered_limit(rng: &mut SmallRng, base: u32, variation: u32) -> u32 {
    let value = i64::from(base) + jitter(rng, variation);
    u32::try_from(value.max(1)).unwrap_or(base)
}

/// Draw one agent's limits
pub fn generate_limits(rng: &mut SmallRng, config: &SimulationConfig) -> Limits {
    let gratification_limit = jittered_limit(
        rng,
        config.gratification_limit,
        config.gratification_limit_variation,
    );
    let need_limit = jittered_limit(rng, config.need_limit, config.need_limit_variation);
    let frustration_multiplier = if config.frustration_variation > 0.0 {
        rng.gen_range(0.0..=config.frustration_variation)
    } else {
        0.0
    };

    Limits {
        gratification_limit,
        need_limit,
        frustration_limit: config.frustration_limit,
        frustration_multiplier,
    }
}

/// Spawn the whole population, gratified with a zero counter.
///
/// `placements`, when given, must hold one in-grid cell per agent; the caller
/// checks this.
pub fn spawn_agents(
    world: &mut World,
    config: &SimulationConfig,
    rng: &mut SmallRng,
    placements: Option<&[Cell]>,
) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(config.population_size as usize);

    for i in 0..config.population_size {
        let id = AgentId(i);
        let limits = generate_limits(rng, config);
        let cell = match placements.and_then(|cells| cells.get(i as usize)) {
            Some(cell) => *cell,
            None => Cell::new(
                rng.gen_range(0..config.grid_width),
                rng.gen_range(0..config.grid_height),
            ),
        };

        let entity = world
            .spawn((id, cell, limits, Mood::default(), Encounter::default()))
            .id();
        world.resource_mut::<Grid>().place(cell, id);
        entities.push(entity);
    }

    entities
}
