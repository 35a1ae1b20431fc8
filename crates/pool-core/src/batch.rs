//! Batch Runs
//!
//! Independent models share nothing, so several configurations can run at
//! once on the rayon pool. Each run owns its model and its seeded generator.

use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::model::{Model, RunSummary};

/// `count` copies of `base` with consecutive seeds starting at its own
pub fn seed_sweep(base: &SimulationConfig, count: u32) -> Vec<SimulationConfig> {
    (0..u64::from(count))
        .map(|offset| base.clone().with_seed(base.random_seed.wrapping_add(offset)))
        .collect()
}

/// Run every configuration for `ticks` ticks on the current rayon pool.
///
/// Results come back in input order. A failing or panicking run does not
/// affect the others.
pub fn run_batch(configs: &[SimulationConfig], ticks: u64) -> Vec<Result<RunSummary, SimError>> {
    map_runs(configs, |config| {
        panic::catch_unwind(AssertUnwindSafe(|| Model::new(config.clone())?.run(ticks)))
            .unwrap_or_else(|_| {
                Err(SimError::InvariantViolation(format!(
                    "run with seed {} panicked",
                    config.random_seed
                )))
            })
    })
}

/// Order-preserving parallel map over configurations. Concurrency is bounded
/// by the size of the pool it runs on.
fn map_runs<T, F>(configs: &[SimulationConfig], run: F) -> Vec<T>
where
    T: Send,
    F: Fn(&SimulationConfig) -> T + Sync,
{
    configs.par_iter().map(|config| run(config)).collect()
}
