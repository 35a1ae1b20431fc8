//! Movement Phase
//!
//! Each ball steps to a random neighbouring cell, as if propelled by some
//! inner force at constant velocity.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use super::{TickEvents, TickFault};
use crate::components::{AgentId, Cell, Encounter, Grid};
use crate::error::SimError;
use crate::SimRng;

/// Pick a destination uniformly from `candidates`
pub fn choose_step(
    agent: AgentId,
    from: Cell,
    candidates: &[Cell],
    rng: &mut SmallRng,
) -> Result<Cell, SimError> {
    candidates
        .choose(rng)
        .copied()
        .ok_or(SimError::InvalidNeighborhood {
            agent: agent.0,
            x: from.x,
            y: from.y,
        })
}

/// Forget last tick's encounters and events
pub fn clear_tick(mut events: ResMut<TickEvents>, mut query: Query<&mut Encounter>) {
    events.clear();
    for mut encounter in query.iter_mut() {
        encounter.0 = None;
    }
}

/// Move every agent, in id order.
///
/// All destinations are drawn from pre-phase positions before any agent is
/// moved. If any agent has nowhere to go, nobody moves and the tick faults.
pub fn move_agents(
    grid: Res<Grid>,
    mut rng: ResMut<SimRng>,
    mut fault: ResMut<TickFault>,
    mut query: Query<(&AgentId, &mut Cell)>,
) {
    let mut agents: Vec<_> = query.iter_mut().collect();
    agents.sort_by_key(|(id, _)| **id);

    let mut destinations = Vec::with_capacity(agents.len());
    for (id, cell) in &agents {
        let from: Cell = **cell;
        match choose_step(**id, from, &grid.neighborhood(from), &mut rng.0) {
            Ok(to) => destinations.push(to),
            Err(err) => {
                fault.record(err);
                return;
            }
        }
    }

    for ((_, mut cell), to) in agents.into_iter().zip(destinations) {
        *cell = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::movement_schedule;
    use rand::SeedableRng;

    fn world_with(grid: Grid, cells: &[Cell]) -> World {
        let mut world = World::new();
        world.insert_resource(grid);
        world.insert_resource(SimRng(SmallRng::seed_from_u64(1)));
        world.insert_resource(TickFault::default());
        world.insert_resource(TickEvents::new());
        for (i, cell) in cells.iter().enumerate() {
            world.spawn((AgentId(i as u32), *cell, Encounter(Some(AgentId(99)))));
        }
        world
    }

    #[test]
    fn test_choose_step_rejects_empty() {
        let mut rng = SmallRng::seed_from_u64(3);
        let err = choose_step(AgentId(4), Cell::new(0, 0), &[], &mut rng).unwrap_err();
        assert_eq!(err, SimError::InvalidNeighborhood { agent: 4, x: 0, y: 0 });
    }

    #[test]
    fn test_choose_step_stays_in_candidates() {
        let mut rng = SmallRng::seed_from_u64(3);
        let candidates = [Cell::new(1, 0), Cell::new(0, 1)];
        for _ in 0..50 {
            let to = choose_step(AgentId(0), Cell::new(0, 0), &candidates, &mut rng).unwrap();
            assert!(candidates.contains(&to));
        }
    }

    #[test]
    fn test_agents_move_to_a_neighbour() {
        let mut world = world_with(Grid::new(5, 5, false), &[Cell::new(2, 2), Cell::new(0, 0)]);
        let mut schedule = movement_schedule();
        schedule.run(&mut world);

        let mut query = world.query::<(&AgentId, &Cell, &Encounter)>();
        for (id, cell, encounter) in query.iter(&world) {
            let start = if id.0 == 0 { Cell::new(2, 2) } else { Cell::new(0, 0) };
            assert!(Grid::new(5, 5, false).neighborhood(start).contains(cell));
            assert!(!encounter.is_matched(), "encounters are cleared each tick");
        }
        assert!(!world.resource::<TickFault>().is_faulted());
    }

    #[test]
    fn test_single_cell_grid_faults_without_moving() {
        let mut world = world_with(Grid::new(1, 1, false), &[Cell::new(0, 0)]);
        let mut schedule = movement_schedule();
        schedule.run(&mut world);

        let fault = world.resource::<TickFault>().fault().cloned();
        assert_eq!(fault, Some(SimError::InvalidNeighborhood { agent: 0, x: 0, y: 0 }));
    }
}
