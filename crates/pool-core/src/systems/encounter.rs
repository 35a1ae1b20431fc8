//! Encounter Matching
//!
//! Pairs agents that ended the movement phase on the same cell. Each agent
//! takes part in at most one encounter per tick, and matching is symmetric.

use bevy_ecs::prelude::*;
use pool_events::Event;
use std::collections::BTreeMap;
use tracing::debug;

use super::{SimulationState, TickEvents, TickFault};
use crate::components::{AgentId, Cell, Encounter, Grid};
use crate::error::SimError;

/// Rebuild the grid's occupancy index from current positions
pub fn index_cells(mut grid: ResMut<Grid>, query: Query<(&AgentId, &Cell)>) {
    let mut agents: Vec<(AgentId, Cell)> = query.iter().map(|(id, cell)| (*id, *cell)).collect();
    agents.sort_unstable_by_key(|(id, _)| *id);

    grid.clear();
    for (id, cell) in agents {
        grid.place(cell, id);
    }
}

/// Match each unmatched agent with the first other unmatched occupant of its
/// cell. `order` must be sorted by id; occupants are scanned in id order.
///
/// Returns the partner of every matched agent, keyed both ways.
pub fn pair_encounters(order: &[(AgentId, Cell)], grid: &Grid) -> BTreeMap<AgentId, AgentId> {
    let mut partners: BTreeMap<AgentId, AgentId> = BTreeMap::new();
    for (agent, cell) in order {
        if partners.contains_key(agent) {
            continue;
        }
        let candidate = grid
            .occupants(*cell)
            .iter()
            .find(|other| *other != agent && !partners.contains_key(*other));
        if let Some(&other) = candidate {
            partners.insert(*agent, other);
            partners.insert(other, *agent);
        }
    }
    partners
}

/// Set every agent's encounter for this tick
pub fn match_encounters(
    grid: Res<Grid>,
    state: Res<SimulationState>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(&AgentId, &Cell, &mut Encounter)>,
) {
    let mut order: Vec<(AgentId, Cell)> =
        query.iter().map(|(id, cell, _)| (*id, *cell)).collect();
    order.sort_unstable_by_key(|(id, _)| *id);

    let partners = pair_encounters(&order, &grid);

    for (id, cell) in &order {
        match partners.get(id) {
            Some(partner) if id < partner => {
                debug!(tick = state.current_tick, a = %id, b = %partner, x = cell.x, y = cell.y, "encounter");
                events.push(Event::Encounter {
                    tick: state.current_tick,
                    agents: [id.0, partner.0],
                    x: cell.x,
                    y: cell.y,
                });
            }
            _ => {}
        }
    }

    for (id, _, mut encounter) in query.iter_mut() {
        encounter.0 = partners.get(id).copied();
    }
}

/// Check that `partners` is symmetric and nobody is claimed twice
pub fn check_symmetry(partners: &BTreeMap<AgentId, Option<AgentId>>) -> Result<(), SimError> {
    let mut claimed: BTreeMap<AgentId, AgentId> = BTreeMap::new();
    for (agent, partner) in partners {
        let Some(partner) = partner else {
            continue;
        };
        if partner == agent {
            return Err(SimError::InvariantViolation(format!(
                "agent {agent} is matched with itself"
            )));
        }
        let back = partners.get(partner).copied().flatten();
        if back != Some(*agent) {
            return Err(SimError::InvariantViolation(format!(
                "agent {agent} is matched with {partner}, but {partner} is matched with {back:?}"
            )));
        }
        if let Some(previous) = claimed.insert(*partner, *agent) {
            return Err(SimError::InvariantViolation(format!(
                "agent {partner} is claimed by both {previous} and {agent}"
            )));
        }
    }
    Ok(())
}

/// Record an invariant violation if matching broke symmetry
pub fn verify_encounters(mut fault: ResMut<TickFault>, query: Query<(&AgentId, &Encounter)>) {
    let partners: BTreeMap<AgentId, Option<AgentId>> =
        query.iter().map(|(id, e)| (*id, e.partner())).collect();
    if let Err(err) = check_symmetry(&partners) {
        fault.record(err);
    }
}
