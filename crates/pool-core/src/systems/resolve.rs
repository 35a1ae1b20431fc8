//! Resolution Phase
//!
//! Applies the transition rule to every agent. Partners are read as they were
//! before any agent in this phase resolved.

use bevy_ecs::prelude::*;
use pool_events::{BallState, Event};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::{SimulationState, TickEvents, TickFault};
use crate::components::{AgentId, Encounter, Limits, Mood};
use crate::error::SimError;
use crate::policy::ActivePolicy;

pub fn resolve_agents(
    policy: Res<ActivePolicy>,
    state: Res<SimulationState>,
    mut fault: ResMut<TickFault>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(&AgentId, &Limits, &Encounter, &mut Mood)>,
) {
    if fault.is_faulted() {
        return;
    }

    let before: BTreeMap<AgentId, BallState> = query
        .iter()
        .map(|(id, _, _, mood)| (*id, mood.state))
        .collect();

    let mut agents: Vec<_> = query.iter_mut().collect();
    agents.sort_by_key(|(id, ..)| **id);

    for (id, limits, encounter, mut mood) in agents {
        let partner = match encounter.partner() {
            Some(partner) => match before.get(&partner) {
                Some(other) => Some((partner, *other)),
                None => {
                    fault.record(SimError::InvariantViolation(format!(
                        "agent {id} is matched with unknown agent {partner}"
                    )));
                    return;
                }
            },
            None => None,
        };

        match mood.resolve(partner, limits, policy.policy()) {
            Some(transition) => {
                debug!(
                    tick = state.current_tick,
                    agent = %id,
                    from = %transition.from,
                    to = %transition.to,
                    "state change"
                );
                events.push(Event::StateChange {
                    tick: state.current_tick,
                    agent_id: id.0,
                    from: transition.from,
                    to: transition.to,
                    cause: transition.cause,
                });
            }
            None => {
                let level = mood.frustration_level(limits);
                if level > 0.0 {
                    trace!(agent = %id, frustration_level = level, "frustration deepening");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use pool_events::ChangeCause;

    fn limits(limit: u32) -> Limits {
        Limits {
            gratification_limit: limit,
            need_limit: limit,
            frustration_limit: limit,
            frustration_multiplier: 1.0,
        }
    }

    fn setup_world() -> World {
        let mut world = World::new();
        world.insert_resource(ActivePolicy::from_config(&PolicyConfig::default()));
        world.insert_resource(SimulationState { current_tick: 1 });
        world.insert_resource(TickEvents::new());
        world.insert_resource(TickFault::default());
        world
    }

    fn moods(world: &mut World) -> BTreeMap<u32, Mood> {
        let mut query = world.query::<(&AgentId, &Mood)>();
        query.iter(world).map(|(id, mood)| (id.0, *mood)).collect()
    }

    #[test]
    fn test_partners_see_pre_resolution_state() {
        let mut world = setup_world();
        // need meets gratified: the needy side frustrates, the other is untouched
        world.spawn((
            AgentId(0),
            limits(10),
            Encounter(Some(AgentId(1))),
            Mood::new(BallState::Need),
        ));
        world.spawn((
            AgentId(1),
            limits(10),
            Encounter(Some(AgentId(0))),
            Mood::new(BallState::Gratified),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(resolve_agents);
        schedule.run(&mut world);

        let moods = moods(&mut world);
        assert_eq!(moods[&0], Mood { state: BallState::Frustrated, state_counter: 0 });
        assert_eq!(moods[&1], Mood { state: BallState::Gratified, state_counter: 1 });

        let events = &world.resource::<TickEvents>().events;
        assert_eq!(
            events,
            &vec![Event::StateChange {
                tick: 1,
                agent_id: 0,
                from: BallState::Need,
                to: BallState::Frustrated,
                cause: ChangeCause::Encounter { partner: 1 },
            }]
        );
    }

    #[test]
    fn test_unknown_partner_faults() {
        let mut world = setup_world();
        world.spawn((
            AgentId(0),
            limits(10),
            Encounter(Some(AgentId(42))),
            Mood::new(BallState::Need),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(resolve_agents);
        schedule.run(&mut world);

        assert!(matches!(
            world.resource::<TickFault>().fault(),
            Some(SimError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_skips_after_fault() {
        let mut world = setup_world();
        world.spawn((AgentId(0), limits(1), Encounter::default(), Mood::new(BallState::Gratified)));
        world
            .resource_mut::<TickFault>()
            .record(SimError::InvariantViolation("earlier".into()));

        let mut schedule = Schedule::default();
        schedule.add_systems(resolve_agents);
        schedule.run(&mut world);

        assert_eq!(moods(&mut world)[&0], Mood::new(BallState::Gratified));
    }
}
