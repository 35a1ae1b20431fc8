//! Transition Policies
//!
//! The encounter table is the part of the model that differs between
//! experiments, so it sits behind a trait and is chosen per run.

use bevy_ecs::prelude::*;
use pool_events::BallState;
use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;

/// Maps an agent's state to its next state.
///
/// Implementations must be pure: the same inputs always give the same state.
pub trait TransitionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// State an agent in `own` takes after meeting an agent in `other`.
    fn on_encounter(&self, own: BallState, other: BallState) -> BallState;

    /// State an agent in `own` takes once its time limit for `own` runs out.
    fn on_timeout(&self, own: BallState) -> BallState {
        own.timeout_successor()
    }
}

/// Selects the transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Calhoun,
    PairBucket,
}

/// Outcome of an encounter for an agent that is already frustrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrustratedEncounter {
    /// Frustration only wears off with time
    #[default]
    Unaffected,
    /// Meeting another needy or frustrated agent gratifies
    Consoled,
}

/// Calhoun's social pool table.
///
/// | own        | other      | next                    |
/// |------------|------------|-------------------------|
/// | gratified  | any        | gratified               |
/// | need       | gratified  | frustrated              |
/// | need       | need       | gratified               |
/// | need       | frustrated | frustrated              |
/// | frustrated | any        | see [`FrustratedEncounter`] |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalhounPolicy {
    pub frustrated_encounter: FrustratedEncounter,
}

impl TransitionPolicy for CalhounPolicy {
    fn name(&self) -> &'static str {
        match self.frustrated_encounter {
            FrustratedEncounter::Unaffected => "calhoun",
            FrustratedEncounter::Consoled => "calhoun_consoled",
        }
    }

    fn on_encounter(&self, own: BallState, other: BallState) -> BallState {
        use BallState::*;
        match (own, other) {
            (Gratified, _) => Gratified,
            (Need, Gratified) => Frustrated,
            (Need, Need) => Gratified,
            (Need, Frustrated) => Frustrated,
            (Frustrated, Gratified) => Frustrated,
            (Frustrated, Need | Frustrated) => match self.frustrated_encounter {
                FrustratedEncounter::Unaffected => Frustrated,
                FrustratedEncounter::Consoled => Gratified,
            },
        }
    }
}

/// The first draft of the pool: need and frustration share one bucket, and
/// any two agents from that bucket gratify each other. Frustration never
/// wears off with time; only an encounter ends it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairBucketPolicy;

impl TransitionPolicy for PairBucketPolicy {
    fn name(&self) -> &'static str {
        "pair_bucket"
    }

    fn on_encounter(&self, own: BallState, other: BallState) -> BallState {
        match (own, other) {
            (BallState::Gratified, _) | (_, BallState::Gratified) => own,
            _ => BallState::Gratified,
        }
    }

    fn on_timeout(&self, own: BallState) -> BallState {
        match own {
            BallState::Frustrated => BallState::Frustrated,
            other => other.timeout_successor(),
        }
    }
}

/// Resource holding the policy used by the resolution phase
#[derive(Resource)]
pub struct ActivePolicy(pub Box<dyn TransitionPolicy>);

impl ActivePolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        match config.kind {
            PolicyKind::Calhoun => Self(Box::new(CalhounPolicy {
                frustrated_encounter: config.frustrated_encounter,
            })),
            PolicyKind::PairBucket => Self(Box::new(PairBucketPolicy)),
        }
    }

    pub fn policy(&self) -> &dyn TransitionPolicy {
        self.0.as_ref()
    }
}
