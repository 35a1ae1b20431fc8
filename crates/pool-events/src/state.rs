//! Ball States
//!
//! The three emotional states an agent cycles through.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotional state of a ball in the social pool.
///
/// There is no terminal state: agents keep cycling for as long as the model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallState {
    /// Seeking contact with another ball in the same state
    Need,
    /// Satisfied by a recent encounter
    Gratified,
    /// Thwarted, either by a bad encounter or by waiting too long
    Frustrated,
}

impl BallState {
    /// Returns all state variants in reporting order.
    pub fn all() -> &'static [BallState] {
        &[BallState::Gratified, BallState::Need, BallState::Frustrated]
    }

    /// State entered when the time allotted to this one runs out.
    pub fn timeout_successor(self) -> BallState {
        match self {
            BallState::Gratified => BallState::Need,
            BallState::Need => BallState::Frustrated,
            BallState::Frustrated => BallState::Need,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BallState::Need => "need",
            BallState::Gratified => "gratified",
            BallState::Frustrated => "frustrated",
        }
    }
}

impl fmt::Display for BallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
