//! Shared state, event, and snapshot types for the social pool simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Reporting and visualization layers depend on it instead of the core.

pub mod event;
pub mod snapshot;
pub mod state;

pub use event::{ChangeCause, Event};
pub use snapshot::{AgentSnapshot, StateCounts, TickSnapshot};
pub use state::BallState;
