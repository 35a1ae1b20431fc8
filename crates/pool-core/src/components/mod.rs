//! ECS Components
//!
//! Agent and grid data stored in the ECS world.

pub mod agent;
pub mod grid;

pub use agent::*;
pub use grid::*;
