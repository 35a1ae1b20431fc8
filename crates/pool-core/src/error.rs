//! Error Types
//!
//! Fatal simulation errors and configuration loading errors.

use std::path::PathBuf;

/// Errors raised while building or stepping a model.
///
/// None of these are retried; they propagate to the run driver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// Construction-time parameter validation failed
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An agent found no cell to move to
    #[error("agent {agent} at ({x}, {y}) has no neighbouring cell to move to")]
    InvalidNeighborhood { agent: u32, x: u32, y: u32 },

    /// Internal bookkeeping broke; this is a bug, never corrected silently
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] SimError),
}
