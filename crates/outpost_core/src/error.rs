//! Error types for the block simulation.
//!
//! Per-tick updates never fail: invalid targets, missing ores and full
//! storage are ordinary states handled inside the update. Errors only
//! surface at the configuration, placement and persistence boundaries.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all block simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A block or resource definition failed validation.
    #[error("Invalid configuration for '{block}': {reason}")]
    InvalidConfig {
        /// Block or resource the configuration belongs to.
        block: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A block cannot be placed at the requested tile.
    #[error("Cannot place {block} at ({x}, {y}): {reason}")]
    InvalidPlacement {
        /// Block kind being placed.
        block: String,
        /// Tile x coordinate.
        x: i32,
        /// Tile y coordinate.
        y: i32,
        /// Why the placement was rejected.
        reason: String,
    },

    /// A resource key or id is not registered.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// A block id does not exist in the simulation.
    #[error("Unknown block: {0}")]
    UnknownBlock(u32),

    /// Persisted block data could not be encoded or decoded.
    #[error("Save data error: {0}")]
    SaveFormat(String),
}

impl GameError {
    /// Shorthand for an [`GameError::InvalidConfig`] error.
    pub fn invalid_config(block: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            block: block.into(),
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for GameError {
    fn from(err: bincode::Error) -> Self {
        Self::SaveFormat(err.to_string())
    }
}
