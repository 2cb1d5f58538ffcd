//! Block data structures for data-driven block definitions.

use serde::{Deserialize, Serialize};

use crate::capture::CaptureTurretConfig;
use crate::drill::MultiDrillConfig;
use crate::error::Result;

/// Data-driven capture turret definition.
///
/// Omitted config fields fall back to the stock turret values.
///
/// # Example RON
///
/// ```ron
/// CaptureTurretData(
///     id: "hack_turret",
///     name: "block.hack_turret.name",
///     config: (
///         damage: 12,
///         target_air: false,
///     ),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureTurretData {
    /// Unique string identifier for this block type.
    pub id: String,

    /// Localization key for the block's display name.
    #[serde(default)]
    pub name: String,

    /// Tuning parameters.
    #[serde(default)]
    pub config: CaptureTurretConfig,
}

impl CaptureTurretData {
    /// Validate and return the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GameError::InvalidConfig`] if any parameter is out of range.
    pub fn to_config(&self) -> Result<CaptureTurretConfig> {
        self.config.validate(&self.id)?;
        Ok(self.config.clone())
    }
}

/// Data-driven multi-ore drill definition.
///
/// # Example RON
///
/// ```ron
/// MultiDrillData(
///     id: "multi_drill",
///     name: "block.multi_drill.name",
///     config: (
///         size: 3,
///         item_capacity: 20,
///     ),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiDrillData {
    /// Unique string identifier for this block type.
    pub id: String,

    /// Localization key for the block's display name.
    #[serde(default)]
    pub name: String,

    /// Tuning parameters.
    #[serde(default)]
    pub config: MultiDrillConfig,
}

impl MultiDrillData {
    /// Validate and return the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GameError::InvalidConfig`] if any parameter is out of range.
    pub fn to_config(&self) -> Result<MultiDrillConfig> {
        self.config.validate(&self.id)?;
        Ok(self.config.clone())
    }
}

/// Any block definition, for data files that mix block kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockData {
    /// A capture turret.
    CaptureTurret(CaptureTurretData),
    /// A multi-ore drill.
    MultiDrill(MultiDrillData),
}

impl BlockData {
    /// The block's string identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::CaptureTurret(data) => &data.id,
            Self::MultiDrill(data) => &data.id,
        }
    }
}
