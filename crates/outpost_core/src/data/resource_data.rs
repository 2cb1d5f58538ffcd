//! Resource data structures for data-driven ore definitions.

use serde::{Deserialize, Serialize};

/// Data-driven resource definition.
///
/// # Example RON
///
/// ```ron
/// ResourceData(
///     id: "titanium",
///     hardness: 3,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Unique string identifier for this resource type.
    pub id: String,

    /// Extraction hardness. Each point adds the drill's hardness multiplier
    /// to the ticks needed per item.
    #[serde(default)]
    pub hardness: u32,
}
