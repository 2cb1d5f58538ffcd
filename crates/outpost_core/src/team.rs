//! Team identifiers.
//!
//! Every unit and block carries a team tag. A capture turret rewrites a
//! target's tag to its own team.

use serde::{Deserialize, Serialize};

/// Ownership tag for units and blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    /// Unowned wreckage and neutral structures.
    pub const DERELICT: Self = Self(0);
    /// The default player team.
    pub const SHARDED: Self = Self(1);
    /// The default enemy team.
    pub const CRUX: Self = Self(2);
    /// Third team used by scenarios with more factions.
    pub const MALIS: Self = Self(3);

    /// Get the display name for this team.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self.0 {
            0 => "derelict",
            1 => "sharded",
            2 => "crux",
            3 => "malis",
            _ => "custom",
        }
    }

    /// Check if two tags belong to different teams.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            0..=3 => f.write_str(self.display_name()),
            id => write!(f, "team#{id}"),
        }
    }
}
