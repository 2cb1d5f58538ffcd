//! # Outpost Core
//!
//! Deterministic simulation of two outpost blocks: a capture turret that
//! converts enemy units to its own team, and a multi-ore drill that extracts
//! every ore type around it at once.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No floating-point math in the tick path (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`capture`] - Capture turret targeting and conversion
//! - [`drill`] - Multi-ore extraction
//! - [`simulation`] - Fixed-timestep block scheduler
//! - [`units`], [`tiles`], [`resources`], [`inventory`] - World the blocks read from
//! - [`data`] - Serde block and resource definitions
//! - [`math`] - Fixed-point math and angle helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod capture;
pub mod context;
pub mod data;
pub mod drill;
pub mod error;
pub mod inventory;
pub mod math;
pub mod resources;
pub mod simulation;
pub mod team;
pub mod tiles;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capture::{CaptureEvent, CaptureTurret, CaptureTurretConfig};
    pub use crate::context::BlockContext;
    pub use crate::drill::{DrillEvent, MultiDrill, MultiDrillConfig};
    pub use crate::error::{GameError, Result};
    pub use crate::inventory::{BufferSink, ItemSink, ItemStorage, NullSink};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::resources::{ResourceId, ResourceRegistry};
    pub use crate::simulation::{BlockId, Simulation, TickEvents};
    pub use crate::team::TeamId;
    pub use crate::tiles::{GridMap, TileCoord, TileMap};
    pub use crate::units::{EntityId, UnitClass, UnitIndex, UnitRegistry};
}
