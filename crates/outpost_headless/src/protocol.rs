//! JSON protocol for interactive headless sessions.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** State updates and responses
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"spawn_unit","x":30,"y":0,"team":2,"max_health":40}
//! <- {"type":"spawned","entity_id":1}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"ticked","tick":60,"captured":[1],"mined":{"copper":2}}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":60,...}
//! ```

use std::collections::BTreeMap;

use outpost_core::units::UnitClass;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation by N ticks (default: 1).
    Tick {
        /// Ticks to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current block and unit state without advancing time.
    Query,

    /// Spawn a unit at a world position.
    SpawnUnit {
        /// World x coordinate.
        x: i32,
        /// World y coordinate.
        y: i32,
        /// Owning team id.
        team: u8,
        /// Maximum health.
        max_health: u32,
        /// Ground or air.
        #[serde(default)]
        class: UnitClass,
    },

    /// Change the ore dropped by a tile; drills touching it rebuild.
    SetTile {
        /// Tile x coordinate.
        x: i32,
        /// Tile y coordinate.
        y: i32,
        /// Resource key, or none to clear the ore.
        #[serde(default)]
        resource: Option<String>,
    },

    /// Override power and boost for one block.
    SetPower {
        /// Block id.
        block: u32,
        /// Power satisfaction in percent.
        percent: u32,
        /// Whether the boost liquid is supplied.
        #[serde(default)]
        boosted: bool,
    },

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Snapshot persisted block data in memory.
    Save,

    /// Restore the last snapshot taken with `save`.
    Restore,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session start.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
    },

    /// Result of a `tick` command.
    Ticked {
        /// Tick after advancing.
        tick: u64,
        /// Units converted while advancing.
        captured: Vec<u64>,
        /// Items mined while advancing, by resource key.
        mined: BTreeMap<String, u64>,
    },

    /// Full state snapshot.
    State(StateSnapshot),

    /// A unit was spawned.
    Spawned {
        /// New unit id.
        entity_id: u64,
    },

    /// State hash at a tick.
    Hash {
        /// Current tick.
        tick: u64,
        /// Deterministic state hash.
        hash: u64,
    },

    /// The command succeeded with nothing else to report.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// The command failed.
    Error {
        /// Why it failed.
        message: String,
    },

    /// Session closed.
    Goodbye {
        /// Final tick.
        tick: u64,
    },
}

impl Response {
    /// Shorthand for an acknowledgement.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Shorthand for an error response.
    #[must_use]
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

/// Snapshot of every block and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Current tick.
    pub tick: u64,
    /// Capture turrets in id order.
    pub turrets: Vec<TurretState>,
    /// Drills in id order.
    pub drills: Vec<DrillState>,
    /// Units in id order.
    pub units: Vec<UnitState>,
}

/// Capture turret state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretState {
    /// Block id.
    pub id: u32,
    /// Facing in degrees.
    pub rotation: f64,
    /// Locked unit, if any.
    pub target: Option<u64>,
    /// Capture progress against the target.
    pub progress: u32,
}

/// Drill state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillState {
    /// Block id.
    pub id: u32,
    /// Rotor warmup in `[0, 1]`.
    pub warmup: f64,
    /// Ore tile counts by resource key.
    pub ores: BTreeMap<String, u32>,
    /// Buffered items by resource key.
    pub items: BTreeMap<String, u32>,
    /// Items delivered downstream so far.
    pub delivered: u32,
    /// Whether backpressure halted the last update.
    pub stalled: bool,
}

/// Unit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    /// Unit id.
    pub id: u64,
    /// World x coordinate.
    pub x: f64,
    /// World y coordinate.
    pub y: f64,
    /// Owning team id.
    pub team: u8,
    /// Ground or air.
    pub class: UnitClass,
}
