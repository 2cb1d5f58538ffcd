//! Run metrics collection.
//!
//! Aggregates per-tick block events into a JSON-serializable summary of
//! captures, extraction and backpressure.

use std::collections::BTreeMap;

use outpost_core::capture::CaptureEvent;
use outpost_core::drill::DrillEvent;
use outpost_core::resources::ResourceRegistry;
use outpost_core::simulation::{Simulation, TickEvents};
use outpost_core::units::EntityId;
use serde::{Deserialize, Serialize};

/// A unit converted by a turret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Tick the capture completed on.
    pub tick: u64,
    /// Turret that performed it.
    pub turret: u32,
    /// Converted unit.
    pub unit: EntityId,
    /// Team the unit joined.
    pub new_team: String,
}

/// Per-drill extraction totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillMetrics {
    /// Items mined, by resource key.
    pub mined: BTreeMap<String, u64>,
    /// Items handed downstream, by resource key.
    pub dumped: BTreeMap<String, u64>,
    /// Ticks spent stalled on full storage or missing inputs.
    pub stalled_ticks: u64,
}

impl DrillMetrics {
    /// Total items mined across all resources.
    #[must_use]
    pub fn total_mined(&self) -> u64 {
        self.mined.values().sum()
    }
}

/// Complete metrics for one scenario run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
    /// Every completed capture, in order.
    pub captures: Vec<CaptureRecord>,
    /// Progress forfeited to aim loss, summed over all turrets.
    pub forfeited_progress: u64,
    /// Per-drill totals keyed by block id.
    pub drills: BTreeMap<u32, DrillMetrics>,
    /// Surviving units per team at the end of the run.
    pub units_by_team: BTreeMap<String, usize>,
}

impl RunMetrics {
    /// Items mined by every drill, by resource key.
    #[must_use]
    pub fn mined_totals(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for drill in self.drills.values() {
            for (key, count) in &drill.mined {
                *totals.entry(key.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Collects metrics during a run.
#[derive(Debug)]
pub struct MetricsCollector {
    metrics: RunMetrics,
    resources: ResourceRegistry,
}

impl MetricsCollector {
    /// Create a collector for a simulation.
    #[must_use]
    pub fn new(scenario: &str, sim: &Simulation) -> Self {
        let drills = sim.drill_ids().map(|id| (id.0, DrillMetrics::default())).collect();
        Self {
            metrics: RunMetrics {
                scenario: scenario.to_string(),
                drills,
                ..RunMetrics::default()
            },
            resources: sim.resources().clone(),
        }
    }

    /// Record the events of one tick.
    pub fn record(&mut self, tick: u64, events: &TickEvents) {
        self.metrics.ticks = tick;

        for (block, event) in &events.captures {
            match event {
                CaptureEvent::Captured { target, new_team } => {
                    tracing::info!(tick, turret = %block, unit = target, team = %new_team, "Unit captured");
                    self.metrics.captures.push(CaptureRecord {
                        tick,
                        turret: block.0,
                        unit: *target,
                        new_team: new_team.to_string(),
                    });
                }
                CaptureEvent::AimLost { forfeited, .. } => {
                    self.metrics.forfeited_progress += u64::from(*forfeited);
                }
                _ => {}
            }
        }

        for (block, event) in &events.drills {
            let drill = self.metrics.drills.entry(block.0).or_default();
            match event {
                DrillEvent::Mined { resource } => {
                    let key = self.resources.key(*resource).to_string();
                    *drill.mined.entry(key).or_insert(0) += 1;
                }
                DrillEvent::Dumped { resource } => {
                    let key = self.resources.key(*resource).to_string();
                    *drill.dumped.entry(key).or_insert(0) += 1;
                }
                DrillEvent::Stalled => drill.stalled_ticks += 1,
            }
        }
    }

    /// Finish the run, capturing end-of-run state.
    #[must_use]
    pub fn finalize(mut self, sim: &Simulation) -> RunMetrics {
        self.metrics.ticks = sim.get_tick();
        self.metrics.final_state_hash = sim.state_hash();
        for unit in sim.units().units_sorted() {
            *self
                .metrics
                .units_by_team
                .entry(unit.team.to_string())
                .or_insert(0) += 1;
        }
        self.metrics
    }

    /// Metrics gathered so far.
    #[must_use]
    pub const fn current(&self) -> &RunMetrics {
        &self.metrics
    }
}
