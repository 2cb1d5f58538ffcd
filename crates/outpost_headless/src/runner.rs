//! Scenario runner for batch runs, determinism checks and interactive sessions.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use outpost_core::context::BlockContext;
use outpost_core::math::{ratio, Vec2Fixed};
use outpost_core::resources::{ResourceId, ResourceRegistry};
use outpost_core::simulation::{BlockId, Simulation, TickEvents};
use outpost_core::team::TeamId;
use outpost_core::tiles::TileCoord;
use rayon::prelude::*;

use crate::metrics::{MetricsCollector, RunMetrics};
use crate::protocol::{
    Command, DrillState, Response, StateSnapshot, TurretState, UnitState, PROTOCOL_VERSION,
};
use crate::scenario::{Scenario, ScenarioError};

/// Outcome of running a scenario several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismReport {
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Ticks per run.
    pub ticks: u64,
}

impl DeterminismReport {
    /// Whether every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
    }
}

/// Drives a simulation built from a scenario.
#[derive(Debug)]
pub struct ScenarioRunner {
    scenario: Scenario,
    sim: Simulation,
    collector: MetricsCollector,
    snapshot: Option<Vec<u8>>,
}

impl ScenarioRunner {
    /// Build the scenario's simulation.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        let sim = scenario.build()?;
        let collector = MetricsCollector::new(&scenario.name, &sim);
        Ok(Self {
            scenario,
            sim,
            collector,
            snapshot: None,
        })
    }

    /// The running simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// The scenario this runner was built from.
    #[must_use]
    pub const fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Advance one tick and record its events.
    pub fn step(&mut self) -> TickEvents {
        let events = self.sim.tick();
        self.collector.record(self.sim.get_tick(), &events);
        events
    }

    /// Run `ticks` ticks (the scenario's own length when `None`) and return metrics.
    #[must_use]
    pub fn run(mut self, ticks: Option<u64>) -> RunMetrics {
        let ticks = ticks.unwrap_or(self.scenario.ticks);
        tracing::info!(scenario = %self.scenario.name, ticks, "Running scenario");
        for _ in 0..ticks {
            self.step();
        }
        let metrics = self.collector.finalize(&self.sim);
        tracing::info!(
            hash = %format!("{:016x}", metrics.final_state_hash),
            captures = metrics.captures.len(),
            "Scenario finished"
        );
        metrics
    }

    /// Handle one protocol command.
    pub fn handle(&mut self, command: Command) -> Response {
        match command {
            Command::Tick { count } => {
                let mut captured = Vec::new();
                let mut mined: BTreeMap<String, u64> = BTreeMap::new();
                for _ in 0..count {
                    let events = self.step();
                    captured.extend(events.captured());
                    for (_, resource) in events.mined() {
                        let key = self.sim.resources().key(resource).to_string();
                        *mined.entry(key).or_insert(0) += 1;
                    }
                }
                Response::Ticked {
                    tick: self.sim.get_tick(),
                    captured,
                    mined,
                }
            }
            Command::Query => Response::State(self.snapshot_state()),
            Command::SpawnUnit {
                x,
                y,
                team,
                max_health,
                class,
            } => {
                let entity_id = self.sim.units_mut().spawn_unit(
                    Vec2Fixed::from_ints(x, y),
                    TeamId(team),
                    max_health,
                    class,
                );
                Response::Spawned { entity_id }
            }
            Command::SetTile { x, y, resource } => {
                let drop = match resource.as_deref().map(|key| self.sim.resources().id_of(key)) {
                    None => None,
                    Some(Ok(id)) => Some(id),
                    Some(Err(e)) => return Response::error(e),
                };
                if self.sim.set_tile(TileCoord::new(x, y), drop) {
                    Response::ack("set_tile")
                } else {
                    Response::error(format!("tile ({x}, {y}) is outside the map"))
                }
            }
            Command::SetPower {
                block,
                percent,
                boosted,
            } => {
                let percent = i32::try_from(percent.min(100)).unwrap_or(100);
                let ctx = BlockContext::new()
                    .with_efficiency(ratio(percent, 100))
                    .with_boost(boosted);
                match self.sim.set_block_context(BlockId(block), ctx) {
                    Ok(()) => Response::ack("set_power"),
                    Err(e) => Response::error(e),
                }
            }
            Command::Hash => Response::Hash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            },
            Command::Save => match self.sim.save_blocks() {
                Ok(bytes) => {
                    self.snapshot = Some(bytes);
                    Response::ack("save")
                }
                Err(e) => Response::error(e),
            },
            Command::Restore => {
                let Some(bytes) = self.snapshot.as_deref() else {
                    return Response::error("no snapshot saved");
                };
                match self.sim.load_blocks(bytes) {
                    Ok(()) => Response::ack("restore"),
                    Err(e) => Response::error(e),
                }
            }
            Command::Quit => Response::Goodbye {
                tick: self.sim.get_tick(),
            },
        }
    }

    /// Serve JSON-line commands until `quit` or end of input.
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> io::Result<()> {
        send(
            &mut writer,
            &Response::Ready {
                version: PROTOCOL_VERSION.to_string(),
                tick: self.sim.get_tick(),
            },
        )?;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let response = match serde_json::from_str::<Command>(line) {
                Ok(command) => {
                    tracing::debug!(?command, "Received command");
                    let quit = command == Command::Quit;
                    let response = self.handle(command);
                    if quit {
                        return send(&mut writer, &response);
                    }
                    response
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid command");
                    Response::error(format!("invalid command: {e}"))
                }
            };
            send(&mut writer, &response)?;
        }
        Ok(())
    }

    fn snapshot_state(&self) -> StateSnapshot {
        let resources = self.sim.resources();

        let turrets = self
            .sim
            .turret_ids()
            .filter_map(|id| {
                self.sim.turret(id).map(|turret| TurretState {
                    id: id.0,
                    rotation: turret.rotation().to_num::<f64>(),
                    target: turret.target(),
                    progress: turret.progress(),
                })
            })
            .collect();

        let drills = self
            .sim
            .drill_ids()
            .filter_map(|id| {
                self.sim.drill(id).map(|drill| DrillState {
                    id: id.0,
                    warmup: drill.warmup.to_num::<f64>(),
                    ores: named_counts(resources, drill.ores().iter().map(|(r, c)| (*r, *c))),
                    items: named_counts(resources, drill.items().iter()),
                    delivered: self.sim.drill_output(id).map_or(0, |out| out.total()),
                    stalled: drill.is_stalled(),
                })
            })
            .collect();

        let units = self
            .sim
            .units()
            .units_sorted()
            .map(|unit| UnitState {
                id: unit.id,
                x: unit.position.x.to_num::<f64>(),
                y: unit.position.y.to_num::<f64>(),
                team: unit.team.0,
                class: unit.class,
            })
            .collect();

        StateSnapshot {
            tick: self.sim.get_tick(),
            turrets,
            drills,
            units,
        }
    }
}

fn named_counts(
    resources: &ResourceRegistry,
    counts: impl Iterator<Item = (ResourceId, u32)>,
) -> BTreeMap<String, u32> {
    counts
        .map(|(id, count)| (resources.key(id).to_string(), count))
        .collect()
}

fn send<W: Write>(writer: &mut W, response: &Response) -> io::Result<()> {
    let json = serde_json::to_string(response).map_err(io::Error::other)?;
    writeln!(writer, "{json}")?;
    writer.flush()
}

/// Run a scenario `runs` times from scratch, in parallel, and compare final hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    runs: usize,
    ticks: Option<u64>,
) -> Result<DeterminismReport, ScenarioError> {
    let ticks = ticks.unwrap_or(scenario.ticks);
    let hashes = (0..runs)
        .into_par_iter()
        .map(|run| {
            let metrics = ScenarioRunner::new(scenario.clone())?.run(Some(ticks));
            tracing::debug!(run, hash = metrics.final_state_hash, "Determinism run complete");
            Ok(metrics.final_state_hash)
        })
        .collect::<Result<Vec<u64>, ScenarioError>>()?;
    Ok(DeterminismReport { hashes, ticks })
}
