//! Scenario loading and configuration.
//!
//! Scenarios define the initial world for headless runs: registered ores,
//! an ASCII ore map, enemy units and block placements.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Ridge Outpost",
//!     resources: [(id: "copper", hardness: 1), (id: "titanium", hardness: 3)],
//!     legend: {'c': "copper", 't': "titanium"},
//!     map: [
//!         "........",
//!         ".cc.t...",
//!         ".cc.....",
//!     ],
//!     units: [(x: 60, y: 0, team: 2, max_health: 200, class: Air)],
//!     turrets: [(x: 0, y: 0, team: 1)],
//!     drills: [(x: 1, y: 1, power_percent: Some(50))],
//!     ticks: 600,
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use outpost_core::capture::CaptureTurretConfig;
use outpost_core::context::BlockContext;
use outpost_core::data::ResourceData;
use outpost_core::drill::MultiDrillConfig;
use outpost_core::error::GameError;
use outpost_core::math::{ratio, Vec2Fixed};
use outpost_core::resources::ResourceRegistry;
use outpost_core::simulation::Simulation;
use outpost_core::team::TeamId;
use outpost_core::tiles::{GridMap, TileCoord};
use outpost_core::units::UnitClass;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The map rows or legend are malformed.
    #[error("Invalid scenario map: {0}")]
    InvalidMap(String),
    /// The simulation rejected part of the scenario.
    #[error(transparent)]
    Core(#[from] GameError),
}

/// A unit group to spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// World x coordinate.
    pub x: i32,
    /// World y coordinate.
    pub y: i32,
    /// Owning team id.
    pub team: u8,
    /// Maximum health.
    pub max_health: u32,
    /// Ground or air.
    #[serde(default)]
    pub class: UnitClass,
    /// Number of units, spaced 4 world units apart along x.
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// A capture turret to place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretPlacement {
    /// World x coordinate.
    pub x: i32,
    /// World y coordinate.
    pub y: i32,
    /// Owning team id.
    pub team: u8,
    /// Tuning parameters.
    #[serde(default)]
    pub config: CaptureTurretConfig,
    /// Power satisfaction in percent; full power when omitted.
    #[serde(default)]
    pub power_percent: Option<u32>,
}

/// A multi-ore drill to place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillPlacement {
    /// Origin tile x.
    pub x: i32,
    /// Origin tile y.
    pub y: i32,
    /// Tuning parameters.
    #[serde(default)]
    pub config: MultiDrillConfig,
    /// Power satisfaction in percent; full power when omitted.
    #[serde(default)]
    pub power_percent: Option<u32>,
    /// Whether the boost liquid is supplied.
    #[serde(default)]
    pub boosted: bool,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Ore types, registered in list order.
    pub resources: Vec<ResourceData>,
    /// Map characters to resource keys. `.` and unknown-free characters drop nothing.
    #[serde(default)]
    pub legend: BTreeMap<char, String>,
    /// Ore map rows; row `i` is tile `y = i`.
    #[serde(default)]
    pub map: Vec<String>,
    /// Units to spawn.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Turrets to place.
    #[serde(default)]
    pub turrets: Vec<TurretPlacement>,
    /// Drills to place.
    #[serde(default)]
    pub drills: Vec<DrillPlacement>,
    /// Default run length in ticks.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

fn default_ticks() -> u64 {
    3600
}

impl Default for Scenario {
    fn default() -> Self {
        Self::outpost_defense()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A small outpost: two drills on mixed ore guarded by one turret
    /// against a mixed wave.
    #[must_use]
    pub fn outpost_defense() -> Self {
        Self {
            name: "Outpost Defense".to_string(),
            description: "Two drills on mixed ore, one capture turret against a mixed wave"
                .to_string(),
            resources: vec![
                ResourceData {
                    id: "copper".to_string(),
                    hardness: 1,
                },
                ResourceData {
                    id: "lead".to_string(),
                    hardness: 1,
                },
                ResourceData {
                    id: "titanium".to_string(),
                    hardness: 3,
                },
            ],
            legend: BTreeMap::from([
                ('c', "copper".to_string()),
                ('l', "lead".to_string()),
                ('t', "titanium".to_string()),
            ]),
            map: vec![
                "............".to_string(),
                ".ccl....tt..".to_string(),
                ".cc.....tc..".to_string(),
                "..l.........".to_string(),
                "............".to_string(),
            ],
            units: vec![
                UnitPlacement {
                    x: 40,
                    y: 0,
                    team: TeamId::CRUX.0,
                    max_health: 120,
                    class: UnitClass::Ground,
                    count: 2,
                },
                UnitPlacement {
                    x: -30,
                    y: 30,
                    team: TeamId::CRUX.0,
                    max_health: 250,
                    class: UnitClass::Air,
                    count: 1,
                },
            ],
            turrets: vec![TurretPlacement {
                x: 0,
                y: 0,
                team: TeamId::SHARDED.0,
                config: CaptureTurretConfig::default(),
                power_percent: None,
            }],
            drills: vec![
                DrillPlacement {
                    x: 1,
                    y: 1,
                    config: MultiDrillConfig::default(),
                    power_percent: None,
                    boosted: false,
                },
                DrillPlacement {
                    x: 8,
                    y: 1,
                    config: MultiDrillConfig::default(),
                    power_percent: Some(60),
                    boosted: true,
                },
            ],
            ticks: 3600,
        }
    }

    /// Build the resource registry and ore map.
    pub fn build_world(&self) -> Result<(ResourceRegistry, GridMap), ScenarioError> {
        let registry = ResourceRegistry::from_data(&self.resources)?;

        let height = u32::try_from(self.map.len())
            .map_err(|_| ScenarioError::InvalidMap("too many rows".to_string()))?;
        let width = self.map.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let width = u32::try_from(width)
            .map_err(|_| ScenarioError::InvalidMap("row too long".to_string()))?;

        let mut map = GridMap::new(width, height);
        for (y, row) in self.map.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '.' || ch == ' ' {
                    continue;
                }
                let key = self.legend.get(&ch).ok_or_else(|| {
                    ScenarioError::InvalidMap(format!("character '{ch}' at ({x}, {y}) has no legend entry"))
                })?;
                let resource = registry.id_of(key)?;
                let tile = TileCoord::new(
                    i32::try_from(x).map_err(|_| ScenarioError::InvalidMap("row too long".into()))?,
                    i32::try_from(y).map_err(|_| ScenarioError::InvalidMap("too many rows".into()))?,
                );
                map.set_drop(tile, Some(resource));
            }
        }

        Ok((registry, map))
    }

    /// Build a ready-to-run simulation.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        let (registry, map) = self.build_world()?;
        let mut sim = Simulation::new(map, registry);

        for placement in &self.turrets {
            let id = sim.place_turret(
                placement.config.clone(),
                Vec2Fixed::from_ints(placement.x, placement.y),
                TeamId(placement.team),
            )?;
            if let Some(ctx) = power_context(placement.power_percent, false) {
                sim.set_block_context(id, ctx)?;
            }
        }

        for placement in &self.drills {
            let id = sim.place_drill(
                placement.config.clone(),
                TileCoord::new(placement.x, placement.y),
            )?;
            if let Some(ctx) = power_context(placement.power_percent, placement.boosted) {
                sim.set_block_context(id, ctx)?;
            }
        }

        for group in &self.units {
            for i in 0..group.count {
                let offset = i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(4);
                sim.units_mut().spawn_unit(
                    Vec2Fixed::from_ints(group.x.saturating_add(offset), group.y),
                    TeamId(group.team),
                    group.max_health,
                    group.class,
                );
            }
        }

        tracing::debug!(
            scenario = %self.name,
            turrets = self.turrets.len(),
            drills = self.drills.len(),
            units = sim.units().unit_count(),
            "Scenario built"
        );
        Ok(sim)
    }
}

/// Context override for a block, or `None` for the default full-power context.
fn power_context(power_percent: Option<u32>, boosted: bool) -> Option<BlockContext> {
    if power_percent.is_none() && !boosted {
        return None;
    }
    let percent = power_percent.unwrap_or(100).min(100);
    let percent = i32::try_from(percent).unwrap_or(100);
    Some(
        BlockContext::new()
            .with_efficiency(ratio(percent, 100))
            .with_boost(boosted),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_builds() {
        let scenario = Scenario::default();
        let sim = scenario.build().unwrap();
        assert_eq!(sim.turret_ids().count(), 1);
        assert_eq!(sim.drill_ids().count(), 2);
        assert_eq!(sim.units().unit_count(), 3);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                resources: [(id: "sand")],
                legend: {'s': "sand"},
                map: ["ss", "s."],
                drills: [(x: 0, y: 0)],
                ticks: 10,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.ticks, 10);

        let (registry, map) = scenario.build_world().unwrap();
        assert_eq!(map.width(), 2);
        let sand = registry.id_of("sand").unwrap();
        assert_eq!(
            outpost_core::tiles::TileMap::drop_at(&map, TileCoord::new(1, 0)),
            Some(sand)
        );
    }

    #[test]
    fn test_unknown_legend_char_rejected() {
        let scenario = Scenario {
            map: vec!["x".to_string()],
            ..Scenario::outpost_defense()
        };
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::InvalidMap(_))
        ));
    }

    #[test]
    fn test_drill_without_ore_rejected() {
        let ron = r#"
            Scenario(
                name: "Barren",
                resources: [(id: "sand")],
                map: ["....", "....", "....", "...."],
                drills: [(x: 1, y: 1)],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::Core(GameError::InvalidPlacement { .. }))
        ));
    }

    #[test]
    fn test_power_context() {
        assert!(power_context(None, false).is_none());
        let ctx = power_context(Some(50), true).unwrap();
        assert_eq!(ctx.efficiency, ratio(1, 2));
        assert!(ctx.boost_valid);
    }
}
