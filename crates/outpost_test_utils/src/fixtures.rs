//! Test fixtures and helpers.
//!
//! Pre-built worlds for the capture and extraction scenarios so every test
//! starts from the same layout.

use fixed::types::I32F32;
use outpost_core::capture::{CaptureTurret, CaptureTurretConfig};
use outpost_core::drill::{MultiDrill, MultiDrillConfig};
use outpost_core::math::Vec2Fixed;
use outpost_core::resources::{ResourceId, ResourceRegistry};
use outpost_core::simulation::{BlockId, Simulation};
use outpost_core::team::TeamId;
use outpost_core::tiles::{GridMap, TileCoord};
use outpost_core::units::{EntityId, UnitClass, UnitRegistry};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Anchor tile used by the drill fixtures.
pub const DRILL_ORIGIN: TileCoord = TileCoord::new(10, 10);

/// Team owning fixture turrets.
pub const TURRET_TEAM: TeamId = TeamId::SHARDED;

/// Team owning fixture targets.
pub const ENEMY_TEAM: TeamId = TeamId::CRUX;

/// Two ores: a soft one (hardness 0) and a hard one (hardness 10).
#[derive(Debug, Clone)]
pub struct OreSet {
    /// Registry holding both ores.
    pub registry: ResourceRegistry,
    /// Hardness 0.
    pub soft: ResourceId,
    /// Hardness 10.
    pub hard: ResourceId,
}

/// Register the soft and hard fixture ores.
///
/// # Panics
///
/// Never in practice; the keys are distinct and non-empty.
#[must_use]
pub fn ore_set() -> OreSet {
    let mut registry = ResourceRegistry::new();
    let soft = registry.register("copper", 0).expect("fresh registry");
    let hard = registry.register("thorium", 10).expect("fresh registry");
    OreSet {
        registry,
        soft,
        hard,
    }
}

/// A 32x32 map where a 2x2 drill at [`DRILL_ORIGIN`] sees `soft_tiles`
/// soft-ore tiles in its footprint and `hard_tiles` hard-ore tiles on its
/// edge.
///
/// Counts are clamped to what the footprint (4) and edge (8) can hold.
#[must_use]
pub fn mixed_ore_map(ores: &OreSet, soft_tiles: u8, hard_tiles: u8) -> GridMap {
    let mut map = GridMap::new(32, 32);
    let footprint = outpost_core::tiles::footprint(DRILL_ORIGIN, 2);
    let edge = outpost_core::tiles::perimeter(DRILL_ORIGIN, 2);

    for tile in footprint.into_iter().take(usize::from(soft_tiles)) {
        map.set_drop(tile, Some(ores.soft));
    }
    for tile in edge.into_iter().take(usize::from(hard_tiles)) {
        map.set_drop(tile, Some(ores.hard));
    }
    map
}

/// A drill at [`DRILL_ORIGIN`] with warmup pinned at full speed.
#[must_use]
pub fn warm_drill(map: &GridMap) -> MultiDrill {
    let mut drill = MultiDrill::placed(MultiDrillConfig::default(), DRILL_ORIGIN, map);
    drill.warmup = fixed(1);
    drill
}

/// A turret at the origin facing east.
#[must_use]
pub fn capture_turret(damage: u32) -> CaptureTurret {
    let config = CaptureTurretConfig {
        damage,
        ..CaptureTurretConfig::default()
    };
    CaptureTurret::new(config, Vec2Fixed::ZERO, TURRET_TEAM)
}

/// A registry holding one enemy ground unit directly east of the origin.
#[must_use]
pub fn lone_target(max_health: u32) -> (UnitRegistry, EntityId) {
    let mut units = UnitRegistry::new();
    let id = units.spawn_unit(
        Vec2Fixed::from_ints(20, 0),
        ENEMY_TEAM,
        max_health,
        UnitClass::Ground,
    );
    (units, id)
}

/// A full simulation with one turret, one drill on mixed ore and a few
/// enemy units scattered around the turret.
///
/// # Panics
///
/// Never in practice; the fixture layout always places validly.
#[must_use]
pub fn outpost_simulation() -> (Simulation, BlockId, BlockId) {
    let ores = ore_set();
    let map = mixed_ore_map(&ores, 2, 1);
    let mut sim = Simulation::new(map, ores.registry);

    let turret = sim
        .place_turret(
            CaptureTurretConfig::default(),
            Vec2Fixed::from_ints(40, 40),
            TURRET_TEAM,
        )
        .expect("default turret config is valid");
    let drill = sim
        .place_drill(MultiDrillConfig::default(), DRILL_ORIGIN)
        .expect("fixture map has ore under the drill");

    for (i, class) in [UnitClass::Ground, UnitClass::Air, UnitClass::Ground]
        .into_iter()
        .enumerate()
    {
        let offset = i32::try_from(i).unwrap_or(0) * 15;
        sim.units_mut().spawn_unit(
            Vec2Fixed::from_ints(60 + offset, 40 - offset),
            ENEMY_TEAM,
            40 + 30 * u32::try_from(i).unwrap_or(0),
            class,
        );
    }

    (sim, turret, drill)
}
