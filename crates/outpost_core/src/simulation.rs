//! Fixed-timestep block scheduler.
//!
//! [`Simulation`] owns the world the blocks read from (units, ore map,
//! resource registry) and every placed block. Each tick it updates turrets,
//! then drills, each in ascending [`BlockId`] order, and returns the events
//! they produced.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`](crate::math::Fixed))
//! - Blocks and units are always visited in sorted id order
//! - Same placements and inputs always produce the same state hash
//!
//! # Example
//!
//! ```
//! use outpost_core::capture::CaptureTurretConfig;
//! use outpost_core::math::Vec2Fixed;
//! use outpost_core::simulation::Simulation;
//! use outpost_core::team::TeamId;
//! use outpost_core::units::UnitClass;
//!
//! let mut sim = Simulation::default();
//! let turret = sim
//!     .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
//!     .unwrap();
//! let unit = sim
//!     .units_mut()
//!     .spawn_unit(Vec2Fixed::from_ints(20, 0), TeamId::CRUX, 25, UnitClass::Ground);
//!
//! for _ in 0..4 {
//!     sim.tick();
//! }
//! assert_eq!(sim.unit_team(unit), Some(TeamId::SHARDED));
//! # let _ = turret;
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureEvent, CaptureTurret, CaptureTurretConfig};
use crate::context::BlockContext;
use crate::drill::{can_place_on, DrillEvent, MultiDrill, MultiDrillConfig};
use crate::error::{GameError, Result};
use crate::inventory::{BufferSink, ItemStorage};
use crate::math::Vec2Fixed;
use crate::resources::{ResourceId, ResourceRegistry};
use crate::team::TeamId;
use crate::tiles::{footprint, perimeter, GridMap, TileCoord};
use crate::units::{EntityId, UnitIndex, UnitRegistry};

/// Version tag written at the head of persisted block data.
pub const SAVE_VERSION: u32 = 1;

/// Identifier of a placed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// Events generated during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Turret events, in turret id order.
    pub captures: Vec<(BlockId, CaptureEvent)>,
    /// Drill events, in drill id order.
    pub drills: Vec<(BlockId, DrillEvent)>,
}

impl TickEvents {
    /// Units converted this tick.
    pub fn captured(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.captures.iter().filter_map(|(_, event)| match event {
            CaptureEvent::Captured { target, .. } => Some(*target),
            _ => None,
        })
    }

    /// Items mined this tick.
    pub fn mined(&self) -> impl Iterator<Item = (BlockId, ResourceId)> + '_ {
        self.drills.iter().filter_map(|(block, event)| match event {
            DrillEvent::Mined { resource } => Some((*block, *resource)),
            _ => None,
        })
    }
}

/// A drill plus the conveyor it dumps into.
#[derive(Debug, Clone)]
struct DrillSlot {
    drill: MultiDrill,
    output: BufferSink,
}

/// Persisted block extras, keyed by block id.
#[derive(Debug, Serialize, Deserialize)]
struct BlockSave {
    version: u32,
    turrets: Vec<(BlockId, Vec<u8>)>,
    drills: Vec<(BlockId, ItemStorage, Vec<u8>)>,
}

/// The block simulation.
///
/// # System Execution Order
///
/// 1. Pending drill proximity rebuilds
/// 2. Capture turrets
/// 3. Dead unit sweep
/// 4. Multi-ore drills
#[derive(Debug, Clone)]
pub struct Simulation {
    tick: u64,
    units: UnitRegistry,
    map: GridMap,
    resources: ResourceRegistry,
    turrets: BTreeMap<BlockId, CaptureTurret>,
    drills: BTreeMap<BlockId, DrillSlot>,
    contexts: BTreeMap<BlockId, BlockContext>,
    default_context: BlockContext,
    pending_rebuild: BTreeSet<BlockId>,
    next_block: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(GridMap::new(0, 0), ResourceRegistry::new())
    }
}

impl Simulation {
    /// Create a simulation over an ore map.
    #[must_use]
    pub fn new(map: GridMap, resources: ResourceRegistry) -> Self {
        Self {
            tick: 0,
            units: UnitRegistry::new(),
            map,
            resources,
            turrets: BTreeMap::new(),
            drills: BTreeMap::new(),
            contexts: BTreeMap::new(),
            default_context: BlockContext::new(),
            pending_rebuild: BTreeSet::new(),
            next_block: 0,
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Units and buildings.
    #[must_use]
    pub const fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Units and buildings, for spawning and scripted changes.
    pub fn units_mut(&mut self) -> &mut UnitRegistry {
        &mut self.units
    }

    /// Team of a unit, if it exists.
    #[must_use]
    pub fn unit_team(&self, id: EntityId) -> Option<TeamId> {
        self.units.unit(id).map(|u| u.team)
    }

    /// The ore map.
    #[must_use]
    pub const fn map(&self) -> &GridMap {
        &self.map
    }

    /// Registered resources.
    #[must_use]
    pub const fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Context used for blocks without an override.
    pub fn set_default_context(&mut self, ctx: BlockContext) {
        self.default_context = ctx;
    }

    /// Override the context for one block, e.g. to model a power shortage.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownBlock`] if the block does not exist.
    pub fn set_block_context(&mut self, block: BlockId, ctx: BlockContext) -> Result<()> {
        if !self.turrets.contains_key(&block) && !self.drills.contains_key(&block) {
            return Err(GameError::UnknownBlock(block.0));
        }
        self.contexts.insert(block, ctx);
        Ok(())
    }

    fn context_for(&self, block: BlockId) -> BlockContext {
        self.contexts
            .get(&block)
            .copied()
            .unwrap_or(self.default_context)
    }

    fn allocate_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    /// Place a capture turret.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the config fails validation.
    pub fn place_turret(
        &mut self,
        config: CaptureTurretConfig,
        position: Vec2Fixed,
        team: TeamId,
    ) -> Result<BlockId> {
        config.validate("capture_turret")?;
        let id = self.allocate_block();
        self.turrets
            .insert(id, CaptureTurret::new(config, position, team));
        tracing::debug!(block = %id, team = %team, "Placed capture turret");
        Ok(id)
    }

    /// Place a multi-ore drill with an unbounded output conveyor.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the config fails validation, or
    /// [`GameError::InvalidPlacement`] if no ore lies under or beside the footprint.
    pub fn place_drill(&mut self, config: MultiDrillConfig, origin: TileCoord) -> Result<BlockId> {
        self.place_drill_with_output(config, origin, BufferSink::unbounded())
    }

    /// Place a multi-ore drill dumping into `output`.
    ///
    /// # Errors
    ///
    /// See [`Simulation::place_drill`].
    pub fn place_drill_with_output(
        &mut self,
        config: MultiDrillConfig,
        origin: TileCoord,
        output: BufferSink,
    ) -> Result<BlockId> {
        config.validate("multi_drill")?;
        if !can_place_on(&self.map, origin, config.size) {
            return Err(GameError::InvalidPlacement {
                block: "multi_drill".to_string(),
                x: origin.x,
                y: origin.y,
                reason: "no ore under or beside the footprint".to_string(),
            });
        }

        let id = self.allocate_block();
        let drill = MultiDrill::placed(config, origin, &self.map);
        tracing::debug!(block = %id, x = origin.x, y = origin.y, "Placed multi drill");
        self.drills.insert(id, DrillSlot { drill, output });
        Ok(id)
    }

    /// Remove a block.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownBlock`] if the block does not exist.
    pub fn remove_block(&mut self, block: BlockId) -> Result<()> {
        let removed = self.turrets.remove(&block).is_some() || self.drills.remove(&block).is_some();
        if !removed {
            return Err(GameError::UnknownBlock(block.0));
        }
        self.contexts.remove(&block);
        self.pending_rebuild.remove(&block);
        Ok(())
    }

    /// Look up a turret.
    #[must_use]
    pub fn turret(&self, block: BlockId) -> Option<&CaptureTurret> {
        self.turrets.get(&block)
    }

    /// Look up a drill.
    #[must_use]
    pub fn drill(&self, block: BlockId) -> Option<&MultiDrill> {
        self.drills.get(&block).map(|slot| &slot.drill)
    }

    /// Look up a drill mutably.
    pub fn drill_mut(&mut self, block: BlockId) -> Option<&mut MultiDrill> {
        self.drills.get_mut(&block).map(|slot| &mut slot.drill)
    }

    /// Items a drill has dumped downstream so far.
    #[must_use]
    pub fn drill_output(&self, block: BlockId) -> Option<&ItemStorage> {
        self.drills.get(&block).map(|slot| &slot.output.received)
    }

    /// Turret ids in ascending order.
    pub fn turret_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.turrets.keys().copied()
    }

    /// Drill ids in ascending order.
    pub fn drill_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.drills.keys().copied()
    }

    /// Change the ore on a tile.
    ///
    /// Drills whose footprint or edge covers the tile rediscover their ores
    /// before the next tick. Returns false when the tile is off the map.
    pub fn set_tile(&mut self, tile: TileCoord, drop: Option<ResourceId>) -> bool {
        if !self.map.set_drop(tile, drop) {
            return false;
        }
        for (id, slot) in &self.drills {
            let origin = slot.drill.origin();
            let size = slot.drill.config().size;
            let touches = footprint(origin, size)
                .into_iter()
                .chain(perimeter(origin, size))
                .any(|t| t == tile);
            if touches {
                self.pending_rebuild.insert(*id);
            }
        }
        true
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();

        // 1. Proximity rebuilds
        for id in std::mem::take(&mut self.pending_rebuild) {
            if let Some(slot) = self.drills.get_mut(&id) {
                slot.drill.on_proximity_update(&self.map);
            }
        }

        // 2. Turrets
        let turret_ids: Vec<BlockId> = self.turrets.keys().copied().collect();
        for id in turret_ids {
            let ctx = self.context_for(id);
            if let Some(turret) = self.turrets.get_mut(&id) {
                let produced = turret.update(&ctx, &mut self.units);
                events.captures.extend(produced.into_iter().map(|e| (id, e)));
            }
        }

        // 3. Remove units killed or converted away
        let swept = self.units.sweep_dead();
        if !swept.is_empty() {
            tracing::debug!(tick = self.tick, count = swept.len(), "Swept dead units");
        }

        // 4. Drills
        let drill_ids: Vec<BlockId> = self.drills.keys().copied().collect();
        for id in drill_ids {
            let ctx = self.context_for(id);
            if let Some(slot) = self.drills.get_mut(&id) {
                let produced = slot.drill.update(&ctx, &self.resources, &mut slot.output);
                events.drills.extend(produced.into_iter().map(|e| (id, e)));
            }
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Identical placements fed identical inputs hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.units.unit_count().hash(&mut hasher);
        for unit in self.units.units_sorted() {
            unit.id.hash(&mut hasher);
            unit.position.x.to_bits().hash(&mut hasher);
            unit.position.y.to_bits().hash(&mut hasher);
            unit.team.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.dead.hash(&mut hasher);
        }

        for (id, turret) in &self.turrets {
            id.hash(&mut hasher);
            turret.rotation().to_bits().hash(&mut hasher);
            turret.target().hash(&mut hasher);
            turret.progress().hash(&mut hasher);
        }

        for (id, slot) in &self.drills {
            id.hash(&mut hasher);
            slot.drill.warmup.to_bits().hash(&mut hasher);
            for (resource, progress) in slot.drill.progress_map() {
                resource.hash(&mut hasher);
                progress.to_bits().hash(&mut hasher);
            }
            for (resource, count) in slot.drill.items().iter() {
                resource.hash(&mut hasher);
                count.hash(&mut hasher);
            }
            for (resource, count) in slot.output.received.iter() {
                resource.hash(&mut hasher);
                count.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize every block's persisted state.
    ///
    /// Turrets keep their rotation; drills keep their inventory only.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveFormat`] if encoding fails.
    pub fn save_blocks(&self) -> Result<Vec<u8>> {
        let turrets = self
            .turrets
            .iter()
            .map(|(id, turret)| Ok((*id, turret.write_extra()?)))
            .collect::<Result<Vec<_>>>()?;
        let drills = self
            .drills
            .iter()
            .map(|(id, slot)| (*id, slot.drill.items().clone(), slot.drill.write_extra()))
            .collect();

        let save = BlockSave {
            version: SAVE_VERSION,
            turrets,
            drills,
        };
        Ok(bincode::serialize(&save)?)
    }

    /// Restore block state written by [`Simulation::save_blocks`] onto the
    /// same block layout.
    ///
    /// Either every block is restored or none is.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveFormat`] on malformed data or a version
    /// mismatch, and [`GameError::UnknownBlock`] if the data names a block
    /// that is not placed here.
    pub fn load_blocks(&mut self, data: &[u8]) -> Result<()> {
        let save: BlockSave = bincode::deserialize(data)?;
        if save.version != SAVE_VERSION {
            return Err(GameError::SaveFormat(format!(
                "unsupported block save version {} (expected {SAVE_VERSION})",
                save.version
            )));
        }

        let mut turrets = Vec::with_capacity(save.turrets.len());
        for (id, extra) in &save.turrets {
            let mut turret = self
                .turrets
                .get(id)
                .cloned()
                .ok_or(GameError::UnknownBlock(id.0))?;
            turret.read_extra(extra)?;
            turrets.push((*id, turret));
        }
        let mut drills = Vec::with_capacity(save.drills.len());
        for (id, items, extra) in save.drills {
            let mut drill = self
                .drills
                .get(&id)
                .map(|slot| slot.drill.clone())
                .ok_or(GameError::UnknownBlock(id.0))?;
            drill.read_extra(&extra)?;
            *drill.items_mut() = items;
            drills.push((id, drill));
        }

        for (id, turret) in turrets {
            self.turrets.insert(id, turret);
        }
        for (id, drill) in drills {
            if let Some(slot) = self.drills.get_mut(&id) {
                slot.drill = drill;
            }
        }

        tracing::debug!(tick = self.tick, "Loaded block state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::units::UnitClass;

    fn ore_world() -> (Simulation, ResourceId, ResourceId) {
        let mut resources = ResourceRegistry::new();
        let copper = resources.register("copper", 0).unwrap();
        let titanium = resources.register("titanium", 10).unwrap();
        let mut map = GridMap::new(32, 32);
        map.set_drop(TileCoord::new(10, 10), Some(copper));
        map.set_drop(TileCoord::new(11, 10), Some(copper));
        map.set_drop(TileCoord::new(10, 9), Some(titanium));
        (Simulation::new(map, resources), copper, titanium)
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = Simulation::default();
        sim.tick();
        sim.tick();
        assert_eq!(sim.get_tick(), 2);
    }

    #[test]
    fn test_turret_captures_through_scheduler() {
        let mut sim = Simulation::default();
        sim.place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        let unit = sim.units_mut().spawn_unit(
            Vec2Fixed::from_ints(20, 0),
            TeamId::CRUX,
            25,
            UnitClass::Ground,
        );

        let mut captured = Vec::new();
        for _ in 0..4 {
            captured.extend(sim.tick().captured());
        }
        assert_eq!(captured, vec![unit]);
        assert_eq!(sim.unit_team(unit), Some(TeamId::SHARDED));
    }

    #[test]
    fn test_drill_placement_requires_ore() {
        let (mut sim, _, _) = ore_world();
        let result = sim.place_drill(MultiDrillConfig::default(), TileCoord::new(20, 20));
        assert!(matches!(result, Err(GameError::InvalidPlacement { .. })));
        for corner in [
            TileCoord::new(i32::MAX, i32::MAX),
            TileCoord::new(i32::MIN, i32::MIN),
        ] {
            let result = sim.place_drill(MultiDrillConfig::default(), corner);
            assert!(matches!(result, Err(GameError::InvalidPlacement { .. })));
        }
        assert!(sim
            .place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
            .is_ok());
    }

    #[test]
    fn test_drill_dumps_into_output() {
        let (mut sim, copper, _) = ore_world();
        let drill = sim
            .place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
            .unwrap();
        if let Some(d) = sim.drill_mut(drill) {
            d.warmup = Fixed::ONE;
        }

        for _ in 0..300 {
            sim.tick();
        }
        assert_eq!(sim.drill_output(drill).map(|o| o.get(copper)), Some(2));
    }

    #[test]
    fn test_set_tile_triggers_rebuild() {
        let (mut sim, copper, titanium) = ore_world();
        let drill = sim
            .place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
            .unwrap();
        for _ in 0..20 {
            sim.tick();
        }
        assert!(sim.drill(drill).unwrap().progress(copper) > Fixed::ZERO);

        assert!(sim.set_tile(TileCoord::new(10, 9), None));
        sim.tick();
        let d = sim.drill(drill).unwrap();
        assert!(!d.ores().contains_key(&titanium));
        // Progress restarted from zero on the rebuild, then advanced one tick
        assert!(d.progress(copper) < Fixed::ONE);

        assert!(!sim.set_tile(TileCoord::new(-1, 0), Some(copper)));
    }

    #[test]
    fn test_block_context_override() {
        let mut sim = Simulation::default();
        let turret = sim
            .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        sim.set_block_context(turret, BlockContext::new().with_efficiency(Fixed::ZERO))
            .unwrap();
        sim.units_mut().spawn_unit(
            Vec2Fixed::from_ints(20, 0),
            TeamId::CRUX,
            5,
            UnitClass::Ground,
        );
        for _ in 0..5 {
            sim.tick();
        }
        assert_eq!(sim.turret(turret).unwrap().progress(), 0);
        assert!(sim.set_block_context(BlockId(99), BlockContext::new()).is_err());
    }

    #[test]
    fn test_deterministic_hash() {
        let build = || {
            let (mut sim, _, _) = ore_world();
            sim.place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
                .unwrap();
            sim.place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
                .unwrap();
            sim.units_mut().spawn_unit(
                Vec2Fixed::from_ints(30, 30),
                TeamId::CRUX,
                500,
                UnitClass::Air,
            );
            for _ in 0..50 {
                sim.tick();
            }
            sim.state_hash()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_save_load_blocks() {
        let (mut sim, copper, _) = ore_world();
        let turret = sim
            .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        let drill = sim
            .place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
            .unwrap();
        sim.units_mut().spawn_unit(
            Vec2Fixed::from_ints(0, 20),
            TeamId::CRUX,
            1000,
            UnitClass::Ground,
        );
        if let Some(d) = sim.drill_mut(drill) {
            d.items_mut().add(copper, 4);
        }
        for _ in 0..5 {
            sim.tick();
        }
        let rotation = sim.turret(turret).unwrap().rotation();
        let bytes = sim.save_blocks().unwrap();

        let (mut restored, _, _) = ore_world();
        restored
            .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        restored
            .place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
            .unwrap();
        restored.load_blocks(&bytes).unwrap();

        let t = restored.turret(turret).unwrap();
        assert_eq!(t.rotation(), rotation);
        assert_eq!(t.progress(), 0);
        let d = restored.drill(drill).unwrap();
        assert_eq!(d.items(), sim.drill(drill).unwrap().items());
        assert_eq!(d.warmup, Fixed::ZERO);
    }

    #[test]
    fn test_load_rejects_unknown_block() {
        let mut sim = Simulation::default();
        sim.place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        let bytes = sim.save_blocks().unwrap();

        let mut empty = Simulation::default();
        assert!(matches!(
            empty.load_blocks(&bytes),
            Err(GameError::UnknownBlock(0))
        ));
        assert!(empty.load_blocks(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_failed_load_changes_nothing() {
        let (mut sim, copper, _) = ore_world();
        sim.place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        let drill = sim
            .place_drill(MultiDrillConfig::default(), TileCoord::new(10, 10))
            .unwrap();
        if let Some(d) = sim.drill_mut(drill) {
            d.items_mut().add(copper, 3);
        }
        let bytes = sim.save_blocks().unwrap();

        // Same turret, but no drill to receive the saved inventory
        let (mut other, _, _) = ore_world();
        let turret = other
            .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        other.units_mut().spawn_unit(
            Vec2Fixed::from_ints(0, 20),
            TeamId::CRUX,
            1000,
            UnitClass::Ground,
        );
        for _ in 0..5 {
            other.tick();
        }
        let rotation = other.turret(turret).unwrap().rotation();
        let hash = other.state_hash();

        assert!(matches!(
            other.load_blocks(&bytes),
            Err(GameError::UnknownBlock(1))
        ));
        assert_eq!(other.turret(turret).unwrap().rotation(), rotation);
        assert_eq!(other.state_hash(), hash);
    }

    #[test]
    fn test_dead_units_are_swept() {
        let mut sim = Simulation::default();
        let turret = sim
            .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        let unit = sim.units_mut().spawn_unit(
            Vec2Fixed::from_ints(20, 0),
            TeamId::CRUX,
            1000,
            UnitClass::Ground,
        );
        sim.tick();
        assert_eq!(sim.turret(turret).unwrap().target(), Some(unit));

        assert!(sim.units_mut().kill(unit));
        let events = sim.tick();
        assert_eq!(sim.units().unit_count(), 0);
        assert_eq!(sim.turret(turret).unwrap().target(), None);
        assert!(events
            .captures
            .contains(&(turret, CaptureEvent::TargetLost { target: unit })));
    }

    #[test]
    fn test_remove_block() {
        let mut sim = Simulation::default();
        let turret = sim
            .place_turret(CaptureTurretConfig::default(), Vec2Fixed::ZERO, TeamId::SHARDED)
            .unwrap();
        sim.remove_block(turret).unwrap();
        assert!(sim.turret(turret).is_none());
        assert!(sim.remove_block(turret).is_err());
    }
}
