//! Unit registry and target queries.
//!
//! Turrets never own the entities they track. They hold an [`EntityId`] and
//! resolve it through a [`UnitIndex`] on every use, so an entity destroyed or
//! recaptured by another block earlier in the same tick is seen as such.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};
use crate::team::TeamId;

/// Unique identifier for entities.
pub type EntityId = u64;

/// Coarse movement classification used by targeting filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitClass {
    /// Walks or rolls on the ground.
    #[default]
    Ground,
    /// Flies over terrain.
    Air,
}

/// A mobile unit in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Owning team.
    pub team: TeamId,
    /// Current health.
    pub health: u32,
    /// Maximum health. Capture completes once progress exceeds this.
    pub max_health: u32,
    /// Set when the unit has been killed but not yet swept from the registry.
    pub dead: bool,
    /// Ground or air.
    pub class: UnitClass,
}

impl Unit {
    /// Check if the unit is on the ground.
    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        matches!(self.class, UnitClass::Ground)
    }

    /// Squared distance to a point.
    #[must_use]
    pub fn dst2(&self, point: Vec2Fixed) -> Fixed {
        self.position.distance_squared(point)
    }
}

/// A static structure that target queries may consider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTarget {
    /// Unique identifier (shares the id space with units).
    pub id: EntityId,
    /// World position of the building center.
    pub position: Vec2Fixed,
    /// Owning team.
    pub team: TeamId,
    /// Current health.
    pub health: u32,
}

/// Result of a target query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    /// A unit.
    Unit(EntityId),
    /// A building.
    Building(EntityId),
}

impl TargetRef {
    /// The referenced entity id.
    #[must_use]
    pub const fn id(self) -> EntityId {
        match self {
            Self::Unit(id) | Self::Building(id) => id,
        }
    }
}

/// Spatial query and entity accessors consumed by targeting blocks.
pub trait UnitIndex {
    /// Resolve a unit by id.
    fn unit(&self, id: EntityId) -> Option<&Unit>;

    /// Resolve a unit by id for mutation.
    fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit>;

    /// Find the best enemy of `team` within `range` of `origin`.
    ///
    /// Units passing `unit_filter` are ranked by `unit_sort` ascending, ties
    /// broken by lower id. Buildings passing `building_filter` are only
    /// considered when no unit qualifies, nearest first.
    fn best_target<U, B, S>(
        &self,
        team: TeamId,
        origin: Vec2Fixed,
        range: Fixed,
        unit_filter: U,
        building_filter: B,
        unit_sort: S,
    ) -> Option<TargetRef>
    where
        U: Fn(&Unit) -> bool,
        B: Fn(&BuildingTarget) -> bool,
        S: Fn(&Unit, Vec2Fixed) -> Fixed;
}

/// In-memory unit and building storage.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration via
/// sorted keys whenever order can affect the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRegistry {
    units: HashMap<EntityId, Unit>,
    buildings: HashMap<EntityId, BuildingTarget>,
    next_id: EntityId,
}

impl UnitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            buildings: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        // Default-constructed registries start at zero; keep ids non-zero.
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a unit at full health and return its id.
    pub fn spawn_unit(
        &mut self,
        position: Vec2Fixed,
        team: TeamId,
        max_health: u32,
        class: UnitClass,
    ) -> EntityId {
        let id = self.allocate_id();
        self.units.insert(
            id,
            Unit {
                id,
                position,
                team,
                health: max_health,
                max_health,
                dead: false,
                class,
            },
        );
        id
    }

    /// Register a building and return its id.
    pub fn spawn_building(&mut self, position: Vec2Fixed, team: TeamId, health: u32) -> EntityId {
        let id = self.allocate_id();
        self.buildings.insert(
            id,
            BuildingTarget {
                id,
                position,
                team,
                health,
            },
        );
        id
    }

    /// Remove a unit outright.
    pub fn remove_unit(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Flag a unit as dead. Returns false if it does not exist.
    pub fn kill(&mut self, id: EntityId) -> bool {
        match self.units.get_mut(&id) {
            Some(unit) => {
                unit.dead = true;
                unit.health = 0;
                true
            }
            None => false,
        }
    }

    /// Drop all units flagged dead and return their ids in ascending order.
    pub fn sweep_dead(&mut self) -> Vec<EntityId> {
        let mut dead: Vec<EntityId> = self
            .units
            .values()
            .filter(|u| u.dead)
            .map(|u| u.id)
            .collect();
        dead.sort_unstable();
        for id in &dead {
            self.units.remove(id);
        }
        dead
    }

    /// Get sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_unit_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate units in ascending id order.
    pub fn units_sorted(&self) -> impl Iterator<Item = &Unit> {
        self.sorted_unit_ids()
            .into_iter()
            .filter_map(move |id| self.units.get(&id))
    }

    /// Resolve a building by id.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&BuildingTarget> {
        self.buildings.get(&id)
    }

    /// Number of units (dead ones included until swept).
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Count live units owned by `team`.
    #[must_use]
    pub fn team_unit_count(&self, team: TeamId) -> usize {
        self.units
            .values()
            .filter(|u| !u.dead && u.team == team)
            .count()
    }
}

impl UnitIndex for UnitRegistry {
    fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    fn best_target<U, B, S>(
        &self,
        team: TeamId,
        origin: Vec2Fixed,
        range: Fixed,
        unit_filter: U,
        building_filter: B,
        unit_sort: S,
    ) -> Option<TargetRef>
    where
        U: Fn(&Unit) -> bool,
        B: Fn(&BuildingTarget) -> bool,
        S: Fn(&Unit, Vec2Fixed) -> Fixed,
    {
        let mut best_unit: Option<(EntityId, Fixed)> = None;

        for unit in self.units_sorted() {
            if !unit.team.is_hostile_to(team) || !unit.position.within(origin, range) {
                continue;
            }
            if !unit_filter(unit) {
                continue;
            }

            let score = unit_sort(unit, origin);
            match best_unit {
                None => best_unit = Some((unit.id, score)),
                // Strict comparison keeps the lower id on ties
                Some((_, best_score)) if score < best_score => {
                    best_unit = Some((unit.id, score));
                }
                _ => {}
            }
        }

        if let Some((id, _)) = best_unit {
            return Some(TargetRef::Unit(id));
        }

        let mut building_ids: Vec<_> = self.buildings.keys().copied().collect();
        building_ids.sort_unstable();

        let mut best_building: Option<(EntityId, Fixed)> = None;
        for id in building_ids {
            let Some(building) = self.buildings.get(&id) else {
                continue;
            };
            if !building.team.is_hostile_to(team) || !building.position.within(origin, range) {
                continue;
            }
            if !building_filter(building) {
                continue;
            }

            let dist_sq = building.position.distance_squared(origin);
            match best_building {
                None => best_building = Some((id, dist_sq)),
                Some((_, best_dist)) if dist_sq < best_dist => best_building = Some((id, dist_sq)),
                _ => {}
            }
        }

        best_building.map(|(id, _)| TargetRef::Building(id))
    }
}
