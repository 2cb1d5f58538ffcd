//! Capture turret: converts enemy units instead of destroying them.
//!
//! The turret locks onto the nearest eligible enemy unit, swings toward it
//! and, while its aim stays inside the firing cone, accumulates a fixed
//! amount of progress per tick. Once progress exceeds the target's maximum
//! health the target's team is rewritten to the turret's team.
//!
//! # State machine
//!
//! ```text
//!            find_target()            aim inside cone
//!  [Idle] ───────────────> [Locked] ─────────────────> progress += damage
//!     ^                       │                              │
//!     │  invalid target /     │ aim outside cone             │ progress > max health
//!     └─── reset() ───────────┴──────────────────────────────┴──> capture + reset()
//! ```
//!
//! Progress is forfeited on *any* aim loss, so a capture needs an unbroken
//! lock rather than cumulative exposure.

use serde::{Deserialize, Serialize};

use crate::context::{BlockContext, TICKS_PER_SECOND};
use crate::error::{GameError, Result};
use crate::math::{
    angle_between, angle_within, fixed_serde, move_toward_angle, ratio, wrap_degrees, Fixed,
    Vec2Fixed,
};
use crate::team::TeamId;
use crate::units::{EntityId, TargetRef, UnitIndex};

/// Largest accepted engagement radius, in world units.
pub const MAX_TURRET_RANGE: u32 = 10_000;

/// Tuning parameters for a capture turret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTurretConfig {
    /// Engagement radius in world units.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Degrees turned per tick at full efficiency.
    #[serde(with = "fixed_serde")]
    pub rotate_speed: Fixed,
    /// Aim tolerance in degrees.
    #[serde(with = "fixed_serde")]
    pub shoot_cone: Fixed,
    /// Progress added per tick while on target.
    pub damage: u32,
    /// Whether airborne units are eligible.
    pub target_air: bool,
    /// Whether grounded units are eligible.
    pub target_ground: bool,
    /// The turret holds no target at or below this efficiency.
    #[serde(with = "fixed_serde")]
    pub min_efficiency: Fixed,
    /// Distance from the turret center to the beam emitter.
    #[serde(with = "fixed_serde")]
    pub shoot_length: Fixed,
    /// Beam width at full efficiency.
    #[serde(with = "fixed_serde")]
    pub laser_width: Fixed,
}

impl Default for CaptureTurretConfig {
    fn default() -> Self {
        Self {
            range: Fixed::from_num(80),
            rotate_speed: Fixed::from_num(10),
            shoot_cone: Fixed::from_num(6),
            damage: 10,
            target_air: true,
            target_ground: true,
            min_efficiency: ratio(2, 100),
            shoot_length: Fixed::from_num(5),
            laser_width: ratio(6, 10),
        }
    }
}

impl CaptureTurretConfig {
    /// Check parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming `block` and the first bad field.
    pub fn validate(&self, block: &str) -> Result<()> {
        let reason = if self.range <= Fixed::ZERO {
            "range must be positive"
        } else if self.range > Fixed::from_num(MAX_TURRET_RANGE) {
            "range exceeds the maximum turret range"
        } else if self.rotate_speed <= Fixed::ZERO {
            "rotate_speed must be positive"
        } else if self.shoot_cone < Fixed::ZERO || self.shoot_cone > Fixed::from_num(180) {
            "shoot_cone must be within [0, 180]"
        } else if self.damage == 0 {
            "damage must be non-zero"
        } else if !self.target_air && !self.target_ground {
            "turret must target air, ground or both"
        } else if self.min_efficiency < Fixed::ZERO || self.min_efficiency >= Fixed::ONE {
            "min_efficiency must be within [0, 1)"
        } else {
            return Ok(());
        };

        tracing::warn!(block, reason, "Rejected capture turret config");
        Err(GameError::invalid_config(block, reason))
    }

    /// Static block stats for tooltips and balance reports.
    #[must_use]
    pub fn stats(&self) -> CaptureTurretStats {
        CaptureTurretStats {
            damage_per_second: self.damage.saturating_mul(TICKS_PER_SECOND),
            targets_air: self.target_air,
            targets_ground: self.target_ground,
            range: self.range,
        }
    }
}

/// Display stats of a capture turret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTurretStats {
    /// Progress per second of continuous lock.
    pub damage_per_second: u32,
    /// Whether airborne units are eligible.
    pub targets_air: bool,
    /// Whether grounded units are eligible.
    pub targets_ground: bool,
    /// Engagement radius in world units.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
}

/// Something that happened during a turret update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureEvent {
    /// A new target was locked.
    TargetAcquired {
        /// The locked unit.
        target: EntityId,
    },
    /// The held target stopped being valid.
    TargetLost {
        /// The dropped unit.
        target: EntityId,
    },
    /// Aim drifted outside the cone and progress was forfeited.
    AimLost {
        /// The dropped unit.
        target: EntityId,
        /// Progress discarded.
        forfeited: u32,
    },
    /// Progress advanced without completing.
    Progress {
        /// The unit being converted.
        target: EntityId,
        /// Accumulated progress after this tick.
        progress: u32,
    },
    /// The target switched teams.
    Captured {
        /// The converted unit.
        target: EntityId,
        /// Its new team.
        new_team: TeamId,
    },
    /// Keep the beam sound looping this tick.
    BeamLoop,
}

/// Beam geometry for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamSegment {
    /// Emitter position.
    pub start: Vec2Fixed,
    /// Last known target position.
    pub end: Vec2Fixed,
    /// Beam width.
    #[serde(with = "fixed_serde")]
    pub width: Fixed,
}

/// A capture turret instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTurret {
    config: CaptureTurretConfig,
    /// World position of the turret center.
    pub position: Vec2Fixed,
    /// Owning team; captured units join it.
    pub team: TeamId,
    #[serde(with = "fixed_serde")]
    rotation: Fixed,
    target: Option<EntityId>,
    progress: u32,
    last_target: Vec2Fixed,
}

impl CaptureTurret {
    /// Create an idle turret facing east.
    #[must_use]
    pub fn new(config: CaptureTurretConfig, position: Vec2Fixed, team: TeamId) -> Self {
        Self {
            config,
            position,
            team,
            rotation: Fixed::ZERO,
            target: None,
            progress: 0,
            last_target: Vec2Fixed::ZERO,
        }
    }

    /// Builder method to set the initial facing, in degrees.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Fixed) -> Self {
        self.rotation = wrap_degrees(rotation);
        self
    }

    /// Tuning parameters.
    #[must_use]
    pub const fn config(&self) -> &CaptureTurretConfig {
        &self.config
    }

    /// Current facing in degrees.
    #[must_use]
    pub const fn rotation(&self) -> Fixed {
        self.rotation
    }

    /// The locked unit, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Accumulated capture progress.
    #[must_use]
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Where the target was last seen.
    #[must_use]
    pub const fn last_target(&self) -> Vec2Fixed {
        self.last_target
    }

    /// Advance the turret by one tick.
    ///
    /// The target is re-resolved through `units` every call; nothing about it
    /// is trusted from the previous tick except its id.
    pub fn update<I: UnitIndex>(&mut self, ctx: &BlockContext, units: &mut I) -> Vec<CaptureEvent> {
        let mut events = Vec::new();

        let Some((target, target_pos, max_health)) = self.validate_target(ctx, units) else {
            if let Some(lost) = self.target {
                tracing::debug!(unit = lost, team = %self.team, "Capture target lost");
                events.push(CaptureEvent::TargetLost { target: lost });
            }
            self.reset();

            if let Some(found) = self.find_target(units) {
                tracing::debug!(unit = found, team = %self.team, "Capture target acquired");
                self.target = Some(found);
                events.push(CaptureEvent::TargetAcquired { target: found });
            }
            return events;
        };

        if !ctx.headless {
            events.push(CaptureEvent::BeamLoop);
        }

        let dest = angle_between(self.position, target_pos);
        self.rotation = move_toward_angle(self.rotation, dest, self.config.rotate_speed * ctx.edelta());
        self.last_target = target_pos;

        if !angle_within(self.rotation, dest, self.config.shoot_cone) {
            events.push(CaptureEvent::AimLost {
                target,
                forfeited: self.progress,
            });
            self.reset();
            return events;
        }

        self.progress = self.progress.saturating_add(self.config.damage);
        if self.progress > max_health {
            if let Some(unit) = units.unit_mut(target) {
                unit.team = self.team;
            }
            tracing::info!(unit = target, team = %self.team, "Unit captured");
            events.push(CaptureEvent::Captured {
                target,
                new_team: self.team,
            });
            self.reset();
        } else {
            events.push(CaptureEvent::Progress {
                target,
                progress: self.progress,
            });
        }

        events
    }

    /// Resolve the held target and check it is still fair game.
    ///
    /// Returns its id, position and maximum health when valid.
    fn validate_target<I: UnitIndex>(
        &self,
        ctx: &BlockContext,
        units: &I,
    ) -> Option<(EntityId, Vec2Fixed, u32)> {
        let id = self.target?;
        let unit = units.unit(id)?;

        let valid = !unit.dead
            && unit.position.within(self.position, self.config.range)
            && unit.team.is_hostile_to(self.team)
            && ctx.efficiency > self.config.min_efficiency;

        valid.then_some((id, unit.position, unit.max_health))
    }

    /// Nearest eligible enemy unit in range. Buildings are never eligible.
    pub fn find_target<I: UnitIndex>(&self, units: &I) -> Option<EntityId> {
        let target_air = self.config.target_air;
        let target_ground = self.config.target_ground;

        let found = units.best_target(
            self.team,
            self.position,
            self.config.range,
            |unit| {
                !unit.dead
                    && (unit.is_grounded() || target_air)
                    && (!unit.is_grounded() || target_ground)
            },
            |_| false,
            |unit, origin| unit.dst2(origin),
        );

        match found {
            Some(TargetRef::Unit(id)) => Some(id),
            Some(TargetRef::Building(_)) | None => None,
        }
    }

    /// Drop the target and any progress against it.
    pub fn reset(&mut self) {
        self.progress = 0;
        self.target = None;
    }

    /// Beam from the emitter to the last known target position.
    ///
    /// `None` while no target is held.
    #[must_use]
    pub fn beam(&self, efficiency: Fixed) -> Option<BeamSegment> {
        self.target?;
        let direction = (self.last_target - self.position).normalize();
        Some(BeamSegment {
            start: self.position + direction.scale(self.config.shoot_length),
            end: self.last_target,
            width: efficiency * self.config.laser_width,
        })
    }

    /// Encode the state persisted beyond the base block: the rotation as one `f32`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveFormat`] if encoding fails.
    pub fn write_extra(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.rotation.to_num::<f32>())?)
    }

    /// Restore persisted state. Target and progress always start empty.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveFormat`] if the data is not exactly one finite `f32`.
    pub fn read_extra(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != std::mem::size_of::<f32>() {
            return Err(GameError::SaveFormat(format!(
                "turret rotation expects 4 bytes, got {}",
                bytes.len()
            )));
        }
        let rotation: f32 = bincode::deserialize(bytes)?;
        if !rotation.is_finite() {
            return Err(GameError::SaveFormat(format!(
                "turret rotation is not finite: {rotation}"
            )));
        }

        self.rotation = wrap_degrees(Fixed::from_num(rotation));
        self.reset();
        self.last_target = Vec2Fixed::ZERO;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{UnitClass, UnitRegistry};

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    fn turret_with(config: CaptureTurretConfig) -> CaptureTurret {
        CaptureTurret::new(config, Vec2Fixed::ZERO, TeamId::SHARDED)
    }

    fn turret() -> CaptureTurret {
        turret_with(CaptureTurretConfig::default())
    }

    fn enemy(registry: &mut UnitRegistry, at: Vec2Fixed, health: u32) -> EntityId {
        registry.spawn_unit(at, TeamId::CRUX, health, UnitClass::Ground)
    }

    #[test]
    fn test_capture_completes_on_third_locked_tick() {
        let mut units = UnitRegistry::new();
        let target = enemy(&mut units, pos(20, 0), 25);
        let mut turret = turret();
        let ctx = BlockContext::new();

        // Acquisition tick
        let events = turret.update(&ctx, &mut units);
        assert_eq!(events, vec![CaptureEvent::TargetAcquired { target }]);
        assert_eq!(turret.progress(), 0);

        turret.update(&ctx, &mut units);
        assert_eq!(turret.progress(), 10);
        turret.update(&ctx, &mut units);
        assert_eq!(turret.progress(), 20);

        let events = turret.update(&ctx, &mut units);
        assert_eq!(
            events,
            vec![CaptureEvent::Captured {
                target,
                new_team: TeamId::SHARDED
            }]
        );
        assert_eq!(units.unit(target).map(|u| u.team), Some(TeamId::SHARDED));
        assert_eq!(turret.target(), None);
        assert_eq!(turret.progress(), 0);

        // Captured unit is now friendly, nothing left to lock
        assert!(turret.update(&ctx, &mut units).is_empty());
    }

    #[test]
    fn test_progress_must_exceed_max_health() {
        let mut units = UnitRegistry::new();
        let target = enemy(&mut units, pos(0, 20), 20);
        let mut turret = turret().with_rotation(Fixed::from_num(90));
        let ctx = BlockContext::new();

        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);
        // Exactly at max health is not enough
        assert_eq!(turret.progress(), 20);
        assert_eq!(units.unit(target).map(|u| u.team), Some(TeamId::CRUX));

        turret.update(&ctx, &mut units);
        assert_eq!(units.unit(target).map(|u| u.team), Some(TeamId::SHARDED));
    }

    #[test]
    fn test_aim_outside_cone_forfeits_progress() {
        let mut units = UnitRegistry::new();
        let target = enemy(&mut units, pos(20, 0), 1000);
        let mut turret = turret();
        let ctx = BlockContext::new();

        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);
        assert_eq!(turret.progress(), 10);

        // Target jumps behind the turret: 180 degrees away
        if let Some(unit) = units.unit_mut(target) {
            unit.position = pos(-20, 0);
        }
        let events = turret.update(&ctx, &mut units);
        assert_eq!(
            events,
            vec![CaptureEvent::AimLost {
                target,
                forfeited: 10
            }]
        );
        assert_eq!(turret.progress(), 0);
        assert_eq!(turret.target(), None);
        // Rotation still moved one step toward the new bearing
        assert_eq!(angle_distance_to(turret.rotation(), 0), Fixed::from_num(10));
    }

    fn angle_distance_to(angle: Fixed, degrees: i32) -> Fixed {
        crate::math::angle_distance(angle, Fixed::from_num(degrees))
    }

    #[test]
    fn test_turret_converges_on_off_axis_target() {
        let mut units = UnitRegistry::new();
        let target = enemy(&mut units, pos(0, 30), 15);
        let mut turret = turret();
        let ctx = BlockContext::new();

        let mut captured = false;
        for _ in 0..40 {
            let events = turret.update(&ctx, &mut units);
            if events.contains(&CaptureEvent::Captured {
                target,
                new_team: TeamId::SHARDED,
            }) {
                captured = true;
                break;
            }
        }
        assert!(captured, "turret should eventually swing onto the target");
        assert_eq!(turret.rotation(), Fixed::from_num(90));
    }

    #[test]
    fn test_dead_target_is_dropped_and_replaced() {
        let mut units = UnitRegistry::new();
        let first = enemy(&mut units, pos(10, 0), 1000);
        let second = enemy(&mut units, pos(30, 0), 1000);
        let mut turret = turret();
        let ctx = BlockContext::new();

        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);
        assert_eq!(turret.target(), Some(first));

        units.kill(first);
        let events = turret.update(&ctx, &mut units);
        assert_eq!(
            events,
            vec![
                CaptureEvent::TargetLost { target: first },
                CaptureEvent::TargetAcquired { target: second },
            ]
        );
        assert_eq!(turret.progress(), 0);
    }

    #[test]
    fn test_vanished_target_is_dropped() {
        let mut units = UnitRegistry::new();
        let target = enemy(&mut units, pos(10, 0), 1000);
        let mut turret = turret();
        let ctx = BlockContext::new();

        turret.update(&ctx, &mut units);
        units.remove_unit(target);

        let events = turret.update(&ctx, &mut units);
        assert_eq!(events, vec![CaptureEvent::TargetLost { target }]);
        assert_eq!(turret.target(), None);
    }

    #[test]
    fn test_target_leaving_range_is_dropped() {
        let mut units = UnitRegistry::new();
        let target = enemy(&mut units, pos(10, 0), 1000);
        let mut turret = turret();
        let ctx = BlockContext::new();

        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);
        if let Some(unit) = units.unit_mut(target) {
            unit.position = pos(200, 0);
        }

        turret.update(&ctx, &mut units);
        assert_eq!(turret.target(), None);
        assert_eq!(turret.progress(), 0);
    }

    #[test]
    fn test_low_efficiency_never_holds_target() {
        let mut units = UnitRegistry::new();
        enemy(&mut units, pos(10, 0), 25);
        let mut turret = turret();
        let ctx = BlockContext::new().with_efficiency(ratio(1, 100));

        for _ in 0..10 {
            turret.update(&ctx, &mut units);
            assert_eq!(turret.progress(), 0);
        }
    }

    #[test]
    fn test_air_and_ground_filters() {
        let mut units = UnitRegistry::new();
        let flyer = units.spawn_unit(pos(5, 0), TeamId::CRUX, 100, UnitClass::Air);
        let walker = units.spawn_unit(pos(15, 0), TeamId::CRUX, 100, UnitClass::Ground);

        let ground_only = turret_with(CaptureTurretConfig {
            target_air: false,
            ..CaptureTurretConfig::default()
        });
        assert_eq!(ground_only.find_target(&units), Some(walker));

        let air_only = turret_with(CaptureTurretConfig {
            target_ground: false,
            ..CaptureTurretConfig::default()
        });
        assert_eq!(air_only.find_target(&units), Some(flyer));
    }

    #[test]
    fn test_buildings_are_never_targeted() {
        let mut units = UnitRegistry::new();
        units.spawn_building(pos(5, 0), TeamId::CRUX, 100);

        assert_eq!(turret().find_target(&units), None);
    }

    #[test]
    fn test_beam_loop_only_when_rendering() {
        let mut units = UnitRegistry::new();
        enemy(&mut units, pos(10, 0), 1000);
        let mut turret = turret();
        let ctx = BlockContext::new().rendering();

        turret.update(&ctx, &mut units);
        let events = turret.update(&ctx, &mut units);
        assert_eq!(events.first(), Some(&CaptureEvent::BeamLoop));
    }

    #[test]
    fn test_beam_geometry() {
        let mut units = UnitRegistry::new();
        enemy(&mut units, pos(20, 0), 1000);
        let mut turret = turret();
        let ctx = BlockContext::new();

        assert!(turret.beam(Fixed::ONE).is_none());
        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);

        let beam = turret.beam(ratio(1, 2)).unwrap();
        assert!((beam.start.x - Fixed::from_num(5)).abs() < ratio(1, 100));
        assert_eq!(beam.start.y, Fixed::ZERO);
        assert_eq!(beam.end, pos(20, 0));
        assert_eq!(beam.width, ratio(3, 10));
    }

    #[test]
    fn test_persistence_keeps_rotation_only() {
        let mut units = UnitRegistry::new();
        enemy(&mut units, pos(0, 20), 1000);
        let mut turret = turret().with_rotation(Fixed::from_num(85));
        let ctx = BlockContext::new();
        turret.update(&ctx, &mut units);
        turret.update(&ctx, &mut units);
        assert!(turret.progress() > 0);

        let bytes = turret.write_extra().unwrap();
        assert_eq!(bytes.len(), 4);

        let mut restored = CaptureTurret::new(
            CaptureTurretConfig::default(),
            Vec2Fixed::ZERO,
            TeamId::SHARDED,
        );
        restored.read_extra(&bytes).unwrap();
        assert_eq!(restored.rotation(), Fixed::from_num(90));
        assert_eq!(restored.target(), None);
        assert_eq!(restored.progress(), 0);
    }

    #[test]
    fn test_read_extra_rejects_garbage() {
        let mut turret = turret();
        assert!(turret.read_extra(&[1, 2]).is_err());
        let nan = bincode::serialize(&f32::NAN).unwrap();
        assert!(turret.read_extra(&nan).is_err());
    }

    #[test]
    fn test_stats() {
        let stats = CaptureTurretConfig::default().stats();
        assert_eq!(stats.damage_per_second, 600);
        assert!(stats.targets_air && stats.targets_ground);
    }

    #[test]
    fn test_config_validation() {
        assert!(CaptureTurretConfig::default().validate("hack").is_ok());
        let bad = CaptureTurretConfig {
            damage: 0,
            ..CaptureTurretConfig::default()
        };
        assert!(matches!(
            bad.validate("hack"),
            Err(GameError::InvalidConfig { .. })
        ));

        let huge = CaptureTurretConfig {
            range: Fixed::from_num(50_000),
            ..CaptureTurretConfig::default()
        };
        assert!(huge.validate("hack").is_err());
        let widest = CaptureTurretConfig {
            range: Fixed::from_num(MAX_TURRET_RANGE),
            ..CaptureTurretConfig::default()
        };
        assert!(widest.validate("hack").is_ok());
    }

    #[test]
    fn test_far_units_are_out_of_range() {
        let mut units = UnitRegistry::new();
        units.spawn_unit(pos(50_000, 0), TeamId::CRUX, 10, UnitClass::Ground);
        units.spawn_unit(pos(-2_000_000_000, 2_000_000_000), TeamId::CRUX, 10, UnitClass::Air);
        let near = units.spawn_unit(pos(30, 0), TeamId::CRUX, 100, UnitClass::Ground);

        let mut t = turret();
        let ctx = BlockContext::new();
        let events = t.update(&ctx, &mut units);
        assert_eq!(events, vec![CaptureEvent::TargetAcquired { target: near }]);

        // Even the widest turret ignores units tens of thousands of units away
        let mut wide = turret_with(CaptureTurretConfig {
            range: Fixed::from_num(MAX_TURRET_RANGE),
            ..CaptureTurretConfig::default()
        });
        units.remove_unit(near);
        assert!(wide.update(&ctx, &mut units).is_empty());
        assert_eq!(wide.target(), None);
    }
}
