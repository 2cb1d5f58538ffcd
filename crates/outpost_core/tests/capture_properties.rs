//! Property tests for capture turret progress, resets and completion.

use outpost_core::capture::{CaptureEvent, CaptureTurret, CaptureTurretConfig};
use outpost_core::context::BlockContext;
use outpost_core::math::{angle_between, Fixed, Vec2Fixed};
use outpost_core::units::{EntityId, UnitClass, UnitIndex, UnitRegistry};
use outpost_test_utils::determinism::strategies::{
    arb_damage, arb_efficiency, arb_health, arb_position_in_range, arb_unit_class,
};
use outpost_test_utils::fixtures::{capture_turret, fixed, lone_target, ENEMY_TEAM, TURRET_TEAM};
use proptest::prelude::*;

/// A turret already facing a freshly spawned enemy at `position`.
fn aimed_at(
    position: Vec2Fixed,
    max_health: u32,
    damage: u32,
    class: UnitClass,
) -> (CaptureTurret, UnitRegistry, EntityId) {
    let mut units = UnitRegistry::new();
    let target = units.spawn_unit(position, ENEMY_TEAM, max_health, class);
    let turret = capture_turret(damage).with_rotation(angle_between(Vec2Fixed::ZERO, position));
    (turret, units, target)
}

/// Updates after the acquisition tick until capture fires.
fn ticks_to_capture(turret: &mut CaptureTurret, units: &mut UnitRegistry, limit: u32) -> Option<u32> {
    let ctx = BlockContext::new();
    turret.update(&ctx, units);
    for tick in 1..=limit {
        let events = turret.update(&ctx, units);
        if events
            .iter()
            .any(|e| matches!(e, CaptureEvent::Captured { .. }))
        {
            return Some(tick);
        }
    }
    None
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn capture_of_25_health_at_10_damage_takes_three_ticks() {
    let (mut units, target) = lone_target(25);
    let mut turret = capture_turret(10);

    assert_eq!(ticks_to_capture(&mut turret, &mut units, 10), Some(3));
    assert_eq!(units.unit(target).map(|u| u.team), Some(TURRET_TEAM));
}

#[test]
fn rotated_away_turret_still_converges() {
    let (mut units, target) = lone_target(25);
    let mut turret = capture_turret(10).with_rotation(fixed(180));

    // Each out-of-cone step drops the lock, so the turret turns on every
    // other tick: 18 steps of 10 degrees, then two more locked ticks.
    assert_eq!(ticks_to_capture(&mut turret, &mut units, 40), Some(37));
    assert_eq!(units.unit(target).map(|u| u.team), Some(TURRET_TEAM));
}

#[test]
fn friendly_units_are_ignored() {
    let mut units = UnitRegistry::new();
    units.spawn_unit(Vec2Fixed::from_ints(10, 0), TURRET_TEAM, 10, UnitClass::Ground);
    let turret = capture_turret(10);
    assert_eq!(turret.find_target(&units), None);
}

#[test]
fn nearest_enemy_wins() {
    let mut units = UnitRegistry::new();
    units.spawn_unit(Vec2Fixed::from_ints(40, 0), ENEMY_TEAM, 10, UnitClass::Ground);
    let near = units.spawn_unit(Vec2Fixed::from_ints(0, -15), ENEMY_TEAM, 10, UnitClass::Air);
    let turret = capture_turret(10);
    assert_eq!(turret.find_target(&units), Some(near));
}

#[test]
fn progress_not_carried_across_targets() {
    let mut units = UnitRegistry::new();
    let first = units.spawn_unit(Vec2Fixed::from_ints(10, 0), ENEMY_TEAM, 500, UnitClass::Ground);
    units.spawn_unit(Vec2Fixed::from_ints(30, 0), ENEMY_TEAM, 500, UnitClass::Ground);
    let mut turret = capture_turret(10);
    let ctx = BlockContext::new();

    for _ in 0..5 {
        turret.update(&ctx, &mut units);
    }
    assert_eq!(turret.progress(), 40);

    units.remove_unit(first);
    turret.update(&ctx, &mut units);
    assert_eq!(turret.progress(), 0);
    turret.update(&ctx, &mut units);
    assert_eq!(turret.progress(), 10);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// While locked and aimed, progress rises by exactly `damage` every tick.
    #[test]
    fn progress_is_monotonic_while_aimed(
        position in arb_position_in_range(),
        damage in arb_damage(),
        class in arb_unit_class(),
        ticks in 1u32..30,
    ) {
        let health = damage.saturating_mul(ticks + 1);
        let (mut turret, mut units, target) = aimed_at(position, health, damage, class);
        let ctx = BlockContext::new();

        turret.update(&ctx, &mut units);
        prop_assert_eq!(turret.target(), Some(target));

        let mut last = turret.progress();
        for _ in 0..ticks {
            turret.update(&ctx, &mut units);
            prop_assert_eq!(turret.progress(), last + damage);
            last = turret.progress();
        }
    }

    /// Capture fires on the first locked tick where progress exceeds max health.
    #[test]
    fn capture_completes_after_health_over_damage_ticks(
        position in arb_position_in_range(),
        health in arb_health(),
        damage in arb_damage(),
    ) {
        let (mut turret, mut units, target) = aimed_at(position, health, damage, UnitClass::Ground);

        let expected = health / damage + 1;
        let ticks = ticks_to_capture(&mut turret, &mut units, expected + 1);
        prop_assert_eq!(ticks, Some(expected));
        if health % damage != 0 {
            prop_assert_eq!(expected, health.div_ceil(damage));
        }
        prop_assert_eq!(units.unit(target).map(|u| u.team), Some(TURRET_TEAM));
        prop_assert_eq!(turret.target(), None);
        prop_assert_eq!(turret.progress(), 0);
    }

    /// Any invalidation clears progress and the target in the same tick.
    #[test]
    fn invalid_target_resets_progress(
        position in arb_position_in_range(),
        warmup_ticks in 1u32..10,
        invalidation in 0u8..4,
    ) {
        let (mut turret, mut units, target) = aimed_at(position, 100_000, 10, UnitClass::Ground);
        let ctx = BlockContext::new();
        for _ in 0..=warmup_ticks {
            turret.update(&ctx, &mut units);
        }
        prop_assert!(turret.progress() > 0);

        match invalidation {
            0 => {
                units.kill(target);
            }
            1 => {
                units.remove_unit(target);
            }
            2 => {
                if let Some(unit) = units.unit_mut(target) {
                    unit.position = Vec2Fixed::from_ints(500, 500);
                }
            }
            _ => {
                if let Some(unit) = units.unit_mut(target) {
                    unit.team = TURRET_TEAM;
                }
            }
        }

        turret.update(&ctx, &mut units);
        prop_assert_eq!(turret.progress(), 0);
        prop_assert_eq!(turret.target(), None);
    }

    /// Losing aim forfeits progress even though the target stays valid.
    #[test]
    fn aim_loss_resets_progress(
        health in 200u32..1000,
        locked_ticks in 1u32..10,
    ) {
        let (mut units, target) = lone_target(health);
        let mut turret = capture_turret(10);
        let ctx = BlockContext::new();
        for _ in 0..=locked_ticks {
            turret.update(&ctx, &mut units);
        }
        prop_assert_eq!(turret.progress(), 10 * locked_ticks);

        // Directly behind: far outside the cone and beyond one rotation step
        if let Some(unit) = units.unit_mut(target) {
            unit.position = Vec2Fixed::from_ints(-20, 0);
        }
        let events = turret.update(&ctx, &mut units);
        prop_assert_eq!(
            events,
            vec![CaptureEvent::AimLost { target, forfeited: 10 * locked_ticks }]
        );
        prop_assert_eq!(turret.progress(), 0);
    }

    /// At or below the efficiency floor the turret never accumulates progress.
    #[test]
    fn efficiency_gates_targeting(
        position in arb_position_in_range(),
        efficiency in arb_efficiency(),
    ) {
        let (mut turret, mut units, _) = aimed_at(position, 1000, 10, UnitClass::Air);
        let ctx = BlockContext::new().with_efficiency(efficiency);
        for _ in 0..5 {
            turret.update(&ctx, &mut units);
        }
        let floor = CaptureTurretConfig::default().min_efficiency;
        if efficiency <= floor {
            prop_assert_eq!(turret.progress(), 0);
        } else {
            prop_assert!(turret.target().is_some());
        }
    }
}

#[test]
fn efficiency_floor_is_two_percent() {
    assert_eq!(
        CaptureTurretConfig::default().min_efficiency,
        Fixed::from_num(2) / Fixed::from_num(100)
    );
}
