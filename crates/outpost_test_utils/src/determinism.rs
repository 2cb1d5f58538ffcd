//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the block simulation produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the harness guards against:
//!
//! - **Floating-point math**: we use fixed-point arithmetic via
//!   [`outpost_core::math::Fixed`] throughout the tick path.
//!
//! - **HashMap iteration order**: units live in a `HashMap`, so every
//!   query that can affect the outcome iterates in sorted id order.
//!
//! - **Persistence**: saving and loading block state must not change what
//!   the next tick does beyond the documented resets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use outpost_core::math::{angle_distance, Fixed};
use outpost_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(runs, ticks, "Determinism check failed");
    }

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`Simulation`] `runs` times from the same setup and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, runs: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        runs,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
}

/// Run N simulations on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under different thread
/// scheduling or memory layout.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Check that a save/load cycle restores turret rotation (to `f32`
/// precision) and drill inventory onto a freshly built copy of the same layout.
pub fn verify_block_persistence<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.tick();
    }

    let Ok(bytes) = sim.save_blocks() else {
        return false;
    };
    let mut restored = setup_fn();
    if restored.load_blocks(&bytes).is_err() {
        return false;
    }

    let turrets_match = sim.turret_ids().all(|id| {
        match (sim.turret(id), restored.turret(id)) {
            (Some(a), Some(b)) => {
                // Rotation is stored as f32
                angle_distance(a.rotation(), b.rotation()) < Fixed::from_num(1) / 1000
                    && b.target().is_none()
            }
            _ => false,
        }
    });
    let drills_match = sim.drill_ids().all(|id| match (sim.drill(id), restored.drill(id)) {
        (Some(a), Some(b)) => a.items() == b.items(),
        _ => false,
    });

    turrets_match && drills_match
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for block simulation tests.
pub mod strategies {
    use outpost_core::math::{Fixed, Vec2Fixed};
    use outpost_core::units::UnitClass;
    use proptest::prelude::*;

    /// Generate a fixed-point coordinate inside a turret's default range.
    ///
    /// Range: -50 to 50
    pub fn arb_near_coordinate() -> impl Strategy<Value = Fixed> {
        (-50i32..=50i32).prop_map(Fixed::from_num)
    }

    /// Generate a position inside the default turret range, excluding the origin itself.
    pub fn arb_position_in_range() -> impl Strategy<Value = Vec2Fixed> {
        (arb_near_coordinate(), arb_near_coordinate())
            .prop_filter("not on top of the turret", |(x, y)| {
                *x != Fixed::ZERO || *y != Fixed::ZERO
            })
            .prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a facing in whole degrees.
    pub fn arb_rotation() -> impl Strategy<Value = Fixed> {
        (0i32..360i32).prop_map(Fixed::from_num)
    }

    /// Generate max health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Generate capture damage values (1-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Generate a unit class.
    pub fn arb_unit_class() -> impl Strategy<Value = UnitClass> {
        prop_oneof![Just(UnitClass::Ground), Just(UnitClass::Air)]
    }

    /// Generate a hardness value (0-10).
    pub fn arb_hardness() -> impl Strategy<Value = u32> {
        0u32..=10u32
    }

    /// Generate an ore tile count a 2x2 drill can see (1-4).
    pub fn arb_ore_count() -> impl Strategy<Value = u8> {
        1u8..=4u8
    }

    /// Generate an efficiency in hundredths (0-100).
    pub fn arb_efficiency() -> impl Strategy<Value = Fixed> {
        (0i32..=100i32).prop_map(|p| Fixed::from_num(p) / Fixed::from_num(100))
    }
}
