//! Per-tick context handed to block updates.
//!
//! Blocks never read ambient world state for timing or power. The scheduler
//! builds a [`BlockContext`] for each block each tick and passes it in.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Simulation ticks per second; `delta == 1` is one such tick.
pub const TICKS_PER_SECOND: u32 = 60;

/// Read-only inputs for one block update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Elapsed time this tick, in 60 Hz tick units.
    #[serde(with = "fixed_serde")]
    pub delta: Fixed,
    /// Global time scale applied on top of `delta`.
    #[serde(with = "fixed_serde")]
    pub time_scale: Fixed,
    /// Operating efficiency in `[0, 1]`, e.g. power satisfaction.
    #[serde(with = "fixed_serde")]
    pub efficiency: Fixed,
    /// No audio or visuals are produced when set.
    pub headless: bool,
    /// Required (non-optional) inputs are satisfied.
    pub inputs_valid: bool,
    /// The optional boosting liquid is present.
    pub boost_valid: bool,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            delta: Fixed::ONE,
            time_scale: Fixed::ONE,
            efficiency: Fixed::ONE,
            headless: true,
            inputs_valid: true,
            boost_valid: false,
        }
    }
}

impl BlockContext {
    /// One full-power headless tick.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set efficiency.
    #[must_use]
    pub const fn with_efficiency(mut self, efficiency: Fixed) -> Self {
        self.efficiency = efficiency;
        self
    }

    /// Builder method to set the tick delta.
    #[must_use]
    pub const fn with_delta(mut self, delta: Fixed) -> Self {
        self.delta = delta;
        self
    }

    /// Builder method to set the boost liquid state.
    #[must_use]
    pub const fn with_boost(mut self, boost_valid: bool) -> Self {
        self.boost_valid = boost_valid;
        self
    }

    /// Builder method to set the required-input state.
    #[must_use]
    pub const fn with_inputs(mut self, inputs_valid: bool) -> Self {
        self.inputs_valid = inputs_valid;
        self
    }

    /// Builder method to enable audio/visual cues.
    #[must_use]
    pub const fn rendering(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Elapsed time honoring the global time scale.
    #[must_use]
    pub fn scaled_delta(&self) -> Fixed {
        self.delta * self.time_scale
    }

    /// Elapsed time scaled by efficiency, for mechanisms that slow down when underpowered.
    #[must_use]
    pub fn edelta(&self) -> Fixed {
        self.scaled_delta() * self.efficiency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    #[test]
    fn test_edelta_scales_with_efficiency() {
        let ctx = BlockContext::new()
            .with_delta(Fixed::from_num(2))
            .with_efficiency(ratio(1, 2));
        assert_eq!(ctx.scaled_delta(), Fixed::from_num(2));
        assert_eq!(ctx.edelta(), Fixed::ONE);
    }
}
