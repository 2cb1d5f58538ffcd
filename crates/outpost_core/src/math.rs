//! Fixed-point math utilities for deterministic simulation.
//!
//! All block simulation uses fixed-point arithmetic to ensure
//! deterministic behavior across platforms. Floating-point
//! operations can produce different results on different CPUs.
//!
//! Angles are expressed in degrees, normalized to `[0, 360)`.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Build a fixed-point value from a ratio of integers.
///
/// Keeps fractional constants (`0.02`, `1.8`, ...) free of float literals.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at `Fixed::MAX` for points more than ~46,000 units apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Check whether `other` lies within `range` of this point (inclusive).
    ///
    /// A saturated distance is never in range.
    #[must_use]
    pub fn within(self, other: Self, range: Fixed) -> bool {
        let dst2 = self.distance_squared(other);
        dst2 < Fixed::MAX && dst2 <= range.saturating_mul(range)
    }

    /// Dot product of two vectors, saturating.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..32 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

// ============================================================================
// Angles
// ============================================================================

/// A full turn in degrees.
#[must_use]
pub fn full_turn() -> Fixed {
    Fixed::from_num(360)
}

/// Normalize an angle into `[0, 360)`.
#[must_use]
pub fn wrap_degrees(angle: Fixed) -> Fixed {
    let turn = full_turn();
    let wrapped = angle % turn;
    if wrapped < Fixed::ZERO {
        wrapped + turn
    } else {
        wrapped
    }
}

/// Arctangent of `z` for `|z| <= 1`, in degrees.
///
/// `atan(z) ~ 45z - z(|z| - 1)(14.02 + 3.80|z|)`, max error below 0.1 degrees.
/// Exact at 0 and +-1.
fn atan_unit_degrees(z: Fixed) -> Fixed {
    let abs_z = z.abs();
    let correction = ratio(1402, 100) + ratio(380, 100) * abs_z;
    Fixed::from_num(45) * z - z * (abs_z - Fixed::ONE) * correction
}

/// Deterministic `atan2` in degrees, returning a bearing in `[0, 360)`.
///
/// Zero vector maps to 0.
#[must_use]
pub fn atan2_degrees(y: Fixed, x: Fixed) -> Fixed {
    let ax = x.abs();
    let ay = y.abs();

    if ax == Fixed::ZERO && ay == Fixed::ZERO {
        return Fixed::ZERO;
    }

    // First-quadrant angle of (ax, ay)
    let mut angle = if ax >= ay {
        atan_unit_degrees(ay / ax)
    } else {
        Fixed::from_num(90) - atan_unit_degrees(ax / ay)
    };

    if x < Fixed::ZERO {
        angle = Fixed::from_num(180) - angle;
    }
    if y < Fixed::ZERO {
        angle = full_turn() - angle;
    }

    wrap_degrees(angle)
}

/// Bearing of a vector in degrees.
#[must_use]
pub fn angle_of(v: Vec2Fixed) -> Fixed {
    atan2_degrees(v.y, v.x)
}

/// Bearing from one point to another in degrees.
#[must_use]
pub fn angle_between(from: Vec2Fixed, to: Vec2Fixed) -> Fixed {
    angle_of(to - from)
}

/// Shortest unsigned separation between two angles, in `[0, 180]`.
#[must_use]
pub fn angle_distance(a: Fixed, b: Fixed) -> Fixed {
    let forward = wrap_degrees(a - b);
    let backward = wrap_degrees(b - a);
    forward.min(backward)
}

/// Check whether two angles are within `margin` degrees of each other.
#[must_use]
pub fn angle_within(a: Fixed, b: Fixed, margin: Fixed) -> bool {
    angle_distance(a, b) <= margin
}

/// Rotate `current` toward `target` along the shortest arc by at most `step` degrees.
///
/// Returns exactly `target` once the remaining separation fits inside `step`,
/// so a rotation never overshoots its destination.
#[must_use]
pub fn move_toward_angle(current: Fixed, target: Fixed, step: Fixed) -> Fixed {
    let target = wrap_degrees(target);
    if angle_distance(current, target) <= step {
        return target;
    }

    // Signed separation in (-180, 180]
    let mut diff = wrap_degrees(target - current);
    if diff > Fixed::from_num(180) {
        diff -= full_turn();
    }

    if diff > Fixed::ZERO {
        wrap_degrees(current + step)
    } else {
        wrap_degrees(current - step)
    }
}

/// Frame-rate independent exponential easing.
///
/// `from + (to - from) * clamp(rate * delta, 0, 1)`.
#[must_use]
pub fn lerp_delta(from: Fixed, to: Fixed, rate: Fixed, delta: Fixed) -> Fixed {
    let t = (rate * delta).clamp(Fixed::ZERO, Fixed::ONE);
    from + (to - from) * t
}
