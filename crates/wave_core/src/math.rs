//! Fixed-point math utilities for deterministic simulation.
//!
//! Positions, ranges and distances use fixed-point arithmetic so that the
//! same inputs produce the same targeting decisions on every platform.
//! Percentages are plain integers with exact round-half-to-even.

use fixed::types::I32F32;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_decimal_serde")]
    pub x: Fixed,
    /// Y coordinate (depth on the ground plane).
    #[serde(with = "fixed_decimal_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers written as decimals.
///
/// Configuration files are authored by hand, so values travel as `f64` and
/// are converted once at the load boundary. Values that do not fit in
/// [`Fixed`] are rejected instead of wrapping.
pub mod fixed_decimal_serde {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(raw)
            .ok_or_else(|| D::Error::custom(format!("value {raw} does not fit in fixed-point")))
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
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Uniform random point inside a disk of `radius` centred on the origin.
    ///
    /// Rejection sampling over the bounding square, on raw fixed-point bits,
    /// so the result depends only on the RNG stream.
    pub fn random_in_disk<R: Rng + ?Sized>(rng: &mut R, radius: Fixed) -> Self {
        if radius <= Fixed::ZERO {
            return Self::ZERO;
        }

        let bits = radius.to_bits();
        let radius_sq = radius.saturating_mul(radius);
        loop {
            let candidate = Self::new(
                Fixed::from_bits(rng.gen_range(-bits..=bits)),
                Fixed::from_bits(rng.gen_range(-bits..=bits)),
            );
            if candidate.distance_squared(Self::ZERO) <= radius_sq {
                return candidate;
            }
        }
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = low + (high - low) / Fixed::from_num(2);
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
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// A whole-number percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percent(u8);

impl Percent {
    /// 0%.
    pub const ZERO: Self = Self(0);
    /// 100%.
    pub const FULL: Self = Self(100);

    /// Create a percentage, rejecting values above 100.
    pub fn new(value: u32) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(GameError::InvalidPercent(value))
    }

    /// Create a percentage, clamping values above 100.
    #[must_use]
    pub const fn saturating(value: u8) -> Self {
        Self(if value > 100 { 100 } else { value })
    }

    /// Raw value in `0..=100`.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0 as u32
    }

    /// `round(count * self / 100)` with ties going to the even neighbour.
    ///
    /// Non-positive counts yield zero.
    #[must_use]
    pub fn of_rounded(self, count: i64) -> i64 {
        if count <= 0 {
            return 0;
        }

        let scaled = count * i64::from(self.0);
        let quotient = scaled / 100;
        let twice_rem = (scaled % 100) * 2;

        match twice_rem.cmp(&100) {
            std::cmp::Ordering::Greater => quotient + 1,
            std::cmp::Ordering::Equal => quotient + (quotient & 1),
            std::cmp::Ordering::Less => quotient,
        }
    }
}

impl TryFrom<u32> for Percent {
    type Error = GameError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Percent> for u32 {
    fn from(value: Percent) -> Self {
        value.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();

        let len_sq = norm.dot(norm);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!(
            (len_sq - Fixed::ONE).abs() < epsilon,
            "normalized vector length² should be ~1, got {len_sq:?}"
        );

        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon, "direction not preserved");
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_random_in_disk_stays_inside_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let radius = Fixed::from_num(2.5);
        for _ in 0..500 {
            let offset = Vec2Fixed::random_in_disk(&mut rng, radius);
            assert!(offset.distance_squared(Vec2Fixed::ZERO) <= radius * radius);
        }
    }

    #[test]
    fn test_random_in_disk_zero_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(
            Vec2Fixed::random_in_disk(&mut rng, Fixed::ZERO),
            Vec2Fixed::ZERO
        );
    }

    #[test]
    fn test_random_in_disk_is_seed_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(
                Vec2Fixed::random_in_disk(&mut a, Fixed::from_num(3)),
                Vec2Fixed::random_in_disk(&mut b, Fixed::from_num(3))
            );
        }
    }

    #[test]
    fn test_percent_rejects_over_100() {
        assert!(Percent::new(100).is_ok());
        assert!(matches!(
            Percent::new(101),
            Err(GameError::InvalidPercent(101))
        ));
    }

    #[test]
    fn test_percent_rounding() {
        let seventy = Percent::new(70).unwrap();
        assert_eq!(seventy.of_rounded(10), 7);
        assert_eq!(seventy.of_rounded(4), 3); // 2.8
        assert_eq!(seventy.of_rounded(3), 2); // 2.1
        assert_eq!(seventy.of_rounded(0), 0);
        assert_eq!(seventy.of_rounded(-5), 0);
    }

    #[test]
    fn test_percent_ties_go_to_even() {
        let half = Percent::new(50).unwrap();
        assert_eq!(half.of_rounded(1), 0); // 0.5
        assert_eq!(half.of_rounded(3), 2); // 1.5
        assert_eq!(half.of_rounded(5), 2); // 2.5
        assert_eq!(half.of_rounded(7), 4); // 3.5
    }
}
