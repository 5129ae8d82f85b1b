//! Splitting a wave across spawn locations and hostile kinds.
//!
//! [`allocate`] is a pure function: the same inputs always give the same
//! per-location counts, and no randomness is involved.

use serde::{Deserialize, Serialize};

use crate::components::HostileKind;
use crate::config::SpawnLocation;
use crate::error::{GameError, Result};
use crate::math::Percent;

/// Hostiles to spawn at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationAllocation {
    /// Melee hostiles.
    pub melee: i64,
    /// Ranged hostiles.
    pub ranged: i64,
}

impl LocationAllocation {
    /// Both kinds together.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.melee + self.ranged
    }

    /// Count for one kind.
    #[must_use]
    pub const fn count(&self, kind: HostileKind) -> i64 {
        match kind {
            HostileKind::Melee => self.melee,
            HostileKind::Ranged => self.ranged,
        }
    }
}

/// Split `total` hostiles across `locations`.
///
/// The global melee count is `round(total * melee%)`. Locations receive
/// `total / n` each, the first `total % n` one more. Each location then
/// takes its rounded melee share, clamped to the melee still unassigned;
/// if that leaves more ranged than remain, the ranged count is clamped and
/// the difference moves back to melee.
///
/// # Errors
///
/// Returns [`GameError::NoSpawnLocations`] if `locations` is empty.
pub fn allocate(
    total: i64,
    melee_percent: Percent,
    locations: &[SpawnLocation],
) -> Result<Vec<LocationAllocation>> {
    if locations.is_empty() {
        return Err(GameError::NoSpawnLocations);
    }

    let slots = i64::try_from(locations.len()).unwrap_or(i64::MAX);
    let mut allocations = vec![LocationAllocation::default(); locations.len()];
    if total <= 0 {
        return Ok(allocations);
    }

    let mut melee_left = melee_percent.of_rounded(total);
    let mut ranged_left = total - melee_left;

    let base = total / slots;
    let extra = total % slots;

    for (index, allocation) in (0_i64..).zip(allocations.iter_mut()) {
        let local = base + i64::from(index < extra);

        let mut melee = melee_percent.of_rounded(local).min(melee_left);
        let mut ranged = local - melee;
        if ranged > ranged_left {
            ranged = ranged_left;
            melee = local - ranged;
        }

        melee_left -= melee;
        ranged_left -= ranged;
        *allocation = LocationAllocation { melee, ranged };
    }

    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2Fixed;

    fn locations(n: i32) -> Vec<SpawnLocation> {
        (0..n)
            .map(|i| SpawnLocation::at(Vec2Fixed::from_ints(i * 10, 0)))
            .collect()
    }

    fn pct(value: u32) -> Percent {
        Percent::new(value).unwrap()
    }

    #[test]
    fn test_ten_across_three() {
        let result = allocate(10, pct(70), &locations(3)).unwrap();

        let totals: Vec<i64> = result.iter().map(LocationAllocation::total).collect();
        assert_eq!(totals, vec![4, 3, 3]);

        let melee: i64 = result.iter().map(|a| a.melee).sum();
        let ranged: i64 = result.iter().map(|a| a.ranged).sum();
        assert_eq!((melee, ranged), (7, 3));

        assert_eq!(
            result,
            vec![
                LocationAllocation { melee: 3, ranged: 1 },
                LocationAllocation { melee: 2, ranged: 1 },
                LocationAllocation { melee: 2, ranged: 1 },
            ]
        );
    }

    #[test]
    fn test_melee_budget_clamp() {
        // Global melee is round(2.4) = 2. Every location rounds 0.6 up to
        // one melee until the melee budget is spent.
        let result = allocate(4, pct(60), &locations(4)).unwrap();
        assert_eq!(
            result,
            vec![
                LocationAllocation { melee: 1, ranged: 0 },
                LocationAllocation { melee: 1, ranged: 0 },
                LocationAllocation { melee: 0, ranged: 1 },
                LocationAllocation { melee: 0, ranged: 1 },
            ]
        );
    }

    #[test]
    fn test_ranged_budget_clamp_shifts_to_melee() {
        // Global melee is round(2.5) = 2, ranged 3. Each location rounds 0.5
        // down to no melee; once ranged is spent the rest moves to melee.
        let result = allocate(5, pct(50), &locations(5)).unwrap();
        assert_eq!(
            result,
            vec![
                LocationAllocation { melee: 0, ranged: 1 },
                LocationAllocation { melee: 0, ranged: 1 },
                LocationAllocation { melee: 0, ranged: 1 },
                LocationAllocation { melee: 1, ranged: 0 },
                LocationAllocation { melee: 1, ranged: 0 },
            ]
        );
    }

    #[test]
    fn test_fewer_than_locations() {
        let result = allocate(2, pct(100), &locations(4)).unwrap();
        let totals: Vec<i64> = result.iter().map(LocationAllocation::total).collect();
        assert_eq!(totals, vec![1, 1, 0, 0]);
        assert!(result.iter().all(|a| a.ranged == 0));
    }

    #[test]
    fn test_non_positive_total_is_all_zero() {
        for total in [0, -1, -50] {
            let result = allocate(total, pct(70), &locations(3)).unwrap();
            assert!(result.iter().all(|a| *a == LocationAllocation::default()));
        }
    }

    #[test]
    fn test_no_locations_is_error() {
        assert!(matches!(
            allocate(10, pct(70), &[]),
            Err(GameError::NoSpawnLocations)
        ));
    }

    #[test]
    fn test_is_deterministic() {
        let a = allocate(97, pct(35), &locations(7)).unwrap();
        let b = allocate(97, pct(35), &locations(7)).unwrap();
        assert_eq!(a, b);
    }
}
