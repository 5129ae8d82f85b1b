//! Wave tiers and the per-wave count formula.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Percent;

/// Number of the first wave.
pub const FIRST_WAVE: u32 = 1;

/// One row of the tier table, as authored.
///
/// # Example RON
///
/// ```ron
/// TierSpec(
///     start_count: 5,
///     added_per_wave: 2,
///     waves_affected: 3,
///     melee_percent: 70,
///     ranged_percent: 30,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    /// Base count for the tier.
    pub start_count: i32,

    /// Count added for every wave into the tier (the first wave included).
    pub added_per_wave: i32,

    /// Number of waves the tier governs. Ignored for the infinite tier.
    #[serde(default)]
    pub waves_affected: u32,

    /// Whether this tier governs every wave from its start onwards.
    #[serde(default)]
    pub is_infinite: bool,

    /// Share of each wave spawned as melee.
    #[serde(default = "default_melee_percent")]
    pub melee_percent: Percent,

    /// Share of each wave spawned as ranged.
    #[serde(default = "default_ranged_percent")]
    pub ranged_percent: Percent,
}

const fn default_melee_percent() -> Percent {
    Percent::saturating(70)
}

const fn default_ranged_percent() -> Percent {
    Percent::saturating(30)
}

impl TierSpec {
    /// A finite tier with the default 70/30 mix.
    #[must_use]
    pub const fn finite(start_count: i32, added_per_wave: i32, waves_affected: u32) -> Self {
        Self {
            start_count,
            added_per_wave,
            waves_affected,
            is_infinite: false,
            melee_percent: default_melee_percent(),
            ranged_percent: default_ranged_percent(),
        }
    }

    /// The terminal infinite tier with the default 70/30 mix.
    #[must_use]
    pub const fn infinite(start_count: i32, added_per_wave: i32) -> Self {
        Self {
            start_count,
            added_per_wave,
            waves_affected: 0,
            is_infinite: true,
            melee_percent: default_melee_percent(),
            ranged_percent: default_ranged_percent(),
        }
    }

    /// Replace the melee/ranged mix.
    #[must_use]
    pub const fn with_mix(mut self, melee: Percent, ranged: Percent) -> Self {
        self.melee_percent = melee;
        self.ranged_percent = ranged;
        self
    }
}

/// Every structural problem with a tier list, in table order.
///
/// An empty result means [`WaveTable::new`] will accept the list.
#[must_use]
pub fn tier_issues(specs: &[TierSpec]) -> Vec<String> {
    let mut issues = Vec::new();

    let Some(last) = specs.len().checked_sub(1) else {
        issues.push("at least one tier is required".to_string());
        return issues;
    };

    let mut next_start = Some(FIRST_WAVE);
    for (index, spec) in specs.iter().enumerate() {
        if spec.is_infinite && index != last {
            issues.push(format!("tier {index} is infinite but is not the last tier"));
        }
        if !spec.is_infinite && spec.waves_affected == 0 {
            issues.push(format!("tier {index} must affect at least one wave"));
        }

        let sum = spec.melee_percent.value() + spec.ranged_percent.value();
        if sum != 100 {
            issues.push(format!(
                "tier {index} melee and ranged percentages sum to {sum}, expected 100"
            ));
        }

        if !spec.is_infinite {
            next_start = next_start.and_then(|start| start.checked_add(spec.waves_affected));
        }
    }

    if !specs[last].is_infinite {
        issues.push("the last tier must be infinite".to_string());
    }
    if next_start.is_none() {
        issues.push("tier wave ranges overflow the wave counter".to_string());
    }

    issues
}

/// A validated tier with its derived first wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveTier {
    spec: TierSpec,
    group_start_wave: u32,
}

impl WaveTier {
    /// The authored row.
    #[must_use]
    pub const fn spec(&self) -> &TierSpec {
        &self.spec
    }

    /// First wave governed by this tier.
    #[must_use]
    pub const fn group_start_wave(&self) -> u32 {
        self.group_start_wave
    }

    /// Whether this is the terminal infinite tier.
    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        self.spec.is_infinite
    }

    fn contains(&self, wave: u32) -> bool {
        wave >= self.group_start_wave && wave - self.group_start_wave < self.spec.waves_affected
    }

    fn count_for(&self, wave: u32) -> i64 {
        let into_tier = i64::from(wave) - i64::from(self.group_start_wave) + 1;
        i64::from(self.spec.start_count) + into_tier * i64::from(self.spec.added_per_wave)
    }
}

/// Per-wave values derived from the tier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveComposition {
    /// Wave number.
    pub wave: u32,
    /// Hostiles in the wave. Non-positive under odd configs; spawns nothing.
    pub total_count: i64,
    /// Melee share.
    pub melee_percent: Percent,
    /// Ranged share.
    pub ranged_percent: Percent,
}

impl WaveComposition {
    /// Global `(melee, ranged)` split of the wave.
    #[must_use]
    pub fn split(&self) -> (i64, i64) {
        let total = self.total_count.max(0);
        let melee = self.melee_percent.of_rounded(total);
        (melee, total - melee)
    }
}

/// Immutable tier table with derived group start waves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveTable {
    tiers: Vec<WaveTier>,
}

impl WaveTable {
    /// Build the table, enforcing the tier invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTiers`] listing every issue from
    /// [`tier_issues`].
    pub fn new(specs: &[TierSpec]) -> Result<Self> {
        let issues = tier_issues(specs);
        if !issues.is_empty() {
            return Err(GameError::InvalidTiers(issues.join("; ")));
        }

        let mut tiers = Vec::with_capacity(specs.len());
        let mut start = FIRST_WAVE;
        for spec in specs {
            tiers.push(WaveTier {
                spec: spec.clone(),
                group_start_wave: start,
            });
            // Overflow was ruled out by `tier_issues`.
            start = start.saturating_add(spec.waves_affected);
        }

        Ok(Self { tiers })
    }

    /// Tiers in table order.
    #[must_use]
    pub fn tiers(&self) -> &[WaveTier] {
        &self.tiers
    }

    /// The tier governing `wave`: the first finite tier whose range holds
    /// it, else the infinite tier once `wave` reaches its start.
    #[must_use]
    pub fn tier_for(&self, wave: u32) -> Option<&WaveTier> {
        let mut infinite = None;
        for tier in &self.tiers {
            if tier.is_infinite() {
                infinite = Some(tier);
            } else if tier.contains(wave) {
                return Some(tier);
            }
        }
        infinite.filter(|tier| wave >= tier.group_start_wave)
    }

    /// Hostile count for `wave`, or `None` when no tier governs it.
    #[must_use]
    pub fn wave_count(&self, wave: u32) -> Option<i64> {
        self.tier_for(wave).map(|tier| tier.count_for(wave))
    }

    /// Full composition for `wave`.
    #[must_use]
    pub fn composition(&self, wave: u32) -> Option<WaveComposition> {
        self.tier_for(wave).map(|tier| WaveComposition {
            wave,
            total_count: tier.count_for(wave),
            melee_percent: tier.spec.melee_percent,
            ranged_percent: tier.spec.ranged_percent,
        })
    }
}
