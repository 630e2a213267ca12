use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::models::Tier;

/// Invalid tier or score configuration
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Band for {tier} is empty: min {min} > max {max}")]
    EmptyBand { tier: Tier, min: f64, max: f64 },

    #[error("Bands overlap or are misordered: {lower} max {lower_max} must be below {upper} min {upper_min}")]
    OverlappingBands {
        lower: Tier,
        lower_max: f64,
        upper: Tier,
        upper_min: f64,
    },

    #[error("Safe fraction must lie in [0, 1], got {0}")]
    SafeFraction(f64),

    #[error("Enrichment concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Score band for one tier
///
/// `shift` is added to the base score before clamping into `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub shift: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64, shift: f64) -> Self {
        Self { min, max, shift }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }

    /// Clamp into the band; NaN lands on the band minimum
    #[inline]
    pub fn bound(&self, score: f64) -> f64 {
        if score.is_nan() {
            return self.min;
        }
        score.clamp(self.min, self.max)
    }

    /// Shift a base score, then clamp
    #[inline]
    pub fn apply(&self, base: f64) -> f64 {
        self.bound(base + self.shift)
    }
}

/// Per-tier score bands, ordered Dream < Target < Safe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBands {
    pub dream: Band,
    pub target: Band,
    pub safe: Band,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            dream: Band::new(50.0, 69.0, -20.0),
            target: Band::new(70.0, 84.0, 0.0),
            safe: Band::new(85.0, 95.0, 10.0),
        }
    }
}

impl ScoreBands {
    pub fn for_tier(&self, tier: Tier) -> &Band {
        match tier {
            Tier::Dream => &self.dream,
            Tier::Target => &self.target,
            Tier::Safe => &self.safe,
        }
    }

    /// Bands must be non-empty and strictly ordered without overlap
    pub fn validate(&self) -> Result<(), PolicyError> {
        for tier in [Tier::Dream, Tier::Target, Tier::Safe] {
            let band = self.for_tier(tier);
            if !(band.min <= band.max) {
                return Err(PolicyError::EmptyBand {
                    tier,
                    min: band.min,
                    max: band.max,
                });
            }
        }

        for (lower, upper) in [(Tier::Dream, Tier::Target), (Tier::Target, Tier::Safe)] {
            let (lo, hi) = (self.for_tier(lower), self.for_tier(upper));
            if !(lo.max < hi.min) {
                return Err(PolicyError::OverlappingBands {
                    lower,
                    lower_max: lo.max,
                    upper,
                    upper_min: hi.min,
                });
            }
        }

        Ok(())
    }
}

/// Base match score from a cosine distance
///
/// `round((1 - distance) * 1000) / 10`, i.e. a 0-100 scale with one decimal.
/// Distances outside [0, 1] give values outside that scale; callers clamp.
#[inline]
pub fn base_score(distance: f64) -> f64 {
    ((1.0 - distance) * 1000.0).round() / 10.0
}

/// Tier-bounded match score for a candidate's distance
///
/// Monotonic within a tier: a smaller distance never yields a lower score.
#[inline]
pub fn normalize_score(distance: f64, tier: Tier, bands: &ScoreBands) -> f64 {
    bands.for_tier(tier).apply(base_score(distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_score() {
        assert_eq!(base_score(0.0), 100.0);
        assert_eq!(base_score(0.25), 75.0);
        assert_eq!(base_score(0.123), 87.7);
        assert_eq!(base_score(1.5), -50.0);
    }

    #[test]
    fn test_scores_stay_in_band() {
        let bands = ScoreBands::default();

        for distance in [-0.5, 0.0, 0.02, 0.1, 0.3, 0.5, 0.9, 1.0, 2.0] {
            assert!(bands.dream.contains(normalize_score(distance, Tier::Dream, &bands)));
            assert!(bands.target.contains(normalize_score(distance, Tier::Target, &bands)));
            assert!(bands.safe.contains(normalize_score(distance, Tier::Safe, &bands)));
        }
    }

    #[test]
    fn test_tier_shifts() {
        let bands = ScoreBands::default();

        // base 80: dream shifts down to 60, safe up to 90
        assert_eq!(normalize_score(0.2, Tier::Dream, &bands), 60.0);
        assert_eq!(normalize_score(0.2, Tier::Target, &bands), 80.0);
        assert_eq!(normalize_score(0.2, Tier::Safe, &bands), 90.0);
    }

    #[test]
    fn test_monotonic_within_tier() {
        let bands = ScoreBands::default();
        let distances: Vec<f64> = (0..=200).map(|i| i as f64 / 100.0).collect();

        for tier in [Tier::Dream, Tier::Target, Tier::Safe] {
            for pair in distances.windows(2) {
                let better = normalize_score(pair[0], tier, &bands);
                let worse = normalize_score(pair[1], tier, &bands);
                assert!(better >= worse, "{tier}: {} scored below {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_nan_distance_lands_on_band_minimum() {
        let bands = ScoreBands::default();
        assert_eq!(normalize_score(f64::NAN, Tier::Safe, &bands), 85.0);
    }

    #[test]
    fn test_validate_bands() {
        assert!(ScoreBands::default().validate().is_ok());

        let mut overlapping = ScoreBands::default();
        overlapping.target.max = 90.0;
        assert!(matches!(
            overlapping.validate(),
            Err(PolicyError::OverlappingBands { lower: Tier::Target, .. })
        ));

        let mut empty = ScoreBands::default();
        empty.dream = Band::new(69.0, 50.0, 0.0);
        assert!(matches!(empty.validate(), Err(PolicyError::EmptyBand { tier: Tier::Dream, .. })));
    }
}
