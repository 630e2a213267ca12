use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use crate::core::scoring::PolicyError;
use crate::models::ProgramCandidate;

/// Tier selection thresholds and caps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    /// Rankings at or below this value are Dream-eligible
    pub dream_ranking_cutoff: u32,
    pub dream_cap: usize,
    pub target_cap: usize,
    pub safe_cap: usize,
    /// Share of the non-Dream pool, best matches first, that becomes Safe
    pub safe_fraction: f64,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            dream_ranking_cutoff: 30,
            dream_cap: 4,
            target_cap: 6,
            safe_cap: 4,
            safe_fraction: 0.30,
        }
    }
}

impl TierPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&self.safe_fraction) {
            return Err(PolicyError::SafeFraction(self.safe_fraction));
        }
        Ok(())
    }

    /// Number of Safe picks for a pool of `remaining` candidates
    pub fn safe_count(&self, remaining: usize) -> usize {
        // Epsilon keeps 10 * 0.3 from ceiling to 4
        let share = (remaining as f64 * self.safe_fraction - 1e-9).ceil().max(0.0) as usize;
        share.min(self.safe_cap).min(remaining)
    }
}

/// Candidates partitioned into disjoint tiers
#[derive(Debug, Clone, Default)]
pub struct TierAssignment {
    /// Ascending ranking
    pub dream: Vec<ProgramCandidate>,
    /// Ascending distance
    pub target: Vec<ProgramCandidate>,
    /// Ascending distance
    pub safe: Vec<ProgramCandidate>,
    /// Candidates no tier selected
    pub discarded: usize,
    /// Repeated (school, program) entries collapsed before tiering
    pub duplicates: usize,
}

impl TierAssignment {
    pub fn len(&self) -> usize {
        self.dream.len() + self.target.len() + self.safe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn by_ranking(a: &ProgramCandidate, b: &ProgramCandidate) -> Ordering {
    rank_order(a.ranking, b.ranking)
        .then_with(|| a.distance.total_cmp(&b.distance))
        .then_with(|| a.key().cmp(&b.key()))
}

fn by_distance(a: &ProgramCandidate, b: &ProgramCandidate) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| rank_order(a.ranking, b.ranking))
        .then_with(|| a.key().cmp(&b.key()))
}

/// Ranked programs first, unranked last
fn rank_order(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Collapse repeated (school, program) pairs, keeping the closest match
fn dedupe(candidates: Vec<ProgramCandidate>) -> (Vec<ProgramCandidate>, usize) {
    let total = candidates.len();
    let mut positions: HashMap<(String, String), usize> = HashMap::with_capacity(total);
    let mut unique: Vec<ProgramCandidate> = Vec::with_capacity(total);

    for candidate in candidates {
        match positions.get(&candidate.key()) {
            Some(&idx) => {
                if candidate.distance.total_cmp(&unique[idx].distance) == Ordering::Less {
                    unique[idx] = candidate;
                }
            }
            None => {
                positions.insert(candidate.key(), unique.len());
                unique.push(candidate);
            }
        }
    }

    let duplicates = total - unique.len();
    (unique, duplicates)
}

/// Partition candidates into Dream, Safe and Target tiers
///
/// # Pipeline Stages
/// 1. Collapse duplicate (school, program) pairs
/// 2. Dream: top-ranked programs regardless of similarity, by ascending ranking
/// 3. Safe: the best-matching share of what remains, by ascending distance
/// 4. Target: the next slice after Safe
/// 5. Anything left over is discarded
///
/// Tiers are never padded: a short pool simply yields short tiers.
pub fn classify_tiers(candidates: Vec<ProgramCandidate>, policy: &TierPolicy) -> TierAssignment {
    let (pool, duplicates) = dedupe(candidates);
    let total = pool.len();

    let (mut eligible, mut rest): (Vec<_>, Vec<_>) = pool
        .into_iter()
        .partition(|c| c.ranking.is_some_and(|r| r <= policy.dream_ranking_cutoff));

    eligible.sort_by(by_ranking);
    let overflow = eligible.split_off(policy.dream_cap.min(eligible.len()));
    let dream = eligible;

    // Dream-eligible programs beyond the cap compete on similarity
    rest.extend(overflow);
    rest.sort_by(by_distance);

    let safe_count = policy.safe_count(rest.len());
    let mut remainder = rest.split_off(safe_count);
    let safe = rest;

    let target_count = policy.target_cap.min(remainder.len());
    let leftover = remainder.split_off(target_count);
    let target = remainder;

    TierAssignment {
        discarded: leftover.len(),
        duplicates,
        dream,
        target,
        safe,
    }
    .debug_check(total)
}

impl TierAssignment {
    fn debug_check(self, total: usize) -> Self {
        debug_assert_eq!(self.len() + self.discarded, total);
        self
    }
}
