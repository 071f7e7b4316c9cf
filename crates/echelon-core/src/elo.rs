//! Elo rating calculations.
//!
//! Pure functions with no I/O. Ratings are `f64` and are never clamped, so
//! they may go negative after a long losing streak.

use serde::{Deserialize, Serialize};

/// Rating given to every item on creation.
pub const DEFAULT_RATING: f64 = 1200.0;

/// Spread constant. The logistic curve uses `F = 2 * BETA`.
pub const DEFAULT_BETA: f64 = 200.0;

/// K-factor used when no schedule step applies.
pub const DEFAULT_K: f64 = 10.0;

/// Result of a single comparison, seen from the first item's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First item won.
    Win,
    /// First item lost.
    Loss,
    /// Neither side preferred.
    Draw,
}

impl Outcome {
    /// Actual scores `(first, second)` for this outcome.
    pub fn scores(self) -> (f64, f64) {
        match self {
            Outcome::Win => (1.0, 0.0),
            Outcome::Loss => (0.0, 1.0),
            Outcome::Draw => (0.5, 0.5),
        }
    }
}

/// Expected score of `rating` against `other_rating`.
///
/// `E = 1 / (1 + 10^((other - rating) / (2 * beta)))`
pub fn expected_score(rating: f64, other_rating: f64, beta: f64) -> f64 {
    let f_factor = 2.0 * beta;
    1.0 / (1.0 + 10f64.powf((other_rating - rating) / f_factor))
}

/// New rating after scoring `actual` against `other_rating`.
pub fn new_rating(rating: f64, other_rating: f64, actual: f64, k: f64, beta: f64) -> f64 {
    rating + k * (actual - expected_score(rating, other_rating, beta))
}

/// Rate a single comparison between two items with the same K.
///
/// Returns the updated `(rating_a, rating_b)`. Both sides are computed from
/// the ratings as they were before the comparison.
pub fn rate_1vs1(rating_a: f64, rating_b: f64, outcome: Outcome, k: f64, beta: f64) -> (f64, f64) {
    let (score_a, score_b) = outcome.scores();
    (
        new_rating(rating_a, rating_b, score_a, k, beta),
        new_rating(rating_b, rating_a, score_b, k, beta),
    )
}

/// One step of a variable K-factor schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KStep {
    /// Upper bound (inclusive) on the counter for which this step applies.
    pub threshold: u64,
    /// K-factor to use while the counter is at or below `threshold`.
    pub k: f64,
}

/// K-factor schedule keyed on a monotonically increasing counter.
///
/// For a counter value `n`, the step with the smallest `threshold >= n` wins.
/// If `n` exceeds every threshold, or the schedule is empty, `default_k`
/// applies. Steps sharing a threshold keep their configured order and the
/// first one is used.
#[derive(Debug, Clone, PartialEq)]
pub struct KSchedule {
    steps: Vec<KStep>,
    default_k: f64,
}

impl KSchedule {
    /// Schedule that always yields `k`.
    pub fn constant(k: f64) -> Self {
        Self {
            steps: Vec::new(),
            default_k: k,
        }
    }

    /// Build a schedule from steps in any order.
    pub fn new(mut steps: Vec<KStep>, default_k: f64) -> Self {
        // stable: equal thresholds keep configuration order
        steps.sort_by_key(|step| step.threshold);
        Self { steps, default_k }
    }

    /// K-factor for the given counter.
    pub fn k_for(&self, counter: u64) -> f64 {
        self.steps
            .iter()
            .find(|step| step.threshold >= counter)
            .map(|step| step.k)
            .unwrap_or(self.default_k)
    }

    /// Steps sorted by threshold.
    pub fn steps(&self) -> &[KStep] {
        &self.steps
    }

    /// K-factor used past the last threshold.
    pub fn default_k(&self) -> f64 {
        self.default_k
    }
}

impl Default for KSchedule {
    fn default() -> Self {
        Self::constant(DEFAULT_K)
    }
}

/// Rating transition for one decided pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingChange {
    /// Winner rating before the match.
    pub winner_before: f64,
    /// Winner rating after the match.
    pub winner_after: f64,
    /// Loser rating before the match.
    pub loser_before: f64,
    /// Loser rating after the match.
    pub loser_after: f64,
    /// K-factor that was applied.
    pub k: f64,
}

impl RatingChange {
    /// Points gained by the winner.
    pub fn winner_delta(&self) -> f64 {
        self.winner_after - self.winner_before
    }

    /// Points lost by the loser (negative for a normal win).
    pub fn loser_delta(&self) -> f64 {
        self.loser_after - self.loser_before
    }
}

/// Elo model: spread constant plus K schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct EloModel {
    beta: f64,
    schedule: KSchedule,
}

impl EloModel {
    /// Create a model with the given spread constant and schedule.
    pub fn new(beta: f64, schedule: KSchedule) -> Self {
        Self { beta, schedule }
    }

    /// Model with a single constant K.
    pub fn with_constant_k(beta: f64, k: f64) -> Self {
        Self::new(beta, KSchedule::constant(k))
    }

    /// Spread constant.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// K schedule.
    pub fn schedule(&self) -> &KSchedule {
        &self.schedule
    }

    /// Rate a decided comparison.
    ///
    /// `counter` selects the K-factor from the schedule; callers pass the
    /// ordinal of the match being recorded.
    pub fn rate_win(&self, winner: f64, loser: f64, counter: u64) -> RatingChange {
        let k = self.schedule.k_for(counter);
        let (winner_after, loser_after) = rate_1vs1(winner, loser, Outcome::Win, k, self.beta);
        RatingChange {
            winner_before: winner,
            winner_after,
            loser_before: loser,
            loser_after,
            k,
        }
    }

    /// Rate an arbitrary outcome from `a`'s perspective.
    pub fn rate(&self, a: f64, b: f64, outcome: Outcome, counter: u64) -> (f64, f64) {
        rate_1vs1(a, b, outcome, self.schedule.k_for(counter), self.beta)
    }
}

impl Default for EloModel {
    fn default() -> Self {
        Self::new(DEFAULT_BETA, KSchedule::default())
    }
}
