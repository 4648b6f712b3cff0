//! Empirical cumulative and point distribution lookups
//!
//! Built once from a sorted value -> probability table; queries are binary
//! searches over the sorted keys.

use crate::frequency::FrequencyHistogram;
use crate::math;
use crate::statistics::AdvancedSnapshot;
use crate::traits::{check_finite, StatsError};

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Allowed distance between the total probability mass and 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-10;

/// Empirical distribution over a finite set of values
///
/// The cumulative probability of the largest value is exactly 1: whatever
/// rounding residue the running sum accumulates is absorbed by the last key.
///
/// # Example
///
/// ```
/// use flowmoments::distribution::EmpiricalDistribution;
///
/// let dist = EmpiricalDistribution::from_density([(1.0, 0.2), (3.0, 0.2), (20.0, 0.6)], true)
///     .unwrap();
///
/// assert_eq!(dist.pr_less_than_or_equal(0.1), 0.0);
/// assert!((dist.pr_less_than_or_equal(15.0) - 0.4).abs() < 1e-12);
/// assert_eq!(dist.pr_less_than_or_equal(20.0), 1.0);
/// assert_eq!(dist.pr_equal(3.0), 0.2);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmpiricalDistribution {
    /// Ascending values
    keys: Vec<f64>,
    /// Point probability per key
    density: Vec<f64>,
    /// Cumulative probability per key, last entry exactly 1
    cumulative: Vec<f64>,
}

impl EmpiricalDistribution {
    /// Build from `(value, probability)` pairs in ascending value order
    ///
    /// With `verify_order` set, keys that are not strictly ascending are
    /// reported as [`StatsError::SortOrder`]. Without it the pairs are sorted
    /// here and repeated values have their probabilities summed. The
    /// probabilities must sum to 1 within [`PROBABILITY_TOLERANCE`]. `-0.0`
    /// is read as `0.0`.
    pub fn from_density<I>(density: I, verify_order: bool) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let iter = density.into_iter();
        let (lower, _) = iter.size_hint();
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(lower);

        for (value, probability) in iter {
            check_finite(value, "value")?;
            check_finite(probability, "probability")?;
            if probability < 0.0 {
                return Err(StatsError::invalid("probability must be non-negative"));
            }
            pairs.push((value + 0.0, probability));
        }

        if verify_order {
            if let Some(index) = (1..pairs.len()).find(|&i| pairs[i - 1].0 >= pairs[i].0) {
                return Err(StatsError::SortOrder { index });
            }
        } else {
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            pairs.dedup_by(|next, kept| {
                if next.0 == kept.0 {
                    kept.1 += next.1;
                    true
                } else {
                    false
                }
            });
        }

        let (keys, probs): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

        let total: f64 = probs.iter().sum();
        if keys.is_empty() || math::abs(total - 1.0) > PROBABILITY_TOLERANCE {
            return Err(StatsError::ProbabilityMass {
                total,
                tolerance: PROBABILITY_TOLERANCE,
            });
        }

        let mut running = 0.0;
        let mut cumulative: Vec<f64> = probs
            .iter()
            .map(|p| {
                running += p;
                running.min(1.0)
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(Self {
            keys,
            density: probs,
            cumulative,
        })
    }

    /// Build from observed frequencies
    pub fn from_histogram(histogram: &FrequencyHistogram) -> Result<Self, StatsError> {
        if histogram.is_empty() {
            return Err(StatsError::EmptyAccumulator {
                operation: "build a distribution",
            });
        }
        Self::from_density(histogram.probabilities(), false)
    }

    /// Build from the probabilities of an advanced snapshot
    pub fn from_snapshot(snapshot: &AdvancedSnapshot) -> Result<Self, StatsError> {
        if snapshot.probabilities.is_empty() {
            return Err(StatsError::EmptyAccumulator {
                operation: "build a distribution",
            });
        }
        Self::from_density(snapshot.probabilities.iter().copied(), false)
    }

    /// Smallest value
    pub fn minimum(&self) -> f64 {
        self.keys[0]
    }

    /// Largest value
    pub fn maximum(&self) -> f64 {
        self.keys[self.keys.len() - 1]
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: construction rejects empty input
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate `(value, probability, cumulative probability)` in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.keys
            .iter()
            .zip(&self.density)
            .zip(&self.cumulative)
            .map(|((&k, &p), &c)| (k, p, c))
    }

    /// `x` must already have `-0.0` folded into `0.0`
    fn search(&self, x: f64) -> Result<usize, usize> {
        self.keys.binary_search_by(|k| k.total_cmp(&x))
    }

    /// P(X <= x)
    pub fn pr_less_than_or_equal(&self, x: f64) -> f64 {
        let x = x + 0.0;
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.minimum() {
            return 0.0;
        }
        if x >= self.maximum() {
            return 1.0;
        }
        // greatest key <= x; the insertion point is >= 1 since x >= minimum
        match self.search(x) {
            Ok(i) => self.cumulative[i],
            Err(i) => self.cumulative[i - 1],
        }
    }

    /// P(X < x)
    pub fn pr_less_than(&self, x: f64) -> f64 {
        let x = x + 0.0;
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= self.minimum() {
            return 0.0;
        }
        if x > self.maximum() {
            return 1.0;
        }
        match self.search(x) {
            Ok(i) | Err(i) => self.cumulative[i - 1],
        }
    }

    /// P(X > x)
    pub fn pr_greater_than(&self, x: f64) -> f64 {
        1.0 - self.pr_less_than_or_equal(x)
    }

    /// P(X == x), 0 unless `x` is one of the values
    pub fn pr_equal(&self, x: f64) -> f64 {
        match self.search(x + 0.0) {
            Ok(i) => self.density[i],
            Err(_) => 0.0,
        }
    }

    /// Smallest value whose cumulative probability reaches `p`
    ///
    /// Returns `None` for `p` outside `[0, 1]`.
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        let i = self.cumulative.partition_point(|&c| c < p);
        Some(self.keys[i.min(self.keys.len() - 1)])
    }
}
