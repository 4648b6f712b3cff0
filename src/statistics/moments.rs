//! Running moments (mean, variance, skewness, kurtosis) with exact removal
//!
//! Uses Welford's numerically stable update, generalized to batches: a batch of
//! `count` copies of one value is treated as a cluster with zero spread and
//! merged with the parallel-moments formulas of Chan et al. Removal applies the
//! algebraic inverse of that merge.

use crate::statistics::Snapshot;
use crate::traits::{check_count, check_finite, checked_total, Accumulator, StatsError};

/// Raw state of a [`MomentAccumulator`]
///
/// Sufficient to rebuild the accumulator exactly without replaying history.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MomentState {
    pub count: u64,
    pub count_zero: u64,
    pub sum: f64,
    pub sse: f64,
    pub m3: f64,
    pub m4: f64,
}

/// Central moments of a cluster of observations
#[derive(Clone, Copy, Debug)]
struct Cluster {
    n: f64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Cluster {
    /// `count` copies of `value`: no spread at all
    fn point(value: f64, count: u64) -> Self {
        Self {
            n: count as f64,
            mean: value,
            m2: 0.0,
            m3: 0.0,
            m4: 0.0,
        }
    }
}

/// Merge the higher moments of two clusters; returns (m2, m3, m4)
fn merge_central(a: &Cluster, b: &Cluster) -> (f64, f64, f64) {
    let n = a.n + b.n;
    let delta = b.mean - a.mean;
    let delta2 = delta * delta;

    let m2 = a.m2 + b.m2 + delta2 * a.n * b.n / n;
    let m3 = a.m3
        + b.m3
        + delta2 * delta * a.n * b.n * (a.n - b.n) / (n * n)
        + 3.0 * delta * (a.n * b.m2 - b.n * a.m2) / n;
    let m4 = a.m4
        + b.m4
        + delta2 * delta2 * a.n * b.n * (a.n * a.n - a.n * b.n + b.n * b.n) / (n * n * n)
        + 6.0 * delta2 * (a.n * a.n * b.m2 + b.n * b.n * a.m2) / (n * n)
        + 4.0 * delta * (a.n * b.m3 - b.n * a.m3) / n;

    (m2, m3, m4)
}

/// Incremental moment accumulator supporting add, remove, merge and scale
///
/// Tracks count, sum, the Welford sum of squared errors (SSE) and the third and
/// fourth central moment sums. Every update is O(1) and never rescans the
/// sample.
///
/// # Example
///
/// ```
/// use flowmoments::statistics::MomentAccumulator;
/// use flowmoments::traits::Accumulator;
///
/// let mut acc = MomentAccumulator::new();
///
/// for v in [1.0, 2.0, 3.0] {
///     acc.add(v, 1).unwrap();
/// }
/// acc.add(5.0, 4).unwrap();
/// acc.remove(1.0, 1).unwrap();
///
/// let snap = acc.snapshot();
/// assert_eq!(snap.count, 6);
/// assert!((snap.sum - 25.0).abs() < 1e-12);
/// assert!((snap.mean - 25.0 / 6.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "MomentState", into = "MomentState")
)]
pub struct MomentAccumulator {
    /// Number of observations
    count: u64,
    /// Observations exactly equal to zero
    count_zero: u64,
    /// Sum of observations
    sum: f64,
    /// Sum of squared deviations from the mean (M2 in Welford's algorithm)
    sse: f64,
    /// Sum of cubed deviations
    m3: f64,
    /// Sum of fourth-power deviations
    m4: f64,
}

impl MomentAccumulator {
    /// Create a new empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mean, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// Sum of all observations
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Sum of squared errors
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Number of observations equal to zero
    pub fn count_zero(&self) -> u64 {
        self.count_zero
    }

    /// Raw state for persistence
    pub fn state(&self) -> MomentState {
        MomentState {
            count: self.count,
            count_zero: self.count_zero,
            sum: self.sum,
            sse: self.sse,
            m3: self.m3,
            m4: self.m4,
        }
    }

    /// Rebuild from persisted state, rejecting inconsistent records
    pub fn from_state(state: MomentState) -> Result<Self, StatsError> {
        for (field, v) in [
            ("sum", state.sum),
            ("sse", state.sse),
            ("m3", state.m3),
            ("m4", state.m4),
        ] {
            check_finite(v, field)?;
        }
        if state.count_zero > state.count {
            return Err(StatsError::invalid("count_zero exceeds count"));
        }
        if state.count <= 1 && (state.sse != 0.0 || state.m3 != 0.0 || state.m4 != 0.0) {
            return Err(StatsError::invalid(
                "a sample of at most one observation has no spread",
            ));
        }
        if state.count == 0 && state.sum != 0.0 {
            return Err(StatsError::invalid("an empty sample must have zero sum"));
        }

        Ok(Self {
            count: state.count,
            count_zero: state.count_zero,
            sum: state.sum,
            sse: state.sse,
            m3: state.m3,
            m4: state.m4,
        })
    }

    fn cluster(&self) -> Cluster {
        Cluster {
            n: self.count as f64,
            mean: self.sum / self.count as f64,
            m2: self.sse,
            m3: self.m3,
            m4: self.m4,
        }
    }

    fn absorb(&mut self, other: &Cluster, other_count: u64, other_sum: f64, other_zero: u64) {
        let (m2, m3, m4) = merge_central(&self.cluster(), other);
        self.count += other_count;
        self.count_zero += other_zero;
        self.sum += other_sum;
        self.sse = m2;
        self.m3 = m3;
        self.m4 = m4;
    }
}

impl Accumulator for MomentAccumulator {
    type Snapshot = Snapshot;

    fn add(&mut self, value: f64, count: u64) -> Result<(), StatsError> {
        check_count(count)?;
        check_finite(value, "value")?;
        checked_total(self.count, count)?;

        let zeros = if value == 0.0 { count } else { 0 };

        if self.count == 0 {
            self.count = count;
            self.count_zero = zeros;
            self.sum = count as f64 * value;
            self.sse = 0.0;
            self.m3 = 0.0;
            self.m4 = 0.0;
            return Ok(());
        }

        self.absorb(
            &Cluster::point(value, count),
            count,
            value * count as f64,
            zeros,
        );
        Ok(())
    }

    fn remove(&mut self, value: f64, count: u64) -> Result<(), StatsError> {
        check_count(count)?;
        check_finite(value, "value")?;

        if self.count == 0 {
            return Err(StatsError::EmptyAccumulator {
                operation: "remove",
            });
        }
        if count > self.count {
            return Err(StatsError::CountUnderflow {
                value,
                requested: count,
                available: self.count,
            });
        }
        if value == 0.0 && count > self.count_zero {
            return Err(StatsError::CountUnderflow {
                value,
                requested: count,
                available: self.count_zero,
            });
        }

        let new_count = self.count - count;
        if new_count == 0 {
            self.clear();
            return Ok(());
        }

        let new_sum = self.sum - value * count as f64;
        if value == 0.0 {
            self.count_zero -= count;
        }

        if new_count == 1 {
            // A lone observation has no spread; drop accumulated residue.
            self.count = 1;
            self.sum = new_sum;
            self.sse = 0.0;
            self.m3 = 0.0;
            self.m4 = 0.0;
            return Ok(());
        }

        let n = self.count as f64;
        let k = count as f64;
        let rest = new_count as f64;
        let mean = self.sum / n;
        let new_mean = new_sum / rest;
        let delta = value - new_mean;
        let delta2 = delta * delta;

        let sse = self.sse - (value - mean) * (value - new_mean) * k;
        let m3 = self.m3 - delta2 * delta * rest * k * (rest - k) / (n * n)
            + 3.0 * delta * k * sse / n;
        let m4 = self.m4
            - delta2 * delta2 * rest * k * (rest * rest - rest * k + k * k) / (n * n * n)
            - 6.0 * delta2 * k * k * sse / (n * n)
            + 4.0 * delta * k * m3 / n;

        self.count = new_count;
        self.sum = new_sum;
        self.sse = sse;
        self.m3 = m3;
        self.m4 = m4;
        Ok(())
    }

    fn merge(&mut self, other: &Self) -> Result<(), StatsError> {
        if other.count == 0 {
            return Ok(());
        }
        if self.count == 0 {
            *self = *other;
            return Ok(());
        }
        checked_total(self.count, other.count)?;

        self.absorb(&other.cluster(), other.count, other.sum, other.count_zero);
        Ok(())
    }

    fn scale(&mut self, multiplier: f64) -> Result<(), StatsError> {
        check_finite(multiplier, "multiplier")?;
        if multiplier == 0.0 {
            return Err(StatsError::invalid("cannot scale a sample by zero"));
        }

        let m2 = multiplier * multiplier;
        self.sum *= multiplier;
        self.sse *= m2;
        self.m3 *= m2 * multiplier;
        self.m4 *= m2 * m2;
        Ok(())
    }

    fn clear(&mut self) {
        *self = Self::new();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::from_moments(
            self.count,
            self.count_zero,
            self.sum,
            self.sse,
            self.m3,
            self.m4,
        )
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl From<MomentAccumulator> for MomentState {
    fn from(acc: MomentAccumulator) -> Self {
        acc.state()
    }
}

impl TryFrom<MomentState> for MomentAccumulator {
    type Error = StatsError;

    fn try_from(state: MomentState) -> Result<Self, Self::Error> {
        Self::from_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_values(values: &[f64]) -> MomentAccumulator {
        let mut acc = MomentAccumulator::new();
        for &v in values {
            acc.add(v, 1).unwrap();
        }
        acc
    }

    /// Two-pass reference moments: (mean, sse, m3, m4)
    fn reference(values: &[f64]) -> (f64, f64, f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let mut sse = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &v in values {
            let d = v - mean;
            sse += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
        }
        (mean, sse, m3, m4)
    }

    #[test]
    fn test_basic() {
        let acc = from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let snap = acc.snapshot();

        assert_eq!(snap.count, 8);
        assert!((snap.mean - 5.0).abs() < 1e-12);
        assert!((snap.population_variance - 4.0).abs() < 1e-12);
        assert!((snap.population_standard_deviation - 2.0).abs() < 1e-12);
        assert!((snap.variance - 32.0 / 7.0).abs() < 1e-12);
        assert!((snap.sse - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_add_matches_repeated_add() {
        let mut batched = from_values(&[1.0, 2.0]);
        batched.add(5.0, 4).unwrap();
        let single = from_values(&[1.0, 2.0, 5.0, 5.0, 5.0, 5.0]);

        assert_eq!(batched.count(), single.count());
        assert!((batched.sum() - single.sum()).abs() < 1e-12);
        assert!((batched.sse() - single.sse()).abs() < 1e-9);
        assert!((batched.m3 - single.m3).abs() < 1e-9);
        assert!((batched.m4 - single.m4).abs() < 1e-9);
    }

    #[test]
    fn test_first_batch_has_no_spread() {
        let mut acc = MomentAccumulator::new();
        acc.add(3.0, 5).unwrap();
        let snap = acc.snapshot();
        assert_eq!(snap.count, 5);
        assert_eq!(snap.sum, 15.0);
        assert_eq!(snap.variance, 0.0);
    }

    #[test]
    fn test_add_remove_scenario() {
        let mut acc = from_values(&[1.0, 2.0, 3.0]);
        acc.add(5.0, 4).unwrap();
        acc.remove(1.0, 1).unwrap();

        let snap = acc.snapshot();
        assert_eq!(snap.count, 6);
        assert!((snap.sum - 25.0).abs() < 1e-12);
        assert!((snap.mean - 4.1667).abs() < 1e-4);

        let (mean, sse, _, _) = reference(&[2.0, 3.0, 5.0, 5.0, 5.0, 5.0]);
        assert!((snap.mean - mean).abs() < 1e-12);
        assert!((snap.sse - sse).abs() < 1e-9);
    }

    #[test]
    fn test_remove_inverts_higher_moments() {
        let mut acc = from_values(&[1.0, 4.0, 9.0, 16.0, 25.0]);
        acc.add(2.5, 3).unwrap();
        acc.remove(9.0, 1).unwrap();
        acc.remove(2.5, 2).unwrap();

        let (mean, sse, m3, m4) = reference(&[1.0, 4.0, 16.0, 25.0, 2.5]);
        assert!((acc.mean().unwrap() - mean).abs() < 1e-12);
        assert!((acc.sse - sse).abs() < 1e-8);
        assert!((acc.m3 - m3).abs() < 1e-6);
        assert!((acc.m4 - m4).abs() < 1e-5);
    }

    #[test]
    fn test_remove_to_single_clears_residue() {
        let mut acc = from_values(&[0.1, 0.2, 0.3]);
        acc.remove(0.1, 1).unwrap();
        acc.remove(0.3, 1).unwrap();

        let snap = acc.snapshot();
        assert_eq!(snap.count, 1);
        assert_eq!(snap.variance, 0.0);
        assert_eq!(snap.population_variance, 0.0);
        assert_eq!(snap.sse, 0.0);
    }

    #[test]
    fn test_remove_all_resets() {
        let mut acc = from_values(&[1.5, 2.5]);
        acc.add(0.0, 2).unwrap();
        acc.remove(2.5, 1).unwrap();
        acc.remove(0.0, 2).unwrap();
        acc.remove(1.5, 1).unwrap();

        assert!(acc.is_empty());
        assert_eq!(acc, MomentAccumulator::new());
    }

    #[test]
    fn test_remove_errors() {
        let mut acc = MomentAccumulator::new();
        assert_eq!(
            acc.remove(1.0, 1),
            Err(StatsError::EmptyAccumulator {
                operation: "remove"
            })
        );

        acc.add(1.0, 2).unwrap();
        assert_eq!(
            acc.remove(1.0, 3),
            Err(StatsError::CountUnderflow {
                value: 1.0,
                requested: 3,
                available: 2
            })
        );
        assert_eq!(
            acc.remove(0.0, 1),
            Err(StatsError::CountUnderflow {
                value: 0.0,
                requested: 1,
                available: 0
            })
        );
        assert_eq!(acc.remove(1.0, 0), Err(StatsError::InvalidCount { count: 0 }));
        // failed calls leave the state untouched
        assert_eq!(acc.count(), 2);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut acc = MomentAccumulator::new();
        assert_eq!(acc.add(1.0, 0), Err(StatsError::InvalidCount { count: 0 }));
        assert!(acc.add(f64::NAN, 1).is_err());
        assert!(acc.add(f64::INFINITY, 1).is_err());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_count_zero() {
        let mut acc = from_values(&[0.0, 1.0, 0.0]);
        assert_eq!(acc.count_zero(), 2);
        acc.remove(0.0, 1).unwrap();
        assert_eq!(acc.snapshot().count_zero, 1);
    }

    #[test]
    fn test_merge() {
        let mut a = from_values(&[1.0, 2.0, 3.0]);
        let b = from_values(&[4.0, 5.0, 6.0]);
        a.merge(&b).unwrap();

        let (mean, sse, m3, m4) = reference(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.count(), 6);
        assert!((a.mean().unwrap() - mean).abs() < 1e-12);
        assert!((a.sse - sse).abs() < 1e-9);
        assert!((a.m3 - m3).abs() < 1e-9);
        assert!((a.m4 - m4).abs() < 1e-9);
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let a = from_values(&[1.0, 2.0]);
        let empty = MomentAccumulator::new();

        assert_eq!(a.combined(&empty).unwrap(), a);
        assert_eq!(empty.combined(&a).unwrap(), a);
    }

    #[test]
    fn test_scale() {
        let acc = from_values(&[1.0, 2.0, 3.0, 10.0]);
        let scaled = acc.scaled(-3.0).unwrap();
        let (_, sse, m3, m4) = reference(&[-3.0, -6.0, -9.0, -30.0]);

        assert!((scaled.sum() + 48.0).abs() < 1e-12);
        assert!((scaled.sse() - sse).abs() < 1e-9);
        assert!((scaled.m3 - m3).abs() < 1e-6);
        assert!((scaled.m4 - m4).abs() < 1e-4);

        let back = scaled.scaled(-1.0 / 3.0).unwrap();
        assert!((back.sum() - acc.sum()).abs() < 1e-12);
        assert!((back.sse() - acc.sse()).abs() < 1e-9);
    }

    #[test]
    fn test_scale_by_zero_rejected() {
        let mut acc = from_values(&[1.0, 2.0]);
        assert!(matches!(
            acc.scale(0.0),
            Err(StatsError::InvalidArgument(_))
        ));
        assert_eq!(acc.sum(), 3.0);
    }

    #[test]
    fn test_count_overflow_leaves_state_untouched() {
        let mut acc = MomentAccumulator::new();
        acc.add(1.0, u64::MAX).unwrap();
        let before = acc.state();

        assert_eq!(
            acc.add(1.0, 1),
            Err(StatsError::CountOverflow {
                held: u64::MAX,
                requested: 1
            })
        );
        assert_eq!(acc.state(), before);

        let other = from_values(&[2.0]);
        assert!(matches!(
            acc.merge(&other),
            Err(StatsError::CountOverflow { .. })
        ));
        assert_eq!(acc.state(), before);
    }

    #[test]
    fn test_skewness_and_kurtosis() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 10.0];
        let acc = from_values(&values);
        let snap = acc.snapshot();
        let (_, sse, m3, m4) = reference(&values);
        let n = values.len() as f64;

        let skew = n.sqrt() * m3 / sse.powf(1.5);
        let kurt = n * m4 / (sse * sse) - 3.0;
        assert!(snap.skewness > 0.0);
        assert!((snap.skewness - skew).abs() < 1e-9);
        assert!((snap.kurtosis - kurt).abs() < 1e-9);
    }

    #[test]
    fn test_numerical_stability() {
        let mut acc = MomentAccumulator::new();
        let base = 1e9;
        for i in 0..1000 {
            acc.add(base + i as f64, 1).unwrap();
        }
        for i in 0..500 {
            acc.remove(base + i as f64, 1).unwrap();
        }

        // remaining: base + 500 ..= base + 999, variance of 500 consecutive ints
        let snap = acc.snapshot();
        let expected = (500.0 * 500.0 - 1.0) / 12.0;
        assert!((snap.population_variance - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn test_state_round_trip() {
        let mut acc = from_values(&[0.0, 1.25, 7.5, -3.0]);
        acc.add(2.0, 3).unwrap();

        let restored = MomentAccumulator::from_state(acc.state()).unwrap();
        assert_eq!(restored.snapshot(), acc.snapshot());
    }

    #[test]
    fn test_from_state_rejects_inconsistent() {
        let bad = MomentState {
            count: 1,
            count_zero: 2,
            ..MomentState::default()
        };
        assert!(MomentAccumulator::from_state(bad).is_err());

        let bad = MomentState {
            count: 1,
            sum: 4.0,
            sse: 2.0,
            ..MomentState::default()
        };
        assert!(MomentAccumulator::from_state(bad).is_err());
    }
}
