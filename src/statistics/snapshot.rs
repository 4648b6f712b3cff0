//! Immutable summaries derived from accumulator state

use crate::math;

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Serialize a possibly-`NaN` float as an optional number
///
/// JSON has no `NaN`; an undefined mean travels as `null` and comes back as
/// `NaN`.
#[cfg(feature = "serde")]
mod nan_as_none {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let value = if value.is_nan() { None } else { Some(*value) };
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Point-in-time summary of a [`MomentAccumulator`](super::MomentAccumulator)
///
/// Recomputed on every query; never mutated. For an empty sample the mean is
/// `NaN` and every other derived figure is zero. Two snapshots with an
/// undefined mean compare equal.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Number of observations
    pub count: u64,
    /// Number of observations equal to zero
    pub count_zero: u64,
    /// Arithmetic mean, `NaN` when empty
    #[cfg_attr(feature = "serde", serde(with = "nan_as_none"))]
    pub mean: f64,
    /// Sum of all observations
    pub sum: f64,
    /// Sample variance (Bessel's correction), 0 when count <= 1
    pub variance: f64,
    /// Population variance
    pub population_variance: f64,
    /// Sample standard deviation
    pub standard_deviation: f64,
    /// Population standard deviation
    pub population_standard_deviation: f64,
    /// Sum of squared deviations from the mean
    pub sse: f64,
    /// Sample standard deviation over mean, 0 unless the mean is positive
    pub coefficient_of_variation: f64,
    /// Population standard deviation over mean, 0 unless the mean is positive
    pub population_coefficient_of_variation: f64,
    /// Population skewness, 0 when the sample has no spread
    pub skewness: f64,
    /// Excess kurtosis, 0 when the sample has no spread
    pub kurtosis: f64,
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        let same_mean =
            self.mean == other.mean || (self.mean.is_nan() && other.mean.is_nan());
        same_mean
            && self.count == other.count
            && self.count_zero == other.count_zero
            && self.sum == other.sum
            && self.variance == other.variance
            && self.population_variance == other.population_variance
            && self.standard_deviation == other.standard_deviation
            && self.population_standard_deviation == other.population_standard_deviation
            && self.sse == other.sse
            && self.coefficient_of_variation == other.coefficient_of_variation
            && self.population_coefficient_of_variation
                == other.population_coefficient_of_variation
            && self.skewness == other.skewness
            && self.kurtosis == other.kurtosis
    }
}

impl Snapshot {
    pub(crate) fn from_moments(
        count: u64,
        count_zero: u64,
        sum: f64,
        sse: f64,
        m3: f64,
        m4: f64,
    ) -> Self {
        if count == 0 {
            return Self {
                count: 0,
                count_zero: 0,
                mean: f64::NAN,
                sum: 0.0,
                variance: 0.0,
                population_variance: 0.0,
                standard_deviation: 0.0,
                population_standard_deviation: 0.0,
                sse: 0.0,
                coefficient_of_variation: 0.0,
                population_coefficient_of_variation: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }

        let n = count as f64;
        let mean = sum / n;

        let variance = if count > 1 {
            (sse / (n - 1.0)).max(0.0)
        } else {
            0.0
        };
        let population_variance = (sse / n).max(0.0);

        let standard_deviation = math::sqrt_clamped(variance);
        let population_standard_deviation = math::sqrt_clamped(population_variance);

        let cv = |stdev: f64| if mean > 0.0 { stdev / mean } else { 0.0 };

        let (skewness, kurtosis) = if sse > 0.0 {
            (
                math::sqrt(n) * m3 / math::powi(math::sqrt(sse), 3),
                n * m4 / (sse * sse) - 3.0,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            count,
            count_zero,
            mean,
            sum,
            variance,
            population_variance,
            standard_deviation,
            population_standard_deviation,
            sse,
            coefficient_of_variation: cv(standard_deviation),
            population_coefficient_of_variation: cv(population_standard_deviation),
            skewness,
            kurtosis,
        }
    }
}

/// Summary of an [`AdvancedAccumulator`](super::AdvancedAccumulator)
///
/// Extends the moment [`Snapshot`] with the sample bounds, the exact greatest
/// common divisor and the empirical probability of every distinct value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvancedSnapshot {
    /// Moment summary
    pub summary: Snapshot,
    /// Smallest observation
    pub minimum: Option<f64>,
    /// Largest observation
    pub maximum: Option<f64>,
    /// Greatest common divisor of the distinct non-zero values, 0 if none
    pub greatest_common_divisor: f64,
    /// `(value, count / total)` in ascending value order
    pub probabilities: Vec<(f64, f64)>,
}

impl AdvancedSnapshot {
    /// Probability that an observation equals `value`
    pub fn probability_of(&self, value: f64) -> f64 {
        self.probabilities
            .binary_search_by(|(k, _)| k.total_cmp(&value))
            .map(|i| self.probabilities[i].1)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let s = Snapshot::from_moments(0, 0, 0.0, 0.0, 0.0, 0.0);
        assert!(s.mean.is_nan());
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.population_variance, 0.0);
        assert_eq!(s.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_empty_snapshots_compare_equal() {
        let a = Snapshot::from_moments(0, 0, 0.0, 0.0, 0.0, 0.0);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Snapshot::from_moments(1, 0, 0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_single_observation_has_no_spread() {
        let s = Snapshot::from_moments(1, 0, 7.0, 0.0, 0.0, 0.0);
        assert_eq!(s.mean, 7.0);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.population_variance, 0.0);
        assert_eq!(s.standard_deviation, 0.0);
    }

    #[test]
    fn test_negative_residue_is_clamped() {
        let s = Snapshot::from_moments(3, 0, 3.0, -1e-17, 0.0, 0.0);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.standard_deviation, 0.0);
        assert!(!s.population_standard_deviation.is_nan());
    }

    #[test]
    fn test_coefficient_of_variation() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, SSE 32
        let s = Snapshot::from_moments(8, 0, 40.0, 32.0, 0.0, 0.0);
        assert!((s.population_standard_deviation - 2.0).abs() < 1e-12);
        assert!((s.population_coefficient_of_variation - 0.4).abs() < 1e-12);
        assert!((s.variance - 32.0 / 7.0).abs() < 1e-12);

        // non-positive mean gives 0
        let s = Snapshot::from_moments(2, 0, -4.0, 8.0, 0.0, 0.0);
        assert_eq!(s.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_probability_of() {
        let snap = AdvancedSnapshot {
            summary: Snapshot::from_moments(4, 0, 10.0, 5.0, 0.0, 0.0),
            minimum: Some(1.0),
            maximum: Some(4.0),
            greatest_common_divisor: 1.0,
            probabilities: vec![(1.0, 0.25), (2.0, 0.25), (3.0, 0.25), (4.0, 0.25)],
        };
        assert_eq!(snap.probability_of(3.0), 0.25);
        assert_eq!(snap.probability_of(3.5), 0.0);
    }
}
