//! Moments plus exact frequencies, bounds and greatest common divisor
//!
//! Combines a [`MomentAccumulator`], a [`FrequencyHistogram`] and a
//! [`GcdTracker`], updating all three together on every add and remove.

use crate::distribution::EmpiricalDistribution;
use crate::frequency::{decimal_places, FrequencyHistogram, GcdParts, GcdTracker};
use crate::statistics::{AdvancedSnapshot, MomentAccumulator, MomentState};
use crate::traits::{check_count, check_finite, checked_total, Accumulator, StatsError};

#[cfg(feature = "std")]
use std::{collections::BTreeMap, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};

/// Raw state of an [`AdvancedAccumulator`]
///
/// Holds the moment state, the histogram and the GCD bookkeeping, so that a
/// restored accumulator reports exactly the same snapshot without replaying
/// any history.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvancedState {
    pub moments: MomentState,
    pub integer_multiplier: u64,
    pub gcd: Option<u128>,
    /// `(value, count)` in ascending value order
    pub frequencies: Vec<(f64, u64)>,
    /// `(scale, distinct values)` in ascending scale order
    pub scale_references: Vec<(u64, u64)>,
}

/// Accumulator tracking moments, frequencies and the exact GCD of a sample
///
/// Add and remove cost O(log d) for d distinct values, except when a removal
/// takes away the last value with the largest decimal scale, which triggers an
/// O(d) GCD rebuild. [`merge`](Accumulator::merge) and
/// [`scale`](Accumulator::scale) replay the histogram through fresh adds,
/// since GCD state cannot be combined algebraically.
///
/// # Example
///
/// ```
/// use flowmoments::statistics::AdvancedAccumulator;
/// use flowmoments::traits::Accumulator;
///
/// let mut acc = AdvancedAccumulator::new();
/// for v in [0.05, 0.2, 2.0, 20.0, 400.0, 8000.0] {
///     acc.add(v, 1).unwrap();
/// }
/// assert_eq!(acc.scaled_gcd(), Some(5));
/// assert_eq!(acc.integer_multiplier(), 100);
///
/// acc.remove(0.05, 1).unwrap();
/// assert_eq!(acc.scaled_gcd(), Some(2));
/// assert_eq!(acc.integer_multiplier(), 10);
///
/// let snap = acc.snapshot();
/// assert_eq!(snap.minimum, Some(0.2));
/// assert_eq!(snap.maximum, Some(8000.0));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "AdvancedState", into = "AdvancedState")
)]
pub struct AdvancedAccumulator {
    moments: MomentAccumulator,
    histogram: FrequencyHistogram,
    gcd: GcdTracker,
}

impl AdvancedAccumulator {
    /// Create a new empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Moment bookkeeping
    pub fn moments(&self) -> &MomentAccumulator {
        &self.moments
    }

    /// Frequencies of every distinct value
    pub fn histogram(&self) -> &FrequencyHistogram {
        &self.histogram
    }

    /// GCD bookkeeping
    pub fn gcd_tracker(&self) -> &GcdTracker {
        &self.gcd
    }

    /// Power-of-ten multiplier used to lift values to integers
    pub fn integer_multiplier(&self) -> u64 {
        self.gcd.integer_multiplier()
    }

    /// GCD of the distinct values scaled by [`integer_multiplier`](Self::integer_multiplier)
    pub fn scaled_gcd(&self) -> Option<u128> {
        self.gcd.scaled_gcd()
    }

    /// Empirical distribution of the current sample
    pub fn distribution(&self) -> Result<EmpiricalDistribution, StatsError> {
        EmpiricalDistribution::from_histogram(&self.histogram)
    }

    /// Raw state for persistence
    pub fn state(&self) -> AdvancedState {
        let GcdParts {
            integer_multiplier,
            gcd,
            scale_references,
        } = self.gcd.parts();

        AdvancedState {
            moments: self.moments.state(),
            integer_multiplier,
            gcd,
            frequencies: self.histogram.iter().collect(),
            scale_references,
        }
    }

    /// Rebuild from persisted state, rejecting inconsistent records
    pub fn from_state(state: AdvancedState) -> Result<Self, StatsError> {
        let moments = MomentAccumulator::from_state(state.moments)?;

        let mut histogram = FrequencyHistogram::new();
        let mut expected_refs: BTreeMap<u64, u64> = BTreeMap::new();
        let mut prev: Option<f64> = None;
        for (index, &(value, count)) in state.frequencies.iter().enumerate() {
            if prev.is_some_and(|p| p >= value) {
                return Err(StatsError::SortOrder { index });
            }
            prev = Some(value);
            histogram.add(value, count)?;
            if value != 0.0 {
                *expected_refs.entry(10u64.pow(decimal_places(value))).or_insert(0) += 1;
            }
        }

        if histogram.total() != moments.count() {
            return Err(StatsError::invalid(
                "frequency counts do not add up to the moment count",
            ));
        }
        if histogram.get(0.0) != moments.count_zero() {
            return Err(StatsError::invalid(
                "zero frequency does not match the zero count",
            ));
        }

        let refs: Vec<(u64, u64)> = expected_refs.into_iter().collect();
        if refs != state.scale_references {
            return Err(StatsError::invalid(
                "scale references do not match the frequencies",
            ));
        }

        let gcd = GcdTracker::from_parts(GcdParts {
            integer_multiplier: state.integer_multiplier,
            gcd: state.gcd,
            scale_references: state.scale_references,
        })?;
        gcd.verify(&histogram)?;

        Ok(Self {
            moments,
            histogram,
            gcd,
        })
    }

    /// Fresh accumulator holding `entries` added in order
    fn replay<I>(entries: I) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = (f64, u64)>,
    {
        let mut next = Self::new();
        for (value, count) in entries {
            next.add(value, count)?;
        }
        Ok(next)
    }
}

impl Accumulator for AdvancedAccumulator {
    type Snapshot = AdvancedSnapshot;

    fn add(&mut self, value: f64, count: u64) -> Result<(), StatsError> {
        check_count(count)?;
        check_finite(value, "value")?;
        checked_total(self.count(), count)?;

        let value = value + 0.0;
        self.moments.add(value, count)?;
        if self.histogram.add(value, count)? {
            self.gcd.insert(value);
        }
        Ok(())
    }

    fn remove(&mut self, value: f64, count: u64) -> Result<(), StatsError> {
        check_count(count)?;
        check_finite(value, "value")?;

        if self.histogram.is_empty() {
            return Err(StatsError::EmptyAccumulator {
                operation: "remove",
            });
        }
        let available = self.histogram.get(value);
        if count > available {
            return Err(StatsError::CountUnderflow {
                value,
                requested: count,
                available,
            });
        }

        let value = value + 0.0;
        self.moments.remove(value, count)?;
        let gone = self.histogram.remove(value, count)?;

        if self.histogram.is_empty() {
            tracing::debug!(value, count, "advanced_accumulator_emptied");
            self.clear();
        } else if gone {
            self.gcd.evict(value, &self.histogram);
        }
        Ok(())
    }

    fn merge(&mut self, other: &Self) -> Result<(), StatsError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other.clone();
            return Ok(());
        }

        checked_total(self.count(), other.count())?;
        let mut union = self.histogram.clone();
        for (value, count) in other.histogram.iter() {
            union.add(value, count)?;
        }
        tracing::trace!(distinct_values = union.len(), "advanced_merge_replay");

        *self = Self::replay(union.iter())?;
        Ok(())
    }

    fn scale(&mut self, multiplier: f64) -> Result<(), StatsError> {
        check_finite(multiplier, "multiplier")?;
        if multiplier == 0.0 {
            return Err(StatsError::invalid("cannot scale a sample by zero"));
        }

        tracing::trace!(
            distinct_values = self.histogram.len(),
            multiplier,
            "advanced_scale_replay"
        );
        let next = Self::replay(self.histogram.iter().map(|(v, c)| (v * multiplier, c)))?;
        *self = next;
        Ok(())
    }

    fn clear(&mut self) {
        self.moments.clear();
        self.histogram.clear();
        self.gcd.clear();
    }

    fn snapshot(&self) -> AdvancedSnapshot {
        AdvancedSnapshot {
            summary: self.moments.snapshot(),
            minimum: self.histogram.first(),
            maximum: self.histogram.last(),
            greatest_common_divisor: self.gcd.greatest_common_divisor(),
            probabilities: self.histogram.probabilities(),
        }
    }

    fn count(&self) -> u64 {
        self.moments.count()
    }
}

impl From<AdvancedAccumulator> for AdvancedState {
    fn from(acc: AdvancedAccumulator) -> Self {
        acc.state()
    }
}

impl TryFrom<AdvancedState> for AdvancedAccumulator {
    type Error = StatsError;

    fn try_from(state: AdvancedState) -> Result<Self, Self::Error> {
        Self::from_state(state)
    }
}
