//! Core traits and errors for incremental accumulators
//!
//! Every accumulator implements [`Accumulator`], a mutable engine that can
//! grow, shrink, merge and rescale its sample. Value semantics are layered on
//! top through the provided `with_*` methods, which clone, mutate and return.

use core::fmt::Debug;

#[cfg(feature = "std")]
use std::string::String;

#[cfg(not(feature = "std"))]
use alloc::string::String;

use thiserror::Error;

/// Error raised by an accumulator or distribution operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// The operation needs at least one observation
    #[error("cannot {operation} on an empty accumulator")]
    EmptyAccumulator {
        /// Name of the rejected operation
        operation: &'static str,
    },
    /// More observations were removed than are held
    #[error("cannot remove {requested} observation(s) of {value}: only {available} held")]
    CountUnderflow {
        value: f64,
        requested: u64,
        available: u64,
    },
    /// Adding the batch would overflow the observation count
    #[error("cannot add {requested} observation(s): {held} already held")]
    CountOverflow { held: u64, requested: u64 },
    /// A batch count below 1 was supplied
    #[error("count must be at least 1, got {count}")]
    InvalidCount { count: u64 },
    /// Input claimed to be sorted ascending is not
    #[error("keys are not in ascending order at index {index}")]
    SortOrder { index: usize },
    /// Probability density does not sum to 1
    #[error("probability mass {total} is not within {tolerance} of 1")]
    ProbabilityMass { total: f64, tolerance: f64 },
    /// Argument outside the operation's domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StatsError {
    pub(crate) fn invalid(msg: &str) -> Self {
        StatsError::InvalidArgument(String::from(msg))
    }
}

/// Reject NaN and infinities before they reach any running sum
pub(crate) fn check_finite(value: f64, what: &str) -> Result<(), StatsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StatsError::InvalidArgument(fmt!(
            "{} must be finite, got {}",
            what,
            value
        )))
    }
}

pub(crate) fn check_count(count: u64) -> Result<(), StatsError> {
    if count < 1 {
        Err(StatsError::InvalidCount { count })
    } else {
        Ok(())
    }
}

/// `held + requested`, or [`StatsError::CountOverflow`] if it does not fit
pub(crate) fn checked_total(held: u64, requested: u64) -> Result<u64, StatsError> {
    held.checked_add(requested)
        .ok_or(StatsError::CountOverflow { held, requested })
}

/// Core trait for incrementally maintained samples
///
/// Implementations keep enough state to answer [`snapshot`](Accumulator::snapshot)
/// without revisiting the observations, and support exact removal of
/// previously added batches.
pub trait Accumulator: Clone + Debug {
    /// Derived, immutable summary of the sample
    type Snapshot;

    /// Add `count` observations of `value`
    fn add(&mut self, value: f64, count: u64) -> Result<(), StatsError>;

    /// Remove `count` previously added observations of `value`
    fn remove(&mut self, value: f64, count: u64) -> Result<(), StatsError>;

    /// Merge another accumulator's sample into this one
    fn merge(&mut self, other: &Self) -> Result<(), StatsError>;

    /// Multiply every observation by `multiplier`
    ///
    /// A multiplier of zero is rejected since it would collapse the sample.
    fn scale(&mut self, multiplier: f64) -> Result<(), StatsError>;

    /// Reset to the empty state
    fn clear(&mut self);

    /// Compute the current summary
    fn snapshot(&self) -> Self::Snapshot;

    /// Number of observations held
    fn count(&self) -> u64;

    /// Check if no observations are held
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Copy of this accumulator with `count` observations of `value` added
    fn with_added(&self, value: f64, count: u64) -> Result<Self, StatsError> {
        let mut next = self.clone();
        next.add(value, count)?;
        Ok(next)
    }

    /// Copy of this accumulator with `count` observations of `value` removed
    fn with_removed(&self, value: f64, count: u64) -> Result<Self, StatsError> {
        let mut next = self.clone();
        next.remove(value, count)?;
        Ok(next)
    }

    /// Copy of this accumulator merged with `other`
    fn combined(&self, other: &Self) -> Result<Self, StatsError> {
        let mut next = self.clone();
        next.merge(other)?;
        Ok(next)
    }

    /// Copy of this accumulator with every observation multiplied
    fn scaled(&self, multiplier: f64) -> Result<Self, StatsError> {
        let mut next = self.clone();
        next.scale(multiplier)?;
        Ok(next)
    }
}
