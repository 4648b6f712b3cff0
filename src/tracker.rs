//! Mutable tracker surface for front ends
//!
//! A [`Tracker`] owns an accumulator and exposes the small surface a CLI or
//! REPL needs: add, remove, take a snapshot. Failures are wrapped in a single
//! [`TrackerError`] that records which operation failed and with what input,
//! keeping the underlying [`StatsError`] as its source.

use crate::statistics::{AdvancedAccumulator, MomentAccumulator};
use crate::traits::{Accumulator, StatsError};
use core::fmt;
use thiserror::Error;

/// Tracker operation that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
    Combine,
    Multiply,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Combine => "combine",
            Operation::Multiply => "multiply",
        };
        f.write_str(name)
    }
}

/// Input of a failed tracker operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// `count` observations of `value`
    Observation { value: f64, count: u64 },
    /// Scale factor
    Multiplier(f64),
    /// Another tracker holding `count` observations
    Tracker { count: u64 },
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Observation { value, count } => write!(f, "value {} x{}", value, count),
            Input::Multiplier(m) => write!(f, "multiplier {}", m),
            Input::Tracker { count } => write!(f, "tracker with {} observation(s)", count),
        }
    }
}

/// A tracker operation failed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} failed for {input}")]
pub struct TrackerError {
    pub operation: Operation,
    pub input: Input,
    #[source]
    pub source: StatsError,
}

/// Exclusively owned, mutable accumulator with contextual errors
///
/// No internal locking: share across threads behind a `Mutex` if needed.
///
/// # Example
///
/// ```
/// use flowmoments::tracker::AdvancedTracker;
///
/// let mut tracker = AdvancedTracker::new();
/// tracker.add(2.0, 3).unwrap();
/// tracker.add(4.0, 1).unwrap();
///
/// let err = tracker.remove(4.0, 2).unwrap_err();
/// assert_eq!(err.to_string(), "remove failed for value 4 x2");
///
/// let snap = tracker.take_snapshot();
/// assert_eq!(snap.summary.count, 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tracker<A: Accumulator> {
    inner: A,
}

/// Tracker over moments only
pub type MomentTracker = Tracker<MomentAccumulator>;

/// Tracker over moments, frequencies and GCD
pub type AdvancedTracker = Tracker<AdvancedAccumulator>;

impl<A: Accumulator + Default> Tracker<A> {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            inner: A::default(),
        }
    }
}

impl<A: Accumulator> Tracker<A> {
    /// Wrap an existing accumulator
    pub fn from_accumulator(inner: A) -> Self {
        Self { inner }
    }

    /// Borrow the underlying accumulator
    pub fn accumulator(&self) -> &A {
        &self.inner
    }

    /// Unwrap into the underlying accumulator
    pub fn into_inner(self) -> A {
        self.inner
    }

    /// Check if no observations are held
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of observations held
    pub fn count(&self) -> u64 {
        self.inner.count()
    }

    /// Add `count` observations of `value`
    pub fn add(&mut self, value: f64, count: u64) -> Result<(), TrackerError> {
        self.inner
            .add(value, count)
            .map_err(|source| TrackerError {
                operation: Operation::Add,
                input: Input::Observation { value, count },
                source,
            })
    }

    /// Remove `count` observations of `value`
    pub fn remove(&mut self, value: f64, count: u64) -> Result<(), TrackerError> {
        self.inner
            .remove(value, count)
            .map_err(|source| TrackerError {
                operation: Operation::Remove,
                input: Input::Observation { value, count },
                source,
            })
    }

    /// Merge another tracker's sample into this one
    pub fn combine(&mut self, other: &Self) -> Result<(), TrackerError> {
        self.inner.merge(&other.inner).map_err(|source| TrackerError {
            operation: Operation::Combine,
            input: Input::Tracker {
                count: other.count(),
            },
            source,
        })
    }

    /// Multiply every observation by `multiplier`
    pub fn multiply(&mut self, multiplier: f64) -> Result<(), TrackerError> {
        self.inner.scale(multiplier).map_err(|source| TrackerError {
            operation: Operation::Multiply,
            input: Input::Multiplier(multiplier),
            source,
        })
    }

    /// Current summary
    pub fn take_snapshot(&self) -> A::Snapshot {
        self.inner.snapshot()
    }

    /// Drop every observation
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
