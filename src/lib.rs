//! # Flowmoments
//!
//! Incremental statistics for samples that change one batch at a time.
//!
//! Flowmoments keeps descriptive statistics of a numeric sample up to date as
//! values are added *and removed*, without ever rescanning the sample. It is
//! meant for streaming and time-series aggregation where recomputing on every
//! mutation is too costly.
//!
//! ## Features
//!
//! - **Moments**: count, sum, mean, variance, standard deviation, skewness and
//!   kurtosis via Welford's algorithm and its exact inverse for removal
//! - **Frequencies**: exact histogram of the sample with min/max
//! - **Greatest Common Divisor**: exact GCD of the distinct values, maintained
//!   incrementally through decimal-scale tracking
//! - **Empirical Distributions**: CDF and point probability lookups
//! - **Mergeability**: accumulators combine with the parallel-moments formulas
//!
//! ## Quick Start
//!
//! ```rust
//! use flowmoments::prelude::*;
//!
//! let mut acc = MomentAccumulator::new();
//! for v in [1.0, 2.0, 3.0] {
//!     acc.add(v, 1).unwrap();
//! }
//! acc.add(5.0, 4).unwrap();
//! acc.remove(1.0, 1).unwrap();
//!
//! let snap = acc.snapshot();
//! println!("mean = {}, stddev = {}", snap.mean, snap.standard_deviation);
//! ```
//!
//! ## Value Semantics
//!
//! Every accumulator is a mutable engine. The [`Accumulator`](traits::Accumulator)
//! trait layers a functional surface on top that returns fresh copies:
//!
//! ```rust
//! use flowmoments::statistics::MomentAccumulator;
//! use flowmoments::traits::Accumulator;
//!
//! let empty = MomentAccumulator::new();
//! let one = empty.with_added(4.0, 1).unwrap();
//! let two = one.with_added(6.0, 1).unwrap();
//!
//! assert!(empty.is_empty());
//! assert_eq!(one.count(), 1);
//! assert_eq!(two.snapshot().mean, 5.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support; without it the crate is
//!   `no_std` + `alloc` and float math uses `libm`
//! - `serde` (default): Serialization of snapshots, state records and
//!   accumulators

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Helper macro for format! in both std and no_std
macro_rules! fmt {
    ($($arg:tt)*) => {{
        #[cfg(feature = "std")]
        { format!($($arg)*) }
        #[cfg(not(feature = "std"))]
        { alloc::format!($($arg)*) }
    }};
}

// Core traits always available
pub mod traits;

pub mod distribution;
pub mod frequency;
pub mod statistics;
pub mod tracker;

mod math;

pub mod prelude {
    pub use crate::traits::*;

    pub use crate::distribution::EmpiricalDistribution;
    pub use crate::frequency::{FrequencyHistogram, GcdTracker};
    pub use crate::statistics::{AdvancedAccumulator, AdvancedSnapshot, MomentAccumulator, Snapshot};
    pub use crate::tracker::{AdvancedTracker, MomentTracker, Tracker, TrackerError};
}

pub use distribution::EmpiricalDistribution;
pub use statistics::{AdvancedAccumulator, MomentAccumulator};
pub use traits::{Accumulator, StatsError};
