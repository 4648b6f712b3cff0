//! Empirical distributions
//!
//! This module turns observed frequencies into lookup structures for
//! cumulative and point probabilities.
//!
//! # Structures
//!
//! - [`EmpiricalDistribution`]: CDF/PDF over the distinct observed values
//!
//! # Example
//!
//! ```
//! use flowmoments::distribution::EmpiricalDistribution;
//! use flowmoments::statistics::AdvancedAccumulator;
//! use flowmoments::traits::Accumulator;
//!
//! let mut acc = AdvancedAccumulator::new();
//! acc.add(1.0, 1).unwrap();
//! acc.add(3.0, 1).unwrap();
//! acc.add(20.0, 3).unwrap();
//!
//! let dist = EmpiricalDistribution::from_snapshot(&acc.snapshot()).unwrap();
//! println!("P(X <= 15) = {}", dist.pr_less_than_or_equal(15.0));
//! ```

mod empirical;

pub use empirical::{EmpiricalDistribution, PROBABILITY_TOLERANCE};
