//! Exact frequency tracking
//!
//! This module provides structures that keep every distinct observed value,
//! as opposed to the moment accumulators which only keep running sums.
//!
//! # Structures
//!
//! - [`FrequencyHistogram`]: value -> count multiset in ascending order
//! - [`GcdTracker`]: greatest common divisor of the distinct values
//!
//! # Example
//!
//! ```
//! use flowmoments::frequency::FrequencyHistogram;
//!
//! let mut hist = FrequencyHistogram::new();
//!
//! hist.add(2.5, 3).unwrap();
//! hist.add(1.0, 1).unwrap();
//!
//! assert_eq!(hist.first(), Some(1.0));
//! assert_eq!(hist.total(), 4);
//! ```

mod gcd;
mod histogram;

pub(crate) use gcd::GcdParts;
pub use gcd::{decimal_places, GcdTracker, MAX_GCD_DECIMAL_PLACES};
pub use histogram::FrequencyHistogram;
