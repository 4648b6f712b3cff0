//! Statistical summaries of samples that grow and shrink
//!
//! This module provides accumulators that maintain moments of a sample under
//! both insertion and removal, in a single pass with constant work per update.
//!
//! # Accumulators
//!
//! - [`MomentAccumulator`]: count, sum, mean, variance, skewness, kurtosis
//! - [`AdvancedAccumulator`]: moments plus a frequency histogram, bounds and
//!   the exact greatest common divisor of the sample
//!
//! # Example
//!
//! ```
//! use flowmoments::statistics::MomentAccumulator;
//! use flowmoments::traits::Accumulator;
//!
//! let mut stats = MomentAccumulator::new();
//!
//! for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
//!     stats.add(value, 1).unwrap();
//! }
//! stats.remove(5.0, 1).unwrap();
//!
//! let snap = stats.snapshot();
//! println!("Mean: {}", snap.mean);
//! println!("Stddev: {}", snap.standard_deviation);
//! ```

mod advanced;
mod moments;
mod snapshot;

pub use advanced::{AdvancedAccumulator, AdvancedState};
pub use moments::{MomentAccumulator, MomentState};
pub use snapshot::{AdvancedSnapshot, Snapshot};
