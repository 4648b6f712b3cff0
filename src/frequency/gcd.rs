//! Incremental greatest common divisor of a sample
//!
//! Values are lifted to integers by multiplying with `10^d`, where `d` is the
//! largest number of decimal places (capped at [`MAX_GCD_DECIMAL_PLACES`])
//! among the distinct values currently held. The GCD of those integers is
//! folded in as each new distinct value arrives.
//!
//! Removal is cheap unless it takes away the last value carrying the largest
//! decimal scale. Only then does the multiplier shrink, and the GCD is rebuilt
//! from the remaining distinct values.

use crate::frequency::FrequencyHistogram;
use crate::math;
use crate::traits::StatsError;
use core::fmt::{self, Write};

#[cfg(feature = "std")]
use std::{collections::BTreeMap, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};

/// Decimal places considered when scaling values to integers
///
/// Digits beyond this are rounded away for GCD purposes only; moments always
/// use the exact `f64`.
pub const MAX_GCD_DECIMAL_PLACES: u32 = 4;

/// Counts digits after the decimal point of a formatted number
#[derive(Default)]
struct FractionDigits {
    seen_point: bool,
    digits: u32,
}

impl Write for FractionDigits {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if c == '.' {
                self.seen_point = true;
            } else if self.seen_point && c.is_ascii_digit() {
                self.digits += 1;
            }
        }
        Ok(())
    }
}

/// Decimal places of the shortest decimal form of `value`, capped at 4
///
/// ```
/// use flowmoments::frequency::decimal_places;
///
/// assert_eq!(decimal_places(2.0), 0);
/// assert_eq!(decimal_places(0.05), 2);
/// assert_eq!(decimal_places(3.14159), 4);
/// ```
pub fn decimal_places(value: f64) -> u32 {
    let mut counter = FractionDigits::default();
    // `Display` for f64 prints the shortest round-trip form without exponent
    let _ = write!(counter, "{}", value);
    counter.digits.min(MAX_GCD_DECIMAL_PLACES)
}

/// Power-of-ten multiplier that makes `value` integral (up to the cap)
fn scale_of(value: f64) -> u64 {
    10u64.pow(decimal_places(value))
}

/// `|value| * multiplier` rounded to an integer, saturating on overflow
fn to_integer(value: f64, multiplier: u64) -> u128 {
    math::abs(math::round(value * multiplier as f64)) as u128
}

/// Raw state of a [`GcdTracker`]
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GcdParts {
    pub integer_multiplier: u64,
    pub gcd: Option<u128>,
    pub scale_references: Vec<(u64, u64)>,
}

/// Exact GCD of the distinct non-zero values of a sample
///
/// The tracker is driven by the owner of a [`FrequencyHistogram`]: call
/// [`insert`](Self::insert) when a value first appears and
/// [`evict`](Self::evict) after its last occurrence has been removed.
///
/// # Example
///
/// ```
/// use flowmoments::frequency::{FrequencyHistogram, GcdTracker};
///
/// let mut hist = FrequencyHistogram::new();
/// let mut gcd = GcdTracker::new();
///
/// for v in [0.05, 0.2, 2.0] {
///     hist.add(v, 1).unwrap();
///     gcd.insert(v);
/// }
/// assert_eq!(gcd.integer_multiplier(), 100);
/// assert_eq!(gcd.scaled_gcd(), Some(5));
///
/// hist.remove(0.05, 1).unwrap();
/// gcd.evict(0.05, &hist);
/// assert_eq!(gcd.integer_multiplier(), 10);
/// assert_eq!(gcd.scaled_gcd(), Some(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GcdTracker {
    /// `10^d`, d = largest decimal scale among held values
    integer_multiplier: u64,
    /// GCD of held values scaled by `integer_multiplier`
    current: Option<u128>,
    /// Scale -> number of distinct held values with that scale
    scale_refs: BTreeMap<u64, u64>,
}

impl Default for GcdTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GcdTracker {
    /// Create a tracker for an empty sample
    pub fn new() -> Self {
        Self {
            integer_multiplier: 1,
            current: None,
            scale_refs: BTreeMap::new(),
        }
    }

    /// Current power-of-ten multiplier
    pub fn integer_multiplier(&self) -> u64 {
        self.integer_multiplier
    }

    /// GCD of the held values as integers scaled by the multiplier
    pub fn scaled_gcd(&self) -> Option<u128> {
        self.current
    }

    /// GCD in the values' own units, 0 when no non-zero value is held
    pub fn greatest_common_divisor(&self) -> f64 {
        match self.current {
            Some(g) => g as f64 / self.integer_multiplier as f64,
            None => 0.0,
        }
    }

    /// `(scale, distinct values)` pairs in ascending scale order
    pub fn scale_references(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.scale_refs.iter().map(|(&s, &c)| (s, c))
    }

    /// Account for a value that was not present before
    pub fn insert(&mut self, value: f64) {
        if value == 0.0 {
            return;
        }

        let scale = scale_of(value);
        *self.scale_refs.entry(scale).or_insert(0) += 1;

        if scale > self.integer_multiplier {
            let factor = (scale / self.integer_multiplier) as u128;
            self.current = self.current.map(|g| g.saturating_mul(factor));
            self.integer_multiplier = scale;
        }

        self.fold(to_integer(value, self.integer_multiplier));
    }

    /// Account for a value whose last occurrence was just removed
    ///
    /// `remaining` must already exclude `value`.
    pub fn evict(&mut self, value: f64, remaining: &FrequencyHistogram) {
        if value == 0.0 {
            return;
        }

        let scale = scale_of(value);
        let Some(refs) = self.scale_refs.get_mut(&scale) else {
            return;
        };
        *refs -= 1;
        if *refs > 0 {
            return;
        }
        self.scale_refs.remove(&scale);

        if scale == self.integer_multiplier {
            let next = self.scale_refs.keys().next_back().copied().unwrap_or(1);
            tracing::debug!(
                from = self.integer_multiplier,
                to = next,
                distinct_values = remaining.len(),
                "gcd_multiplier_shrunk"
            );
            self.integer_multiplier = next;
            self.recompute(remaining);
        }
    }

    /// Reset to the empty state
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn fold(&mut self, scaled: u128) {
        let g = math::gcd(self.current.unwrap_or(0), scaled);
        self.current = if g == 0 { None } else { Some(g) };
    }

    fn recompute(&mut self, remaining: &FrequencyHistogram) {
        self.current = None;
        for value in remaining.values() {
            if value == 0.0 {
                continue;
            }
            self.fold(to_integer(value, self.integer_multiplier));
            if self.current == Some(1) {
                break;
            }
        }
    }

    pub(crate) fn parts(&self) -> GcdParts {
        GcdParts {
            integer_multiplier: self.integer_multiplier,
            gcd: self.current,
            scale_references: self.scale_references().collect(),
        }
    }

    /// Check that the tracked GCD divides every value of `histogram` once
    /// scaled, and is absent exactly when no value scales to a non-zero integer
    pub(crate) fn verify(&self, histogram: &FrequencyHistogram) -> Result<(), StatsError> {
        let mut any_nonzero = false;
        for value in histogram.values() {
            let scaled = to_integer(value, self.integer_multiplier);
            if scaled == 0 {
                continue;
            }
            any_nonzero = true;
            match self.current {
                Some(g) if scaled % g == 0 => {}
                _ => {
                    return Err(StatsError::invalid(
                        "gcd does not divide every scaled value",
                    ))
                }
            }
        }
        if !any_nonzero && self.current.is_some() {
            return Err(StatsError::invalid("gcd present without a non-zero value"));
        }
        Ok(())
    }

    pub(crate) fn from_parts(parts: GcdParts) -> Result<Self, StatsError> {
        let max_scale = 10u64.pow(MAX_GCD_DECIMAL_PLACES);
        let is_scale = |s: u64| {
            let mut p = 1;
            while p < s && p < max_scale {
                p *= 10;
            }
            p == s
        };

        let mut scale_refs = BTreeMap::new();
        for (scale, refs) in parts.scale_references {
            if !is_scale(scale) || refs == 0 {
                return Err(StatsError::invalid("malformed scale reference"));
            }
            if scale_refs.insert(scale, refs).is_some() {
                return Err(StatsError::invalid("duplicate scale reference"));
            }
        }

        let expected = scale_refs.keys().next_back().copied().unwrap_or(1);
        if parts.integer_multiplier != expected {
            return Err(StatsError::invalid(
                "integer multiplier does not match the largest scale reference",
            ));
        }
        if parts.gcd == Some(0) {
            return Err(StatsError::invalid("gcd must be positive when present"));
        }

        Ok(Self {
            integer_multiplier: parts.integer_multiplier,
            current: parts.gcd,
            scale_refs,
        })
    }
}
