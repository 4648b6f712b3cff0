//! Exact frequency histogram over observed values
//!
//! Stores every distinct value with its occurrence count in ascending value
//! order, so the first and last keys are the sample minimum and maximum.

use crate::traits::{check_count, check_finite, checked_total, StatsError};
use core::cmp::Ordering;

#[cfg(feature = "std")]
use std::{collections::BTreeMap, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};

/// Histogram key: a finite `f64` ordered by `total_cmp`
///
/// `-0.0` is folded into `0.0` on construction so both land in one bucket.
#[derive(Clone, Copy, Debug)]
struct Key(f64);

impl Key {
    fn new(value: f64) -> Self {
        Key(value + 0.0)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Exact multiset of observed values
///
/// # Example
///
/// ```
/// use flowmoments::frequency::FrequencyHistogram;
///
/// let mut hist = FrequencyHistogram::new();
/// hist.add(3.0, 2).unwrap();
/// hist.add(1.0, 1).unwrap();
/// hist.remove(3.0, 1).unwrap();
///
/// assert_eq!(hist.first(), Some(1.0));
/// assert_eq!(hist.last(), Some(3.0));
/// assert_eq!(hist.get(3.0), 1);
/// assert_eq!(hist.total(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyHistogram {
    /// Value -> occurrence count, never zero
    counts: BTreeMap<Key, u64>,
    /// Sum of all counts
    total: u64,
}

impl FrequencyHistogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` more occurrences of `value`
    ///
    /// Returns `true` if `value` was not present before.
    pub fn add(&mut self, value: f64, count: u64) -> Result<bool, StatsError> {
        check_count(count)?;
        check_finite(value, "value")?;

        // every slot is bounded by the total
        let total = checked_total(self.total, count)?;
        let slot = self.counts.entry(Key::new(value)).or_insert(0);
        let inserted = *slot == 0;
        *slot += count;
        self.total = total;
        Ok(inserted)
    }

    /// Drop `count` occurrences of `value`
    ///
    /// Returns `true` if the last occurrence was removed and the value is
    /// no longer present.
    pub fn remove(&mut self, value: f64, count: u64) -> Result<bool, StatsError> {
        check_count(count)?;
        check_finite(value, "value")?;

        let key = Key::new(value);
        let available = self.counts.get(&key).copied().unwrap_or(0);
        if count > available {
            return Err(StatsError::CountUnderflow {
                value,
                requested: count,
                available,
            });
        }

        self.total -= count;
        if count == available {
            self.counts.remove(&key);
            Ok(true)
        } else {
            self.counts.insert(key, available - count);
            Ok(false)
        }
    }

    /// Occurrences of `value`, 0 if absent
    pub fn get(&self, value: f64) -> u64 {
        self.counts.get(&Key::new(value)).copied().unwrap_or(0)
    }

    /// Check if `value` has been observed
    pub fn contains(&self, value: f64) -> bool {
        self.counts.contains_key(&Key::new(value))
    }

    /// Smallest observed value
    pub fn first(&self) -> Option<f64> {
        self.counts.keys().next().map(|k| k.0)
    }

    /// Largest observed value
    pub fn last(&self) -> Option<f64> {
        self.counts.keys().next_back().map(|k| k.0)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no values are held
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of occurrences across all values
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Iterate `(value, count)` pairs in ascending value order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (f64, u64)> + '_ {
        self.counts.iter().map(|(k, &c)| (k.0, c))
    }

    /// Iterate distinct values in ascending order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = f64> + '_ {
        self.counts.keys().map(|k| k.0)
    }

    /// `(value, count / total)` in ascending value order
    pub fn probabilities(&self) -> Vec<(f64, f64)> {
        let total = self.total as f64;
        self.iter().map(|(v, c)| (v, c as f64 / total)).collect()
    }

    /// Remove every value
    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}
