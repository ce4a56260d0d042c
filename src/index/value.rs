use std::cmp::Ordering;
use chrono::{DateTime, Utc};
use crate::core::types::TrackId;

/// Totally ordered wrapper for numeric field values
#[derive(Debug, Clone, Copy)]
pub struct NumericKey(f64);

impl NumericKey {
    /// `None` for NaN, which no range comparison can match
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            // Fold -0.0 into 0.0 so the order agrees with `==`
            Some(NumericKey(value + 0.0))
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl PartialEq for NumericKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumericKey {}

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Sorted `(value, id)` list for one ordered field.
///
/// Entries stay sorted by value; equal values keep insertion order.
/// One entry per track that has the field set.
#[derive(Debug, Clone)]
pub struct ValueIndex<T> {
    entries: Vec<(T, TrackId)>,
}

impl<T: Ord + Copy> ValueIndex<T> {
    pub fn new() -> Self {
        ValueIndex { entries: Vec::new() }
    }

    pub fn add(&mut self, id: TrackId, value: T) {
        let pos = self.entries.partition_point(|(v, _)| *v <= value);
        self.entries.insert(pos, (value, id));
    }

    /// Linear scan by id; removals are rare next to range reads
    pub fn remove(&mut self, id: TrackId) -> Option<T> {
        let pos = self.entries.iter().position(|(_, entry_id)| *entry_id == id)?;
        Some(self.entries.remove(pos).0)
    }

    /// Entries with value above `value` (or equal, when `inclusive`)
    pub fn range_above(&self, value: T, inclusive: bool) -> &[(T, TrackId)] {
        let start = if inclusive {
            self.entries.partition_point(|(v, _)| *v < value)
        } else {
            self.entries.partition_point(|(v, _)| *v <= value)
        };
        &self.entries[start..]
    }

    /// Entries with value below `value` (or equal, when `inclusive`)
    pub fn range_below(&self, value: T, inclusive: bool) -> &[(T, TrackId)] {
        let end = if inclusive {
            self.entries.partition_point(|(v, _)| *v <= value)
        } else {
            self.entries.partition_point(|(v, _)| *v < value)
        };
        &self.entries[..end]
    }

    /// Inclusive on both ends
    pub fn range_between(&self, low: T, high: T) -> &[(T, TrackId)] {
        let start = self.entries.partition_point(|(v, _)| *v < low);
        let end = self.entries.partition_point(|(v, _)| *v <= high);
        if start >= end {
            &[]
        } else {
            &self.entries[start..end]
        }
    }

    pub fn get(&self, id: TrackId) -> Option<T> {
        self.entries
            .iter()
            .find(|(_, entry_id)| *entry_id == id)
            .map(|(v, _)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(T, TrackId)> {
        self.entries.iter()
    }

    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|pair| pair[0].0 <= pair[1].0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Ord + Copy> Default for ValueIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type NumberIndex = ValueIndex<NumericKey>;
pub type DateIndex = ValueIndex<DateTime<Utc>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: f64) -> NumericKey {
        NumericKey::new(v).unwrap()
    }

    fn ids<T>(slice: &[(T, TrackId)]) -> Vec<u64> {
        slice.iter().map(|(_, id)| id.0).collect()
    }

    fn sample() -> NumberIndex {
        let mut index = NumberIndex::new();
        index.add(TrackId(1), key(5.0));
        index.add(TrackId(2), key(0.0));
        index.add(TrackId(3), key(10.0));
        index.add(TrackId(4), key(5.0));
        index
    }

    #[test]
    fn stays_sorted_with_stable_ties() {
        let index = sample();
        assert!(index.is_sorted());
        assert_eq!(ids(index.range_above(key(f64::MIN), true)), vec![2, 1, 4, 3]);
    }

    #[test]
    fn boundary_lookups() {
        let index = sample();
        assert_eq!(ids(index.range_above(key(5.0), false)), vec![3]);
        assert_eq!(ids(index.range_above(key(5.0), true)), vec![1, 4, 3]);
        assert_eq!(ids(index.range_below(key(5.0), false)), vec![2]);
        assert_eq!(ids(index.range_below(key(5.0), true)), vec![2, 1, 4]);
        assert_eq!(ids(index.range_between(key(1.0), key(10.0))), vec![1, 4, 3]);
        assert!(index.range_between(key(11.0), key(1.0)).is_empty());
    }

    #[test]
    fn remove_by_id() {
        let mut index = sample();
        assert_eq!(index.remove(TrackId(1)).map(|k| k.get()), Some(5.0));
        assert_eq!(index.remove(TrackId(1)), None);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(TrackId(4)).map(|k| k.get()), Some(5.0));
    }

    #[test]
    fn negative_zero_orders_as_zero() {
        let mut index = NumberIndex::new();
        index.add(TrackId(1), key(-0.0));
        assert_eq!(ids(index.range_above(key(0.0), true)), vec![1]);
        assert!(NumericKey::new(f64::NAN).is_none());
    }
}
