use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::core::types::Track;
use crate::query::rule::Rule;
use crate::search::pipeline::Sorting;

/// Evaluation cache for avoiding recomputation.
///
/// Every entry is tagged with the library version it was computed at; a
/// lookup at another version is a miss and drops the stale entry.
pub struct QueryCache {
    cache: Mutex<LruCache<QueryKey, CachedResult>>,
    size_limit: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub rule: String,  // Canonical JSON of the rule tree
    pub sorting: Option<Sorting>,
    pub limit: Option<usize>,
}

impl QueryKey {
    /// `None` when the result is not reproducible from the library alone
    /// (relative dates, random order) or when the JSON text would not tell
    /// operands apart (NaN and both infinities all serialize as `null`).
    pub fn for_query(rule: &Rule, sorting: Option<&Sorting>, limit: Option<usize>) -> Option<Self> {
        if rule.has_relative_dates()
            || rule.has_non_finite_operands()
            || sorting.is_some_and(Sorting::is_random)
        {
            return None;
        }
        let rule = serde_json::to_string(rule).ok()?;
        Some(QueryKey { rule, sorting: sorting.copied(), limit })
    }
}

struct CachedResult {
    version: u64,
    tracks: Vec<Arc<Track>>,
}

impl QueryCache {
    /// `None` for a zero capacity, which disables caching
    pub fn new(size_limit: usize) -> Option<Self> {
        let cap = NonZeroUsize::new(size_limit)?;
        Some(QueryCache {
            cache: Mutex::new(LruCache::new(cap)),
            size_limit,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        })
    }

    pub fn get(&self, key: &QueryKey, version: u64) -> Option<Vec<Arc<Track>>> {
        let mut cache = self.cache.lock();
        let hit = cache
            .get(key)
            .filter(|entry| entry.version == version)
            .map(|entry| entry.tracks.clone());

        if hit.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            cache.pop(key);  // Stale or absent
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn put(&self, key: QueryKey, version: u64, tracks: Vec<Arc<Track>>) {
        self.cache.lock().put(key, CachedResult { version, tracks });
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
            capacity: self.size_limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Field;
    use crate::query::rule::{NumericMetadataRule, PlayStatisticsRule, StringMetadataRule};
    use crate::query::types::{DateOperand, Operator, TimeUnit};
    use crate::search::pipeline::SortField;

    fn rule() -> Rule {
        StringMetadataRule::new(Field::Artist, Operator::Contains, "que", false).unwrap().into()
    }

    #[test]
    fn entries_expire_with_version() {
        let cache = QueryCache::new(4).unwrap();
        let key = QueryKey::for_query(&rule(), None, None).unwrap();
        let tracks = vec![Arc::new(Track::new(1))];

        assert!(cache.get(&key, 0).is_none());
        cache.put(key.clone(), 0, tracks.clone());
        assert_eq!(cache.get(&key, 0), Some(tracks));
        assert!(cache.get(&key, 1).is_none());
        // Stale entry was dropped
        assert!(cache.get(&key, 0).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 3);
        assert_eq!(stats.size, 0);
        assert!((stats.hit_rate() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn keys_distinguish_sorting_and_limit() {
        let plain = QueryKey::for_query(&rule(), None, None).unwrap();
        let sorted = QueryKey::for_query(&rule(), Some(&Sorting::ascending(SortField::Title)), None).unwrap();
        let limited = QueryKey::for_query(&rule(), None, Some(3)).unwrap();
        assert_ne!(plain, sorted);
        assert_ne!(plain, limited);
    }

    #[test]
    fn clock_or_rng_dependent_queries_are_not_cached() {
        let relative: Rule = PlayStatisticsRule::last_played(Operator::GreaterThan, DateOperand::ago(3, TimeUnit::Days))
            .unwrap()
            .into();
        assert!(QueryKey::for_query(&relative, None, None).is_none());
        assert!(QueryKey::for_query(&rule(), Some(&Sorting::random()), None).is_none());
        assert!(QueryCache::new(0).is_none());
    }

    #[test]
    fn non_finite_operands_are_not_cached() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let leaf: Rule = NumericMetadataRule::new(Field::Bpm, Operator::LessThan, value).unwrap().into();
            assert!(QueryKey::for_query(&leaf, None, None).is_none());
            let nested = Rule::and(vec![rule(), leaf]);
            assert!(QueryKey::for_query(&nested, None, None).is_none());
        }
        let finite: Rule = NumericMetadataRule::between(Field::Bpm, -0.0, 120.0).unwrap().into();
        assert!(QueryKey::for_query(&finite, None, None).is_some());
    }
}
