use std::sync::Arc;
use log::{debug, trace};
use rayon::prelude::*;
use crate::core::config::EngineConfig;
use crate::core::types::{Track, TrackId};
use crate::index::value::{NumericKey, ValueIndex};
use crate::query::matcher::RuleMatcher;
use crate::query::planner::{Bounds, Plan, QueryPlanner, ValueRange};
use crate::query::rule::Rule;
use crate::search::pipeline::{self, Sorting};
use crate::store::library::Library;

/// Runs rules against a library snapshot. Stateless between calls.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    planner: QueryPlanner,
    parallel_scan_threshold: usize,
}

impl QueryExecutor {
    pub fn new(config: &EngineConfig) -> Self {
        QueryExecutor {
            planner: QueryPlanner::new(config.value_index_ranges),
            parallel_scan_threshold: config.parallel_scan_threshold,
        }
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    /// Select, order and bound
    pub fn execute(
        &self,
        library: &Library,
        rule: &Rule,
        sorting: Option<&Sorting>,
        limit: Option<usize>,
        matcher: &RuleMatcher,
    ) -> Vec<Arc<Track>> {
        let selected = self.select(library, rule, matcher);
        pipeline::finish(selected, sorting, limit)
    }

    /// Every matching track, in store order
    pub fn select(&self, library: &Library, rule: &Rule, matcher: &RuleMatcher) -> Vec<Arc<Track>> {
        let plan = self.planner.plan(rule, matcher.clock());
        debug!("plan {:?} over {} tracks", plan, library.len());

        match plan {
            Plan::TextSeek { field, query, mode } => match library.indexes().text(field) {
                Some(index) => in_store_order(library, index.search(&query, mode).iter().map(TrackId)),
                None => self.scan(library, rule, matcher),
            },
            Plan::ValueRange { field, range } => {
                let ids = match range {
                    ValueRange::Number(bounds) => {
                        library.indexes().numbers(field).map(|index| number_range(index, &bounds))
                    }
                    ValueRange::Date(bounds) => library.indexes().dates(field).map(|index| value_range(index, &bounds)),
                };
                match ids {
                    Some(ids) => in_store_order(library, ids),
                    None => self.scan(library, rule, matcher),
                }
            }
            Plan::Scan => self.scan(library, rule, matcher),
        }
    }

    fn scan(&self, library: &Library, rule: &Rule, matcher: &RuleMatcher) -> Vec<Arc<Track>> {
        let store = library.store();
        if store.len() >= self.parallel_scan_threshold {
            trace!("parallel scan of {} tracks", store.len());
            // Indexed collect keeps store order
            let tracks: Vec<&Arc<Track>> = store.iter().collect();
            tracks
                .par_iter()
                .filter(|track| matcher.matches(rule, track))
                .map(|track| Arc::clone(*track))
                .collect()
        } else {
            store
                .iter()
                .filter(|track| matcher.matches(rule, track))
                .cloned()
                .collect()
        }
    }
}

fn in_store_order(library: &Library, ids: impl IntoIterator<Item = TrackId>) -> Vec<Arc<Track>> {
    let store = library.store();
    let mut hits: Vec<(u64, Arc<Track>)> = ids
        .into_iter()
        .filter_map(|id| Some((store.position(id)?, store.get(id)?.clone())))
        .collect();
    hits.sort_unstable_by_key(|(position, _)| *position);
    hits.into_iter().map(|(_, track)| track).collect()
}

fn number_range(index: &ValueIndex<NumericKey>, bounds: &Bounds<f64>) -> Vec<TrackId> {
    // A NaN bound compares false against everything
    let key = |bound: Option<(f64, bool)>| match bound {
        Some((value, inclusive)) => NumericKey::new(value).map(|key| Some((key, inclusive))),
        None => Some(None),
    };
    match (key(bounds.lower), key(bounds.upper)) {
        (Some(lower), Some(upper)) => value_range(index, &Bounds { lower, upper }),
        _ => Vec::new(),
    }
}

fn value_range<T: Ord + Copy>(index: &ValueIndex<T>, bounds: &Bounds<T>) -> Vec<TrackId> {
    let entries = match (bounds.lower, bounds.upper) {
        (Some((low, true)), Some((high, true))) => index.range_between(low, high),
        (Some((low, inclusive)), None) => index.range_above(low, inclusive),
        (None, Some((high, inclusive))) => index.range_below(high, inclusive),
        (Some((low, low_inclusive)), Some((high, high_inclusive))) => {
            return index
                .range_above(low, low_inclusive)
                .iter()
                .filter(|(value, _)| if high_inclusive { *value <= high } else { *value < high })
                .map(|(_, id)| *id)
                .collect();
        }
        (None, None) => return index.iter().map(|(_, id)| *id).collect(),
    };
    entries.iter().map(|(_, id)| *id).collect()
}
