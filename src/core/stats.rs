use serde::{Serialize, Deserialize};
use crate::query::cache::CacheStats;

/// Engine statistics for monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    // Library
    pub tracks: usize,
    pub version: u64,

    // Indexes
    pub text_keys: usize,      // Whole-value and token keys over all text fields
    pub value_entries: usize,  // Entries over all numeric and date fields

    pub registered_playlists: usize,

    // One-off evaluation cache
    pub cache_stats: CacheStats,
}
