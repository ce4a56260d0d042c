#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub notification_capacity: usize,   // Broadcast buffer behind subscribe()
    pub cache_size: usize,              // One-off evaluation LRU, 0 disables
    pub parallel_scan_threshold: usize, // Library size where scans go to rayon

    // Answer single range leaves from the sorted value indexes
    pub value_index_ranges: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            notification_capacity: 1024,
            cache_size: 256,
            parallel_scan_threshold: 10_000,
            value_index_ranges: false,
        }
    }
}
