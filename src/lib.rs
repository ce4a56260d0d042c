pub mod core;
pub mod analysis;
pub mod store;
pub mod index;
pub mod query;
pub mod search;
pub mod live;

pub use crate::core::config::EngineConfig;
pub use crate::core::engine::Engine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::EngineStats;
pub use crate::core::types::{Field, FieldKind, Track, TrackId};
pub use crate::live::playlist::{PlaylistId, SmartPlaylist};
pub use crate::live::update::{PlaylistUpdate, UpdateKind, UpdateStream};
pub use crate::query::planner::Plan;
pub use crate::query::rule::{
    CombinedRule, FilePropertyRule, NumericMetadataRule, PlayStatisticsRule, Rule, StringMetadataRule,
};
pub use crate::query::types::{Combinator, DateOperand, Operator, TimeUnit};
pub use crate::search::pipeline::{SortField, Sorting};

/*
┌──────────────────────────────────── SMARTLIST ARCHITECTURE ────────────────────────────────────┐
│                                                                                                 │
│  caller ──insert/update/remove/replace_all──▶ Engine ──evaluate──▶ [Arc<Track>]                 │
│                                                 │                                               │
│   ┌─────────────────────────────────────────────┴──────────────────────────────────────────┐   │
│   │ registry: Mutex<Registry>            library: RwLock<Library>                          │   │
│   │  • SmartPlaylist per PlaylistId       • store: RecordStore  (id → Arc<Track>, ordered) │   │
│   │  • last published contents            • indexes: IndexSet                              │   │
│   │                                          - TextIndex   artist/album/genre              │   │
│   │                                          - ValueIndex  numbers + dates                 │   │
│   │                                       • version: u64                                   │   │
│   └────────────────────────────────────────────────────────────────────────────────────────┘   │
│                                                                                                 │
│  QueryExecutor                                                                                  │
│   QueryPlanner ─▶ Plan::TextSeek | Plan::ValueRange | Plan::Scan (rayon above threshold)        │
│   RuleMatcher  ─▶ leaf comparisons, AND/OR, negation, relative dates on one clock               │
│   pipeline     ─▶ stable sort / shuffle ─▶ limit                                                │
│                                                                                                 │
│  QueryCache (LRU, version-tagged) in front of one-off evaluate()                                │
│                                                                                                 │
│  Mutation: registry.lock ─▶ library.write ─▶ edit + index delta ─▶ downgrade to read           │
│            ─▶ registry.on_change ─▶ broadcast PlaylistUpdate ─▶ UpdateStream subscribers        │
└─────────────────────────────────────────────────────────────────────────────────────────────────┘
*/
