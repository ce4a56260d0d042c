use std::sync::Arc;
use log::{debug, info};
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tokio::sync::broadcast::{self, Sender};
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::stats::EngineStats;
use crate::core::types::{Track, TrackId};
use crate::live::playlist::{PlaylistId, SmartPlaylist};
use crate::live::registry::{Change, Registry};
use crate::live::update::{PlaylistUpdate, UpdateStream};
use crate::query::cache::{QueryCache, QueryKey};
use crate::query::matcher::RuleMatcher;
use crate::query::planner::Plan;
use crate::query::rule::Rule;
use crate::search::executor::QueryExecutor;
use crate::search::pipeline::Sorting;
use crate::store::library::Library;

/// Smart playlist engine: library, indexes and live playlists.
///
/// Lock order is registry, then library. Mutations hold the registry for the
/// whole edit-evaluate-publish sequence, so they are serialized and
/// notifications for a playlist go out in mutation order. One-off
/// evaluations only take the library read lock.
pub struct Engine {
    config: EngineConfig,

    library: RwLock<Library>,   // Store + indexes, one domain
    registry: Mutex<Registry>,

    executor: QueryExecutor,
    cache: Option<QueryCache>,  // None when cache_size is 0

    updates: Sender<PlaylistUpdate>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let (updates, _) = broadcast::channel(config.notification_capacity.max(1));
        Engine {
            executor: QueryExecutor::new(&config),
            cache: QueryCache::new(config.cache_size),
            library: RwLock::new(Library::new()),
            registry: Mutex::new(Registry::new()),
            updates,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add a track; an existing id is replaced
    pub fn insert(&self, track: Track) {
        self.upsert(track);
    }

    /// Replace a track by id; an absent id is inserted
    pub fn update(&self, track: Track) {
        self.upsert(track);
    }

    fn upsert(&self, track: Track) {
        let mut registry = self.registry.lock();
        let mut library = self.library.write();
        let (new, old) = library.upsert(track);
        let library = RwLockWriteGuard::downgrade(library);

        let change = match &old {
            Some(old) => Change::Updated { old, new: &new },
            None => Change::Inserted(&new),
        };
        let updates = registry.on_change(change, &library, &self.executor, &RuleMatcher::now());
        self.publish(updates);
    }

    /// Returns whether the id was present; removing an absent id changes nothing
    pub fn remove(&self, id: TrackId) -> bool {
        let mut registry = self.registry.lock();
        let mut library = self.library.write();
        let Some(removed) = library.remove(id) else {
            debug!("remove of absent {:?} ignored", id);
            return false;
        };
        let library = RwLockWriteGuard::downgrade(library);

        let updates = registry.on_change(
            Change::Removed(&removed),
            &library,
            &self.executor,
            &RuleMatcher::now(),
        );
        self.publish(updates);
        true
    }

    /// Swap the whole library; every registered playlist gets a full update
    pub fn replace_all(&self, tracks: Vec<Track>) {
        let mut registry = self.registry.lock();
        let mut library = self.library.write();
        library.replace_all(tracks);
        let library = RwLockWriteGuard::downgrade(library);
        info!("library replaced: {} tracks, version {}", library.len(), library.version());

        let updates = registry.on_replace_all(&library, &self.executor, &RuleMatcher::now());
        self.publish(updates);
    }

    /// One-off query against the current library
    pub fn evaluate(&self, rule: &Rule, sorting: Option<&Sorting>, limit: Option<usize>) -> Vec<Arc<Track>> {
        let library = self.library.read();
        let key = self.cache.as_ref().and_then(|_| QueryKey::for_query(rule, sorting, limit));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(tracks) = cache.get(key, library.version()) {
                return tracks;
            }
        }

        let tracks = self.executor.execute(&library, rule, sorting, limit, &RuleMatcher::now());

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, library.version(), tracks.clone());
        }
        tracks
    }

    /// Plan chosen for `rule`, without running it
    pub fn explain(&self, rule: &Rule) -> Plan {
        self.executor.planner().plan(rule, RuleMatcher::now().clock())
    }

    /// Validate, store and evaluate a playlist, publishing its full contents.
    /// Registering an id again replaces the earlier definition.
    pub fn register(&self, playlist: SmartPlaylist) -> Result<()> {
        playlist.root_rule.validate()?;
        let mut registry = self.registry.lock();
        let library = self.library.read();
        let update = registry.register(playlist, &library, &self.executor, &RuleMatcher::now());
        self.publish(vec![update]);
        Ok(())
    }

    /// Idempotent. Once this returns no update for `id` is sent.
    pub fn unregister(&self, id: PlaylistId) -> bool {
        self.registry.lock().unregister(id)
    }

    pub fn subscribe(&self) -> UpdateStream {
        UpdateStream::new(self.updates.subscribe())
    }

    /// Re-evaluate one playlist and publish a full update
    pub fn refresh(&self, id: PlaylistId) -> Option<Vec<Arc<Track>>> {
        let mut registry = self.registry.lock();
        let library = self.library.read();
        let update = registry.refresh(id, &library, &self.executor, &RuleMatcher::now())?;
        let tracks = registry.tracks(id);
        self.publish(vec![update]);
        tracks
    }

    /// Contents as of the playlist's last notification
    pub fn playlist_tracks(&self, id: PlaylistId) -> Option<Vec<Arc<Track>>> {
        self.registry.lock().tracks(id)
    }

    pub fn playlist(&self, id: PlaylistId) -> Option<SmartPlaylist> {
        self.registry.lock().playlist(id).cloned()
    }

    pub fn get(&self, id: TrackId) -> Option<Arc<Track>> {
        self.library.read().get(id).cloned()
    }

    /// Every track in store order
    pub fn tracks(&self) -> Vec<Arc<Track>> {
        self.library.read().store().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.library.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.library.read().is_empty()
    }

    pub fn stats(&self) -> EngineStats {
        let registered_playlists = self.registry.lock().len();
        let library = self.library.read();
        EngineStats {
            tracks: library.len(),
            text_keys: library.indexes().text_key_count(),
            value_entries: library.indexes().value_entry_count(),
            registered_playlists,
            version: library.version(),
            cache_stats: self.cache.as_ref().map(QueryCache::stats).unwrap_or_default(),
        }
    }

    /// Cross-check every index against the store
    pub fn verify_consistency(&self) -> Result<()> {
        self.library.read().verify()
    }

    fn publish(&self, updates: Vec<PlaylistUpdate>) {
        for update in updates {
            // No subscribers is not an error
            let _ = self.updates.send(update);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
