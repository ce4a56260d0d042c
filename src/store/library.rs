use std::sync::Arc;
use log::debug;
use crate::core::error::{Error, Result};
use crate::core::types::{Track, TrackId};
use crate::index::field_indexes::IndexSet;
use crate::index::value::NumericKey;
use crate::store::record_store::RecordStore;

/// Record store plus the indexes derived from it.
///
/// Every mutation applies the store edit and its index delta before
/// returning, so a `&Library` is always internally consistent.
#[derive(Debug, Clone, Default)]
pub struct Library {
    store: RecordStore,
    indexes: IndexSet,
    version: u64,  // Bumped on every mutation
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id. Returns the stored track and the version it replaced.
    pub fn upsert(&mut self, track: Track) -> (Arc<Track>, Option<Arc<Track>>) {
        let track = Arc::new(track);

        let previous = self.store.upsert(track.clone());
        if let Some(old) = &previous {
            self.indexes.remove_track(old);
        }
        self.indexes.add_track(&track);
        self.version += 1;

        debug_assert!(
            self.indexes.covers(&track),
            "index out of sync after upsert of {:?}",
            track.id
        );
        debug!(
            "upsert {:?} ({}), version {}",
            track.id,
            if previous.is_some() { "replaced" } else { "inserted" },
            self.version
        );

        (track, previous)
    }

    /// Remove by id; `None` (and no version bump) when absent
    pub fn remove(&mut self, id: TrackId) -> Option<Arc<Track>> {
        let removed = self.store.remove(id)?;
        self.indexes.remove_track(&removed);
        self.version += 1;
        debug!("removed {:?}, version {}", id, self.version);
        Some(removed)
    }

    /// Drop everything and rebuild the indexes from scratch.
    /// Later duplicates of an id replace earlier ones.
    pub fn replace_all(&mut self, tracks: Vec<Track>) {
        self.store.clear();
        self.indexes.clear();
        for track in tracks {
            self.store.upsert(Arc::new(track));
        }
        for track in self.store.iter() {
            self.indexes.add_track(track);
        }
        self.version += 1;
    }

    pub fn get(&self, id: TrackId) -> Option<&Arc<Track>> {
        self.store.get(id)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Full cross-check of every index against the store
    pub fn verify(&self) -> Result<()> {
        for track in self.store.iter() {
            if !self.indexes.covers(track) {
                return Err(Error::invalid_state(format!(
                    "track {:?} is missing index entries",
                    track.id
                )));
            }
        }

        for (field, index) in self.indexes.text_indexes() {
            for (key, ids) in index.value_entries() {
                for id in ids.iter() {
                    let value = self.get(TrackId(id)).and_then(|t| t.text(*field));
                    if value.map(|v| index.normalize(v)).as_deref() != Some(key) {
                        return Err(Error::invalid_state(format!(
                            "{} index maps {:?} to stale track {}",
                            field.name(),
                            key,
                            id
                        )));
                    }
                }
            }
            for (token, ids) in index.token_entries() {
                for id in ids.iter() {
                    let value = self.get(TrackId(id)).and_then(|t| t.text(*field));
                    let holds = value.is_some_and(|v| index.tokenize(v).iter().any(|t| t == token));
                    if !holds {
                        return Err(Error::invalid_state(format!(
                            "{} token {:?} maps to stale track {}",
                            field.name(),
                            token,
                            id
                        )));
                    }
                }
            }
        }

        for (field, index) in self.indexes.number_indexes() {
            let expected = self
                .store
                .iter()
                .filter(|t| t.number(*field).and_then(NumericKey::new).is_some())
                .count();
            if index.len() != expected || !index.is_sorted() {
                return Err(Error::invalid_state(format!(
                    "{} value index has {} entries, expected {}",
                    field.name(),
                    index.len(),
                    expected
                )));
            }
        }

        for (field, index) in self.indexes.date_indexes() {
            let expected = self.store.iter().filter(|t| t.date(*field).is_some()).count();
            if index.len() != expected || !index.is_sorted() {
                return Err(Error::invalid_state(format!(
                    "{} date index has {} entries, expected {}",
                    field.name(),
                    index.len(),
                    expected
                )));
            }
        }

        Ok(())
    }
}
