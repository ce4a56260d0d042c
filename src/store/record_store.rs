use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use crate::core::types::{Track, TrackId};

/// Authoritative track collection.
///
/// Tracks are kept in store order: the order in which ids were first
/// inserted. Replacing a track keeps its position; removing and re-inserting
/// it moves it to the end.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    tracks: BTreeMap<u64, Arc<Track>>,  // sequence -> track
    positions: HashMap<TrackId, u64>,   // id -> sequence
    next_seq: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TrackId) -> Option<&Arc<Track>> {
        let seq = self.positions.get(&id)?;
        self.tracks.get(seq)
    }

    /// Store-order position of `id`
    pub fn position(&self, id: TrackId) -> Option<u64> {
        self.positions.get(&id).copied()
    }

    /// Insert or replace by id. Returns the previous version, if any.
    pub fn upsert(&mut self, track: Arc<Track>) -> Option<Arc<Track>> {
        match self.positions.get(&track.id) {
            Some(seq) => self.tracks.insert(*seq, track),
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.positions.insert(track.id, seq);
                self.tracks.insert(seq, track);
                None
            }
        }
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Arc<Track>> {
        let seq = self.positions.remove(&id)?;
        self.tracks.remove(&seq)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.positions.clear();
        self.next_seq = 0;
    }

    /// Tracks in store order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.values()
    }

    /// `(position, track)` pairs in store order
    pub fn entries(&self) -> impl Iterator<Item = (u64, &Arc<Track>)> {
        self.tracks.iter().map(|(seq, track)| (*seq, track))
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
