use std::collections::BTreeMap;
use std::sync::Arc;
use log::{debug, info, trace};
use roaring::RoaringTreemap;
use crate::core::types::{Track, TrackId};
use crate::live::playlist::{PlaylistId, SmartPlaylist};
use crate::live::update::{PlaylistUpdate, UpdateKind};
use crate::query::matcher::RuleMatcher;
use crate::search::executor::QueryExecutor;
use crate::store::library::Library;

/// One applied library mutation, as seen by the registry
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    Inserted(&'a Arc<Track>),
    Updated { old: &'a Arc<Track>, new: &'a Arc<Track> },
    Removed(&'a Arc<Track>),
}

impl Change<'_> {
    pub fn id(&self) -> TrackId {
        match self {
            Change::Inserted(track) | Change::Removed(track) => track.id,
            Change::Updated { new, .. } => new.id,
        }
    }
}

struct Entry {
    playlist: SmartPlaylist,
    members: RoaringTreemap,    // Ids of `published`
    published: Vec<Arc<Track>>, // Contents as of the last notification
}

impl Entry {
    fn publish(&mut self, tracks: Vec<Arc<Track>>) {
        self.members = tracks.iter().map(|t| t.id.0).collect();
        self.published = tracks;
    }
}

/// Registered playlists and their last published contents.
///
/// Pure bookkeeping: the caller holds the library snapshot, and sends the
/// returned updates in order.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<PlaylistId, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a playlist and evaluate it in full
    pub fn register(
        &mut self,
        playlist: SmartPlaylist,
        library: &Library,
        executor: &QueryExecutor,
        matcher: &RuleMatcher,
    ) -> PlaylistUpdate {
        let id = playlist.id;
        let tracks = evaluate(&playlist, library, executor, matcher);
        info!("registered playlist {:?} ({}) with {} tracks", playlist.name, id.0, tracks.len());

        let mut entry = Entry {
            playlist,
            members: RoaringTreemap::new(),
            published: Vec::new(),
        };
        entry.publish(tracks.clone());
        self.entries.insert(id, entry);
        PlaylistUpdate::full(id, tracks)
    }

    /// Returns whether the playlist was registered
    pub fn unregister(&mut self, id: PlaylistId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            info!("unregistered playlist {}", id.0);
        }
        removed
    }

    /// Re-evaluate one playlist; `None` when it is not registered
    pub fn refresh(
        &mut self,
        id: PlaylistId,
        library: &Library,
        executor: &QueryExecutor,
        matcher: &RuleMatcher,
    ) -> Option<PlaylistUpdate> {
        let entry = self.entries.get_mut(&id)?;
        let tracks = evaluate(&entry.playlist, library, executor, matcher);
        entry.publish(tracks.clone());
        Some(PlaylistUpdate::full(id, tracks))
    }

    /// Last published contents
    pub fn tracks(&self, id: PlaylistId) -> Option<Vec<Arc<Track>>> {
        self.entries.get(&id).map(|entry| entry.published.clone())
    }

    pub fn playlist(&self, id: PlaylistId) -> Option<&SmartPlaylist> {
        self.entries.get(&id).map(|entry| &entry.playlist)
    }

    pub fn contains(&self, id: PlaylistId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bring every playlist up to date with one applied mutation.
    ///
    /// A playlist is re-evaluated when the record's membership flips, when
    /// the record stays in but its sort key moved, or when the published
    /// contents disagree with the rule (relative dates drift over time).
    /// Otherwise a published copy of the record is swapped for the new
    /// version without a notification.
    pub fn on_change(
        &mut self,
        change: Change<'_>,
        library: &Library,
        executor: &QueryExecutor,
        matcher: &RuleMatcher,
    ) -> Vec<PlaylistUpdate> {
        let id = change.id();
        let mut updates = Vec::new();

        for (playlist_id, entry) in self.entries.iter_mut() {
            let rule = &entry.playlist.root_rule;
            let was = match change {
                Change::Inserted(_) => false,
                Change::Updated { old, .. } | Change::Removed(old) => matcher.matches(rule, old),
            };
            let now = match change {
                Change::Inserted(new) | Change::Updated { new, .. } => matcher.matches(rule, new),
                Change::Removed(_) => false,
            };
            let published = entry.members.contains(id.0);
            let sort_moved = match (change, &entry.playlist.sorting) {
                (Change::Updated { old, new }, Some(sorting)) => now && sorting.key_changed(old, new),
                _ => false,
            };

            if was != now || sort_moved || (published && !now) {
                trace!(
                    "re-evaluating playlist {} after change to {:?} (was {}, now {})",
                    playlist_id.0,
                    id,
                    was,
                    now
                );
                let tracks = evaluate(&entry.playlist, library, executor, matcher);
                if let Some(kind) = diff(&entry.published, &tracks) {
                    updates.push(PlaylistUpdate { playlist_id: *playlist_id, kind });
                }
                entry.publish(tracks);
            } else if published {
                if let Change::Updated { new, .. } = change {
                    if let Some(slot) = entry.published.iter_mut().find(|t| t.id == id) {
                        *slot = Arc::clone(new);
                    }
                }
            }
        }

        debug!("change to {:?} produced {} playlist update(s)", id, updates.len());
        updates
    }

    /// Re-evaluate everything after a bulk replacement; one full update each
    pub fn on_replace_all(
        &mut self,
        library: &Library,
        executor: &QueryExecutor,
        matcher: &RuleMatcher,
    ) -> Vec<PlaylistUpdate> {
        self.entries
            .iter_mut()
            .map(|(playlist_id, entry)| {
                let tracks = evaluate(&entry.playlist, library, executor, matcher);
                entry.publish(tracks.clone());
                PlaylistUpdate::full(*playlist_id, tracks)
            })
            .collect()
    }
}

fn evaluate(
    playlist: &SmartPlaylist,
    library: &Library,
    executor: &QueryExecutor,
    matcher: &RuleMatcher,
) -> Vec<Arc<Track>> {
    executor.execute(
        library,
        &playlist.root_rule,
        playlist.sorting.as_ref(),
        playlist.limit,
        matcher,
    )
}

/// Incremental when the new list is the old one minus `removed` followed by
/// `added`; full when surviving members changed order or were replaced by a
/// newer version of the record; `None` when identical.
fn diff(previous: &[Arc<Track>], next: &[Arc<Track>]) -> Option<UpdateKind> {
    let after: RoaringTreemap = next.iter().map(|t| t.id.0).collect();
    let removed: Vec<TrackId> = previous
        .iter()
        .filter(|t| !after.contains(t.id.0))
        .map(|t| t.id)
        .collect();

    // Same record versions, same order
    let kept = previous.len() - removed.len();
    let survivors_lead = previous
        .iter()
        .filter(|t| after.contains(t.id.0))
        .zip(&next[..kept])
        .all(|(before, now)| Arc::ptr_eq(before, now));
    if !survivors_lead {
        return Some(UpdateKind::Full(next.to_vec()));
    }

    let added = next[kept..].to_vec();
    if added.is_empty() && removed.is_empty() {
        None
    } else {
        Some(UpdateKind::Incremental { added, removed })
    }
}
