use std::sync::Arc;
use log::warn;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use crate::core::types::{Track, TrackId};
use crate::live::playlist::PlaylistId;

/// Notification published for one registered playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistUpdate {
    pub playlist_id: PlaylistId,
    pub kind: UpdateKind,
}

/// What changed in a playlist.
///
/// Updates track membership, order and sort keys. An edit to a member that
/// touches neither the rule outcome nor the sort key (a title rename under
/// a play-count sort, say) publishes nothing: subscribers keep the older
/// copy of that record until the next update for the playlist. Call
/// `Engine::playlist_tracks` or `Engine::refresh` for current metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    /// Complete ordered contents; always authoritative. Also sent when the
    /// order held but a member's sort key changed.
    Full(Vec<Arc<Track>>),
    /// Membership delta against the previous notification. Order of the
    /// surviving members did not change.
    Incremental {
        added: Vec<Arc<Track>>,
        removed: Vec<TrackId>,
    },
}

impl PlaylistUpdate {
    pub fn full(playlist_id: PlaylistId, tracks: Vec<Arc<Track>>) -> Self {
        PlaylistUpdate { playlist_id, kind: UpdateKind::Full(tracks) }
    }

    pub fn is_full(&self) -> bool {
        matches!(self.kind, UpdateKind::Full(_))
    }
}

/// Receiving end of `Engine::subscribe`.
///
/// A subscriber that falls more than the channel capacity behind skips the
/// oldest updates; it can recover the current state with `Engine::refresh`
/// or `Engine::playlist_tracks`.
pub struct UpdateStream {
    receiver: Receiver<PlaylistUpdate>,
}

impl UpdateStream {
    pub(crate) fn new(receiver: Receiver<PlaylistUpdate>) -> Self {
        UpdateStream { receiver }
    }

    /// Next update; `None` once the engine is dropped
    pub async fn next(&mut self) -> Option<PlaylistUpdate> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => return Some(update),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("update subscriber lagged, skipped {} update(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-queued update without waiting
    pub fn try_next(&mut self) -> Option<PlaylistUpdate> {
        loop {
            match self.receiver.try_recv() {
                Ok(update) => return Some(update),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("update subscriber lagged, skipped {} update(s)", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<PlaylistUpdate> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
