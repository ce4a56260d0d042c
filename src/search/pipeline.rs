use std::cmp::Ordering;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use crate::core::types::{Field, FieldKind, Track};

/// Fields a result set can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Artist,
    Album,
    DateAdded,
    LastPlayed,
    PlayCount,
    Duration,
    Year,
    Rating,
    Bpm,
    Random,
}

impl SortField {
    /// Backing track field; `None` for `Random`
    pub fn field(&self) -> Option<Field> {
        match self {
            SortField::Title => Some(Field::Title),
            SortField::Artist => Some(Field::Artist),
            SortField::Album => Some(Field::Album),
            SortField::DateAdded => Some(Field::DateAdded),
            SortField::LastPlayed => Some(Field::LastPlayed),
            SortField::PlayCount => Some(Field::PlayCount),
            SortField::Duration => Some(Field::Duration),
            SortField::Year => Some(Field::Year),
            SortField::Rating => Some(Field::Rating),
            SortField::Bpm => Some(Field::Bpm),
            SortField::Random => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sorting {
    pub field: SortField,
    pub ascending: bool,  // Ignored for Random
}

impl Sorting {
    pub fn ascending(field: SortField) -> Self {
        Sorting { field, ascending: true }
    }

    pub fn descending(field: SortField) -> Self {
        Sorting { field, ascending: false }
    }

    pub fn random() -> Self {
        Sorting { field: SortField::Random, ascending: true }
    }

    pub fn is_random(&self) -> bool {
        self.field == SortField::Random
    }

    /// Whether replacing `old` by `new` can move the track in this order
    pub fn key_changed(&self, old: &Track, new: &Track) -> bool {
        match self.field.field() {
            Some(field) => sort_key(field, old) != sort_key(field, new),
            None => false,
        }
    }
}

/// Comparable projection of one track field
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Text(String),                 // Lowercased, null = ""
    Date(Option<DateTime<Utc>>),  // Null = distant past
    Number(f64),                  // Null = 0
}

impl SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn sort_key(field: Field, track: &Track) -> SortKey {
    match field.kind() {
        FieldKind::Text => SortKey::Text(track.text(field).unwrap_or_default().to_lowercase()),
        FieldKind::Date => SortKey::Date(track.date(field)),
        // +0.0 folds -0.0 so it ties with 0.0
        FieldKind::Number => SortKey::Number(track.number(field).unwrap_or(0.0) + 0.0),
    }
}

/// Order and bound a match set that arrives in store order.
///
/// Sorting is stable, so tracks with equal keys keep store order in both
/// directions. `Random` shuffles after selection and yields a fresh order on
/// every call. `limit` keeps the first N of the ordered sequence.
pub fn finish(
    mut tracks: Vec<Arc<Track>>,
    sorting: Option<&Sorting>,
    limit: Option<usize>,
) -> Vec<Arc<Track>> {
    match sorting {
        Some(sorting) if sorting.is_random() => {
            tracks.shuffle(&mut rand::thread_rng());
        }
        Some(sorting) => {
            if let Some(field) = sorting.field.field() {
                tracks = sort_stable(tracks, field, sorting.ascending);
            }
        }
        None => {}
    }

    if let Some(limit) = limit {
        tracks.truncate(limit);
    }
    tracks
}

fn sort_stable(tracks: Vec<Arc<Track>>, field: Field, ascending: bool) -> Vec<Arc<Track>> {
    // Keys are computed once per track rather than per comparison
    let mut keyed: Vec<(SortKey, Arc<Track>)> = tracks
        .into_iter()
        .map(|track| (sort_key(field, &track), track))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.cmp(b);
        if ascending { ordering } else { ordering.reverse() }
    });

    keyed.into_iter().map(|(_, track)| track).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ids(tracks: &[Arc<Track>]) -> Vec<u64> {
        tracks.iter().map(|t| t.id.0).collect()
    }

    fn library() -> Vec<Arc<Track>> {
        vec![
            Arc::new(Track::new(1).with_title("b").with_play_count(5)),
            Arc::new(Track::new(2).with_title("A").with_play_count(0)),
            Arc::new(Track::new(3).with_title("c").with_play_count(10)),
            Arc::new(Track::new(4).with_play_count(5)),
            Arc::new(Track::new(5).with_title("a")),
        ]
    }

    #[test]
    fn numeric_sort_is_stable_in_both_directions() {
        let asc = finish(library(), Some(&Sorting::ascending(SortField::PlayCount)), None);
        // Null play count ranks as 0 and ties with track 2
        assert_eq!(ids(&asc), vec![2, 5, 1, 4, 3]);

        let desc = finish(library(), Some(&Sorting::descending(SortField::PlayCount)), None);
        assert_eq!(ids(&desc), vec![3, 1, 4, 2, 5]);
    }

    #[test]
    fn text_sort_ignores_case_and_puts_null_first() {
        let sorted = finish(library(), Some(&Sorting::ascending(SortField::Title)), None);
        assert_eq!(ids(&sorted), vec![4, 2, 5, 1, 3]);
    }

    #[test]
    fn null_dates_are_earliest() {
        let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let tracks = vec![
            Arc::new(Track::new(1).with_date_added(day(3))),
            Arc::new(Track::new(2)),
            Arc::new(Track::new(3).with_date_added(day(1))),
        ];
        let sorted = finish(tracks, Some(&Sorting::ascending(SortField::DateAdded)), None);
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn limit_keeps_prefix_of_sorted_result() {
        let sorting = Sorting::descending(SortField::PlayCount);
        let full = finish(library(), Some(&sorting), None);
        let limited = finish(library(), Some(&sorting), Some(2));
        assert_eq!(ids(&limited), ids(&full)[..2].to_vec());
        assert_eq!(finish(library(), None, Some(0)).len(), 0);
        assert_eq!(finish(library(), None, Some(99)).len(), 5);
    }

    #[test]
    fn random_is_a_permutation_of_the_selection() {
        let shuffled = finish(library(), Some(&Sorting::random()), None);
        let mut seen = ids(&shuffled);
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);

        assert_eq!(finish(library(), Some(&Sorting::random()), Some(3)).len(), 3);
    }

    #[test]
    fn key_change_detection() {
        let sorting = Sorting::ascending(SortField::Title);
        let old = Track::new(1).with_title("Song").with_play_count(1);
        assert!(!sorting.key_changed(&old, &old.clone().with_play_count(2)));
        assert!(!sorting.key_changed(&old, &old.clone().with_title("SONG")));
        assert!(sorting.key_changed(&old, &old.clone().with_title("Other")));
        assert!(!Sorting::random().key_changed(&old, &old.clone().with_title("Other")));
    }
}
