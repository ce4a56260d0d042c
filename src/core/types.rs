use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl TrackId {
    pub fn new(id: u64) -> Self {
        TrackId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        TrackId(id)
    }
}

/// Storage class of a field, decides which comparisons apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

/// Every track attribute a rule or a sort can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Artist,
    Album,
    Genre,
    Format,
    Year,
    Duration,
    PlayCount,
    Bpm,
    Rating,
    DateAdded,
    LastPlayed,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::Artist,
        Field::Album,
        Field::Genre,
        Field::Format,
        Field::Year,
        Field::Duration,
        Field::PlayCount,
        Field::Bpm,
        Field::Rating,
        Field::DateAdded,
        Field::LastPlayed,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Title | Field::Artist | Field::Album | Field::Genre | Field::Format => FieldKind::Text,
            Field::Year | Field::Duration | Field::PlayCount | Field::Bpm | Field::Rating => FieldKind::Number,
            Field::DateAdded | Field::LastPlayed => FieldKind::Date,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Album => "album",
            Field::Genre => "genre",
            Field::Format => "format",
            Field::Year => "year",
            Field::Duration => "duration",
            Field::PlayCount => "playCount",
            Field::Bpm => "bpm",
            Field::Rating => "rating",
            Field::DateAdded => "dateAdded",
            Field::LastPlayed => "lastPlayed",
        }
    }
}

/// Borrowed view of one field of a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Date(DateTime<Utc>),
}

/// A library record. Owned by the caller's metadata layer; the engine only
/// reads the fields below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub format: Option<String>,     // Container/codec name, e.g. "flac"
    pub year: Option<i32>,
    pub duration: Option<f64>,      // Seconds
    pub play_count: Option<u32>,
    pub bpm: Option<f64>,
    pub rating: Option<u8>,         // 0-5 stars
    pub date_added: Option<DateTime<Utc>>,
    pub last_played: Option<DateTime<Utc>>,
}

impl Track {
    pub fn new(id: u64) -> Self {
        Track {
            id: TrackId(id),
            title: None,
            artist: None,
            album: None,
            genre: None,
            format: None,
            year: None,
            duration: None,
            play_count: None,
            bpm: None,
            rating: None,
            date_added: None,
            last_played: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_play_count(mut self, play_count: u32) -> Self {
        self.play_count = Some(play_count);
        self
    }

    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = Some(bpm);
        self
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_date_added(mut self, date: DateTime<Utc>) -> Self {
        self.date_added = Some(date);
        self
    }

    pub fn with_last_played(mut self, date: DateTime<Utc>) -> Self {
        self.last_played = Some(date);
        self
    }

    /// Read a field; `None` when the track has no value for it
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::Title => self.title.as_deref().map(FieldValue::Text),
            Field::Artist => self.artist.as_deref().map(FieldValue::Text),
            Field::Album => self.album.as_deref().map(FieldValue::Text),
            Field::Genre => self.genre.as_deref().map(FieldValue::Text),
            Field::Format => self.format.as_deref().map(FieldValue::Text),
            Field::Year => self.year.map(|v| FieldValue::Number(v as f64)),
            Field::Duration => self.duration.map(FieldValue::Number),
            Field::PlayCount => self.play_count.map(|v| FieldValue::Number(v as f64)),
            Field::Bpm => self.bpm.map(FieldValue::Number),
            Field::Rating => self.rating.map(|v| FieldValue::Number(v as f64)),
            Field::DateAdded => self.date_added.map(FieldValue::Date),
            Field::LastPlayed => self.last_played.map(FieldValue::Date),
        }
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match self.value(field) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        match self.value(field) {
            Some(FieldValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn date(&self, field: Field) -> Option<DateTime<Utc>> {
        match self.value(field) {
            Some(FieldValue::Date(d)) => Some(d),
            _ => None,
        }
    }
}
