use std::collections::HashMap;
use crate::core::types::{Field, Track};
use crate::index::text::TextIndex;
use crate::index::value::{DateIndex, NumberIndex, NumericKey};

/// String fields with an inverted index
pub const TEXT_INDEXED_FIELDS: [Field; 3] = [Field::Artist, Field::Album, Field::Genre];

/// Ordered fields with a sorted value index
pub const NUMBER_INDEXED_FIELDS: [Field; 5] = [
    Field::Year,
    Field::Duration,
    Field::PlayCount,
    Field::Bpm,
    Field::Rating,
];

pub const DATE_INDEXED_FIELDS: [Field; 2] = [Field::DateAdded, Field::LastPlayed];

/// Every per-field index of a library
#[derive(Debug, Clone)]
pub struct IndexSet {
    text: HashMap<Field, TextIndex>,
    numbers: HashMap<Field, NumberIndex>,
    dates: HashMap<Field, DateIndex>,
}

impl IndexSet {
    pub fn new() -> Self {
        IndexSet {
            text: TEXT_INDEXED_FIELDS.iter().map(|f| (*f, TextIndex::new())).collect(),
            numbers: NUMBER_INDEXED_FIELDS.iter().map(|f| (*f, NumberIndex::new())).collect(),
            dates: DATE_INDEXED_FIELDS.iter().map(|f| (*f, DateIndex::new())).collect(),
        }
    }

    pub fn is_text_indexed(field: Field) -> bool {
        TEXT_INDEXED_FIELDS.contains(&field)
    }

    pub fn is_value_indexed(field: Field) -> bool {
        NUMBER_INDEXED_FIELDS.contains(&field) || DATE_INDEXED_FIELDS.contains(&field)
    }

    pub fn add_track(&mut self, track: &Track) {
        for (field, index) in self.text.iter_mut() {
            if let Some(text) = track.text(*field) {
                index.add(track.id, text);
            }
        }
        for (field, index) in self.numbers.iter_mut() {
            if let Some(key) = track.number(*field).and_then(NumericKey::new) {
                index.add(track.id, key);
            }
        }
        for (field, index) in self.dates.iter_mut() {
            if let Some(date) = track.date(*field) {
                index.add(track.id, date);
            }
        }
    }

    /// Remove the entries `track` contributed; `track` must be the stored version
    pub fn remove_track(&mut self, track: &Track) {
        for (field, index) in self.text.iter_mut() {
            if let Some(text) = track.text(*field) {
                index.remove(track.id, text);
            }
        }
        for (field, index) in self.numbers.iter_mut() {
            if track.number(*field).and_then(NumericKey::new).is_some() {
                index.remove(track.id);
            }
        }
        for (field, index) in self.dates.iter_mut() {
            if track.date(*field).is_some() {
                index.remove(track.id);
            }
        }
    }

    /// Cheap per-track check used after each mutation in debug builds
    pub fn covers(&self, track: &Track) -> bool {
        let text_ok = self.text.iter().all(|(field, index)| match track.text(*field) {
            Some(text) => index.contains_entry(track.id, text),
            None => true,
        });
        let numbers_ok = self.numbers.iter().all(|(field, index)| {
            match track.number(*field).and_then(NumericKey::new) {
                Some(key) => index.get(track.id) == Some(key),
                None => index.get(track.id).is_none(),
            }
        });
        let dates_ok = self.dates.iter().all(|(field, index)| {
            index.get(track.id) == track.date(*field)
        });
        text_ok && numbers_ok && dates_ok
    }

    pub fn text(&self, field: Field) -> Option<&TextIndex> {
        self.text.get(&field)
    }

    pub fn numbers(&self, field: Field) -> Option<&NumberIndex> {
        self.numbers.get(&field)
    }

    pub fn dates(&self, field: Field) -> Option<&DateIndex> {
        self.dates.get(&field)
    }

    pub fn text_indexes(&self) -> impl Iterator<Item = (&Field, &TextIndex)> {
        self.text.iter()
    }

    pub fn number_indexes(&self) -> impl Iterator<Item = (&Field, &NumberIndex)> {
        self.numbers.iter()
    }

    pub fn date_indexes(&self) -> impl Iterator<Item = (&Field, &DateIndex)> {
        self.dates.iter()
    }

    pub fn text_key_count(&self) -> usize {
        self.text.values().map(TextIndex::key_count).sum()
    }

    pub fn value_entry_count(&self) -> usize {
        self.numbers.values().map(NumberIndex::len).sum::<usize>()
            + self.dates.values().map(DateIndex::len).sum::<usize>()
    }

    pub fn clear(&mut self) {
        self.text.values_mut().for_each(TextIndex::clear);
        self.numbers.values_mut().for_each(NumberIndex::clear);
        self.dates.values_mut().for_each(DateIndex::clear);
    }
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}
