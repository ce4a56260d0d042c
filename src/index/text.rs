use std::collections::BTreeMap;
use std::ops::Bound;
use roaring::RoaringTreemap;
use crate::analysis::tokenizer::{is_single_token, WhitespaceTokenizer};
use crate::core::types::TrackId;

/// Substring relation answered by a text index lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
}

/// Inverted index over one string field.
///
/// Holds two key spaces: the whole normalized value, and each whitespace token
/// of it. Both map to the ids of the tracks carrying that text. Keys whose id
/// set becomes empty are dropped on removal.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    values: BTreeMap<String, RoaringTreemap>,
    tokens: BTreeMap<String, RoaringTreemap>,
    tokenizer: WhitespaceTokenizer,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: TrackId, text: &str) {
        let normalized = self.tokenizer.normalize(text);
        for token in self.tokenizer.tokens(&normalized) {
            self.tokens
                .entry(token.to_string())
                .or_default()
                .insert(id.0);
        }
        self.values.entry(normalized).or_default().insert(id.0);
    }

    pub fn remove(&mut self, id: TrackId, text: &str) {
        let normalized = self.tokenizer.normalize(text);
        for token in self.tokenizer.tokens(&normalized) {
            remove_id(&mut self.tokens, token, id);
        }
        remove_id(&mut self.values, &normalized, id);
    }

    /// Ids of every track whose value contains / starts with `query`,
    /// compared case-insensitively
    pub fn search(&self, query: &str, mode: TextMatch) -> RoaringTreemap {
        let needle = self.tokenizer.normalize(query);
        let mut result = RoaringTreemap::new();

        match mode {
            TextMatch::StartsWith => {
                // Keys sharing the prefix are contiguous in key order
                let range = self
                    .values
                    .range::<str, _>((Bound::Included(needle.as_str()), Bound::Unbounded));
                for (key, ids) in range {
                    if !key.starts_with(needle.as_str()) {
                        break;
                    }
                    result |= ids;
                }
            }
            TextMatch::Contains => {
                // A whitespace-free needle always falls inside a single token
                let keys = if !needle.is_empty() && is_single_token(&needle) {
                    &self.tokens
                } else {
                    &self.values
                };
                for (key, ids) in keys {
                    if key.contains(needle.as_str()) {
                        result |= ids;
                    }
                }
            }
        }

        result
    }

    /// True when both the whole value and all its tokens resolve to `id`
    pub fn contains_entry(&self, id: TrackId, text: &str) -> bool {
        let normalized = self.tokenizer.normalize(text);
        let has = |map: &BTreeMap<String, RoaringTreemap>, key: &str| {
            map.get(key).is_some_and(|ids| ids.contains(id.0))
        };
        has(&self.values, &normalized)
            && self.tokenizer.tokens(&normalized).all(|token| has(&self.tokens, token))
    }

    pub fn value_entries(&self) -> impl Iterator<Item = (&str, &RoaringTreemap)> {
        self.values.iter().map(|(key, ids)| (key.as_str(), ids))
    }

    pub fn token_entries(&self) -> impl Iterator<Item = (&str, &RoaringTreemap)> {
        self.tokens.iter().map(|(key, ids)| (key.as_str(), ids))
    }

    pub fn normalize(&self, text: &str) -> String {
        self.tokenizer.normalize(text)
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    pub fn key_count(&self) -> usize {
        self.values.len() + self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.tokens.clear();
    }
}

fn remove_id(map: &mut BTreeMap<String, RoaringTreemap>, key: &str, id: TrackId) {
    if let Some(ids) = map.get_mut(key) {
        ids.remove(id.0);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}
