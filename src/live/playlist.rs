use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::error::Result;
use crate::query::rule::Rule;
use crate::search::pipeline::Sorting;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaylistId(pub Uuid);

impl PlaylistId {
    pub fn new() -> Self {
        PlaylistId(Uuid::new_v4())
    }
}

impl Default for PlaylistId {
    fn default() -> Self {
        Self::new()
    }
}

/// A named live query: rule, optional order, optional bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartPlaylist {
    pub id: PlaylistId,
    pub name: String,
    pub root_rule: Rule,
    #[serde(default)]
    pub sorting: Option<Sorting>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SmartPlaylist {
    pub fn new(name: impl Into<String>, root_rule: Rule) -> Result<Self> {
        root_rule.validate()?;
        Ok(SmartPlaylist {
            id: PlaylistId::new(),
            name: name.into(),
            root_rule,
            sorting: None,
            limit: None,
        })
    }

    pub fn with_sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = Some(sorting);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parse and validate a definition
    pub fn from_json(json: &str) -> Result<Self> {
        let playlist: SmartPlaylist = serde_json::from_str(json)?;
        playlist.root_rule.validate()?;
        Ok(playlist)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
