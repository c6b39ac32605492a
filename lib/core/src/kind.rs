use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Audio features indexed for every entity kind by default
pub const DEFAULT_FEATURES: [&str; 10] = [
    "acousticness",
    "danceability",
    "duration_ms",
    "energy",
    "instrumentalness",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
];

/// Kind of entity a feature table and its index describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Song,
    Artist,
    Genre,
    Year,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Song,
        EntityKind::Artist,
        EntityKind::Genre,
        EntityKind::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Artist => "artist",
            EntityKind::Genre => "genre",
            EntityKind::Year => "year",
        }
    }

    /// Column holding the stable identifier
    pub fn id_column(&self) -> &'static str {
        match self {
            EntityKind::Song => "id",
            EntityKind::Artist => "artists",
            EntityKind::Genre => "genres",
            EntityKind::Year => "year",
        }
    }

    /// Column holding the display label
    pub fn label_column(&self) -> &'static str {
        match self {
            EntityKind::Song => "name",
            EntityKind::Artist => "artists",
            EntityKind::Genre => "genres",
            EntityKind::Year => "year",
        }
    }

    /// Display-only columns carried along with each row
    pub fn attribute_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Song => &["artists", "year", "popularity"],
            EntityKind::Artist => &["count", "popularity"],
            EntityKind::Genre => &["popularity"],
            EntityKind::Year => &["popularity"],
        }
    }

    pub fn default_features(&self) -> Vec<String> {
        DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect()
    }

    /// Conventional file stem under a data directory
    pub fn file_stem(&self) -> &'static str {
        match self {
            EntityKind::Song => "data",
            EntityKind::Artist => "data_by_artist",
            EntityKind::Genre => "data_by_genres",
            EntityKind::Year => "data_by_year",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "song" | "songs" => Ok(EntityKind::Song),
            "artist" | "artists" => Ok(EntityKind::Artist),
            "genre" | "genres" => Ok(EntityKind::Genre),
            "year" | "years" => Ok(EntityKind::Year),
            other => Err(Error::Configuration(format!("unknown entity kind '{}'", other))),
        }
    }
}
