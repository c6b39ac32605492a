use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::{Error, Result};

/// Stable identifier of an entity in a feature table
///
/// Text that [`RowId::parse`] reads as an integer is always held as
/// `Integer`, so `"1921"` and `1921` name the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RowId {
    Integer(u64),
    String(String),
}

impl RowId {
    /// Parse an id cell: integral text becomes `Integer`, anything else `String`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(i) if !trimmed.starts_with('+') && (trimmed == "0" || !trimmed.starts_with('0')) => {
                RowId::Integer(i)
            }
            _ => RowId::String(trimmed.to_string()),
        }
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::String(s) => write!(f, "{}", s),
            RowId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId::parse(&s)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId::parse(s)
    }
}

struct RowIdVisitor;

impl Visitor<'_> for RowIdVisitor {
    type Value = RowId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a string id")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<RowId, E> {
        Ok(RowId::Integer(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<RowId, E> {
        u64::try_from(v)
            .map(RowId::Integer)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<RowId, E> {
        Ok(RowId::parse(v))
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RowIdVisitor)
    }
}

impl From<u64> for RowId {
    fn from(i: u64) -> Self {
        RowId::Integer(i)
    }
}

/// One entity of a feature table: identifier, display label and numeric features
///
/// Feature names are shared `Arc<str>` so a table of many rows keeps a single
/// copy of each column name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: RowId,
    pub label: String,
    features: Vec<(Arc<str>, f32)>,
    attributes: Vec<(Arc<str>, String)>,
}

impl FeatureRow {
    #[must_use]
    pub fn new<I, S>(id: impl Into<RowId>, label: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<Arc<str>>,
    {
        Self {
            id: id.into(),
            label: label.into(),
            features: features.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            attributes: Vec::new(),
        }
    }

    /// Attach a display-only attribute (artist, year, ...)
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[inline]
    pub fn features(&self) -> &[(Arc<str>, f32)] {
        &self.features
    }

    #[inline]
    pub fn attributes(&self) -> &[(Arc<str>, String)] {
        &self.attributes
    }

    pub fn feature(&self, name: &str) -> Option<f32> {
        self.features
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| *v)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(n, _)| n.as_ref())
    }

    /// Project the row onto `feature_names`, in that order.
    ///
    /// Every requested feature must be present with a finite value; anything
    /// else means the index and the table disagree on schema.
    pub fn vector_for(&self, feature_names: &[String]) -> Result<Vec<f32>> {
        let mismatch = || Error::FeatureMismatch {
            index: feature_names.to_vec(),
            row: self.feature_names().map(str::to_string).collect(),
        };

        feature_names
            .iter()
            .map(|name| match self.feature(name) {
                Some(v) if v.is_finite() => Ok(v),
                _ => Err(mismatch()),
            })
            .collect()
    }
}

struct NamedValues<'a, V>(&'a [(Arc<str>, V)]);

impl<V: Serialize> Serialize for NamedValues<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name.as_ref(), value)?;
        }
        map.end()
    }
}

impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("FeatureRow", 4)?;
        row.serialize_field("id", &self.id)?;
        row.serialize_field("label", &self.label)?;
        row.serialize_field("features", &NamedValues(&self.features))?;
        row.serialize_field("attributes", &NamedValues(&self.attributes))?;
        row.end()
    }
}
