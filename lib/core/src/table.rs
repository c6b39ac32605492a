use ahash::{AHashMap, AHashSet};

use crate::{EntityKind, Error, FeatureRow, Result, RowId};

/// Immutable table of entities sharing one declared feature set
///
/// Rows keep their insertion order; index construction and tie-breaking
/// both depend on it.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    kind: EntityKind,
    feature_names: Vec<String>,
    rows: Vec<FeatureRow>,
    by_id: AHashMap<RowId, usize>,
}

impl FeatureTable {
    /// Build a table, checking that every row carries exactly the declared
    /// features with finite values and that ids are unique.
    pub fn new(kind: EntityKind, feature_names: Vec<String>, rows: Vec<FeatureRow>) -> Result<Self> {
        validate_feature_names(&feature_names)?;

        let mut by_id = AHashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            row.vector_for(&feature_names)?;
            if row.features().len() != feature_names.len() {
                return Err(Error::FeatureMismatch {
                    index: feature_names.clone(),
                    row: row.feature_names().map(str::to_string).collect(),
                });
            }
            if by_id.insert(row.id.clone(), pos).is_some() {
                return Err(Error::DuplicateRow(row.id.to_string()));
            }
        }

        Ok(Self {
            kind,
            feature_names,
            rows,
            by_id,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.feature_names.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_by_id(&self, id: &RowId) -> Option<&FeatureRow> {
        self.by_id.get(id).map(|&pos| &self.rows[pos])
    }

    /// Position of a row in insertion order
    pub fn position(&self, id: &RowId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// All rows carrying `label`, in insertion order
    pub fn rows_by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a FeatureRow> + 'a {
        self.rows.iter().filter(move |row| row.label == label)
    }

    /// Every row, in insertion order, for index construction
    pub fn feature_matrix(&self) -> &[FeatureRow] {
        &self.rows
    }
}

pub(crate) fn validate_feature_names(feature_names: &[String]) -> Result<()> {
    if feature_names.is_empty() {
        return Err(Error::Configuration(
            "at least one feature column is required".to_string(),
        ));
    }
    let mut seen = AHashSet::with_capacity(feature_names.len());
    for name in feature_names {
        if name.trim().is_empty() {
            return Err(Error::Configuration("feature name cannot be blank".to_string()));
        }
        if !seen.insert(name.as_str()) {
            return Err(Error::Configuration(format!(
                "feature '{}' declared more than once",
                name
            )));
        }
    }
    Ok(())
}
