//! CSV feature table loading
//!
//! The header row is resolved once against a declared [`TableSchema`].
//! Declared id, label and feature columns must exist; attribute columns are
//! display-only and may be absent. Rows with an empty id or a missing or
//! non-numeric feature cell are skipped and counted.

use amusic_core::{EntityKind, Error, FeatureRow, FeatureTable, Result, RowId};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Column layout of a feature table source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub kind: EntityKind,
    pub id_column: String,
    pub label_column: String,
    #[serde(default)]
    pub attribute_columns: Vec<String>,
    pub feature_columns: Vec<String>,
}

impl TableSchema {
    /// Conventional layout for `kind`
    pub fn for_kind(kind: EntityKind) -> Self {
        Self {
            kind,
            id_column: kind.id_column().to_string(),
            label_column: kind.label_column().to_string(),
            attribute_columns: kind.attribute_columns().iter().map(|s| s.to_string()).collect(),
            feature_columns: kind.default_features(),
        }
    }

    #[must_use]
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_columns = features;
        self
    }
}

/// Outcome of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Load a feature table from a CSV file
pub fn load_table<P: AsRef<Path>>(path: P, schema: &TableSchema) -> Result<(FeatureTable, LoadReport)> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let (table, report) = read_table(file, schema)?;
    info!(
        "Loaded {} table from {:?}: {} rows, {} skipped",
        schema.kind, path, report.loaded, report.skipped
    );
    Ok((table, report))
}

/// Load a feature table from any CSV source
pub fn read_table<R: Read>(source: R, schema: &TableSchema) -> Result<(FeatureTable, LoadReport)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| Error::Serialization(format!("unreadable CSV header: {}", e)))?
        .clone();
    let layout = ColumnLayout::resolve(&headers, schema)?;

    let mut rows = Vec::new();
    let mut report = LoadReport::default();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Serialization(format!("CSV record {}: {}", line + 2, e)))?;
        match layout.row(&record) {
            Some(row) => rows.push(row),
            None => {
                report.skipped += 1;
                debug!("Skipped CSV record {}: missing id or feature value", line + 2);
            }
        }
    }
    report.loaded = rows.len();

    if report.skipped > 0 {
        warn!(
            "{} {} rows skipped for missing or non-numeric values",
            report.skipped, schema.kind
        );
    }

    let table = FeatureTable::new(schema.kind, schema.feature_columns.clone(), rows)?;
    Ok((table, report))
}

/// Header positions resolved once per file
struct ColumnLayout {
    id: usize,
    label: usize,
    features: Vec<(Arc<str>, usize)>,
    attributes: Vec<(Arc<str>, usize)>,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, schema: &TableSchema) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| {
                Error::Configuration(format!(
                    "column '{}' missing from {} table header",
                    name, schema.kind
                ))
            })
        };

        let features = schema
            .feature_columns
            .iter()
            .map(|name| Ok((Arc::from(name.as_str()), required(name)?)))
            .collect::<Result<Vec<_>>>()?;

        let attributes = schema
            .attribute_columns
            .iter()
            .filter_map(|name| match position(name) {
                Some(pos) => Some((Arc::from(name.as_str()), pos)),
                None => {
                    debug!("attribute column '{}' absent, not loaded", name);
                    None
                }
            })
            .collect();

        Ok(Self {
            id: required(&schema.id_column)?,
            label: required(&schema.label_column)?,
            features,
            attributes,
        })
    }

    fn row(&self, record: &StringRecord) -> Option<FeatureRow> {
        let raw_id = record.get(self.id).filter(|s| !s.is_empty())?;
        let id = RowId::parse(raw_id);
        let label = match record.get(self.label) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => raw_id.to_string(),
        };

        let mut values = Vec::with_capacity(self.features.len());
        for (name, pos) in &self.features {
            let value = record.get(*pos)?.parse::<f32>().ok().filter(|v| v.is_finite())?;
            values.push((name.clone(), value));
        }

        let mut row = FeatureRow::new(id, label, values);
        for (name, pos) in &self.attributes {
            if let Some(value) = record.get(*pos).filter(|s| !s.is_empty()) {
                row = row.with_attribute(name.clone(), value);
            }
        }
        Some(row)
    }
}
