use tracing::info;

use crate::index::MIN_INDEX_ROWS;
use crate::table::validate_feature_names;
use crate::{Error, FeatureTable, Metric, Result, SimilarityIndex};

/// Builds a [`SimilarityIndex`] from one feature table snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexBuilder {
    metric: Metric,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Build over `feature_names`, which must all be feature columns of `table`.
    ///
    /// Rows are indexed in table order, so the same snapshot and feature list
    /// always answer queries identically.
    pub fn build(&self, table: &FeatureTable, feature_names: &[String]) -> Result<SimilarityIndex> {
        validate_feature_names(feature_names)?;
        if let Some(missing) = feature_names.iter().find(|f| !table.has_feature(f)) {
            return Err(Error::Configuration(format!(
                "feature '{}' is not a column of the {} table",
                missing,
                table.kind()
            )));
        }
        if table.len() < MIN_INDEX_ROWS {
            return Err(Error::InsufficientData {
                rows: table.len(),
                required: MIN_INDEX_ROWS,
            });
        }

        let rows = table.feature_matrix();
        let mut ids = Vec::with_capacity(rows.len());
        let mut vectors = Vec::with_capacity(rows.len() * feature_names.len());
        for row in rows {
            vectors.extend(row.vector_for(feature_names)?);
            ids.push(row.id.clone());
        }

        info!(
            "Built {} index over {} rows, {} features, {} metric",
            table.kind(),
            ids.len(),
            feature_names.len(),
            self.metric
        );

        Ok(SimilarityIndex::from_parts(
            feature_names.to_vec(),
            self.metric,
            ids,
            vectors,
        ))
    }

    /// Build over every feature column the table declares
    pub fn build_all(&self, table: &FeatureTable) -> Result<SimilarityIndex> {
        self.build(table, table.feature_names())
    }
}
