//! Recommendation query engine
//!
//! Resolves a seed row, over-fetches neighbors from the similarity index,
//! then walks them closest first dropping excluded ids and near-duplicates
//! until the requested count is reached.

use ahash::AHashSet;
use amusic_core::{EntityKind, Error, FeatureRow, FeatureTable, Neighbor, Result, RowId, SimilarityIndex};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::EngineConfig;
use crate::diversity::DiversityFilter;
use crate::explain::{Recommendation, RecommendationResponse, RecommendationStats};

/// Parameters of one recommendation call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendRequest {
    pub seed: RowId,
    pub count: usize,
    /// Falls back to the engine's default diversity when unset
    #[serde(default)]
    pub diversity: Option<f32>,
    /// Ids never returned. Unset means `{seed}`; an explicit set replaces it.
    #[serde(default)]
    pub exclude: Option<Vec<RowId>>,
}

impl RecommendRequest {
    pub fn new(seed: impl Into<RowId>, count: usize) -> Self {
        Self {
            seed: seed.into(),
            count,
            diversity: None,
            exclude: None,
        }
    }

    #[must_use]
    pub fn with_diversity(mut self, diversity: f32) -> Self {
        self.diversity = Some(diversity);
        self
    }

    #[must_use]
    pub fn with_exclude<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RowId>,
    {
        self.exclude = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// Answers recommendation queries for one entity kind
///
/// Holds shared read-only handles to a feature table and the index built
/// from it; any number of threads may query one engine at once.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    table: Arc<FeatureTable>,
    index: Arc<SimilarityIndex>,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(table: Arc<FeatureTable>, index: Arc<SimilarityIndex>) -> Self {
        Self {
            table,
            index,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(
        table: Arc<FeatureTable>,
        index: Arc<SimilarityIndex>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table,
            index,
            config,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.table.kind()
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recommend entities similar to `request.seed`.
    ///
    /// Fails only before the index is consulted: unknown seed, zero count,
    /// or a seed row that no longer carries the indexed features. A shortfall
    /// after filtering comes back as a shorter list.
    pub fn recommend(&self, request: &RecommendRequest) -> Result<RecommendationResponse> {
        if request.count == 0 {
            return Err(Error::Configuration(
                "requested count must be positive".to_string(),
            ));
        }

        let seed = self
            .table
            .row_by_id(&request.seed)
            .ok_or_else(|| Error::SeedNotFound(request.seed.to_string()))?;
        let point = seed.vector_for(self.index.feature_names())?;

        let diversity = request.diversity.unwrap_or(self.config.default_diversity);
        let exclude: AHashSet<&RowId> = match &request.exclude {
            Some(ids) => ids.iter().collect(),
            None => std::iter::once(&seed.id).collect(),
        };

        let mut k = request
            .count
            .saturating_mul(self.config.over_fetch_factor)
            .min(self.index.len())
            .max(1);

        loop {
            let neighbors = self.index.k_nearest(&point, k)?;
            let (result, effective_diversity) = self.select(seed, &neighbors, request.count, &exclude, diversity);

            let exhausted = k >= self.index.len();
            if result.len() >= request.count || exhausted || !self.config.widen_on_shortfall {
                let stats = RecommendationStats {
                    requested: request.count,
                    returned: result.len(),
                    candidates: neighbors.len(),
                    diversity: effective_diversity,
                };
                debug!(
                    "{} recommend seed={} requested={} returned={} candidates={}",
                    self.kind(),
                    seed.id,
                    stats.requested,
                    stats.returned,
                    stats.candidates
                );
                return Ok(RecommendationResponse {
                    seed: seed.id.clone(),
                    result,
                    stats,
                });
            }

            k = k.saturating_mul(2).min(self.index.len());
        }
    }

    /// Recommend from the first row carrying `label`, in table order
    pub fn recommend_by_label(
        &self,
        label: &str,
        count: usize,
        diversity: Option<f32>,
    ) -> Result<RecommendationResponse> {
        let seed = self
            .table
            .rows_by_label(label)
            .next()
            .ok_or_else(|| Error::SeedNotFound(label.to_string()))?;
        let request = RecommendRequest {
            seed: seed.id.clone(),
            count,
            diversity,
            exclude: None,
        };
        self.recommend(&request)
    }

    /// Greedy pass over candidates, closest first. Returns accepted results
    /// and the effective diversity.
    fn select(
        &self,
        seed: &FeatureRow,
        neighbors: &[Neighbor<'_>],
        count: usize,
        exclude: &AHashSet<&RowId>,
        diversity: f32,
    ) -> (Vec<Recommendation>, f32) {
        let mut filter = DiversityFilter::new(diversity, self.config.min_separation, self.index.metric());
        if exclude.contains(&seed.id) {
            filter.reserve_label(&seed.label);
        }

        let mut result = Vec::with_capacity(count);
        for neighbor in neighbors {
            if result.len() >= count {
                break;
            }
            if exclude.contains(neighbor.id) {
                continue;
            }
            let Some(row) = self.table.row_by_id(neighbor.id) else {
                debug!("index row {} missing from {} table, skipped", neighbor.id, self.kind());
                continue;
            };
            if !filter.admit(&row.label, self.index.vector(neighbor.position)) {
                continue;
            }
            result.push(Recommendation {
                row: row.clone(),
                distance: neighbor.distance,
            });
        }

        (result, filter.diversity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amusic_core::IndexBuilder;

    fn engine_with(rows: Vec<FeatureRow>, config: EngineConfig) -> RecommendationEngine {
        let features = vec!["x".to_string(), "y".to_string()];
        let table = FeatureTable::new(EntityKind::Song, features, rows).unwrap();
        let index = IndexBuilder::new().build_all(&table).unwrap();
        RecommendationEngine::with_config(Arc::new(table), Arc::new(index), config).unwrap()
    }

    fn row(id: &str, label: &str, x: f32, y: f32) -> FeatureRow {
        FeatureRow::new(id, label, [("x", x), ("y", y)])
    }

    fn ids(response: &RecommendationResponse) -> Vec<String> {
        response.result.iter().map(|r| r.id().to_string()).collect()
    }

    fn scenario() -> RecommendationEngine {
        engine_with(
            vec![
                row("A", "Track", 1.0, 0.0),
                row("B", "Other", 1.0, 0.01),
                row("C", "Far", 5.0, 5.0),
                row("D", "Track", 1.0, 0.0),
            ],
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_seed_and_duplicate_label_excluded() {
        let response = scenario().recommend(&RecommendRequest::new("A", 2)).unwrap();
        assert_eq!(ids(&response), vec!["B", "C"]);
        assert!(response.result[0].distance <= response.result[1].distance);
    }

    #[test]
    fn test_zero_diversity_keeps_duplicate_labels() {
        let request = RecommendRequest::new("A", 2).with_diversity(0.0);
        let response = scenario().recommend(&request).unwrap();
        assert_eq!(ids(&response), vec!["D", "B"]);
    }

    #[test]
    fn test_explicit_exclude_replaces_default() {
        let request = RecommendRequest::new("A", 2)
            .with_diversity(0.0)
            .with_exclude(["B"]);
        let response = scenario().recommend(&request).unwrap();
        assert_eq!(ids(&response), vec!["A", "D"]);
    }

    #[test]
    fn test_unknown_seed() {
        let err = scenario().recommend(&RecommendRequest::new("nope", 2)).unwrap_err();
        assert!(matches!(err, Error::SeedNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = scenario().recommend(&RecommendRequest::new("A", 0)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_shortfall_is_not_an_error() {
        let response = scenario().recommend(&RecommendRequest::new("A", 10)).unwrap();
        assert_eq!(ids(&response), vec!["B", "C"]);
        assert!(response.stats.is_short());
    }

    #[test]
    fn test_widening_fills_request_past_duplicates() {
        let mut rows = vec![row("seed", "Seed", 0.0, 0.0)];
        for i in 0..6 {
            rows.push(row(&format!("dup{}", i), "Same", 0.1 + i as f32 * 0.01, 0.0));
        }
        rows.push(row("u1", "Unique 1", 3.0, 0.0));
        rows.push(row("u2", "Unique 2", 4.0, 0.0));

        let widened = engine_with(rows.clone(), EngineConfig::default());
        let response = widened.recommend(&RecommendRequest::new("seed", 3)).unwrap();
        assert_eq!(ids(&response), vec!["dup0", "u1", "u2"]);

        let fixed = engine_with(
            rows,
            EngineConfig {
                widen_on_shortfall: false,
                ..Default::default()
            },
        );
        let response = fixed.recommend(&RecommendRequest::new("seed", 3)).unwrap();
        assert_eq!(ids(&response), vec!["dup0"]);
    }

    #[test]
    fn test_min_separation_rejects_near_neighbors() {
        let rows = vec![
            row("s", "S", 0.0, 0.0),
            row("a", "A", 1.0, 0.0),
            row("b", "B", 1.1, 0.0),
            row("c", "C", 3.0, 0.0),
        ];
        let config = EngineConfig {
            min_separation: 1.0,
            ..Default::default()
        };
        let engine = engine_with(rows, config);

        let spread = engine
            .recommend(&RecommendRequest::new("s", 2).with_diversity(1.0))
            .unwrap();
        assert_eq!(ids(&spread), vec!["a", "c"]);

        let tight = engine
            .recommend(&RecommendRequest::new("s", 2).with_diversity(0.05))
            .unwrap();
        assert_eq!(ids(&tight), vec!["a", "b"]);
    }

    #[test]
    fn test_recommend_by_label_uses_first_row() {
        let response = scenario().recommend_by_label("Track", 1, None).unwrap();
        assert_eq!(response.seed, RowId::from("A"));
        assert_eq!(ids(&response), vec!["B"]);

        assert!(matches!(
            scenario().recommend_by_label("Missing", 1, None),
            Err(Error::SeedNotFound(_))
        ));
    }

    #[test]
    fn test_stale_index_detected() {
        let features = vec!["x".to_string(), "y".to_string()];
        let old = FeatureTable::new(
            EntityKind::Song,
            features,
            vec![row("A", "a", 0.0, 0.0), row("B", "b", 1.0, 1.0)],
        )
        .unwrap();
        let index = IndexBuilder::new().build_all(&old).unwrap();

        let drifted = FeatureTable::new(
            EntityKind::Song,
            vec!["x".to_string(), "z".to_string()],
            vec![
                FeatureRow::new("A", "a", [("x", 0.0), ("z", 0.0)]),
                FeatureRow::new("B", "b", [("x", 1.0), ("z", 1.0)]),
            ],
        )
        .unwrap();

        let engine = RecommendationEngine::new(Arc::new(drifted), Arc::new(index));
        let err = engine.recommend(&RecommendRequest::new("A", 1)).unwrap_err();
        assert!(err.is_stale_index());
    }
}
