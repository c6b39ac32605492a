//! Caller-facing result records

use amusic_core::{FeatureRow, RowId};
use serde::Serialize;

/// One recommended entity, annotated with its full row and raw distance.
///
/// Serializes flat as `{id, label, features, attributes, distance}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub row: FeatureRow,
    pub distance: f32,
}

impl Recommendation {
    pub fn id(&self) -> &RowId {
        &self.row.id
    }

    pub fn label(&self) -> &str {
        &self.row.label
    }
}

/// Summary of a recommendation call, for logs and API responses
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationStats {
    pub requested: usize,
    pub returned: usize,
    /// Candidates pulled from the index on the last pass
    pub candidates: usize,
    pub diversity: f32,
}

impl RecommendationStats {
    pub fn is_short(&self) -> bool {
        self.returned < self.requested
    }
}

/// Full answer of the engine: ordered results plus stats
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub seed: RowId,
    pub result: Vec<Recommendation>,
    pub stats: RecommendationStats,
}
