//! # amusic
//!
//! Nearest-neighbor recommendations over numeric audio feature tables.
//!
//! Each entity kind (songs, artists, genres, years) has a feature table
//! loaded from CSV and an exact k-NN index built over its audio features.
//! A query names a seed row and gets back the closest other rows, with the
//! seed itself and near-duplicate labels filtered out.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! amusic build --kind song --table data/data.csv --out data/data.idx
//! amusic serve --data-dir ./data --http-port 8642
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use amusic::prelude::*;
//! use std::sync::Arc;
//!
//! let features = vec!["energy".to_string(), "tempo".to_string()];
//! let rows = vec![
//!     FeatureRow::new("s1", "Blue", [("energy", 0.2), ("tempo", 0.5)]),
//!     FeatureRow::new("s2", "Green", [("energy", 0.3), ("tempo", 0.5)]),
//!     FeatureRow::new("s3", "Red", [("energy", 0.9), ("tempo", 0.1)]),
//! ];
//! let table = FeatureTable::new(EntityKind::Song, features, rows).unwrap();
//! let index = IndexBuilder::new().build_all(&table).unwrap();
//! let engine = RecommendationEngine::new(Arc::new(table), Arc::new(index));
//!
//! let response = engine.recommend(&RecommendRequest::new("s1", 1)).unwrap();
//! assert_eq!(response.result[0].label(), "Green");
//! ```
//!
//! ## Crate Structure
//!
//! - `amusic-core` - Feature tables, rows, metrics, the similarity index and its builder
//! - `amusic-recommend` - Query engine, diversity filtering, session lists
//! - `amusic-storage` - CSV loading, index artifacts, the per-kind catalog
//! - `amusic-api` - REST API

// Re-export core types
pub use amusic_core::{
    EntityKind, Error, FeatureRow, FeatureTable, IndexBuilder, Metric, Neighbor, Result, RowId,
    SimilarityIndex,
};

// Re-export the query engine
pub use amusic_recommend::{
    EngineConfig, ListKind, RecommendRequest, Recommendation, RecommendationEngine,
    RecommendationResponse, RecommendationStats, Session,
};

// Re-export storage
pub use amusic_storage::{artifact_path, table_path, Catalog, CatalogConfig, IndexArtifact, TableSchema};

// Re-export API
pub use amusic_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, CatalogConfig, EngineConfig, EntityKind, Error, FeatureRow, FeatureTable,
        IndexArtifact, IndexBuilder, Metric, RecommendRequest, Recommendation,
        RecommendationEngine, RecommendationResponse, RecommendationStats, Result, RowId, Session,
        TableSchema,
    };
}
