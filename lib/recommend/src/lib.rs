//! # amusic Recommend
//!
//! The recommendation query engine: the one call every caller of amusic
//! goes through.
//!
//! ## Features
//!
//! - **Self-exclusion**: the seed never comes back unless the caller asks for it
//! - **Over-fetch then filter**: candidates are pulled with headroom for filtering
//! - **Diversity**: duplicate labels are dropped, optionally near neighbors too
//! - **Graceful shortfall**: too few eligible rows yields a shorter list, not an error
//! - **Sessions**: explicit favorites / playlist context objects
//!
//! ## Example
//!
//! ```rust
//! use amusic_core::{EntityKind, FeatureRow, FeatureTable, IndexBuilder};
//! use amusic_recommend::{RecommendRequest, RecommendationEngine};
//! use std::sync::Arc;
//!
//! let features = vec!["x".to_string(), "y".to_string()];
//! let rows = vec![
//!     FeatureRow::new("A", "Track", [("x", 1.0), ("y", 0.0)]),
//!     FeatureRow::new("B", "Other", [("x", 1.0), ("y", 0.01)]),
//!     FeatureRow::new("C", "Far", [("x", 5.0), ("y", 5.0)]),
//!     FeatureRow::new("D", "Track", [("x", 1.0), ("y", 0.0)]),
//! ];
//! let table = FeatureTable::new(EntityKind::Song, features, rows).unwrap();
//! let index = IndexBuilder::new().build_all(&table).unwrap();
//!
//! let engine = RecommendationEngine::new(Arc::new(table), Arc::new(index));
//! let response = engine.recommend(&RecommendRequest::new("A", 2)).unwrap();
//! let labels: Vec<_> = response.result.iter().map(|r| r.label()).collect();
//! assert_eq!(labels, vec!["Other", "Far"]);
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Seed     │────>│   Index     │────>│  Exclude    │
//! │  (table)    │     │ (k * 2 NN)  │     │   (ids)     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                      ┌─────────────┐    ┌─────────────┐
//!                      │  Results    │<───│  Diversity  │
//!                      │ (annotated) │    │  (labels)   │
//!                      └─────────────┘    └─────────────┘
//! ```

pub mod config;
pub mod diversity;
pub mod engine;
pub mod explain;
pub mod session;

pub use config::{EngineConfig, DEFAULT_DIVERSITY, DEFAULT_OVER_FETCH_FACTOR};
pub use diversity::DiversityFilter;
pub use engine::{RecommendRequest, RecommendationEngine};
pub use explain::{Recommendation, RecommendationResponse, RecommendationStats};
pub use session::{LabelList, ListKind, Session};
