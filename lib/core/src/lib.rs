//! # amusic Core
//!
//! Core library for the amusic recommendation engine.
//!
//! This crate provides the data contracts and the query primitive:
//!
//! - [`FeatureRow`] - An entity with id, display label and numeric features
//! - [`FeatureTable`] - Immutable table of rows sharing one feature set
//! - [`IndexBuilder`] - Builds a similarity index from a table snapshot
//! - [`SimilarityIndex`] - Exact k-nearest-neighbor search in feature space
//!
//! ## Example
//!
//! ```rust
//! use amusic_core::{EntityKind, FeatureRow, FeatureTable, IndexBuilder};
//!
//! let features = vec!["energy".to_string(), "valence".to_string()];
//! let rows = vec![
//!     FeatureRow::new("a", "Song A", [("energy", 0.9), ("valence", 0.1)]),
//!     FeatureRow::new("b", "Song B", [("energy", 0.8), ("valence", 0.2)]),
//!     FeatureRow::new("c", "Song C", [("energy", 0.1), ("valence", 0.9)]),
//! ];
//! let table = FeatureTable::new(EntityKind::Song, features.clone(), rows).unwrap();
//!
//! let index = IndexBuilder::new().build(&table, &features).unwrap();
//! let hits = index.k_nearest(&[0.9, 0.1], 2).unwrap();
//! assert_eq!(hits[0].id.to_string(), "a");
//! ```

pub mod builder;
pub mod error;
pub mod index;
pub mod kind;
pub mod metric;
pub mod row;
pub mod table;

pub use builder::IndexBuilder;
pub use error::{Error, Result};
pub use index::{IndexState, Neighbor, SimilarityIndex, MIN_INDEX_ROWS};
pub use kind::{EntityKind, DEFAULT_FEATURES};
pub use metric::Metric;
pub use row::{FeatureRow, RowId};
pub use table::FeatureTable;
