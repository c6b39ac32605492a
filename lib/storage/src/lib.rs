//! # amusic Storage
//!
//! Everything that touches the filesystem: CSV feature tables in, index
//! artifacts in and out, and the per-kind [`Catalog`] assembled from both.

pub mod artifact;
pub mod catalog;
pub mod loader;

pub use artifact::{ArtifactInfo, IndexArtifact, ARTIFACT_FORMAT_VERSION};
pub use catalog::{artifact_path, table_path, Catalog, CatalogConfig};
pub use loader::{load_table, read_table, LoadReport, TableSchema};
