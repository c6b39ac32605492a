//! Per-kind engine catalog
//!
//! Opened once at process start from a data directory laid out as
//!
//! ```text
//! data_dir/
//!   data.csv              data.idx
//!   data_by_artist.csv    data_by_artist.idx
//!   data_by_genres.csv    data_by_genres.idx
//!   data_by_year.csv      data_by_year.idx
//! ```
//!
//! Kinds without a table file are skipped. A table without an artifact is
//! either indexed on the spot (`build_missing`) or skipped.

use amusic_core::{EntityKind, Error, IndexBuilder, Metric, Result};
use amusic_recommend::{EngineConfig, RecommendationEngine};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::artifact::IndexArtifact;
use crate::loader::{load_table, TableSchema};

/// How a catalog is opened
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub data_dir: PathBuf,
    pub kinds: Vec<EntityKind>,
    pub engine: EngineConfig,
    /// Build and save an index for tables that have no artifact yet
    pub build_missing: bool,
    /// Metric for indexes built by the catalog
    pub metric: Metric,
}

impl CatalogConfig {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            kinds: EntityKind::ALL.to_vec(),
            engine: EngineConfig::default(),
            build_missing: false,
            metric: Metric::default(),
        }
    }
}

/// Loaded recommendation engines, one per entity kind
#[derive(Debug, Default)]
pub struct Catalog {
    engines: BTreeMap<EntityKind, Arc<RecommendationEngine>>,
}

impl Catalog {
    pub fn open(config: &CatalogConfig) -> Result<Self> {
        config.engine.validate()?;

        let mut catalog = Catalog::default();
        for &kind in &config.kinds {
            let table_path = table_path(&config.data_dir, kind);
            if !table_path.exists() {
                info!("No {} table at {:?}, kind not served", kind, table_path);
                continue;
            }
            let (table, _) = load_table(&table_path, &TableSchema::for_kind(kind))?;

            let artifact_path = artifact_path(&config.data_dir, kind);
            let artifact = if artifact_path.exists() {
                let artifact = IndexArtifact::load(&artifact_path)?;
                if artifact.info.kind != kind {
                    return Err(Error::Artifact(format!(
                        "{:?} holds a {} index, expected {}",
                        artifact_path, artifact.info.kind, kind
                    )));
                }
                artifact
            } else if config.build_missing {
                let index = IndexBuilder::new().with_metric(config.metric).build_all(&table)?;
                let artifact = IndexArtifact::new(kind, index)?;
                artifact.save(&artifact_path)?;
                artifact
            } else {
                warn!(
                    "No index artifact for {} at {:?}, kind not served",
                    kind, artifact_path
                );
                continue;
            };

            if let Some(missing) = artifact
                .info
                .feature_names
                .iter()
                .find(|name| !table.has_feature(name))
            {
                warn!(
                    "{} index uses feature '{}' absent from the table; queries will fail until rebuilt",
                    kind, missing
                );
            }

            let engine = RecommendationEngine::with_config(
                Arc::new(table),
                Arc::new(artifact.index),
                config.engine,
            )?;
            catalog.insert(Arc::new(engine));
        }

        if catalog.is_empty() {
            return Err(Error::Configuration(format!(
                "no servable feature tables in {:?}",
                config.data_dir
            )));
        }
        info!(
            "Catalog ready: {}",
            catalog.kinds().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(catalog)
    }

    /// Register an engine, replacing any previous one of the same kind
    pub fn insert(&mut self, engine: Arc<RecommendationEngine>) {
        self.engines.insert(engine.kind(), engine);
    }

    pub fn engine(&self, kind: EntityKind) -> Option<Arc<RecommendationEngine>> {
        self.engines.get(&kind).cloned()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.engines.keys().copied()
    }

    pub fn engines(&self) -> impl Iterator<Item = &Arc<RecommendationEngine>> {
        self.engines.values()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

/// Conventional CSV location of a kind's feature table
pub fn table_path(data_dir: &Path, kind: EntityKind) -> PathBuf {
    data_dir.join(format!("{}.csv", kind.file_stem()))
}

/// Conventional location of a kind's index artifact
pub fn artifact_path(data_dir: &Path, kind: EntityKind) -> PathBuf {
    data_dir.join(format!("{}.idx", kind.file_stem()))
}
