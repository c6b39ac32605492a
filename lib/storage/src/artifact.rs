//! Index artifact persistence
//!
//! An artifact is a bincode envelope around a gzip-compressed JSON
//! [`IndexState`]. The envelope carries a format version and a SHA-256 of the
//! payload; both are verified before the index is rebuilt.

use amusic_core::{EntityKind, Error, IndexState, Metric, Result, SimilarityIndex};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Current artifact layout version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    kind: EntityKind,
    built_at: String,
    checksum: String,
    payload: Vec<u8>,
}

/// Artifact metadata, readable without keeping the index around
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub format_version: u32,
    pub kind: EntityKind,
    pub built_at: String,
    pub checksum: String,
    pub metric: Metric,
    pub feature_names: Vec<String>,
    pub rows: usize,
    /// Compressed payload size in bytes
    pub payload_size: usize,
}

/// A similarity index together with its artifact metadata
#[derive(Debug, Clone)]
pub struct IndexArtifact {
    pub info: ArtifactInfo,
    pub index: SimilarityIndex,
}

impl IndexArtifact {
    /// Wrap a freshly built index, stamping the build time
    pub fn new(kind: EntityKind, index: SimilarityIndex) -> Result<Self> {
        Self::with_built_at(kind, index, Utc::now())
    }

    fn with_built_at(kind: EntityKind, index: SimilarityIndex, built_at: DateTime<Utc>) -> Result<Self> {
        let payload = compress_state(&index.export())?;
        let info = ArtifactInfo {
            format_version: ARTIFACT_FORMAT_VERSION,
            kind,
            built_at: built_at.to_rfc3339(),
            checksum: checksum(&payload),
            metric: index.metric(),
            feature_names: index.feature_names().to_vec(),
            rows: index.len(),
            payload_size: payload.len(),
        };
        Ok(Self { info, index })
    }

    /// Serialize to the on-disk byte layout
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = compress_state(&self.index.export())?;
        let envelope = ArtifactEnvelope {
            format_version: self.info.format_version,
            kind: self.info.kind,
            built_at: self.info.built_at.clone(),
            checksum: checksum(&payload),
            payload,
        };
        bincode::serialize(&envelope).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse and verify an artifact
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let envelope: ArtifactEnvelope = bincode::deserialize(bytes)
            .map_err(|e| Error::Artifact(format!("unreadable envelope: {}", e)))?;

        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::Artifact(format!(
                "unsupported format version {} (expected {})",
                envelope.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let actual = checksum(&envelope.payload);
        if actual != envelope.checksum {
            return Err(Error::Artifact(format!(
                "checksum mismatch: recorded {}, computed {}",
                envelope.checksum, actual
            )));
        }

        let state: IndexState = serde_json::from_reader(GzDecoder::new(envelope.payload.as_slice()))
            .map_err(|e| Error::Artifact(format!("corrupt payload: {}", e)))?;
        let index = SimilarityIndex::from_state(state)?;

        let info = ArtifactInfo {
            format_version: envelope.format_version,
            kind: envelope.kind,
            built_at: envelope.built_at,
            checksum: envelope.checksum,
            metric: index.metric(),
            feature_names: index.feature_names().to_vec(),
            rows: index.len(),
            payload_size: envelope.payload.len(),
        };
        Ok(Self { info, index })
    }

    /// Write atomically; readers never observe a partial file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.encode()?;
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&bytes))
            .map_err(|e| match e {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
            })?;
        info!(
            "Saved {} index artifact to {:?} ({} rows, {} bytes)",
            self.info.kind,
            path,
            self.info.rows,
            bytes.len()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let artifact = Self::decode(&bytes)?;
        info!(
            "Loaded {} index artifact from {:?} ({} rows, built {})",
            artifact.info.kind, path, artifact.info.rows, artifact.info.built_at
        );
        Ok(artifact)
    }
}

fn compress_state(state: &IndexState) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, state).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(encoder.finish()?)
}

fn checksum(payload: &[u8]) -> String {
    format!("{:x}", Sha256::digest(payload))
}
