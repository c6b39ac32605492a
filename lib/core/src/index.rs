use ahash::AHashSet;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BinaryHeap;

use crate::table::validate_feature_names;
use crate::{Error, Metric, Result, RowId};

/// Above this many rows distances are evaluated on the rayon pool
const PARALLEL_SCAN_THRESHOLD: usize = 8_192;

/// Minimum rows for a useful index: the seed plus one neighbor
pub const MIN_INDEX_ROWS: usize = 2;

/// One hit of a k-nearest query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    /// Row position in the snapshot the index was built from
    pub position: usize,
    pub id: &'a RowId,
    pub distance: f32,
}

/// Candidate ordered by (distance, insertion position) so ties go to the
/// earlier row and the heap top is always the worst kept candidate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    dist: OrderedFloat<f32>,
    pos: usize,
}

/// Exported state of an index, consumed by the artifact layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexState {
    pub feature_names: Vec<String>,
    pub metric: Metric,
    pub ids: Vec<RowId>,
    /// Row-major, `ids.len() * feature_names.len()` values
    pub vectors: Vec<f32>,
}

/// Exact nearest-neighbor index over a fixed feature set
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    feature_names: Vec<String>,
    metric: Metric,
    ids: Vec<RowId>,
    vectors: Vec<f32>,
}

impl SimilarityIndex {
    pub(crate) fn from_parts(
        feature_names: Vec<String>,
        metric: Metric,
        ids: Vec<RowId>,
        vectors: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(vectors.len(), ids.len() * feature_names.len());
        Self {
            feature_names,
            metric,
            ids,
            vectors,
        }
    }

    /// Restore an index from exported state, re-checking every invariant
    /// the builder guarantees.
    pub fn from_state(state: IndexState) -> Result<Self> {
        validate_feature_names(&state.feature_names)?;

        let dim = state.feature_names.len();
        if state.vectors.len() != state.ids.len() * dim {
            return Err(Error::Artifact(format!(
                "{} values cannot hold {} rows of {} features",
                state.vectors.len(),
                state.ids.len(),
                dim
            )));
        }
        if state.ids.len() < MIN_INDEX_ROWS {
            return Err(Error::InsufficientData {
                rows: state.ids.len(),
                required: MIN_INDEX_ROWS,
            });
        }
        if state.vectors.iter().any(|v| !v.is_finite()) {
            return Err(Error::Artifact("non-finite feature value".to_string()));
        }
        let mut seen = AHashSet::with_capacity(state.ids.len());
        for id in &state.ids {
            if !seen.insert(id) {
                return Err(Error::DuplicateRow(id.to_string()));
            }
        }

        Ok(Self::from_parts(
            state.feature_names,
            state.metric,
            state.ids,
            state.vectors,
        ))
    }

    pub fn export(&self) -> IndexState {
        IndexState {
            feature_names: self.feature_names.clone(),
            metric: self.metric,
            ids: self.ids.clone(),
            vectors: self.vectors.clone(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.feature_names.len()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }

    #[inline]
    pub fn vector(&self, position: usize) -> &[f32] {
        let dim = self.dim();
        &self.vectors[position * dim..(position + 1) * dim]
    }

    /// The `k` rows closest to `point`, ascending distance, ties by position.
    ///
    /// Returns `min(k, len)` neighbors. The point must have exactly one
    /// component per indexed feature.
    pub fn k_nearest(&self, point: &[f32], k: usize) -> Result<Vec<Neighbor<'_>>> {
        if point.len() != self.dim() {
            return Err(Error::ShapeMismatch {
                expected: self.dim(),
                actual: point.len(),
            });
        }
        if k == 0 {
            return Err(Error::Configuration("k must be positive".to_string()));
        }
        if point.iter().any(|v| !v.is_finite()) {
            return Err(Error::Configuration(
                "query point has non-finite components".to_string(),
            ));
        }

        let distances = self.scan(point);
        let k = k.min(distances.len());

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for (pos, dist) in distances.into_iter().enumerate() {
            let candidate = Candidate {
                dist: OrderedFloat(dist),
                pos,
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                position: c.pos,
                id: &self.ids[c.pos],
                distance: c.dist.into_inner(),
            })
            .collect())
    }

    fn scan(&self, point: &[f32]) -> Vec<f32> {
        let dim = self.dim();
        let metric = self.metric;
        if self.len() >= PARALLEL_SCAN_THRESHOLD {
            self.vectors
                .par_chunks_exact(dim)
                .map(|row| metric.distance(point, row))
                .collect()
        } else {
            self.vectors
                .chunks_exact(dim)
                .map(|row| metric.distance(point, row))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(rows: &[(&str, [f32; 2])]) -> SimilarityIndex {
        SimilarityIndex::from_parts(
            vec!["x".to_string(), "y".to_string()],
            Metric::Euclidean,
            rows.iter().map(|(id, _)| RowId::from(*id)).collect(),
            rows.iter().flat_map(|(_, v)| v.iter().copied()).collect(),
        )
    }

    #[test]
    fn test_k_nearest_ascending() {
        let idx = index(&[("a", [0.0, 0.0]), ("b", [3.0, 4.0]), ("c", [1.0, 0.0])]);
        let hits = idx.k_nearest(&[0.0, 0.0], 3).unwrap();
        let ids: Vec<_> = hits.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert!((hits[2].distance - 5.0).abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let idx = index(&[
            ("far", [9.0, 9.0]),
            ("first", [1.0, 0.0]),
            ("second", [0.0, 1.0]),
            ("third", [-1.0, 0.0]),
        ]);
        let hits = idx.k_nearest(&[0.0, 0.0], 2).unwrap();
        let ids: Vec<_> = hits.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(hits[0].position, 1);
    }

    #[test]
    fn test_k_larger_than_index_truncates() {
        let idx = index(&[("a", [0.0, 0.0]), ("b", [1.0, 1.0])]);
        assert_eq!(idx.k_nearest(&[0.0, 0.0], 50).unwrap().len(), 2);
    }

    #[test]
    fn test_shape_mismatch() {
        let idx = index(&[("a", [0.0, 0.0]), ("b", [1.0, 1.0])]);
        for point in [vec![0.0], vec![0.0, 0.0, 0.0], vec![]] {
            let err = idx.k_nearest(&point, 1).unwrap_err();
            assert!(matches!(err, Error::ShapeMismatch { expected: 2, .. }));
        }
    }

    #[test]
    fn test_zero_k_rejected() {
        let idx = index(&[("a", [0.0, 0.0]), ("b", [1.0, 1.0])]);
        assert!(matches!(
            idx.k_nearest(&[0.0, 0.0], 0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_state_roundtrip_and_validation() {
        let idx = index(&[("a", [0.0, 0.0]), ("b", [1.0, 1.0])]);
        let restored = SimilarityIndex::from_state(idx.export()).unwrap();
        assert_eq!(restored.export(), idx.export());

        let mut truncated = idx.export();
        truncated.vectors.pop();
        assert!(matches!(
            SimilarityIndex::from_state(truncated),
            Err(Error::Artifact(_))
        ));

        let mut duplicated = idx.export();
        duplicated.ids[1] = RowId::from("a");
        assert!(matches!(
            SimilarityIndex::from_state(duplicated),
            Err(Error::DuplicateRow(_))
        ));
    }

    #[test]
    fn test_parallel_scan_matches_sequential_order() {
        let n = PARALLEL_SCAN_THRESHOLD + 10;
        let ids: Vec<RowId> = (0..n as u64).map(RowId::from).collect();
        let vectors: Vec<f32> = (0..n).flat_map(|i| [(i % 7) as f32, 0.0]).collect();
        let idx = SimilarityIndex::from_parts(
            vec!["x".to_string(), "y".to_string()],
            Metric::Euclidean,
            ids,
            vectors,
        );
        let hits = idx.k_nearest(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<_> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 7, 14]);
    }
}
