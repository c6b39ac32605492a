//! Greedy diversity filter applied to over-fetched candidates
//!
//! Candidates arrive closest first. With diversity above zero a candidate is
//! rejected when its label was already accepted; with a positive separation
//! threshold it is also rejected when it sits closer than the threshold to
//! any accepted candidate in feature space.

use ahash::AHashSet;
use amusic_core::Metric;

#[derive(Debug, Clone)]
pub struct DiversityFilter<'a> {
    diversity: f32,
    threshold: f32,
    metric: Metric,
    labels: AHashSet<&'a str>,
    accepted: Vec<&'a [f32]>,
}

impl<'a> DiversityFilter<'a> {
    /// `diversity` is clamped to [0, 1]; NaN counts as zero
    pub fn new(diversity: f32, min_separation: f32, metric: Metric) -> Self {
        let diversity = if diversity.is_nan() { 0.0 } else { diversity.clamp(0.0, 1.0) };
        Self {
            diversity,
            threshold: diversity * min_separation.max(0.0),
            metric,
            labels: AHashSet::new(),
            accepted: Vec::new(),
        }
    }

    pub fn diversity(&self) -> f32 {
        self.diversity
    }

    pub fn is_active(&self) -> bool {
        self.diversity > 0.0
    }

    /// Treat `label` as already taken (the seed's own label)
    pub fn reserve_label(&mut self, label: &'a str) {
        if self.is_active() {
            self.labels.insert(label);
        }
    }

    /// Accept or reject the next candidate; accepted ones constrain later calls
    pub fn admit(&mut self, label: &'a str, vector: &'a [f32]) -> bool {
        if !self.is_active() {
            return true;
        }
        if self.labels.contains(label) {
            return false;
        }
        if self.threshold > 0.0 {
            let too_close = self
                .accepted
                .iter()
                .any(|other| self.metric.distance(other, vector) < self.threshold);
            if too_close {
                return false;
            }
            self.accepted.push(vector);
        }
        self.labels.insert(label);
        true
    }
}
