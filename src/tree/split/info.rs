//! Best split record kept while searching a node.

use crate::core::error::AggregateError;
use crate::core::types::{FeatureIndex, InstanceIndex, Threshold};
use crate::dataset::ResultsSet;
use crate::tree::aggregate::SubsetAggregate;

/// Winning split of a node: the cut, its cost and the snapshot needed to
/// build both children without recomputation.
#[derive(Debug, Clone)]
pub struct SplitInfo {
    /// Feature the node branches on
    pub feature: FeatureIndex,
    /// Value of the last left-side instance; values `<=` go left
    pub threshold: Threshold,
    /// Combined cost: left best cost plus right best cost
    pub cost: f64,
    /// Number of instances sent left
    pub left_count: usize,
    /// Node members sorted by the feature (ties by instance index)
    pub sorted: Vec<InstanceIndex>,
    /// Aggregate of the left prefix
    pub left: SubsetAggregate,
    /// Aggregate of the right suffix
    pub right: SubsetAggregate,
}

impl SplitInfo {
    /// Instances routed to the left child.
    pub fn left_indices(&self) -> &[InstanceIndex] {
        &self.sorted[..self.left_count]
    }

    /// Instances routed to the right child.
    pub fn right_indices(&self) -> &[InstanceIndex] {
        &self.sorted[self.left_count..]
    }

    /// Number of instances sent right.
    pub fn right_count(&self) -> usize {
        self.sorted.len() - self.left_count
    }

    /// Total number of instances covered by the split.
    pub fn num_instances(&self) -> usize {
        self.sorted.len()
    }

    /// Returns true if both sides hold at least `min_elements` instances.
    pub fn is_valid(&self, min_elements: usize) -> bool {
        self.left_count >= min_elements && self.right_count() >= min_elements
    }

    /// Overwrites this record with the cut at `left_count` of `sorted`,
    /// reusing its buffers. Both aggregates are rebuilt from scratch and
    /// the cost is taken from them.
    pub(crate) fn assign(
        &mut self,
        results: &ResultsSet,
        feature: FeatureIndex,
        threshold: Threshold,
        left_count: usize,
        sorted: &[InstanceIndex],
    ) -> Result<(), AggregateError> {
        self.left.recompute(results, &sorted[..left_count])?;
        self.right.recompute(results, &sorted[left_count..])?;
        self.feature = feature;
        self.threshold = threshold;
        self.cost = self.left.best_cost() + self.right.best_cost();
        self.left_count = left_count;
        self.sorted.clear();
        self.sorted.extend_from_slice(sorted);
        Ok(())
    }
}
