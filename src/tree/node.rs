//! Tree node of a prescriptive decision tree.
//!
//! Every node keeps the instances it covers and their aggregate, so both
//! internal nodes and leaves can report the configuration they recommend.

use crate::core::types::{AlgorithmIndex, FeatureIndex, InstanceIndex, NodeIndex, Threshold};
use crate::tree::aggregate::SubsetAggregate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tree node representation supporting both internal and leaf nodes.
///
/// Internal nodes contain split information (feature index, threshold) and
/// child node references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Left child node index (for internal nodes only)
    left_child: Option<NodeIndex>,
    /// Right child node index (for internal nodes only)
    right_child: Option<NodeIndex>,
    /// Parent node index (None for root node)
    parent: Option<NodeIndex>,
    /// Split feature index (for internal nodes only)
    split_feature: Option<FeatureIndex>,
    /// Split threshold (for internal nodes only)
    split_threshold: Option<Threshold>,
    /// Combined cost of the children (for internal nodes only)
    split_cost: Option<f64>,
    /// Node depth in the tree, root is 0
    depth: usize,
    /// Position among the nodes of a complete binary tree at this depth
    level_index: usize,
    /// Instances covered by this node
    members: Vec<InstanceIndex>,
    /// Aggregate over `members`
    aggregate: SubsetAggregate,
}

impl TreeNode {
    /// Creates a new leaf node.
    pub fn new_leaf(
        members: Vec<InstanceIndex>,
        aggregate: SubsetAggregate,
        depth: usize,
        level_index: usize,
        parent: Option<NodeIndex>,
    ) -> Self {
        TreeNode {
            left_child: None,
            right_child: None,
            parent,
            split_feature: None,
            split_threshold: None,
            split_cost: None,
            depth,
            level_index,
            members,
            aggregate,
        }
    }

    /// Returns true if this node is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.left_child.is_none()
    }

    /// Returns the left child node index (for internal nodes).
    pub fn left_child(&self) -> Option<NodeIndex> {
        self.left_child
    }

    /// Returns the right child node index (for internal nodes).
    pub fn right_child(&self) -> Option<NodeIndex> {
        self.right_child
    }

    /// Returns the parent node index.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Returns the split feature index (for internal nodes).
    pub fn split_feature(&self) -> Option<FeatureIndex> {
        self.split_feature
    }

    /// Returns the split threshold (for internal nodes).
    pub fn split_threshold(&self) -> Option<Threshold> {
        self.split_threshold
    }

    /// Returns the combined cost of the children (for internal nodes).
    pub fn split_cost(&self) -> Option<f64> {
        self.split_cost
    }

    /// Returns the node depth in the tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Position of the node at its depth; children of `k` are `2k` and
    /// `2k + 1`.
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// Identifier used in graph output.
    pub fn graph_id(&self) -> String {
        format!("nL{}I{}", self.depth, self.level_index)
    }

    /// Instances covered by the node.
    pub fn members(&self) -> &[InstanceIndex] {
        &self.members
    }

    /// Number of instances covered by the node.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Aggregate over the node's instances.
    pub fn aggregate(&self) -> &SubsetAggregate {
        &self.aggregate
    }

    /// Recommended configuration.
    pub fn best_algorithm(&self) -> AlgorithmIndex {
        self.aggregate.best_algorithm()
    }

    /// Normalized cost of the recommended configuration.
    pub fn best_cost(&self) -> f64 {
        self.aggregate.best_cost()
    }

    /// Converts this node from leaf to internal node with the given split.
    pub fn set_split(
        &mut self,
        left_child: NodeIndex,
        right_child: NodeIndex,
        split_feature: FeatureIndex,
        split_threshold: Threshold,
        split_cost: f64,
    ) {
        self.left_child = Some(left_child);
        self.right_child = Some(right_child);
        self.split_feature = Some(split_feature);
        self.split_threshold = Some(split_threshold);
        self.split_cost = Some(split_cost);
    }

    /// Returns true if the node is large enough to hold two children of
    /// `min_elements` instances each.
    pub fn can_split(&self, min_elements: usize) -> bool {
        self.size() >= 2 * min_elements
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.split_feature, self.split_threshold) {
            (Some(feature), Some(threshold)) if !self.is_leaf() => write!(
                f,
                "Internal(feature={}, threshold={}, size={}, best={}, cost={:.4})",
                feature,
                threshold,
                self.size(),
                self.best_algorithm(),
                self.best_cost()
            ),
            _ => write!(
                f,
                "Leaf(size={}, best={}, cost={:.4})",
                self.size(),
                self.best_algorithm(),
                self.best_cost()
            ),
        }
    }
}
