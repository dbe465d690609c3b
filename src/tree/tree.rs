//! Prescriptive decision tree.
//!
//! Nodes live in a contiguous arena addressed by [`NodeIndex`]; index 0 is
//! always the root. Summary statistics are derived once, after assembly,
//! by [`Tree::finalize`].

use crate::core::error::{PdtError, Result};
use crate::core::types::{AlgorithmIndex, Evaluation, FeatureValue, NodeIndex};
use crate::tree::node::TreeNode;
use crate::tree::split::SplitInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary statistics of an assembled tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Best cost of the root, i.e. of the single best configuration
    pub root_cost: f64,
    /// Σ(leaf best cost × leaf size) / root size
    pub leaf_weighted_cost: f64,
    /// root cost / leaf-weighted cost, 0 when the latter is 0
    pub improvement: f64,
    /// Deepest node depth reached (root is 0)
    pub max_depth: usize,
    /// Size of the smallest leaf
    pub min_leaf_size: usize,
    /// Number of leaves
    pub num_leaves: usize,
    /// Instance-weighted best cost of the nodes at each depth
    pub cost_by_depth: Vec<f64>,
}

/// Decision tree recommending an algorithm configuration per region of the
/// feature space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    /// Vector of tree nodes (index 0 is always the root)
    nodes: Vec<TreeNode>,
    /// Evaluation mode the aggregates were built with
    evaluation: Evaluation,
    /// Statistics derived by `finalize`
    stats: TreeStats,
}

impl Tree {
    /// Creates a tree holding only `root`.
    pub fn new(root: TreeNode) -> Self {
        let evaluation = root.aggregate().evaluation();
        let mut tree = Tree {
            nodes: vec![root],
            evaluation,
            stats: TreeStats::default(),
        };
        tree.finalize();
        tree
    }

    /// Returns the number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn num_leaves(&self) -> usize {
        self.stats.num_leaves
    }

    /// Returns the deepest node depth.
    pub fn depth(&self) -> usize {
        self.stats.max_depth
    }

    /// Evaluation mode of the node aggregates.
    pub fn evaluation(&self) -> Evaluation {
        self.evaluation
    }

    /// Returns a reference to the node at the given index.
    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Returns the root node.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    /// Summary statistics.
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    /// Leaf-weighted average cost.
    pub fn leaf_weighted_cost(&self) -> f64 {
        self.stats.leaf_weighted_cost
    }

    /// Ratio of the root cost to the leaf-weighted cost.
    pub fn improvement(&self) -> f64 {
        self.stats.improvement
    }

    /// Size of the smallest leaf.
    pub fn min_leaf_size(&self) -> usize {
        self.stats.min_leaf_size
    }

    /// Instance-weighted cost of the nodes at each depth.
    pub fn cost_by_depth(&self) -> &[f64] {
        &self.stats.cost_by_depth
    }

    /// Splits leaf `node_index` using the snapshot held by `split`.
    ///
    /// Children take their members and aggregates straight from the split
    /// record and are appended to the arena.
    pub fn split_node(
        &mut self,
        node_index: NodeIndex,
        split: SplitInfo,
    ) -> Result<(NodeIndex, NodeIndex)> {
        let parent = self
            .nodes
            .get(node_index)
            .ok_or_else(|| PdtError::index_out_of_bounds(node_index, self.nodes.len()))?;

        if !parent.is_leaf() {
            return Err(PdtError::tree_construction(format!(
                "cannot split internal node {}",
                node_index
            )));
        }
        if split.num_instances() != parent.size() {
            return Err(PdtError::tree_construction(format!(
                "split of node {} covers {} instances, node has {}",
                node_index,
                split.num_instances(),
                parent.size()
            )));
        }

        let child_depth = parent.depth() + 1;
        let level_index = parent.level_index();
        let left_index = self.nodes.len();
        let right_index = left_index + 1;

        self.nodes.try_reserve(2).map_err(|e| {
            PdtError::resource(format!("cannot grow node arena: {}", e))
        })?;

        let SplitInfo {
            feature,
            threshold,
            cost,
            left_count,
            mut sorted,
            left,
            right,
        } = split;
        let right_members = sorted.split_off(left_count);
        let left_members = sorted;

        self.nodes.push(TreeNode::new_leaf(
            left_members,
            left,
            child_depth,
            level_index * 2,
            Some(node_index),
        ));
        self.nodes.push(TreeNode::new_leaf(
            right_members,
            right,
            child_depth,
            level_index * 2 + 1,
            Some(node_index),
        ));
        self.nodes[node_index].set_split(left_index, right_index, feature, threshold, cost);

        Ok((left_index, right_index))
    }

    /// Derives the summary statistics from the current nodes.
    pub fn finalize(&mut self) {
        let root_size = self.root().size();
        let root_cost = self.root().best_cost();

        let mut leaf_weighted = 0.0;
        let mut num_leaves = 0;
        let mut min_leaf_size = usize::MAX;
        let mut max_depth = 0;
        for node in &self.nodes {
            max_depth = max_depth.max(node.depth());
            if node.is_leaf() {
                num_leaves += 1;
                min_leaf_size = min_leaf_size.min(node.size());
                if root_size > 0 {
                    leaf_weighted += node.best_cost() * (node.size() as f64 / root_size as f64);
                }
            }
        }

        let mut level_size = vec![0usize; max_depth + 1];
        for node in &self.nodes {
            level_size[node.depth()] += node.size();
        }
        let mut cost_by_depth = vec![0.0; max_depth + 1];
        for node in &self.nodes {
            let total = level_size[node.depth()];
            if total > 0 {
                cost_by_depth[node.depth()] += node.best_cost() * (node.size() as f64 / total as f64);
            }
        }

        let improvement = if leaf_weighted != 0.0 {
            root_cost / leaf_weighted
        } else {
            0.0
        };

        self.stats = TreeStats {
            root_cost,
            leaf_weighted_cost: leaf_weighted,
            improvement,
            max_depth,
            min_leaf_size: if num_leaves > 0 { min_leaf_size } else { 0 },
            num_leaves,
            cost_by_depth,
        };
    }

    /// Returns all leaf node indices.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| if node.is_leaf() { Some(i) } else { None })
            .collect()
    }

    /// Routes a feature vector to its leaf.
    ///
    /// Fails if the vector is too short for a split feature or holds a
    /// categorical value where a split expects a number.
    pub fn predict_leaf(&self, features: &[FeatureValue]) -> Result<NodeIndex> {
        let mut node_index = 0;
        loop {
            let node = self
                .nodes
                .get(node_index)
                .ok_or_else(|| PdtError::index_out_of_bounds(node_index, self.nodes.len()))?;

            let (feature, threshold, left, right) = match (
                node.split_feature(),
                node.split_threshold(),
                node.left_child(),
                node.right_child(),
            ) {
                (Some(f), Some(t), Some(l), Some(r)) => (f, t, l, r),
                _ => return Ok(node_index),
            };

            let value = features
                .get(feature)
                .ok_or_else(|| PdtError::index_out_of_bounds(feature, features.len()))?;
            let go_left = threshold.goes_left(value).ok_or_else(|| {
                PdtError::data(format!(
                    "feature {} holds non-numeric value '{}' at node {}",
                    feature, value, node_index
                ))
            })?;

            node_index = if go_left { left } else { right };
        }
    }

    /// Configuration recommended for a feature vector.
    pub fn recommend(&self, features: &[FeatureValue]) -> Result<AlgorithmIndex> {
        let leaf = self.predict_leaf(features)?;
        Ok(self.nodes[leaf].best_algorithm())
    }

    /// Returns a textual representation of the tree structure.
    pub fn to_string_representation(&self) -> String {
        if self.nodes.is_empty() {
            return "Empty tree".to_string();
        }

        let mut result = String::new();
        self.tree_to_string_recursive(0, "", true, &mut result);
        result
    }

    fn tree_to_string_recursive(
        &self,
        node_index: NodeIndex,
        prefix: &str,
        is_last: bool,
        result: &mut String,
    ) {
        let node = match self.nodes.get(node_index) {
            Some(node) => node,
            None => return,
        };
        let current_prefix = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, current_prefix, node));

        let new_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        if let Some(left_child) = node.left_child() {
            self.tree_to_string_recursive(left_child, &new_prefix, false, result);
        }
        if let Some(right_child) = node.right_child() {
            self.tree_to_string_recursive(right_child, &new_prefix, true, result);
        }
    }

    /// Validates the tree structure and the partition of every internal
    /// node's instances between its children.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(PdtError::tree_construction("tree has no nodes"));
        }
        if self.nodes[0].parent().is_some() {
            return Err(PdtError::tree_construction("root node should not have a parent"));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.aggregate().len() != node.size() {
                return Err(PdtError::tree_construction(format!(
                    "node {} aggregate counts {} instances, node has {}",
                    i,
                    node.aggregate().len(),
                    node.size()
                )));
            }

            let (left_idx, right_idx) = match (node.left_child(), node.right_child()) {
                (None, None) => continue,
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(PdtError::tree_construction(format!(
                        "internal node {} missing a child",
                        i
                    )))
                }
            };

            let (left, right) = match (self.nodes.get(left_idx), self.nodes.get(right_idx)) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(PdtError::tree_construction(format!(
                        "node {} has invalid child indices",
                        i
                    )))
                }
            };

            if left.parent() != Some(i) || right.parent() != Some(i) {
                return Err(PdtError::tree_construction(format!(
                    "children of node {} do not point back to it",
                    i
                )));
            }
            if left.depth() != node.depth() + 1 || right.depth() != node.depth() + 1 {
                return Err(PdtError::tree_construction(format!(
                    "children of node {} have wrong depth",
                    i
                )));
            }
            if left.size() == 0 || right.size() == 0 {
                return Err(PdtError::tree_construction(format!(
                    "node {} has an empty child",
                    i
                )));
            }

            let mut parent_members = node.members().to_vec();
            let mut child_members: Vec<_> =
                left.members().iter().chain(right.members()).copied().collect();
            parent_members.sort_unstable();
            child_members.sort_unstable();
            if parent_members != child_members {
                return Err(PdtError::tree_construction(format!(
                    "children of node {} do not partition its instances",
                    i
                )));
            }
        }

        Ok(())
    }

    /// Converts the tree to a JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Creates a tree from a JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Tree = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tree(nodes={}, leaves={}, depth={}, cost={:.4}, improvement={:.4})",
            self.num_nodes(),
            self.num_leaves(),
            self.depth(),
            self.leaf_weighted_cost(),
            self.improvement()
        )
    }
}
