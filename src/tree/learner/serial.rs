//! Greedy serial tree learner.
//!
//! Nodes are expanded one at a time from a LIFO worklist. Each node is
//! either closed as a leaf or split on the cut with the lowest combined
//! child cost, with children built from the split snapshot.

use crate::config::TreeConfig;
use crate::core::error::{PdtError, Result};
use crate::core::types::{InstanceIndex, NodeIndex};
use crate::dataset::{check_compatible, InstanceSet, ResultsSet};
use crate::tree::aggregate::SubsetAggregate;
use crate::tree::node::TreeNode;
use crate::tree::split::{SplitFinder, SplitFinderConfig, SplitRequest};
use crate::tree::tree::Tree;
use std::time::Instant;

/// Counters collected while building one tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// Nodes popped from the worklist
    pub expanded_nodes: usize,
    /// Cuts whose cost was computed, over all nodes
    pub evaluated_cuts: usize,
    /// Features skipped as not branchable, counted per node
    pub skipped_features: usize,
    /// Pending nodes closed as leaves because the time budget ran out
    pub nodes_cut_by_budget: usize,
}

/// Serial learner building one prescriptive tree.
#[derive(Debug)]
pub struct SerialTreeLearner {
    config: TreeConfig,
    last_report: TrainingReport,
}

impl SerialTreeLearner {
    /// Creates a new learner; the configuration is validated first.
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(SerialTreeLearner {
            config,
            last_report: TrainingReport::default(),
        })
    }

    /// Returns the learner configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Counters of the last `train` call.
    pub fn last_report(&self) -> &TrainingReport {
        &self.last_report
    }

    /// Builds a tree over all instances.
    pub fn train(&mut self, instances: &InstanceSet, results: &ResultsSet) -> Result<Tree> {
        check_compatible(instances, results)?;
        let started = Instant::now();

        let num_instances = results.num_instances();
        let min_elements = self.config.effective_min_elements_branch(num_instances);
        let max_depth = self.config.max_depth;

        log::info!(
            "Building tree: {} instances, {} features, {} configurations, eval={}, \
             min_elements_branch={}, max_depth={}",
            num_instances,
            instances.num_features(),
            results.num_algorithms(),
            self.config.evaluation,
            min_elements,
            max_depth
        );

        let aggregate = SubsetAggregate::all(results, self.config.evaluation)?;
        let members: Vec<InstanceIndex> = (0..num_instances).collect();
        let mut tree = Tree::new(TreeNode::new_leaf(members, aggregate, 0, 0, None));

        let mut finder = SplitFinder::new(SplitFinderConfig {
            min_elements_branch: min_elements,
        });
        let mut report = TrainingReport::default();
        let mut stack: Vec<NodeIndex> = vec![0];

        while let Some(node_index) = stack.pop() {
            if report.expanded_nodes > 0 && self.budget_exhausted(started) {
                report.nodes_cut_by_budget = stack.len() + 1;
                log::warn!(
                    "time limit of {:.1}s reached, {} pending nodes closed as leaves",
                    self.config.max_seconds.unwrap_or_default(),
                    report.nodes_cut_by_budget
                );
                break;
            }
            report.expanded_nodes += 1;

            let node = tree
                .node(node_index)
                .ok_or_else(|| PdtError::internal(format!("node {} missing", node_index)))?;
            let depth = node.depth();
            if depth >= max_depth || !node.can_split(min_elements) {
                log::debug!("node {} closed as leaf: {}", node_index, node);
                continue;
            }

            let search = finder.find_best_split(
                instances,
                results,
                SplitRequest {
                    node: node_index,
                    members: node.members(),
                    aggregate: node.aggregate(),
                    max_eval_branches: self.config.max_eval_branches_at(depth),
                },
            )?;
            report.evaluated_cuts += search.evaluated_cuts;
            report.skipped_features += search.skipped.len();

            let split = match search.best {
                Some(split) => split,
                None => {
                    log::debug!("node {} has no valid cut", node_index);
                    continue;
                }
            };

            log::debug!(
                "node {} (depth {}, {} instances) split on feature {} <= {}: {} | {}, cost {:.6}",
                node_index,
                depth,
                split.num_instances(),
                split.feature,
                split.threshold,
                split.left_count,
                split.right_count(),
                split.cost
            );

            let (left, right) = tree.split_node(node_index, split)?;
            stack.push(left);
            stack.push(right);
        }

        tree.finalize();
        self.log_summary(&tree, started);
        self.last_report = report;
        Ok(tree)
    }

    fn budget_exhausted(&self, started: Instant) -> bool {
        match self.config.max_seconds {
            Some(limit) => started.elapsed().as_secs_f64() >= limit,
            None => false,
        }
    }

    fn log_summary(&self, tree: &Tree, started: Instant) {
        for (depth, cost) in tree.cost_by_depth().iter().enumerate() {
            log::info!("Depth {} cost: {:.6}", depth, cost);
        }
        log::info!(
            "Tree built in {:.3}s: {} nodes, {} leaves, max depth {}, min leaf size {}, \
             root cost {:.6}, leaf cost {:.6}, improvement {:.4}",
            started.elapsed().as_secs_f64(),
            tree.num_nodes(),
            tree.num_leaves(),
            tree.depth(),
            tree.min_leaf_size(),
            tree.stats().root_cost,
            tree.leaf_weighted_cost(),
            tree.improvement()
        );
    }
}
