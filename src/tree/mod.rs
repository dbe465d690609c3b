//! Prescriptive tree subsystem: subset aggregates, split search, the node
//! arena and the greedy learner that assembles it.

pub mod aggregate;
pub mod learner;
pub mod node;
pub mod split;
pub mod tree;

pub use aggregate::SubsetAggregate;
pub use learner::{SerialTreeLearner, TrainingReport};
pub use node::TreeNode;
pub use split::{SearchReport, SplitFinder, SplitFinderConfig, SplitInfo, SplitRequest};
pub use tree::{Tree, TreeStats};

use crate::config::TreeConfig;
use crate::core::error::Result;
use crate::dataset::{InstanceSet, ResultsSet};

/// Builds a tree with a fresh [`SerialTreeLearner`].
pub fn build_tree(
    instances: &InstanceSet,
    results: &ResultsSet,
    config: &TreeConfig,
) -> Result<Tree> {
    SerialTreeLearner::new(config.clone())?.train(instances, results)
}
