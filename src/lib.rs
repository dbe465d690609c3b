//! # pdtree-rust
//!
//! Greedy prescriptive decision trees for per-instance algorithm selection.
//!
//! Given a set of problem instances described by numeric and categorical
//! features, and the measured cost of running each algorithm configuration on
//! each instance, this crate builds a binary tree whose internal nodes test a
//! single feature against a threshold and whose leaves recommend the
//! configuration with the lowest aggregate cost over the instances that reach
//! them.
//!
//! ## Quick Start
//!
//! ```rust
//! use pdtree_rust::{build_tree, InstanceSet, ResultsSet, TreeConfigBuilder};
//! use ndarray::array;
//!
//! # fn main() -> pdtree_rust::Result<()> {
//! let instances = InstanceSet::from_float_columns(vec![vec![1.0, 2.0, 3.0, 4.0]])?;
//! let costs = array![[1.0, 9.0], [1.0, 9.0], [9.0, 1.0], [9.0, 1.0]];
//! let results = ResultsSet::new(vec!["A".into(), "B".into()], costs)?;
//!
//! let config = TreeConfigBuilder::new()
//!     .min_elements_branch(1)
//!     .max_depth(1)
//!     .build()?;
//! let tree = build_tree(&instances, &results, &config)?;
//!
//! assert_eq!(tree.num_leaves(), 2);
//! assert!((tree.improvement() - 5.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: index types, constants and the [`PdtError`] type
//! - [`config`]: [`TreeConfig`] with validation, file and environment loading
//! - [`dataset`]: the feature store, the performance matrix and CSV loaders
//! - [`tree`]: subset aggregates, split search, the node arena and the learner
//! - [`prediction`]: routing instances and scoring recommendations
//! - [`io`]: model files and Graphviz export

#![warn(missing_docs)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

pub mod core;

pub mod config;

pub mod dataset;

pub mod tree;

pub mod prediction;

pub mod io;

pub use core::{
    constants::*,
    error::{AggregateError, PdtError, Result},
    types::*,
};

pub use config::{TreeConfig, TreeConfigBuilder};

pub use dataset::{
    check_compatible, load_instances, load_results, FeatureColumn, InstanceSet, ResultsSet,
};

pub use tree::{
    build_tree, SerialTreeLearner, SplitFinder, SplitInfo, SubsetAggregate, TrainingReport, Tree,
    TreeNode, TreeStats,
};

pub use prediction::{EvaluationReport, Predictor};

pub use io::{to_dot, write_dot, ModelMetadata, TreeModel};

pub use core::constants::PDTREE_RUST_VERSION as VERSION;

/// Initialize the library.
///
/// Installs an `env_logger` logger unless one is already set. Calling it is
/// optional; all other functionality works without it.
///
/// ```rust
/// fn main() -> pdtree_rust::Result<()> {
///     pdtree_rust::init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    core::initialize_core()
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    core::is_core_initialized()
}
