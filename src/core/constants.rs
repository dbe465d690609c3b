//! Default configuration values for pdtree-rust.

use crate::core::types::{Evaluation, FillStrategy};

/// Crate version string.
pub const PDTREE_RUST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default evaluation mode.
pub const DEFAULT_EVALUATION: Evaluation = Evaluation::Average;

/// Default minimum number of instances on each side of a split.
pub const DEFAULT_MIN_ELEMENTS_BRANCH: usize = 10;

/// Default minimum fraction of all instances on each side of a split.
pub const DEFAULT_MIN_PERC_ELEMENTS_BRANCH: f64 = 0.0;

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Hard upper bound accepted for `max_depth`.
pub const MAX_SUPPORTED_DEPTH: usize = 64;

/// Default strategy for filling missing results.
pub const DEFAULT_FILL_STRATEGY: FillStrategy = FillStrategy::WorseInstT2;

/// Default absolute difference required between two results to change rank.
pub const DEFAULT_RANK_EPS: f64 = 1e-8;

/// Default relative difference required between two results to change rank.
pub const DEFAULT_RANK_PERC: f64 = 0.01;

/// Number of instance names shown in a graph node label.
pub const GRAPH_LABEL_INSTANCES: usize = 5;

/// Separator used when joining results-file setting columns into a
/// configuration name.
pub const SETTING_SEPARATOR: &str = ";";
