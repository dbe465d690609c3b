//! Core configuration structure and builder for tree construction.
//!
//! The configuration is an explicit value handed to the learner and the split
//! finder; nothing in the crate reads settings from global state.

use crate::core::constants::*;
use crate::core::error::{PdtError, Result};
use crate::core::types::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for building a prescriptive tree and for preparing the
/// performance matrix it is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    // Tree construction
    /// Aggregate raw costs or per-instance ranks
    pub evaluation: Evaluation,
    /// Minimum number of instances on each side of a split
    pub min_elements_branch: usize,
    /// Minimum fraction of all instances on each side of a split; the
    /// effective minimum is the larger of the two
    pub min_perc_elements_branch: f64,
    /// Maximum tree depth (0 builds a single leaf)
    pub max_depth: usize,
    /// Per-depth cap on the number of evaluated cut points per feature.
    /// Missing entries and zeros mean no cap.
    pub max_eval_branches: Vec<usize>,
    /// Wall-clock budget in seconds, checked between node expansions
    pub max_seconds: Option<f64>,

    // Performance matrix preparation
    /// How missing results are filled
    pub fill_strategy: FillStrategy,
    /// Value used by [`FillStrategy::Value`]
    pub fill_value: f64,
    /// Minimum absolute difference between two results to change rank
    pub rank_eps: f64,
    /// Minimum relative difference between two results to change rank
    pub rank_perc: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            evaluation: DEFAULT_EVALUATION,
            min_elements_branch: DEFAULT_MIN_ELEMENTS_BRANCH,
            min_perc_elements_branch: DEFAULT_MIN_PERC_ELEMENTS_BRANCH,
            max_depth: DEFAULT_MAX_DEPTH,
            max_eval_branches: Vec::new(),
            max_seconds: None,
            fill_strategy: DEFAULT_FILL_STRATEGY,
            fill_value: 0.0,
            rank_eps: DEFAULT_RANK_EPS,
            rank_perc: DEFAULT_RANK_PERC,
        }
    }
}

impl TreeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.min_elements_branch < 1 {
            return Err(PdtError::invalid_parameter(
                "min_elements_branch",
                self.min_elements_branch.to_string(),
                "must be at least 1",
            ));
        }

        if !(0.0..=0.5).contains(&self.min_perc_elements_branch) {
            return Err(PdtError::invalid_parameter(
                "min_perc_elements_branch",
                self.min_perc_elements_branch.to_string(),
                "must be in range [0.0, 0.5]",
            ));
        }

        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(PdtError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                format!("must be at most {}", MAX_SUPPORTED_DEPTH),
            ));
        }

        if let Some(seconds) = self.max_seconds {
            if !(seconds > 0.0) {
                return Err(PdtError::invalid_parameter(
                    "max_seconds",
                    seconds.to_string(),
                    "must be positive when specified",
                ));
            }
        }

        if self.rank_eps < 0.0 {
            return Err(PdtError::invalid_parameter(
                "rank_eps",
                self.rank_eps.to_string(),
                "must be non-negative",
            ));
        }

        if self.rank_perc < 0.0 {
            return Err(PdtError::invalid_parameter(
                "rank_perc",
                self.rank_perc.to_string(),
                "must be non-negative",
            ));
        }

        if self.fill_strategy == FillStrategy::Value && !self.fill_value.is_finite() {
            return Err(PdtError::invalid_parameter(
                "fill_value",
                self.fill_value.to_string(),
                "must be finite when fill_strategy is 'value'",
            ));
        }

        Ok(())
    }

    /// Effective minimum number of instances on each side of a split for a
    /// problem with `num_instances` instances.
    pub fn effective_min_elements_branch(&self, num_instances: usize) -> usize {
        let by_fraction = (self.min_perc_elements_branch * num_instances as f64).ceil() as usize;
        self.min_elements_branch.max(by_fraction).max(1)
    }

    /// Cap on evaluated cut points per feature at `depth`, if any.
    pub fn max_eval_branches_at(&self, depth: usize) -> Option<usize> {
        match self.max_eval_branches.get(depth) {
            Some(&cap) if cap > 0 => Some(cap),
            _ => None,
        }
    }

    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PdtError::config(format!("Failed to read config file: {}", e)))?;

        let config: TreeConfig = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .map_err(|e| PdtError::config(format!("Failed to parse JSON config: {}", e)))?
        } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content)
                .map_err(|e| PdtError::config(format!("Failed to parse TOML config: {}", e)))?
        } else {
            return Err(PdtError::config(
                "Unsupported config file format. Use .json or .toml",
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| PdtError::config(format!("Failed to serialize to JSON: {}", e)))?
        } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self)
                .map_err(|e| PdtError::config(format!("Failed to serialize to TOML: {}", e)))?
        } else {
            return Err(PdtError::config(
                "Unsupported config file format. Use .json or .toml",
            ));
        };

        std::fs::write(path, content)
            .map_err(|e| PdtError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_environment() -> Result<Self> {
        let mut config = TreeConfig::default();

        if let Ok(val) = std::env::var("PDTREE_EVAL") {
            config.evaluation = val
                .parse()
                .map_err(|_| PdtError::config("Invalid PDTREE_EVAL"))?;
        }

        if let Ok(val) = std::env::var("PDTREE_MIN_ELEMENTS_BRANCH") {
            config.min_elements_branch = val
                .parse()
                .map_err(|_| PdtError::config("Invalid PDTREE_MIN_ELEMENTS_BRANCH"))?;
        }

        if let Ok(val) = std::env::var("PDTREE_MAX_DEPTH") {
            config.max_depth = val
                .parse()
                .map_err(|_| PdtError::config("Invalid PDTREE_MAX_DEPTH"))?;
        }

        if let Ok(val) = std::env::var("PDTREE_MAX_SECONDS") {
            config.max_seconds = Some(
                val.parse()
                    .map_err(|_| PdtError::config("Invalid PDTREE_MAX_SECONDS"))?,
            );
        }

        if let Ok(val) = std::env::var("PDTREE_FILL_STRATEGY") {
            config.fill_strategy = val
                .parse()
                .map_err(|_| PdtError::config("Invalid PDTREE_FILL_STRATEGY"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to existing configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        let env_config = Self::load_from_environment()?;

        // Only override non-default values
        if env_config.evaluation != DEFAULT_EVALUATION {
            self.evaluation = env_config.evaluation;
        }
        if env_config.min_elements_branch != DEFAULT_MIN_ELEMENTS_BRANCH {
            self.min_elements_branch = env_config.min_elements_branch;
        }
        if env_config.max_depth != DEFAULT_MAX_DEPTH {
            self.max_depth = env_config.max_depth;
        }
        if env_config.max_seconds.is_some() {
            self.max_seconds = env_config.max_seconds;
        }
        if env_config.fill_strategy != DEFAULT_FILL_STRATEGY {
            self.fill_strategy = env_config.fill_strategy;
        }

        self.validate()
    }

    /// Flat name/value view of the configuration, used for reports.
    pub fn as_parameter_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("eval".to_string(), self.evaluation.to_string());
        map.insert(
            "minElementsBranch".to_string(),
            self.min_elements_branch.to_string(),
        );
        map.insert(
            "minPercElementsBranch".to_string(),
            self.min_perc_elements_branch.to_string(),
        );
        map.insert("maxDepth".to_string(), self.max_depth.to_string());
        map.insert("fillMissingRes".to_string(), self.fill_strategy.to_string());
        map.insert("rankEps".to_string(), self.rank_eps.to_string());
        map.insert("rankPerc".to_string(), self.rank_perc.to_string());

        if let Some(seconds) = self.max_seconds {
            map.insert("maxSeconds".to_string(), seconds.to_string());
        }

        map
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct TreeConfigBuilder {
    config: TreeConfig,
    validation_errors: Vec<String>,
}

impl TreeConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        TreeConfigBuilder {
            config: TreeConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the evaluation mode
    pub fn evaluation(mut self, evaluation: Evaluation) -> Self {
        self.config.evaluation = evaluation;
        self
    }

    /// Set the minimum number of instances per split side
    pub fn min_elements_branch(mut self, min_elements: usize) -> Self {
        if min_elements < 1 {
            self.validation_errors
                .push("min_elements_branch must be at least 1".to_string());
        }
        self.config.min_elements_branch = min_elements;
        self
    }

    /// Set the minimum fraction of instances per split side
    pub fn min_perc_elements_branch(mut self, fraction: f64) -> Self {
        if !(0.0..=0.5).contains(&fraction) {
            self.validation_errors
                .push("min_perc_elements_branch must be in range [0.0, 0.5]".to_string());
        }
        self.config.min_perc_elements_branch = fraction;
        self
    }

    /// Set the maximum tree depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the per-depth caps on evaluated cut points
    pub fn max_eval_branches(mut self, caps: Vec<usize>) -> Self {
        self.config.max_eval_branches = caps;
        self
    }

    /// Set the wall-clock budget in seconds
    pub fn max_seconds(mut self, seconds: Option<f64>) -> Self {
        self.config.max_seconds = seconds;
        self
    }

    /// Set the missing result fill strategy
    pub fn fill_strategy(mut self, strategy: FillStrategy) -> Self {
        self.config.fill_strategy = strategy;
        self
    }

    /// Set the fill value used by [`FillStrategy::Value`]
    pub fn fill_value(mut self, value: f64) -> Self {
        self.config.fill_value = value;
        self
    }

    /// Set the absolute rank tolerance
    pub fn rank_eps(mut self, eps: f64) -> Self {
        if eps < 0.0 {
            self.validation_errors
                .push("rank_eps must be non-negative".to_string());
        }
        self.config.rank_eps = eps;
        self
    }

    /// Set the relative rank tolerance
    pub fn rank_perc(mut self, perc: f64) -> Self {
        if perc < 0.0 {
            self.validation_errors
                .push("rank_perc must be non-negative".to_string());
        }
        self.config.rank_perc = perc;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TreeConfig> {
        if !self.validation_errors.is_empty() {
            return Err(PdtError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for TreeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
