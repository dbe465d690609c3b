//! Tree model files.
//!
//! A model file is a JSON document holding the tree together with the
//! settings it was built with and the names needed to read it without the
//! source data files.

use crate::config::TreeConfig;
use crate::core::constants::PDTREE_RUST_VERSION;
use crate::core::error::{PdtError, Result};
use crate::core::types::{AlgorithmIndex, FeatureValue};
use crate::dataset::{InstanceSet, ResultsSet};
use crate::prediction::Predictor;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Build metadata stored next to the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Crate version that wrote the file
    pub version: String,
    /// Number of instances the tree was built on
    pub num_instances: usize,
    /// Number of algorithm configurations
    pub num_algorithms: usize,
    /// Settings used for construction
    pub config: TreeConfig,
}

/// A tree with everything needed to interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeModel {
    /// Build metadata
    pub metadata: ModelMetadata,
    /// Feature names, in the order split feature indices refer to
    pub feature_names: Vec<String>,
    /// Configuration names, in the order recommendations refer to
    pub algorithm_names: Vec<String>,
    /// The tree
    pub tree: Tree,
}

impl TreeModel {
    /// Packs a tree with the names of its inputs.
    pub fn new(
        tree: Tree,
        instances: &InstanceSet,
        results: &ResultsSet,
        config: &TreeConfig,
    ) -> Self {
        TreeModel {
            metadata: ModelMetadata {
                version: PDTREE_RUST_VERSION.to_string(),
                num_instances: results.num_instances(),
                num_algorithms: results.num_algorithms(),
                config: config.clone(),
            },
            feature_names: instances.feature_names().to_vec(),
            algorithm_names: results.algorithm_names().to_vec(),
            tree,
        }
    }

    /// Name of the configuration recommended for a feature vector.
    pub fn recommend(&self, features: &[FeatureValue]) -> Result<&str> {
        let algorithm: AlgorithmIndex = self.tree.recommend(features)?;
        self.algorithm_names
            .get(algorithm)
            .map(String::as_str)
            .ok_or_else(|| PdtError::index_out_of_bounds(algorithm, self.algorithm_names.len()))
    }

    /// Predictor that matches configurations to results columns by name.
    pub fn predictor(&self) -> Predictor<'_> {
        Predictor::with_algorithm_names(&self.tree, &self.algorithm_names)
    }

    /// Writes the model as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            PdtError::serialization(format!("cannot create {}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::info!("Tree model saved to {}", path.display());
        Ok(())
    }

    /// Reads a model written by [`TreeModel::save`] and validates its tree.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PdtError::serialization(format!("cannot open {}: {}", path.display(), e))
        })?;
        let model: TreeModel = serde_json::from_reader(BufReader::new(file))?;
        model.tree.validate()?;
        Ok(model)
    }
}
