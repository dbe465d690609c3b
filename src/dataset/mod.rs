//! Dataset management for pdtree-rust.
//!
//! The two read-only inputs of tree construction live here: the feature
//! store ([`InstanceSet`]) and the performance matrix ([`ResultsSet`]),
//! plus CSV loaders for both.

pub mod instances;
pub mod loader;
pub mod results;

pub use instances::{FeatureColumn, InstanceSet};
pub use loader::{load_instances, load_results, read_instances, read_results};
pub use results::{compute_rankings, fill_missing, ResultsSet};

use crate::core::error::{PdtError, Result};

/// Checks that a feature store and a performance matrix describe the same
/// instances.
pub fn check_compatible(instances: &InstanceSet, results: &ResultsSet) -> Result<()> {
    if instances.num_instances() != results.num_instances() {
        return Err(PdtError::dimension_mismatch(
            format!("{} instances in the performance matrix", instances.num_instances()),
            results.num_instances().to_string(),
        ));
    }
    Ok(())
}
