//! Routing instances through a built tree and scoring its recommendations.

use crate::core::error::{PdtError, Result};
use crate::core::types::{AlgorithmIndex, NodeIndex};
use crate::dataset::{check_compatible, InstanceSet, ResultsSet};
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quality of a tree's recommendations on a performance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Number of instances evaluated
    pub num_instances: usize,
    /// Average cost of the configuration recommended for each instance
    pub recommended_cost: f64,
    /// Average cost of the root recommendation (single best configuration)
    pub single_best_cost: f64,
    /// Average of the per-instance best cost (virtual best)
    pub oracle_cost: f64,
    /// Instances whose recommended configuration has rank 0
    pub best_hits: usize,
    /// Number of instances routed to each leaf
    pub instances_per_leaf: BTreeMap<NodeIndex, usize>,
}

impl EvaluationReport {
    /// Share of the gap between the single best and the virtual best that
    /// the tree closes. `None` when the two coincide.
    pub fn gap_closed(&self) -> Option<f64> {
        let gap = self.single_best_cost - self.oracle_cost;
        if gap.abs() <= f64::EPSILON {
            None
        } else {
            Some((self.single_best_cost - self.recommended_cost) / gap)
        }
    }
}

/// Applies a tree to instance sets.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    tree: &'a Tree,
    algorithm_names: Option<&'a [String]>,
}

impl<'a> Predictor<'a> {
    /// Creates a predictor for `tree`.
    ///
    /// Without configuration names, [`Predictor::evaluate`] reads results
    /// columns by position, so they must be in the order the tree was built
    /// with.
    pub fn new(tree: &'a Tree) -> Self {
        Predictor {
            tree,
            algorithm_names: None,
        }
    }

    /// Creates a predictor that matches configurations to results columns
    /// by name. `algorithm_names[a]` names configuration `a` of the tree.
    pub fn with_algorithm_names(tree: &'a Tree, algorithm_names: &'a [String]) -> Self {
        Predictor {
            tree,
            algorithm_names: Some(algorithm_names),
        }
    }

    /// Results column holding each configuration of the tree.
    fn results_columns(&self, results: &ResultsSet) -> Result<Vec<AlgorithmIndex>> {
        let num_algorithms = results.num_algorithms();
        let Some(names) = self.algorithm_names else {
            return Ok((0..num_algorithms).collect());
        };
        if names.len() != num_algorithms {
            return Err(PdtError::dimension_mismatch(
                format!("{} configurations", names.len()),
                format!("{} configurations", num_algorithms),
            ));
        }
        names
            .iter()
            .map(|name| {
                results
                    .algorithm_names()
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| {
                        PdtError::data(format!("configuration '{}' not found in results", name))
                    })
            })
            .collect()
    }

    /// Leaf reached by instance `i` of `instances`.
    pub fn predict_leaf(&self, instances: &InstanceSet, instance: usize) -> Result<NodeIndex> {
        let features = instances.instance_features(instance)?;
        self.tree.predict_leaf(&features)
    }

    /// Recommended configuration for every instance, in instance order.
    pub fn recommend_all(&self, instances: &InstanceSet) -> Result<Vec<AlgorithmIndex>> {
        (0..instances.num_instances())
            .map(|i| {
                let leaf = self.predict_leaf(instances, i)?;
                Ok(self.tree.nodes()[leaf].best_algorithm())
            })
            .collect()
    }

    /// Scores the tree on `results`.
    ///
    /// `results` must hold the same configurations the tree was built with;
    /// they are matched by name when the predictor has names. The features
    /// of `instances` must follow the training order.
    pub fn evaluate(
        &self,
        instances: &InstanceSet,
        results: &ResultsSet,
    ) -> Result<EvaluationReport> {
        check_compatible(instances, results)?;
        let columns = self.results_columns(results)?;
        let single_best = self.tree.root().best_algorithm();
        let single_best = *columns.get(single_best).ok_or_else(|| {
            PdtError::dimension_mismatch(
                format!("more than {} configurations", single_best),
                columns.len().to_string(),
            )
        })?;

        let n = instances.num_instances();
        let mut recommended_sum = 0.0;
        let mut single_best_sum = 0.0;
        let mut oracle_sum = 0.0;
        let mut best_hits = 0;
        let mut instances_per_leaf = BTreeMap::new();

        for i in 0..n {
            let leaf = self.predict_leaf(instances, i)?;
            let algorithm = self.tree.nodes()[leaf].best_algorithm();
            let algorithm = *columns
                .get(algorithm)
                .ok_or_else(|| PdtError::index_out_of_bounds(algorithm, columns.len()))?;

            recommended_sum += results.cost(i, algorithm);
            single_best_sum += results.cost(i, single_best);
            oracle_sum += results.best_cost_of_instance(i);
            if results.rank(i, algorithm) == 0 {
                best_hits += 1;
            }
            *instances_per_leaf.entry(leaf).or_insert(0) += 1;
        }

        let report = EvaluationReport {
            num_instances: n,
            recommended_cost: recommended_sum / n as f64,
            single_best_cost: single_best_sum / n as f64,
            oracle_cost: oracle_sum / n as f64,
            best_hits,
            instances_per_leaf,
        };
        log::info!(
            "Evaluated {} instances: recommended {:.6}, single best {:.6}, virtual best {:.6}",
            report.num_instances,
            report.recommended_cost,
            report.single_best_cost,
            report.oracle_cost
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfigBuilder;
    use crate::tree::build_tree;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn fixture() -> (InstanceSet, ResultsSet, Tree) {
        let instances = InstanceSet::from_float_columns(vec![vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
        let costs = array![[1.0, 9.0], [1.0, 9.0], [9.0, 1.0], [9.0, 1.0]];
        let results = ResultsSet::new(vec!["A".into(), "B".into()], costs).unwrap();
        let config = TreeConfigBuilder::new()
            .min_elements_branch(1)
            .max_depth(1)
            .build()
            .unwrap();
        let tree = build_tree(&instances, &results, &config).unwrap();
        (instances, results, tree)
    }

    #[test]
    fn test_recommend_all() {
        let (instances, _, tree) = fixture();
        let predictor = Predictor::new(&tree);
        assert_eq!(predictor.recommend_all(&instances).unwrap(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_evaluate_on_training_data() {
        let (instances, results, tree) = fixture();
        let report = Predictor::new(&tree).evaluate(&instances, &results).unwrap();

        assert_eq!(report.num_instances, 4);
        assert_abs_diff_eq!(report.recommended_cost, 1.0);
        assert_abs_diff_eq!(report.single_best_cost, 5.0);
        assert_abs_diff_eq!(report.oracle_cost, 1.0);
        assert_eq!(report.best_hits, 4);
        assert_eq!(report.instances_per_leaf.values().sum::<usize>(), 4);
        assert_abs_diff_eq!(report.gap_closed().unwrap(), 1.0);
    }

    #[test]
    fn test_evaluate_held_out() {
        let (_, _, tree) = fixture();
        let test_instances = InstanceSet::from_float_columns(vec![vec![0.0, 10.0]]).unwrap();
        let test_results =
            ResultsSet::new(vec!["A".into(), "B".into()], array![[2.0, 4.0], [8.0, 4.0]]).unwrap();
        let report = Predictor::new(&tree)
            .evaluate(&test_instances, &test_results)
            .unwrap();
        assert_abs_diff_eq!(report.recommended_cost, 3.0);
        assert_abs_diff_eq!(report.single_best_cost, 5.0);
        assert_abs_diff_eq!(report.oracle_cost, 3.0);
    }

    #[test]
    fn test_evaluate_matches_columns_by_name() {
        let (instances, results, tree) = fixture();
        let names = results.algorithm_names().to_vec();
        let expected = Predictor::with_algorithm_names(&tree, &names)
            .evaluate(&instances, &results)
            .unwrap();

        // same measurements with the configuration columns swapped
        let swapped = ResultsSet::new(
            vec!["B".into(), "A".into()],
            array![[9.0, 1.0], [9.0, 1.0], [1.0, 9.0], [1.0, 9.0]],
        )
        .unwrap();
        let report = Predictor::with_algorithm_names(&tree, &names)
            .evaluate(&instances, &swapped)
            .unwrap();
        assert_eq!(report, expected);
        assert_abs_diff_eq!(report.recommended_cost, 1.0);
        assert_abs_diff_eq!(report.single_best_cost, 5.0);

        // read by position, the swapped columns score every pick as the worst
        let positional = Predictor::new(&tree).evaluate(&instances, &swapped).unwrap();
        assert_abs_diff_eq!(positional.recommended_cost, 9.0);
    }

    #[test]
    fn test_evaluate_rejects_unknown_configuration() {
        let (instances, results, tree) = fixture();
        let names = results.algorithm_names().to_vec();
        let renamed =
            ResultsSet::new(vec!["A".into(), "C".into()], results.costs().clone()).unwrap();
        let err = Predictor::with_algorithm_names(&tree, &names)
            .evaluate(&instances, &renamed)
            .unwrap_err();
        assert!(matches!(err, PdtError::Data { .. }));

        let wider = ResultsSet::new(
            vec!["A".into(), "B".into(), "C".into()],
            array![[1.0, 9.0, 5.0], [1.0, 9.0, 5.0], [9.0, 1.0, 5.0], [9.0, 1.0, 5.0]],
        )
        .unwrap();
        let err = Predictor::with_algorithm_names(&tree, &names)
            .evaluate(&instances, &wider)
            .unwrap_err();
        assert!(matches!(err, PdtError::DimensionMismatch { .. }));
    }
}
