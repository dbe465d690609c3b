//! Shared fixtures for the pdtree-rust integration tests.

#![allow(dead_code)]

use ndarray::{array, Array2};
use pdtree_rust::*;
use rand::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// The four-instance, two-configuration example where the feature
/// perfectly separates the configurations at 2.0.
pub fn separable_example() -> (InstanceSet, ResultsSet) {
    let instances = InstanceSet::from_float_columns(vec![vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
    let costs = array![[1.0, 9.0], [1.0, 9.0], [9.0, 1.0], [9.0, 1.0]];
    let results = ResultsSet::new(vec!["A".into(), "B".into()], costs).unwrap();
    (instances, results)
}

/// Random instance set with `num_float` float features and `num_int`
/// integer features drawn from a small range, so that ties are common.
pub fn random_instances(
    num_instances: usize,
    num_float: usize,
    num_int: usize,
    seed: u64,
) -> InstanceSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut names = Vec::new();
    let mut columns = Vec::new();

    for f in 0..num_float {
        names.push(format!("float_{}", f));
        columns.push(FeatureColumn::Float(
            (0..num_instances).map(|_| rng.gen_range(-5.0..5.0)).collect(),
        ));
    }
    for f in 0..num_int {
        names.push(format!("int_{}", f));
        columns.push(FeatureColumn::Integer(
            (0..num_instances).map(|_| rng.gen_range(0..6)).collect(),
        ));
    }

    let instance_names = (0..num_instances).map(|i| format!("inst_{}", i)).collect();
    InstanceSet::new(instance_names, names, columns).unwrap()
}

/// Random cost matrix with values in `[0, 100)`.
pub fn random_costs(num_instances: usize, num_algorithms: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((num_instances, num_algorithms), |_| rng.gen_range(0.0..100.0))
}

/// Random performance matrix with configurations named `alg_0..`.
pub fn random_results(num_instances: usize, num_algorithms: usize, seed: u64) -> ResultsSet {
    let names = (0..num_algorithms).map(|a| format!("alg_{}", a)).collect();
    ResultsSet::new(names, random_costs(num_instances, num_algorithms, seed)).unwrap()
}

/// Configuration with the given branch minimum and depth limit.
pub fn config(min_elements: usize, max_depth: usize, evaluation: Evaluation) -> TreeConfig {
    TreeConfigBuilder::new()
        .min_elements_branch(min_elements)
        .max_depth(max_depth)
        .evaluation(evaluation)
        .build()
        .unwrap()
}

/// Asserts that every internal node's children partition its members and
/// respect its threshold, and that each side holds at least `min_elements`.
pub fn assert_partition_invariant(tree: &Tree, instances: &InstanceSet, min_elements: usize) {
    for node in tree.nodes().iter().filter(|n| !n.is_leaf()) {
        let left = tree.node(node.left_child().unwrap()).unwrap();
        let right = tree.node(node.right_child().unwrap()).unwrap();
        let feature = node.split_feature().unwrap();
        let threshold = node.split_threshold().unwrap();

        assert!(left.size() >= min_elements, "left child too small");
        assert!(right.size() >= min_elements, "right child too small");
        assert_eq!(left.size() + right.size(), node.size());

        let parent: HashSet<_> = node.members().iter().copied().collect();
        let left_set: HashSet<_> = left.members().iter().copied().collect();
        let right_set: HashSet<_> = right.members().iter().copied().collect();
        assert!(left_set.is_disjoint(&right_set));
        let union: HashSet<_> = left_set.union(&right_set).copied().collect();
        assert_eq!(union, parent);

        for &i in left.members() {
            let value = instances.value(i, feature).unwrap();
            assert_eq!(threshold.goes_left(&value), Some(true));
        }
        for &i in right.members() {
            let value = instances.value(i, feature).unwrap();
            assert_eq!(threshold.goes_left(&value), Some(false));
        }
    }
}

/// Writes the instances and results CSV files used by the loader tests.
pub fn write_example_csvs(dir: &Path) -> std::io::Result<()> {
    fs::write(
        dir.join("instances.csv"),
        "instance,size,density,family\n\
         p1,1,0.10,graph\n\
         p2,2,0.20,graph\n\
         p3,3,0.30,sat\n\
         p4,4,0.40,sat\n",
    )?;
    fs::write(
        dir.join("results.csv"),
        "instance,solver,preset,time\n\
         p1,A,fast,1\n\
         p1,B,fast,9\n\
         p2,A,fast,1\n\
         p2,B,fast,9\n\
         p3,A,fast,9\n\
         p3,B,fast,1\n\
         p4,A,fast,9\n\
         p4,B,fast,1\n\
         unknown,A,fast,3\n",
    )?;
    Ok(())
}
