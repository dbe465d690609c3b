//! End-to-end tests: loading, building, predicting and writing trees.

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use pdtree_rust::*;
use tempfile::TempDir;

mod common;
use common::*;

#[test]
fn test_separable_example() {
    assert!(pdtree_rust::init().is_ok());
    let (instances, results) = separable_example();
    let tree = build_tree(&instances, &results, &config(1, 1, Evaluation::Average)).unwrap();

    assert_eq!(tree.num_nodes(), 3);
    let root = tree.root();
    assert_eq!(root.split_feature(), Some(0));
    assert_eq!(root.split_threshold(), Some(Threshold::Float(2.0)));
    assert_abs_diff_eq!(root.best_cost(), 5.0);

    let left = tree.node(root.left_child().unwrap()).unwrap();
    let right = tree.node(root.right_child().unwrap()).unwrap();
    assert_eq!(left.best_algorithm(), 0);
    assert_abs_diff_eq!(left.best_cost(), 1.0);
    assert_eq!(right.best_algorithm(), 1);
    assert_abs_diff_eq!(right.best_cost(), 1.0);

    assert_abs_diff_eq!(tree.stats().root_cost, 5.0);
    assert_abs_diff_eq!(tree.leaf_weighted_cost(), 1.0);
    assert_abs_diff_eq!(tree.improvement(), 5.0);
    assert_eq!(tree.min_leaf_size(), 2);
    assert_eq!(tree.depth(), 1);
}

#[test]
fn test_separable_example_in_rank_mode() {
    let (instances, results) = separable_example();
    let tree = build_tree(&instances, &results, &config(1, 1, Evaluation::Rank)).unwrap();

    assert_eq!(tree.root().split_threshold(), Some(Threshold::Float(2.0)));
    // Half the instances rank each configuration first: mean rank 0.5, reported +1.
    assert_abs_diff_eq!(tree.root().best_cost(), 1.5);
    assert_abs_diff_eq!(tree.leaf_weighted_cost(), 1.0);
}

#[test]
fn test_too_small_node_is_terminal() {
    let instances = InstanceSet::from_float_columns(vec![vec![1.0, 2.0, 3.0]]).unwrap();
    let results =
        ResultsSet::new(vec!["A".into(), "B".into()], array![[1.0, 9.0], [1.0, 9.0], [9.0, 1.0]])
            .unwrap();
    let tree = build_tree(&instances, &results, &config(2, 4, Evaluation::Average)).unwrap();
    assert_eq!(tree.num_nodes(), 1);
}

#[test]
fn test_ties_prevent_any_valid_cut() {
    // 2 × min instances, but the only group boundary leaves one instance on
    // the right.
    let instances = InstanceSet::from_float_columns(vec![vec![5.0, 5.0, 5.0, 7.0]]).unwrap();
    let results = ResultsSet::new(
        vec!["A".into(), "B".into()],
        array![[1.0, 9.0], [1.0, 9.0], [9.0, 1.0], [9.0, 1.0]],
    )
    .unwrap();
    let tree = build_tree(&instances, &results, &config(2, 4, Evaluation::Average)).unwrap();
    assert_eq!(tree.num_nodes(), 1);
    assert!(tree.root().is_leaf());
}

#[test]
fn test_exactly_twice_min_with_distinct_values_splits() {
    let (instances, results) = separable_example();
    let tree = build_tree(&instances, &results, &config(2, 4, Evaluation::Average)).unwrap();
    assert_eq!(tree.num_nodes(), 3);
    assert_partition_invariant(&tree, &instances, 2);
}

#[test]
fn test_categorical_features_are_skipped() {
    let instances = InstanceSet::new(
        (0..4).map(|i| format!("p{}", i)).collect(),
        vec!["family".into(), "size".into()],
        vec![
            FeatureColumn::Categorical(vec!["a".into(), "a".into(), "b".into(), "b".into()]),
            FeatureColumn::Integer(vec![10, 20, 30, 40]),
        ],
    )
    .unwrap();
    let (_, results) = separable_example();
    let mut learner = SerialTreeLearner::new(config(1, 1, Evaluation::Average)).unwrap();
    let tree = learner.train(&instances, &results).unwrap();

    assert_eq!(tree.root().split_feature(), Some(1));
    assert_eq!(tree.root().split_threshold(), Some(Threshold::Integer(20)));
    assert_eq!(learner.last_report().skipped_features, 1);
}

#[test]
fn test_determinism() {
    let instances = random_instances(120, 3, 2, 7);
    let results = random_results(120, 5, 11);
    let cfg = config(5, 4, Evaluation::Average);

    let first = build_tree(&instances, &results, &cfg).unwrap();
    let second = build_tree(&instances, &results, &cfg).unwrap();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn test_dominant_configuration_everywhere() {
    let instances = random_instances(80, 2, 2, 3);
    let mut costs = random_costs(80, 4, 5);
    for i in 0..80 {
        let others = (0..4)
            .filter(|&a| a != 2)
            .map(|a| costs[[i, a]])
            .fold(f64::INFINITY, f64::min);
        costs[[i, 2]] = others - 1.0;
    }
    let names = (0..4).map(|a| format!("alg_{}", a)).collect();
    let results = ResultsSet::new(names, costs).unwrap();

    for evaluation in [Evaluation::Average, Evaluation::Rank] {
        let tree = build_tree(&instances, &results, &config(4, 5, evaluation)).unwrap();
        for node in tree.nodes() {
            assert_eq!(node.best_algorithm(), 2, "node {} in {} mode", node.graph_id(), evaluation);
        }
    }
}

#[test]
fn test_random_tree_invariants() {
    let instances = random_instances(200, 3, 3, 21);
    let results = random_results(200, 6, 22);
    let cfg = config(8, 5, Evaluation::Average);
    let tree = build_tree(&instances, &results, &cfg).unwrap();

    tree.validate().unwrap();
    assert_partition_invariant(&tree, &instances, 8);
    assert!(tree.depth() <= 5);
    assert!(tree.min_leaf_size() >= 8);
    // A split never raises the weighted cost of the instances it divides.
    assert!(tree.leaf_weighted_cost() <= tree.stats().root_cost + 1e-9);
    for node in tree.nodes().iter().filter(|n| !n.is_leaf()) {
        let left = tree.node(node.left_child().unwrap()).unwrap();
        let right = tree.node(node.right_child().unwrap()).unwrap();
        assert_abs_diff_eq!(
            node.split_cost().unwrap(),
            left.best_cost() + right.best_cost(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_capped_cuts_still_produce_valid_tree() {
    let instances = random_instances(150, 2, 1, 31);
    let results = random_results(150, 4, 32);
    let cfg = TreeConfigBuilder::new()
        .min_elements_branch(5)
        .max_depth(4)
        .max_eval_branches(vec![4, 4, 2])
        .build()
        .unwrap();
    let mut learner = SerialTreeLearner::new(cfg).unwrap();
    let tree = learner.train(&instances, &results).unwrap();

    tree.validate().unwrap();
    assert_partition_invariant(&tree, &instances, 5);
    assert!(learner.last_report().evaluated_cuts > 0);
}

#[test]
fn test_csv_workflow() {
    let dir = TempDir::new().unwrap();
    write_example_csvs(dir.path()).unwrap();
    let cfg = config(1, 2, Evaluation::Average);

    let instances = load_instances(dir.path().join("instances.csv")).unwrap();
    assert_eq!(instances.num_instances(), 4);
    assert_eq!(instances.feature_type(0), Some(FeatureType::Integer));
    assert_eq!(instances.feature_type(1), Some(FeatureType::Float));
    assert_eq!(instances.feature_type(2), Some(FeatureType::Categorical));

    let results = load_results(dir.path().join("results.csv"), &instances, &cfg).unwrap();
    assert_eq!(results.algorithm_names(), &["A;fast".to_string(), "B;fast".to_string()]);

    let tree = build_tree(&instances, &results, &cfg).unwrap();
    assert_eq!(tree.root().split_feature(), Some(0));
    assert_eq!(tree.root().split_threshold(), Some(Threshold::Integer(2)));

    let report = Predictor::new(&tree).evaluate(&instances, &results).unwrap();
    assert_abs_diff_eq!(report.recommended_cost, 1.0);
    assert_abs_diff_eq!(report.single_best_cost, 5.0);
    assert_abs_diff_eq!(report.oracle_cost, 1.0);

    let model_path = dir.path().join("tree.json");
    let model = TreeModel::new(tree, &instances, &results, &cfg);
    model.save(&model_path).unwrap();
    let loaded = TreeModel::load(&model_path).unwrap();
    assert_eq!(loaded.feature_names, vec!["size", "density", "family"]);
    let features = vec![
        FeatureValue::Integer(4),
        FeatureValue::Float(0.4),
        FeatureValue::Categorical("sat".into()),
    ];
    assert_eq!(loaded.recommend(&features).unwrap(), "B;fast");

    let dot_path = dir.path().join("tree.gv");
    write_dot(&loaded.tree, &instances, &results, &dot_path).unwrap();
    let dot = std::fs::read_to_string(&dot_path).unwrap();
    assert!(dot.contains("size≤2"));
    assert!(dot.contains("A;fast"));
}

#[test]
fn test_missing_results_are_filled() {
    let dir = TempDir::new().unwrap();
    write_example_csvs(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("results.csv"),
        "instance,solver,time\np1,A,2\np1,B,4\np2,A,3\n",
    )
    .unwrap();
    let cfg = TreeConfigBuilder::new()
        .fill_strategy(FillStrategy::WorseInstT2)
        .build()
        .unwrap();

    let instances = load_instances(dir.path().join("instances.csv")).unwrap();
    let results = load_results(dir.path().join("results.csv"), &instances, &cfg).unwrap();
    assert_eq!(results.num_instances(), 4);
    // p2 has one known result: its worst, doubled.
    assert_abs_diff_eq!(results.cost(1, 1), 6.0);
    assert!(results.costs().iter().all(|c| c.is_finite()));
}

#[test]
fn test_mismatched_inputs_fail() {
    let (_, results) = separable_example();
    let instances = InstanceSet::from_float_columns(vec![vec![1.0, 2.0, 3.0]]).unwrap();
    let err = build_tree(&instances, &results, &TreeConfig::default()).unwrap_err();
    assert_eq!(err.category(), "dimension_mismatch");

    let bad: Result<ResultsSet> = ResultsSet::new(vec!["A".into()], Array2::zeros((4, 0)));
    assert!(bad.is_err());
}
