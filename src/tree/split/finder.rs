//! Exhaustive threshold search over the numeric features of a node.
//!
//! For every branchable feature the node's members are sorted by value and
//! swept from left to right. Groups of equal values always move together,
//! so a cut never separates two instances with the same value. Left and
//! right aggregates are updated incrementally as groups move across the cut.

use crate::core::error::{PdtError, Result};
use crate::core::types::{FeatureIndex, InstanceIndex, NodeIndex, Threshold};
use crate::dataset::{FeatureColumn, InstanceSet, ResultsSet};
use crate::tree::aggregate::SubsetAggregate;
use crate::tree::split::info::SplitInfo;
use std::cmp::Ordering;

/// Value type a feature can be branched on.
trait BranchValue: Copy {
    fn compare(&self, other: &Self) -> Ordering;
    fn to_threshold(self) -> Threshold;
}

impl BranchValue for i64 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_threshold(self) -> Threshold {
        Threshold::Integer(self)
    }
}

impl BranchValue for f64 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn to_threshold(self) -> Threshold {
        Threshold::Float(self)
    }
}

/// Configuration for split finding operations.
#[derive(Debug, Clone)]
pub struct SplitFinderConfig {
    /// Minimum number of instances on each side of a cut
    pub min_elements_branch: usize,
}

impl Default for SplitFinderConfig {
    fn default() -> Self {
        SplitFinderConfig {
            min_elements_branch: crate::core::constants::DEFAULT_MIN_ELEMENTS_BRANCH,
        }
    }
}

/// The node being searched.
#[derive(Debug, Clone, Copy)]
pub struct SplitRequest<'a> {
    /// Arena index of the node, used for error context
    pub node: NodeIndex,
    /// Instances of the node
    pub members: &'a [InstanceIndex],
    /// Aggregate over `members`
    pub aggregate: &'a SubsetAggregate,
    /// Maximum number of cuts evaluated per feature at this node's depth
    pub max_eval_branches: Option<usize>,
}

/// Outcome of a node search.
#[derive(Debug, Default)]
pub struct SearchReport {
    /// Best split found, if any feature admitted a valid cut
    pub best: Option<SplitInfo>,
    /// Features rejected with a recoverable error
    pub skipped: Vec<PdtError>,
    /// Number of cuts whose cost was computed
    pub evaluated_cuts: usize,
}

/// Buffers reused across features and nodes.
#[derive(Debug, Default)]
struct Scratch {
    order: Vec<InstanceIndex>,
    cuts: Vec<usize>,
    aggregates: Option<(SubsetAggregate, SubsetAggregate)>,
}

/// Split finder holding the sort and aggregate scratch buffers.
#[derive(Debug)]
pub struct SplitFinder {
    config: SplitFinderConfig,
    int_pairs: Vec<(i64, InstanceIndex)>,
    float_pairs: Vec<(f64, InstanceIndex)>,
    scratch: Scratch,
    warned: Vec<FeatureIndex>,
}

impl SplitFinder {
    /// Creates a new split finder with the given configuration.
    pub fn new(config: SplitFinderConfig) -> Self {
        SplitFinder {
            config,
            int_pairs: Vec::new(),
            float_pairs: Vec::new(),
            scratch: Scratch::default(),
            warned: Vec::new(),
        }
    }

    /// Returns the finder configuration.
    pub fn config(&self) -> &SplitFinderConfig {
        &self.config
    }

    /// Searches every feature of `instances` in ascending order.
    ///
    /// Features that cannot be branched on are recorded in the report and
    /// skipped. An empty feature set, or one where every feature is
    /// rejected, yields a report without a split.
    pub fn find_best_split(
        &mut self,
        instances: &InstanceSet,
        results: &ResultsSet,
        request: SplitRequest<'_>,
    ) -> Result<SearchReport> {
        let features: Vec<FeatureIndex> = (0..instances.num_features()).collect();
        self.find_best_split_among(instances, results, request, &features)
    }

    /// Searches the given candidate features, in the order given.
    pub fn find_best_split_among(
        &mut self,
        instances: &InstanceSet,
        results: &ResultsSet,
        request: SplitRequest<'_>,
        features: &[FeatureIndex],
    ) -> Result<SearchReport> {
        let mut report = SearchReport::default();
        for &feature in features {
            match self.search_feature(instances, results, request, feature, &mut report) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    if !self.warned.contains(&feature) {
                        log::warn!("skipping feature {}: {}", feature, e);
                        self.warned.push(feature);
                    } else {
                        log::debug!("skipping feature {} at node {}", feature, request.node);
                    }
                    report.skipped.push(e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Best split of the node restricted to one feature.
    ///
    /// Fails with a recoverable error if the feature is categorical.
    pub fn find_best_split_for_feature(
        &mut self,
        instances: &InstanceSet,
        results: &ResultsSet,
        request: SplitRequest<'_>,
        feature: FeatureIndex,
    ) -> Result<Option<SplitInfo>> {
        let mut report = SearchReport::default();
        self.search_feature(instances, results, request, feature, &mut report)?;
        Ok(report.best)
    }

    fn search_feature(
        &mut self,
        instances: &InstanceSet,
        results: &ResultsSet,
        request: SplitRequest<'_>,
        feature: FeatureIndex,
        report: &mut SearchReport,
    ) -> Result<()> {
        let column = instances
            .column(feature)
            .ok_or_else(|| PdtError::index_out_of_bounds(feature, instances.num_features()))?;

        if request.aggregate.len() != request.members.len() {
            return Err(PdtError::data(format!(
                "node {} aggregate counts {} instances but has {} members",
                request.node,
                request.aggregate.len(),
                request.members.len()
            )));
        }
        if let Some(&bad) = request.members.iter().find(|&&i| i >= column.len()) {
            return Err(PdtError::index_out_of_bounds(bad, column.len()));
        }

        let min = self.config.min_elements_branch.max(1);
        if request.members.len() < 2 * min {
            return Ok(());
        }

        self.prepare_scratch(results, request.aggregate)?;

        match column {
            FeatureColumn::Integer(values) => {
                fill_sorted(&mut self.int_pairs, values, request.members);
                sweep(
                    feature,
                    &self.int_pairs,
                    &mut self.scratch,
                    results,
                    request,
                    min,
                    report,
                )
            }
            FeatureColumn::Float(values) => {
                fill_sorted(&mut self.float_pairs, values, request.members);
                sweep(
                    feature,
                    &self.float_pairs,
                    &mut self.scratch,
                    results,
                    request,
                    min,
                    report,
                )
            }
            FeatureColumn::Categorical(_) => Err(PdtError::feature_not_branchable(
                feature,
                "categorical features cannot be branched on",
            )),
        }
    }

    fn prepare_scratch(&mut self, results: &ResultsSet, aggregate: &SubsetAggregate) -> Result<()> {
        let reusable = matches!(
            &self.scratch.aggregates,
            Some((left, _)) if left.evaluation() == aggregate.evaluation()
                && left.sums().len() == aggregate.sums().len()
        );
        if !reusable {
            let left = SubsetAggregate::empty(results, aggregate.evaluation())?;
            let right = left.clone();
            self.scratch.aggregates = Some((left, right));
        }
        Ok(())
    }
}

fn fill_sorted<V: BranchValue>(
    pairs: &mut Vec<(V, InstanceIndex)>,
    values: &[V],
    members: &[InstanceIndex],
) {
    pairs.clear();
    pairs.extend(members.iter().map(|&i| (values[i], i)));
    pairs.sort_unstable_by(|a, b| a.0.compare(&b.0).then(a.1.cmp(&b.1)));
}

/// Positions where a cut may be placed: ends of equal-value groups leaving
/// at least `min` instances on both sides.
fn valid_cuts<V: BranchValue>(pairs: &[(V, InstanceIndex)], min: usize, cuts: &mut Vec<usize>) {
    cuts.clear();
    let n = pairs.len();
    for pos in min..=(n - min) {
        if pairs[pos - 1].0.compare(&pairs[pos].0) != Ordering::Equal {
            cuts.push(pos);
        }
    }
}

/// Keeps `cap` evenly spaced cuts, the first one always included.
fn coarsen(cuts: &mut Vec<usize>, cap: usize) {
    let total = cuts.len();
    if cap == 0 || total <= cap {
        return;
    }
    for k in 0..cap {
        cuts[k] = cuts[k * total / cap];
    }
    cuts.truncate(cap);
}

fn sweep<V: BranchValue>(
    feature: FeatureIndex,
    pairs: &[(V, InstanceIndex)],
    scratch: &mut Scratch,
    results: &ResultsSet,
    request: SplitRequest<'_>,
    min: usize,
    report: &mut SearchReport,
) -> Result<()> {
    let Scratch {
        order,
        cuts,
        aggregates,
    } = scratch;
    let (left, right) = aggregates
        .as_mut()
        .ok_or_else(|| PdtError::internal("split scratch aggregates not prepared"))?;

    valid_cuts(pairs, min, cuts);
    if let Some(cap) = request.max_eval_branches {
        coarsen(cuts, cap);
    }
    if cuts.is_empty() {
        return Ok(());
    }

    order.clear();
    order.extend(pairs.iter().map(|&(_, i)| i));
    left.clear();
    right.copy_from(request.aggregate);
    if !right.tracks_membership() {
        right
            .recompute(results, order)
            .map_err(|e| PdtError::aggregate(Some(request.node), e))?;
    }

    let node = request.node;
    let mut moved = 0;
    let mut best_cost = report.best.as_ref().map_or(f64::INFINITY, |b| b.cost);
    let mut best_cut = None;
    for &cut in cuts.iter() {
        // every instance between two evaluated cuts changes side
        let batch = &order[moved..cut];
        left
            .add(results, batch)
            .map_err(|e| PdtError::aggregate(Some(node), e))?;
        right
            .remove(results, batch)
            .map_err(|e| PdtError::aggregate(Some(node), e))?;
        moved = cut;

        let cost = left.best_cost() + right.best_cost();
        report.evaluated_cuts += 1;

        if cost < best_cost || (best_cut.is_none() && report.best.is_none()) {
            best_cost = cost;
            best_cut = Some(cut);
        }
    }

    // the winning cut of this feature is materialized once
    if let Some(cut) = best_cut {
        let threshold = pairs[cut - 1].0.to_threshold();
        let best = report.best.get_or_insert_with(|| SplitInfo {
            feature,
            threshold,
            cost: f64::INFINITY,
            left_count: cut,
            sorted: Vec::with_capacity(order.len()),
            left: left.clone(),
            right: right.clone(),
        });
        best.assign(results, feature, threshold, cut, order)
            .map_err(|e| PdtError::aggregate(Some(node), e))?;
    }

    log::trace!(
        "node {} feature {}: {} cuts evaluated",
        node,
        feature,
        cuts.len()
    );
    Ok(())
}
