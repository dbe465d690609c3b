//! Subset aggregate: per-configuration accumulated results over a subset of
//! instances, maintained incrementally.
//!
//! The aggregate owns only its sums. The performance matrix is passed to
//! every mutating call, so the same aggregate type serves as node snapshot
//! and as reusable scratch buffer during split search.

use crate::core::error::{AggregateError, PdtError, Result};
use crate::core::types::{AlgorithmIndex, Evaluation, InstanceIndex, SumType};
use crate::dataset::ResultsSet;
use serde::{Deserialize, Serialize};

type AggregateResult<T> = std::result::Result<T, AggregateError>;

/// Accumulated results of every algorithm configuration over a subset of
/// instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetAggregate {
    evaluation: Evaluation,
    size: usize,
    sums: Vec<SumType>,
    best_algorithm: AlgorithmIndex,
    best_cost: f64,
    num_instances: usize,
    /// Membership bitmap over the instances of the performance matrix.
    /// Empty after deserialization until `recompute` rebuilds it.
    #[serde(skip)]
    members: Vec<u64>,
}

impl SubsetAggregate {
    /// Creates an aggregate with no instances counted.
    pub fn empty(results: &ResultsSet, evaluation: Evaluation) -> Result<Self> {
        let num_algorithms = results.num_algorithms();
        if num_algorithms == 0 {
            return Err(PdtError::data(AggregateError::NoAlgorithms.to_string()));
        }

        let mut sums: Vec<SumType> = Vec::new();
        sums.try_reserve_exact(num_algorithms).map_err(|e| {
            PdtError::resource(format!(
                "cannot allocate sums for {} configurations: {}",
                num_algorithms, e
            ))
        })?;
        sums.resize(num_algorithms, 0.0);

        let mut members = Vec::new();
        members
            .try_reserve_exact(membership_words(results.num_instances()))
            .map_err(|e| PdtError::resource(format!("cannot allocate membership: {}", e)))?;
        members.resize(membership_words(results.num_instances()), 0);

        let mut aggregate = SubsetAggregate {
            evaluation,
            size: 0,
            sums,
            best_algorithm: 0,
            best_cost: f64::INFINITY,
            num_instances: results.num_instances(),
            members,
        };
        aggregate.update_best();
        Ok(aggregate)
    }

    /// Creates an aggregate over every instance of the performance matrix.
    pub fn all(results: &ResultsSet, evaluation: Evaluation) -> Result<Self> {
        if results.num_instances() == 0 {
            return Err(PdtError::data(AggregateError::NoInstances.to_string()));
        }
        let indices: Vec<InstanceIndex> = (0..results.num_instances()).collect();
        Self::from_indices(results, evaluation, &indices)
    }

    /// Creates an aggregate over the given instances.
    ///
    /// An empty index list is a data error; use [`SubsetAggregate::empty`]
    /// for an aggregate that starts with nothing counted.
    pub fn from_indices(
        results: &ResultsSet,
        evaluation: Evaluation,
        indices: &[InstanceIndex],
    ) -> Result<Self> {
        if indices.is_empty() {
            return Err(PdtError::data(AggregateError::NoInstances.to_string()));
        }
        let mut aggregate = Self::empty(results, evaluation)?;
        aggregate.add(results, indices)?;
        Ok(aggregate)
    }

    /// Counts `indices` in the subset and refreshes the best configuration.
    ///
    /// Fails if an instance is already counted. On error the aggregate is
    /// left unchanged.
    pub fn add(&mut self, results: &ResultsSet, indices: &[InstanceIndex]) -> AggregateResult<()> {
        self.check_range(indices)?;
        self.mark(indices, true)?;

        for &i in indices {
            self.accumulate(results, i, 1.0);
        }
        self.size += indices.len();
        self.update_best();
        Ok(())
    }

    /// Removes `indices` from the subset and refreshes the best configuration.
    ///
    /// Fails if an instance is not counted. On error the aggregate is left
    /// unchanged.
    pub fn remove(
        &mut self,
        results: &ResultsSet,
        indices: &[InstanceIndex],
    ) -> AggregateResult<()> {
        if indices.len() > self.size {
            return Err(AggregateError::RemoveTooMany {
                requested: indices.len(),
                available: self.size,
            });
        }
        self.check_range(indices)?;
        self.mark(indices, false)?;

        for &i in indices {
            self.accumulate(results, i, -1.0);
        }
        self.size -= indices.len();
        self.update_best();
        Ok(())
    }

    /// Rebuilds the sums and membership from scratch over `indices`,
    /// discarding any drift accumulated by incremental updates.
    ///
    /// Fails if `indices` holds an instance twice; the aggregate is then
    /// left unchanged.
    pub fn recompute(
        &mut self,
        results: &ResultsSet,
        indices: &[InstanceIndex],
    ) -> AggregateResult<()> {
        self.check_range(indices)?;
        let mut members = vec![0; membership_words(self.num_instances)];
        for &i in indices {
            let (word, bit) = (i / 64, 1u64 << (i % 64));
            if members[word] & bit != 0 {
                return Err(AggregateError::AlreadyCounted { instance: i });
            }
            members[word] |= bit;
        }
        self.members = members;
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        for &i in indices {
            self.accumulate(results, i, 1.0);
        }
        self.size = indices.len();
        self.update_best();
        Ok(())
    }

    /// Makes `self` an exact copy of `other`, reusing the sums buffer.
    pub fn copy_from(&mut self, other: &SubsetAggregate) {
        self.evaluation = other.evaluation;
        self.size = other.size;
        self.sums.clear();
        self.sums.extend_from_slice(&other.sums);
        self.best_algorithm = other.best_algorithm;
        self.best_cost = other.best_cost;
        self.num_instances = other.num_instances;
        self.members.clear();
        self.members.extend_from_slice(&other.members);
    }

    /// Resets to an empty subset, keeping the buffers.
    pub fn clear(&mut self) {
        self.size = 0;
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.members.clear();
        self.members.resize(membership_words(self.num_instances), 0);
        self.update_best();
    }

    #[inline]
    fn accumulate(&mut self, results: &ResultsSet, instance: InstanceIndex, sign: SumType) {
        match self.evaluation {
            Evaluation::Average => {
                let row = results.costs().row(instance);
                for (s, &c) in self.sums.iter_mut().zip(row.iter()) {
                    *s += sign * c as SumType;
                }
            }
            Evaluation::Rank => {
                let row = results.ranks().row(instance);
                for (s, &r) in self.sums.iter_mut().zip(row.iter()) {
                    *s += sign * r as SumType;
                }
            }
        }
    }

    fn check_range(&self, indices: &[InstanceIndex]) -> AggregateResult<()> {
        match indices.iter().find(|&&i| i >= self.num_instances) {
            Some(&instance) => Err(AggregateError::InstanceOutOfRange {
                instance,
                num_instances: self.num_instances,
            }),
            None => Ok(()),
        }
    }

    /// Flips membership of `indices` to `counted`, rolling back on the first
    /// instance already in that state.
    fn mark(&mut self, indices: &[InstanceIndex], counted: bool) -> AggregateResult<()> {
        if !self.tracks_membership() {
            return Err(AggregateError::MembershipUnknown);
        }
        for (pos, &i) in indices.iter().enumerate() {
            if self.is_member(i) == counted {
                for &j in &indices[..pos] {
                    self.members[j / 64] ^= 1u64 << (j % 64);
                }
                return Err(if counted {
                    AggregateError::AlreadyCounted { instance: i }
                } else {
                    AggregateError::NotCounted { instance: i }
                });
            }
            self.members[i / 64] ^= 1u64 << (i % 64);
        }
        Ok(())
    }

    #[inline]
    fn is_member(&self, instance: InstanceIndex) -> bool {
        self.members[instance / 64] & (1u64 << (instance % 64)) != 0
    }

    fn update_best(&mut self) {
        // strict-less scan keeps the lowest index on ties
        let mut best = 0;
        let mut best_sum = SumType::INFINITY;
        for (a, &s) in self.sums.iter().enumerate() {
            if s < best_sum {
                best_sum = s;
                best = a;
            }
        }
        self.best_algorithm = best;
        self.best_cost = self.normalize(best_sum);
    }

    #[inline]
    fn normalize(&self, sum: SumType) -> f64 {
        if self.size == 0 {
            return f64::INFINITY;
        }
        let avg = sum / self.size as SumType;
        match self.evaluation {
            Evaluation::Average => avg,
            Evaluation::Rank => avg + 1.0,
        }
    }

    /// Best configuration of the subset (lowest index on ties).
    #[inline]
    pub fn best_algorithm(&self) -> AlgorithmIndex {
        self.best_algorithm
    }

    /// Normalized cost of the best configuration. Infinite for an empty
    /// subset.
    #[inline]
    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Normalized cost of configuration `algorithm` over the subset.
    pub fn cost_of(&self, algorithm: AlgorithmIndex) -> f64 {
        self.sums
            .get(algorithm)
            .map(|&s| self.normalize(s))
            .unwrap_or(f64::INFINITY)
    }

    /// All configurations sorted from best to worst, ties by index.
    pub fn ranked_algorithms(&self) -> Vec<AlgorithmIndex> {
        let mut order: Vec<AlgorithmIndex> = (0..self.sums.len()).collect();
        order.sort_by(|&a, &b| self.sums[a].total_cmp(&self.sums[b]).then(a.cmp(&b)));
        order
    }

    /// Number of instances counted.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no instance is counted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if the counted instances are known, which incremental
    /// updates require. False only for deserialized aggregates that have not
    /// been recomputed.
    pub fn tracks_membership(&self) -> bool {
        self.members.len() == membership_words(self.num_instances)
    }

    /// Returns true if `instance` is counted in the subset.
    pub fn contains(&self, instance: InstanceIndex) -> bool {
        instance < self.num_instances && self.tracks_membership() && self.is_member(instance)
    }

    /// Raw accumulated sums, one per configuration.
    pub fn sums(&self) -> &[SumType] {
        &self.sums
    }

    /// Evaluation mode fixed at construction.
    pub fn evaluation(&self) -> Evaluation {
        self.evaluation
    }

    /// Largest relative difference between these sums and `other`'s.
    pub fn max_relative_difference(&self, other: &SubsetAggregate) -> f64 {
        self.sums
            .iter()
            .zip(&other.sums)
            .map(|(&a, &b)| {
                let scale = a.abs().max(b.abs()).max(1.0);
                (a - b).abs() / scale
            })
            .fold(0.0, f64::max)
    }
}

fn membership_words(num_instances: usize) -> usize {
    num_instances.div_ceil(64)
}
