//! Performance matrix: cost and rank of every algorithm configuration on
//! every instance.
//!
//! Ranks are computed once over the full instance set when the matrix is
//! built; the tree learner only reads them.

use crate::core::constants::{DEFAULT_RANK_EPS, DEFAULT_RANK_PERC};
use crate::core::error::{PdtError, Result};
use crate::core::types::{AlgorithmIndex, Evaluation, FillStrategy, InstanceIndex, Rank, SumType};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Instance × configuration costs and ranks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSet {
    algorithm_names: Vec<String>,
    costs: Array2<f64>,
    ranks: Array2<Rank>,
}

impl ResultsSet {
    /// Creates a performance matrix from complete costs, ranking with the
    /// default tolerances.
    pub fn new(algorithm_names: Vec<String>, costs: Array2<f64>) -> Result<Self> {
        Self::with_tolerances(algorithm_names, costs, DEFAULT_RANK_EPS, DEFAULT_RANK_PERC)
    }

    /// Creates a performance matrix from complete costs, ranking with the
    /// given tolerances.
    pub fn with_tolerances(
        algorithm_names: Vec<String>,
        costs: Array2<f64>,
        rank_eps: f64,
        rank_perc: f64,
    ) -> Result<Self> {
        Self::check_shape(&algorithm_names, &costs)?;
        if let Some(((i, a), _)) = costs.indexed_iter().find(|(_, c)| !c.is_finite()) {
            return Err(PdtError::data(format!(
                "cost of configuration {} on instance {} is not finite",
                a, i
            )));
        }
        let ranks = compute_rankings(&costs, rank_eps, rank_perc);
        Ok(ResultsSet {
            algorithm_names,
            costs,
            ranks,
        })
    }

    /// Creates a performance matrix with externally computed ranks.
    pub fn with_ranks(
        algorithm_names: Vec<String>,
        costs: Array2<f64>,
        ranks: Array2<Rank>,
    ) -> Result<Self> {
        Self::check_shape(&algorithm_names, &costs)?;
        if ranks.dim() != costs.dim() {
            return Err(PdtError::dimension_mismatch(
                format!("{:?} ranks", costs.dim()),
                format!("{:?}", ranks.dim()),
            ));
        }
        Ok(ResultsSet {
            algorithm_names,
            costs,
            ranks,
        })
    }

    /// Creates a performance matrix from a matrix with missing cells, filling
    /// them with `strategy` before ranking.
    pub fn from_partial(
        algorithm_names: Vec<String>,
        partial: &Array2<Option<f64>>,
        strategy: FillStrategy,
        fill_value: f64,
        rank_eps: f64,
        rank_perc: f64,
    ) -> Result<Self> {
        let costs = fill_missing(partial, strategy, fill_value)?;
        Self::with_tolerances(algorithm_names, costs, rank_eps, rank_perc)
    }

    fn check_shape(algorithm_names: &[String], costs: &Array2<f64>) -> Result<()> {
        let (num_instances, num_algorithms) = costs.dim();
        if num_instances == 0 {
            return Err(PdtError::data("performance matrix has no instances"));
        }
        if num_algorithms == 0 {
            return Err(PdtError::data(
                "performance matrix has no algorithm configurations",
            ));
        }
        if algorithm_names.len() != num_algorithms {
            return Err(PdtError::dimension_mismatch(
                format!("{} algorithm names", num_algorithms),
                algorithm_names.len().to_string(),
            ));
        }
        Ok(())
    }

    /// Number of instances (rows).
    pub fn num_instances(&self) -> usize {
        self.costs.nrows()
    }

    /// Number of algorithm configurations (columns).
    pub fn num_algorithms(&self) -> usize {
        self.costs.ncols()
    }

    /// Configuration names in index order.
    pub fn algorithm_names(&self) -> &[String] {
        &self.algorithm_names
    }

    /// Name of configuration `algorithm`.
    pub fn algorithm_name(&self, algorithm: AlgorithmIndex) -> Option<&str> {
        self.algorithm_names.get(algorithm).map(String::as_str)
    }

    /// Raw cost of `algorithm` on `instance`.
    pub fn cost(&self, instance: InstanceIndex, algorithm: AlgorithmIndex) -> f64 {
        self.costs[[instance, algorithm]]
    }

    /// Rank of `algorithm` on `instance` (0 is best).
    pub fn rank(&self, instance: InstanceIndex, algorithm: AlgorithmIndex) -> Rank {
        self.ranks[[instance, algorithm]]
    }

    /// Value accumulated by subset aggregates under `evaluation`.
    #[inline]
    pub fn value(
        &self,
        instance: InstanceIndex,
        algorithm: AlgorithmIndex,
        evaluation: Evaluation,
    ) -> SumType {
        match evaluation {
            Evaluation::Average => self.costs[[instance, algorithm]] as SumType,
            Evaluation::Rank => self.ranks[[instance, algorithm]] as SumType,
        }
    }

    /// Cost matrix view.
    pub fn costs(&self) -> &Array2<f64> {
        &self.costs
    }

    /// Rank matrix view.
    pub fn ranks(&self) -> &Array2<Rank> {
        &self.ranks
    }

    /// Per-configuration sum of costs over all instances.
    pub fn column_sums(&self) -> Array1<f64> {
        self.costs.sum_axis(Axis(0))
    }

    /// Lowest cost reached on `instance` by any configuration.
    pub fn best_cost_of_instance(&self, instance: InstanceIndex) -> f64 {
        self.costs
            .row(instance)
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }
}

/// Fills the missing cells of `partial` following `strategy`.
pub fn fill_missing(
    partial: &Array2<Option<f64>>,
    strategy: FillStrategy,
    fill_value: f64,
) -> Result<Array2<f64>> {
    let (num_instances, num_algorithms) = partial.dim();
    if num_instances == 0 || num_algorithms == 0 {
        return Err(PdtError::data("performance matrix is empty"));
    }

    let mut worse = f64::NEG_INFINITY;
    let mut worse_inst = vec![f64::NEG_INFINITY; num_instances];
    let mut sum_inst = vec![0.0f64; num_instances];
    let mut count_inst = vec![0usize; num_instances];

    for ((i, _), cell) in partial.indexed_iter() {
        if let Some(r) = cell {
            worse = worse.max(*r);
            worse_inst[i] = worse_inst[i].max(*r);
            sum_inst[i] += *r;
            count_inst[i] += 1;
        }
    }

    if worse == f64::NEG_INFINITY {
        return Err(PdtError::data("performance matrix has no known results"));
    }

    let mut missing = 0usize;
    let costs = Array2::from_shape_fn((num_instances, num_algorithms), |(i, a)| {
        if let Some(r) = partial[[i, a]] {
            return r;
        }
        missing += 1;
        // instances without any result fall back to the global worst
        let inst_worse = if count_inst[i] > 0 { worse_inst[i] } else { worse };
        match strategy {
            FillStrategy::Worse => worse,
            FillStrategy::WorseT2 => worse.abs() * 2.0,
            FillStrategy::WorseInst => inst_worse,
            FillStrategy::WorseInstT2 => inst_worse.abs() * 2.0,
            FillStrategy::AverageInst => {
                if count_inst[i] > 0 {
                    sum_inst[i] / count_inst[i] as f64
                } else {
                    worse
                }
            }
            FillStrategy::Value => fill_value,
        }
    });

    if missing > 0 {
        let percent = missing as f64 / (num_instances * num_algorithms) as f64 * 100.0;
        log::warn!(
            "{} results for instance x configuration missing ({:.2}%), filled with strategy '{}'",
            missing,
            percent,
            strategy
        );
    }

    Ok(costs)
}

/// Dense per-instance ranking of configurations.
///
/// Configurations are visited in ascending cost order (ties by index). The
/// rank only increases when a cost exceeds the last rank anchor by more than
/// `rank_eps` and by more than `rank_perc` of the anchor's magnitude.
pub fn compute_rankings(costs: &Array2<f64>, rank_eps: f64, rank_perc: f64) -> Array2<Rank> {
    let (num_instances, num_algorithms) = costs.dim();
    let mut ranks = Array2::zeros((num_instances, num_algorithms));
    let mut order: Vec<AlgorithmIndex> = Vec::with_capacity(num_algorithms);

    for i in 0..num_instances {
        let row = costs.row(i);
        order.clear();
        order.extend(0..num_algorithms);
        order.sort_by(|&a, &b| row[a].total_cmp(&row[b]).then(a.cmp(&b)));

        let mut rank: Rank = 0;
        let mut anchor = row[order[0]];
        for &a in &order {
            let diff = row[a] - anchor;
            if diff > rank_eps && diff > rank_perc * anchor.abs() {
                rank += 1;
                anchor = row[a];
            }
            ranks[[i, a]] = rank;
        }
    }

    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|a| format!("alg{}", a)).collect()
    }

    #[test]
    fn test_results_set_basics() {
        let costs = array![[1.0, 9.0], [1.0, 9.0], [9.0, 1.0]];
        let rset = ResultsSet::new(names(2), costs).unwrap();
        assert_eq!(rset.num_instances(), 3);
        assert_eq!(rset.num_algorithms(), 2);
        assert_eq!(rset.rank(0, 0), 0);
        assert_eq!(rset.rank(0, 1), 1);
        assert_eq!(rset.rank(2, 0), 1);
        assert_eq!(rset.column_sums(), array![11.0, 19.0]);
        assert_eq!(rset.best_cost_of_instance(2), 1.0);
        assert_eq!(rset.value(2, 0, Evaluation::Rank), 1.0);
        assert_eq!(rset.value(2, 0, Evaluation::Average), 9.0);
    }

    #[test]
    fn test_empty_matrix_is_data_error() {
        let costs = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            ResultsSet::new(names(2), costs),
            Err(PdtError::Data { .. })
        ));

        let costs = Array2::<f64>::zeros((3, 0));
        assert!(matches!(
            ResultsSet::new(names(0), costs),
            Err(PdtError::Data { .. })
        ));
    }

    #[test]
    fn test_rank_tolerances() {
        // 100.0 and 100.5 are within 1% of each other
        let costs = array![[100.0, 100.5, 150.0, 100.0]];
        let ranks = compute_rankings(&costs, 1e-8, 0.01);
        assert_eq!(ranks.row(0).to_vec(), vec![0, 0, 1, 0]);

        let ranks = compute_rankings(&costs, 1e-8, 0.0);
        assert_eq!(ranks.row(0).to_vec(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_fill_strategies() {
        let partial = array![[Some(1.0), None, Some(3.0)], [Some(-2.0), Some(5.0), None]];

        let worse = fill_missing(&partial, FillStrategy::Worse, 0.0).unwrap();
        assert_eq!(worse[[0, 1]], 5.0);
        assert_eq!(worse[[1, 2]], 5.0);

        let worse_t2 = fill_missing(&partial, FillStrategy::WorseT2, 0.0).unwrap();
        assert_eq!(worse_t2[[0, 1]], 10.0);

        let inst = fill_missing(&partial, FillStrategy::WorseInst, 0.0).unwrap();
        assert_eq!(inst[[0, 1]], 3.0);
        assert_eq!(inst[[1, 2]], 5.0);

        let inst_t2 = fill_missing(&partial, FillStrategy::WorseInstT2, 0.0).unwrap();
        assert_eq!(inst_t2[[0, 1]], 6.0);

        let avg = fill_missing(&partial, FillStrategy::AverageInst, 0.0).unwrap();
        assert_eq!(avg[[0, 1]], 2.0);
        assert_eq!(avg[[1, 2]], 1.5);

        let value = fill_missing(&partial, FillStrategy::Value, 42.0).unwrap();
        assert_eq!(value[[0, 1]], 42.0);
        assert_eq!(value[[0, 0]], 1.0);
    }

    #[test]
    fn test_fill_all_missing_is_error() {
        let partial: Array2<Option<f64>> = Array2::from_elem((2, 2), None);
        assert!(fill_missing(&partial, FillStrategy::Worse, 0.0).is_err());
    }

    #[test]
    fn test_with_ranks_shape_check() {
        let costs = array![[1.0, 2.0]];
        let ranks = Array2::<Rank>::zeros((2, 2));
        assert!(ResultsSet::with_ranks(names(2), costs, ranks).is_err());
    }
}
