//! Core data types for pdtree-rust.
//!
//! Index aliases, the accumulator type used by subset aggregates, and the
//! small enumerations shared by the dataset, tree and configuration modules.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Stable index of a problem instance in the feature store.
pub type InstanceIndex = usize;

/// Stable index of an algorithm configuration in the performance matrix.
pub type AlgorithmIndex = usize;

/// Feature index type for identifying features in the instance set.
pub type FeatureIndex = usize;

/// Tree node identifier type (position in the node arena).
pub type NodeIndex = usize;

/// Accumulator type for per-algorithm sums.
///
/// 64-bit float; incremental add/remove drifts from a full recomputation by
/// at most a few ulps per moved instance, see DESIGN.md for the tolerance.
pub type SumType = f64;

/// Rank of an algorithm configuration on one instance (0 is best).
pub type Rank = u32;

/// How per-instance results are aggregated over a subset of instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    /// Raw costs are averaged; use when results are comparable across
    /// instances, e.g. running times.
    Average,
    /// Per-instance ranks are averaged; use when result scales differ
    /// between instances. Reported costs are offset by one.
    Rank,
}

impl Default for Evaluation {
    fn default() -> Self {
        Evaluation::Average
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Average => write!(f, "average"),
            Evaluation::Rank => write!(f, "rank"),
        }
    }
}

impl std::str::FromStr for Evaluation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "average" => Ok(Evaluation::Average),
            "rank" => Ok(Evaluation::Rank),
            other => Err(format!("unknown evaluation mode '{}'", other)),
        }
    }
}

/// Type tag of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// Integer-valued feature (branchable)
    Integer,
    /// Real-valued feature (branchable)
    Float,
    /// String-valued feature (not branchable)
    Categorical,
}

impl FeatureType {
    /// Returns true if splits may be placed on this feature type.
    pub fn is_branchable(&self) -> bool {
        matches!(self, FeatureType::Integer | FeatureType::Float)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Integer => write!(f, "integer"),
            FeatureType::Float => write!(f, "float"),
            FeatureType::Categorical => write!(f, "categorical"),
        }
    }
}

/// A single feature value of an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Categorical(String),
}

impl FeatureValue {
    /// Returns the type tag of this value.
    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeatureValue::Integer(_) => FeatureType::Integer,
            FeatureValue::Float(_) => FeatureType::Float,
            FeatureValue::Categorical(_) => FeatureType::Categorical,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Categorical(v) => write!(f, "{}", v),
        }
    }
}

/// Split threshold of an internal node: instances whose value is less than
/// or equal to the threshold go left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    Integer(i64),
    Float(f64),
}

impl Threshold {
    /// Returns true if `value` is routed to the left child.
    ///
    /// Categorical values are never compared and yield `None`.
    pub fn goes_left(&self, value: &FeatureValue) -> Option<bool> {
        match (self, value) {
            (Threshold::Integer(t), FeatureValue::Integer(v)) => Some(v <= t),
            (Threshold::Integer(t), FeatureValue::Float(v)) => {
                Some((*v).total_cmp(&(*t as f64)) != Ordering::Greater)
            }
            (Threshold::Float(t), FeatureValue::Float(v)) => {
                Some(v.total_cmp(t) != Ordering::Greater)
            }
            (Threshold::Float(t), FeatureValue::Integer(v)) => {
                Some((*v as f64).total_cmp(t) != Ordering::Greater)
            }
            (_, FeatureValue::Categorical(_)) => None,
        }
    }

    /// Returns the threshold as a float.
    pub fn as_f64(&self) -> f64 {
        match self {
            Threshold::Integer(v) => *v as f64,
            Threshold::Float(v) => *v,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Integer(v) => write!(f, "{}", v),
            Threshold::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Strategy used to fill missing (instance, configuration) results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Worst result over the whole matrix
    Worse,
    /// Absolute worst result times two
    WorseT2,
    /// Worst result of the same instance
    WorseInst,
    /// Absolute worst result of the same instance times two
    WorseInstT2,
    /// Average of the known results of the same instance
    AverageInst,
    /// A fixed configured value
    Value,
}

impl Default for FillStrategy {
    fn default() -> Self {
        FillStrategy::WorseInstT2
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillStrategy::Worse => write!(f, "worse"),
            FillStrategy::WorseT2 => write!(f, "worse_t2"),
            FillStrategy::WorseInst => write!(f, "worse_inst"),
            FillStrategy::WorseInstT2 => write!(f, "worse_inst_t2"),
            FillStrategy::AverageInst => write!(f, "average_inst"),
            FillStrategy::Value => write!(f, "value"),
        }
    }
}

impl std::str::FromStr for FillStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "worse" => Ok(FillStrategy::Worse),
            "worse_t2" => Ok(FillStrategy::WorseT2),
            "worse_inst" => Ok(FillStrategy::WorseInst),
            "worse_inst_t2" => Ok(FillStrategy::WorseInstT2),
            "average_inst" => Ok(FillStrategy::AverageInst),
            "value" => Ok(FillStrategy::Value),
            other => Err(format!("unknown fill strategy '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_parse() {
        assert_eq!("rank".parse::<Evaluation>().unwrap(), Evaluation::Rank);
        assert_eq!("Average".parse::<Evaluation>().unwrap(), Evaluation::Average);
        assert!("median".parse::<Evaluation>().is_err());
        assert_eq!(Evaluation::Rank.to_string(), "rank");
    }

    #[test]
    fn test_feature_type_branchable() {
        assert!(FeatureType::Integer.is_branchable());
        assert!(FeatureType::Float.is_branchable());
        assert!(!FeatureType::Categorical.is_branchable());
        assert_eq!(
            FeatureValue::Categorical("x".into()).feature_type(),
            FeatureType::Categorical
        );
    }

    #[test]
    fn test_threshold_routing() {
        let t = Threshold::Float(2.0);
        assert_eq!(t.goes_left(&FeatureValue::Float(2.0)), Some(true));
        assert_eq!(t.goes_left(&FeatureValue::Float(2.5)), Some(false));
        assert_eq!(t.goes_left(&FeatureValue::Integer(1)), Some(true));
        assert_eq!(t.goes_left(&FeatureValue::Categorical("a".into())), None);

        let t = Threshold::Integer(3);
        assert_eq!(t.goes_left(&FeatureValue::Integer(3)), Some(true));
        assert_eq!(t.goes_left(&FeatureValue::Integer(4)), Some(false));
    }

    #[test]
    fn test_fill_strategy_round_trip_names() {
        for s in [
            FillStrategy::Worse,
            FillStrategy::WorseT2,
            FillStrategy::WorseInst,
            FillStrategy::WorseInstT2,
            FillStrategy::AverageInst,
            FillStrategy::Value,
        ] {
            assert_eq!(s.to_string().parse::<FillStrategy>().unwrap(), s);
        }
    }
}
