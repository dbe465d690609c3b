//! Feature store: the instance × feature matrix.
//!
//! Features are stored column-wise with one type tag per column. Only
//! integer and float columns can be branched on.

use crate::core::error::{PdtError, Result};
use crate::core::types::{FeatureIndex, FeatureType, FeatureValue, InstanceIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One typed feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureColumn {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Categorical(Vec<String>),
}

impl FeatureColumn {
    /// Number of values in the column.
    pub fn len(&self) -> usize {
        match self {
            FeatureColumn::Integer(v) => v.len(),
            FeatureColumn::Float(v) => v.len(),
            FeatureColumn::Categorical(v) => v.len(),
        }
    }

    /// Returns true if the column has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type tag of the column.
    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeatureColumn::Integer(_) => FeatureType::Integer,
            FeatureColumn::Float(_) => FeatureType::Float,
            FeatureColumn::Categorical(_) => FeatureType::Categorical,
        }
    }

    /// Value at `instance`, if in range.
    pub fn value(&self, instance: InstanceIndex) -> Option<FeatureValue> {
        match self {
            FeatureColumn::Integer(v) => v.get(instance).map(|&x| FeatureValue::Integer(x)),
            FeatureColumn::Float(v) => v.get(instance).map(|&x| FeatureValue::Float(x)),
            FeatureColumn::Categorical(v) => {
                v.get(instance).map(|x| FeatureValue::Categorical(x.clone()))
            }
        }
    }
}

/// Set of problem instances and their features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSet {
    instance_names: Vec<String>,
    feature_names: Vec<String>,
    columns: Vec<FeatureColumn>,
    #[serde(skip)]
    index_by_name: HashMap<String, InstanceIndex>,
}

impl InstanceSet {
    /// Creates an instance set from named, typed feature columns.
    ///
    /// Every column must have one value per instance.
    pub fn new(
        instance_names: Vec<String>,
        feature_names: Vec<String>,
        columns: Vec<FeatureColumn>,
    ) -> Result<Self> {
        if instance_names.is_empty() {
            return Err(PdtError::data("instance set has no instances"));
        }

        if feature_names.len() != columns.len() {
            return Err(PdtError::dimension_mismatch(
                format!("{} feature columns", feature_names.len()),
                format!("{} columns", columns.len()),
            ));
        }

        for (f, column) in columns.iter().enumerate() {
            if column.len() != instance_names.len() {
                return Err(PdtError::dimension_mismatch(
                    format!("{} values in feature '{}'", instance_names.len(), feature_names[f]),
                    column.len().to_string(),
                ));
            }
        }

        let mut index_by_name = HashMap::with_capacity(instance_names.len());
        for (i, name) in instance_names.iter().enumerate() {
            if index_by_name.insert(name.clone(), i).is_some() {
                return Err(PdtError::data(format!("duplicate instance name '{}'", name)));
            }
        }

        Ok(InstanceSet {
            instance_names,
            feature_names,
            columns,
            index_by_name,
        })
    }

    /// Creates an instance set with float features only, named `f0..fn`
    /// and instances named `i0..in`. Handy for programmatic use.
    pub fn from_float_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        let num_instances = columns.first().map(|c| c.len()).unwrap_or(0);
        let instance_names = (0..num_instances).map(|i| format!("i{}", i)).collect();
        let feature_names = (0..columns.len()).map(|f| format!("f{}", f)).collect();
        let columns = columns.into_iter().map(FeatureColumn::Float).collect();
        Self::new(instance_names, feature_names, columns)
    }

    /// Number of instances.
    pub fn num_instances(&self) -> usize {
        self.instance_names.len()
    }

    /// Number of features.
    pub fn num_features(&self) -> usize {
        self.columns.len()
    }

    /// Instance names in index order.
    pub fn instance_names(&self) -> &[String] {
        &self.instance_names
    }

    /// Name of instance `i`.
    pub fn instance_name(&self, instance: InstanceIndex) -> Option<&str> {
        self.instance_names.get(instance).map(String::as_str)
    }

    /// Looks an instance up by name.
    pub fn instance_by_name(&self, name: &str) -> Option<InstanceIndex> {
        if self.index_by_name.is_empty() && !self.instance_names.is_empty() {
            return self.instance_names.iter().position(|n| n == name);
        }
        self.index_by_name.get(name).copied()
    }

    /// Feature names in index order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of feature `f`.
    pub fn feature_name(&self, feature: FeatureIndex) -> Option<&str> {
        self.feature_names.get(feature).map(String::as_str)
    }

    /// Type tag of feature `f`.
    pub fn feature_type(&self, feature: FeatureIndex) -> Option<FeatureType> {
        self.columns.get(feature).map(FeatureColumn::feature_type)
    }

    /// Returns true if splits may be placed on feature `f`.
    pub fn is_branchable(&self, feature: FeatureIndex) -> bool {
        self.feature_type(feature)
            .map(|t| t.is_branchable())
            .unwrap_or(false)
    }

    /// The raw column of feature `f`.
    pub fn column(&self, feature: FeatureIndex) -> Option<&FeatureColumn> {
        self.columns.get(feature)
    }

    /// Value of feature `f` for instance `i`.
    pub fn value(&self, instance: InstanceIndex, feature: FeatureIndex) -> Option<FeatureValue> {
        self.columns.get(feature).and_then(|c| c.value(instance))
    }

    /// Full feature vector of instance `i`.
    pub fn instance_features(&self, instance: InstanceIndex) -> Result<Vec<FeatureValue>> {
        if instance >= self.num_instances() {
            return Err(PdtError::index_out_of_bounds(instance, self.num_instances()));
        }
        Ok(self
            .columns
            .iter()
            .filter_map(|c| c.value(instance))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_set() -> InstanceSet {
        InstanceSet::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["size".into(), "density".into(), "family".into()],
            vec![
                FeatureColumn::Integer(vec![10, 20, 30]),
                FeatureColumn::Float(vec![0.1, 0.5, 0.9]),
                FeatureColumn::Categorical(vec!["x".into(), "y".into(), "x".into()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_instance_set_accessors() {
        let set = mixed_set();
        assert_eq!(set.num_instances(), 3);
        assert_eq!(set.num_features(), 3);
        assert_eq!(set.instance_by_name("b"), Some(1));
        assert_eq!(set.instance_by_name("zz"), None);
        assert_eq!(set.feature_type(2), Some(FeatureType::Categorical));
        assert!(set.is_branchable(0));
        assert!(set.is_branchable(1));
        assert!(!set.is_branchable(2));
        assert!(!set.is_branchable(3));
        assert_eq!(set.value(2, 0), Some(FeatureValue::Integer(30)));
    }

    #[test]
    fn test_instance_features() {
        let set = mixed_set();
        let features = set.instance_features(1).unwrap();
        assert_eq!(
            features,
            vec![
                FeatureValue::Integer(20),
                FeatureValue::Float(0.5),
                FeatureValue::Categorical("y".into()),
            ]
        );
        assert!(set.instance_features(3).is_err());
    }

    #[test]
    fn test_shape_validation() {
        let err = InstanceSet::new(
            vec!["a".into(), "b".into()],
            vec!["f".into()],
            vec![FeatureColumn::Float(vec![1.0])],
        );
        assert!(err.is_err());

        let err = InstanceSet::new(vec![], vec![], vec![]);
        assert!(err.is_err());

        let err = InstanceSet::new(
            vec!["a".into(), "a".into()],
            vec!["f".into()],
            vec![FeatureColumn::Float(vec![1.0, 2.0])],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_from_float_columns() {
        let set = InstanceSet::from_float_columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(set.num_instances(), 2);
        assert_eq!(set.feature_name(1), Some("f1"));
        assert_eq!(set.instance_name(0), Some("i0"));
    }
}
