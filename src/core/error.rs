//! Error handling and error types for pdtree-rust.
//!
//! Every fallible operation in the crate returns [`Result`]. Feature-level
//! problems met during split search are recoverable and are reported next to
//! the search result instead of aborting it; data and invariant problems are
//! surfaced to the caller of the affected operation.

use std::io;
use thiserror::Error;

use crate::core::types::{FeatureIndex, InstanceIndex, NodeIndex};

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum PdtError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A feature offered for branching cannot be branched on
    #[error("Feature {feature} cannot be used for branching: {reason}")]
    FeatureNotBranchable {
        feature: FeatureIndex,
        reason: String,
    },

    /// Data errors: empty inputs, shape mismatches, corrupted aggregates
    #[error("Data error: {message}")]
    Data { message: String },

    /// Subset aggregate precondition violations
    #[error("Subset aggregate error at node {node:?}: {message}")]
    Aggregate {
        node: Option<NodeIndex>,
        message: String,
    },

    /// Data loading and parsing errors
    #[error("Data loading error: {message}")]
    DataLoading { message: String },

    /// Tree construction errors
    #[error("Tree construction error: {message}")]
    TreeConstruction { message: String },

    /// Buffer allocation failures
    #[error("Resource error: {message}")]
    Resource { message: String },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Specialized errors raised by the subset aggregate bookkeeping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("no algorithm configurations to aggregate")]
    NoAlgorithms,

    #[error("no instances to aggregate")]
    NoInstances,

    #[error("instance {instance} is already counted")]
    AlreadyCounted { instance: InstanceIndex },

    #[error("instance {instance} is not counted")]
    NotCounted { instance: InstanceIndex },

    #[error("cannot remove {requested} instances from a subset of {available}")]
    RemoveTooMany { requested: usize, available: usize },

    #[error("membership of the subset is unknown; recompute it first")]
    MembershipUnknown,

    #[error("instance {instance} out of range for {num_instances} instances")]
    InstanceOutOfRange {
        instance: InstanceIndex,
        num_instances: usize,
    },
}

/// Type alias for Results using PdtError
pub type Result<T> = std::result::Result<T, PdtError>;

impl PdtError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PdtError::Config {
            message: message.into(),
        }
    }

    /// Create a data error
    pub fn data<S: Into<String>>(message: S) -> Self {
        PdtError::Data {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        PdtError::DataLoading {
            message: message.into(),
        }
    }

    /// Create a tree construction error
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        PdtError::TreeConstruction {
            message: message.into(),
        }
    }

    /// Create a resource error
    pub fn resource<S: Into<String>>(message: S) -> Self {
        PdtError::Resource {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        PdtError::Serialization {
            message: message.into(),
        }
    }

    /// Create an error for a feature that cannot be branched on
    pub fn feature_not_branchable<S: Into<String>>(feature: FeatureIndex, reason: S) -> Self {
        PdtError::FeatureNotBranchable {
            feature,
            reason: reason.into(),
        }
    }

    /// Wrap an aggregate error with the node it happened on
    pub fn aggregate(node: Option<NodeIndex>, source: AggregateError) -> Self {
        PdtError::Aggregate {
            node,
            message: source.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        PdtError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        PdtError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        PdtError::IndexOutOfBounds { index, length }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        PdtError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            PdtError::Config { .. } => false,
            PdtError::FeatureNotBranchable { .. } => true,
            PdtError::Data { .. } => false,
            PdtError::Aggregate { .. } => false,
            PdtError::DataLoading { .. } => false,
            PdtError::TreeConstruction { .. } => false,
            PdtError::Resource { .. } => false,
            PdtError::Serialization { .. } => false,
            PdtError::IO { .. } => false,
            PdtError::Csv { .. } => false,
            PdtError::Json { .. } => false,
            PdtError::InvalidParameter { .. } => false,
            PdtError::DimensionMismatch { .. } => false,
            PdtError::IndexOutOfBounds { .. } => false,
            PdtError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            PdtError::Config { .. } => "config",
            PdtError::FeatureNotBranchable { .. } => "config",
            PdtError::Data { .. } => "data",
            PdtError::Aggregate { .. } => "data",
            PdtError::DataLoading { .. } => "data_loading",
            PdtError::TreeConstruction { .. } => "tree_construction",
            PdtError::Resource { .. } => "resource",
            PdtError::Serialization { .. } => "serialization",
            PdtError::IO { .. } => "io",
            PdtError::Csv { .. } => "csv",
            PdtError::Json { .. } => "json",
            PdtError::InvalidParameter { .. } => "invalid_parameter",
            PdtError::DimensionMismatch { .. } => "dimension_mismatch",
            PdtError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            PdtError::Internal { .. } => "internal",
        }
    }
}

impl From<AggregateError> for PdtError {
    fn from(err: AggregateError) -> Self {
        PdtError::aggregate(None, err)
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::PdtError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::PdtError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! data_error {
    ($msg:expr) => {
        $crate::core::error::PdtError::data($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::PdtError::data(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PdtError::config("test configuration error");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());

        let err = PdtError::feature_not_branchable(3, "categorical");
        assert_eq!(err.category(), "config");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("test error");
        assert!(matches!(err, PdtError::Config { .. }));

        let err = data_error!("test error with param: {}", 42);
        assert!(matches!(err, PdtError::Data { .. }));
    }

    #[test]
    fn test_aggregate_error_conversion() {
        let err: PdtError = AggregateError::NotCounted { instance: 7 }.into();
        assert!(matches!(err, PdtError::Aggregate { node: None, .. }));
        assert_eq!(err.category(), "data");
        assert!(err.to_string().contains("instance 7"));

        let err = PdtError::aggregate(Some(4), AggregateError::NoAlgorithms);
        assert!(err.to_string().contains("Some(4)"));
    }

    #[test]
    fn test_parameter_errors() {
        let err = PdtError::invalid_parameter("min_elements_branch", "0", "must be at least 1");
        assert_eq!(err.category(), "invalid_parameter");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = PdtError::data("no instances");
        let error_string = format!("{}", err);
        assert!(error_string.contains("Data error"));
        assert!(error_string.contains("no instances"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: PdtError = io_err.into();
        assert!(matches!(err, PdtError::IO { .. }));
        assert_eq!(err.category(), "io");
    }
}
