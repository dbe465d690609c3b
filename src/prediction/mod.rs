//! Prediction with built trees.
//!
//! [`Predictor`] routes the instances of a feature store through a tree and
//! scores the recommendations against a performance matrix.

pub mod predictor;

pub use predictor::{EvaluationReport, Predictor};
