//! Output of built trees: JSON model files and Graphviz drawings.

pub mod graphviz;
pub mod model_file;

pub use graphviz::{to_dot, write_dot};
pub use model_file::{ModelMetadata, TreeModel};
