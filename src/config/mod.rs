//! Configuration management for pdtree-rust.
//!
//! Type-safe tree construction parameters with validation, file loading and
//! environment overrides.

pub mod core;

pub use self::core::{TreeConfig, TreeConfigBuilder};

/// Default configuration file name picked up by the command-line driver.
pub const DEFAULT_CONFIG_FILE: &str = "pdtree.toml";
