//! Command-line driver: builds a prescriptive tree from two CSV files.
//!
//! ```text
//! pdtree <instances.csv> <results.csv> [config.{json,toml}]
//! ```
//!
//! Writes `tree.json` and `tree.gv` into the working directory.

use anyhow::{bail, Context, Result};
use pdtree_rust::config::DEFAULT_CONFIG_FILE;
use pdtree_rust::{build_tree, load_instances, load_results, write_dot, TreeConfig, TreeModel};
use std::path::Path;

const MODEL_FILE: &str = "tree.json";
const DOT_FILE: &str = "tree.gv";

fn load_config(path: Option<&str>) -> Result<TreeConfig> {
    let mut config = match path {
        Some(path) => TreeConfig::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            TreeConfig::load_from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("loading configuration from {}", DEFAULT_CONFIG_FILE))?
        }
        None => TreeConfig::default(),
    };
    config
        .apply_environment_overrides()
        .context("applying PDTREE_* environment overrides")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        bail!(
            "usage: {} <instances.csv> <results.csv> [config.json|config.toml]",
            args.first().map(String::as_str).unwrap_or("pdtree")
        );
    }
    let config = load_config(args.get(3).map(String::as_str))?;

    let instances = load_instances(&args[1])
        .with_context(|| format!("loading instances from {}", args[1]))?;
    let results = load_results(&args[2], &instances, &config)
        .with_context(|| format!("loading results from {}", args[2]))?;

    let tree = build_tree(&instances, &results, &config).context("building tree")?;
    let model = TreeModel::new(tree, &instances, &results, &config);
    model
        .predictor()
        .evaluate(&instances, &results)
        .context("evaluating tree on the training data")?;

    write_dot(&model.tree, &instances, &results, DOT_FILE)
        .with_context(|| format!("writing {}", DOT_FILE))?;
    model
        .save(MODEL_FILE)
        .with_context(|| format!("writing {}", MODEL_FILE))?;

    Ok(())
}
