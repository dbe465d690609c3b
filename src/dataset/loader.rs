//! CSV loaders for instance features and long-format results.
//!
//! Instances file: a header row, the instance name in the first column and
//! one feature per remaining column. Column types are inferred from the
//! values: all integers gives an integer feature, all numbers a float
//! feature, anything else a categorical one.
//!
//! Results file: `instance, <setting columns...>, result`. The setting
//! columns of a row are joined with `;` to name the algorithm configuration.

use crate::config::TreeConfig;
use crate::core::constants::SETTING_SEPARATOR;
use crate::core::error::{PdtError, Result};
use crate::dataset::instances::{FeatureColumn, InstanceSet};
use crate::dataset::results::ResultsSet;
use csv::{ReaderBuilder, StringRecord};
use ndarray::Array2;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Loads the instance/feature file at `path`.
pub fn load_instances<P: AsRef<Path>>(path: P) -> Result<InstanceSet> {
    let path = path.as_ref();
    log::info!("Loading instances from {}", path.display());
    let file = open(path)?;
    read_instances(file)
}

/// Loads the long-format results file at `path` for the given instances.
pub fn load_results<P: AsRef<Path>>(
    path: P,
    instances: &InstanceSet,
    config: &TreeConfig,
) -> Result<ResultsSet> {
    let path = path.as_ref();
    log::info!("Loading results from {}", path.display());
    let file = open(path)?;
    read_results(file, instances, config)
}

fn open(path: &Path) -> Result<File> {
    if !path.is_file() {
        return Err(PdtError::data_loading(format!(
            "File does not exist: {}",
            path.display()
        )));
    }
    File::open(path).map_err(|e| {
        PdtError::data_loading(format!("Failed to open file {}: {}", path.display(), e))
    })
}

/// Reads an instance/feature table from any reader.
pub fn read_instances<R: Read>(reader: R) -> Result<InstanceSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(PdtError::data_loading("instances file has no columns"));
    }
    let feature_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut instance_names = Vec::new();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); feature_names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(PdtError::data_loading(format!(
                "row {} has {} fields, expected {}",
                row + 1,
                record.len(),
                headers.len()
            )));
        }
        instance_names.push(record[0].to_string());
        for (f, cell) in record.iter().skip(1).enumerate() {
            raw[f].push(cell.to_string());
        }
    }

    let columns: Vec<FeatureColumn> = raw.into_iter().map(infer_column).collect();
    for (name, column) in feature_names.iter().zip(&columns) {
        log::debug!("feature '{}' inferred as {}", name, column.feature_type());
    }

    let set = InstanceSet::new(instance_names, feature_names, columns)?;
    log::info!(
        "{} instances with {} features loaded",
        set.num_instances(),
        set.num_features()
    );
    Ok(set)
}

fn infer_column(cells: Vec<String>) -> FeatureColumn {
    if let Some(values) = cells
        .iter()
        .map(|c| c.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()
    {
        return FeatureColumn::Integer(values);
    }
    if let Some(values) = cells
        .iter()
        .map(|c| c.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()
    {
        return FeatureColumn::Float(values);
    }
    FeatureColumn::Categorical(cells)
}

/// Reads a long-format results table from any reader.
///
/// Rows naming unknown instances are skipped. When a (instance,
/// configuration) pair appears twice the first value is kept and a single
/// warning is logged. Missing pairs are filled per `config.fill_strategy`.
pub fn read_results<R: Read>(
    reader: R,
    instances: &InstanceSet,
    config: &TreeConfig,
) -> Result<ResultsSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < 3 {
        return Err(PdtError::data_loading(
            "results file should have at least 3 columns: instance,settings...,result",
        ));
    }
    let result_col = headers.len() - 1;

    let mut algorithm_names: Vec<String> = Vec::new();
    let mut algorithm_by_name: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(usize, usize, f64)> = Vec::new();
    let mut skipped = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let instance = match instances.instance_by_name(&record[0]) {
            Some(i) => i,
            None => {
                skipped += 1;
                continue;
            }
        };

        let name = setting_name(&record, result_col);
        let algorithm = *algorithm_by_name.entry(name.clone()).or_insert_with(|| {
            algorithm_names.push(name);
            algorithm_names.len() - 1
        });

        let value: f64 = record[result_col].parse().map_err(|_| {
            PdtError::data_loading(format!(
                "row {}: result '{}' is not a number",
                row + 1,
                &record[result_col]
            ))
        })?;
        entries.push((instance, algorithm, value));
    }

    if skipped > 0 {
        log::debug!("{} result rows for unknown instances skipped", skipped);
    }
    if algorithm_names.is_empty() {
        return Err(PdtError::data(
            "results file has no rows for the loaded instances",
        ));
    }

    let mut partial: Array2<Option<f64>> =
        Array2::from_elem((instances.num_instances(), algorithm_names.len()), None);
    let mut warned_duplicate = false;
    for (instance, algorithm, value) in entries {
        let cell = &mut partial[[instance, algorithm]];
        if cell.is_some() {
            if !warned_duplicate {
                log::warn!(
                    "result for instance {} and setting {} appears twice, keeping the first one; \
                     further repeated entries are not reported",
                    instances.instance_name(instance).unwrap_or("?"),
                    algorithm_names[algorithm]
                );
                warned_duplicate = true;
            }
            continue;
        }
        *cell = Some(value);
    }

    let results = ResultsSet::from_partial(
        algorithm_names,
        &partial,
        config.fill_strategy,
        config.fill_value,
        config.rank_eps,
        config.rank_perc,
    )?;
    log::info!(
        "{} algorithm configurations loaded",
        results.num_algorithms()
    );
    Ok(results)
}

fn setting_name(record: &StringRecord, result_col: usize) -> String {
    (1..result_col)
        .map(|j| &record[j])
        .collect::<Vec<_>>()
        .join(SETTING_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FeatureType, FeatureValue, FillStrategy};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const INSTANCES: &str = "\
name,vars,density,family
p1,10,0.5,knap
p2,20,0.25,knap
p3,30,1,bin
";

    #[test]
    fn test_type_inference() {
        let set = read_instances(INSTANCES.as_bytes()).unwrap();
        assert_eq!(set.num_instances(), 3);
        assert_eq!(set.feature_type(0), Some(FeatureType::Integer));
        assert_eq!(set.feature_type(1), Some(FeatureType::Float));
        assert_eq!(set.feature_type(2), Some(FeatureType::Categorical));
        assert_eq!(set.value(2, 1), Some(FeatureValue::Float(1.0)));
    }

    #[test]
    fn test_results_long_format() {
        let set = read_instances(INSTANCES.as_bytes()).unwrap();
        let results = "\
instance,alg,param,cost
p1,cbc,1,3.0
p1,cbc,2,5.0
p2,cbc,1,4.0
p2,cbc,2,1.0
p3,cbc,1,2.0
p3,cbc,2,2.0
unknown,cbc,1,0.0
";
        let config = TreeConfig::default();
        let rset = read_results(results.as_bytes(), &set, &config).unwrap();
        assert_eq!(rset.num_algorithms(), 2);
        assert_eq!(rset.algorithm_name(0), Some("cbc;1"));
        assert_eq!(rset.algorithm_name(1), Some("cbc;2"));
        assert_eq!(rset.cost(1, 1), 1.0);
    }

    #[test]
    fn test_results_duplicates_and_missing() {
        let set = read_instances(INSTANCES.as_bytes()).unwrap();
        let results = "\
instance,alg,cost
p1,a,3.0
p1,a,99.0
p1,b,5.0
p2,a,4.0
p3,b,2.0
";
        let mut config = TreeConfig::default();
        config.fill_strategy = FillStrategy::WorseInst;
        let rset = read_results(results.as_bytes(), &set, &config).unwrap();
        // first value kept
        assert_eq!(rset.cost(0, 0), 3.0);
        // p2 misses b: its own worst is 4.0
        assert_eq!(rset.cost(1, 1), 4.0);
        assert_eq!(rset.cost(2, 0), 2.0);
    }

    #[test]
    fn test_results_need_three_columns() {
        let set = read_instances(INSTANCES.as_bytes()).unwrap();
        let config = TreeConfig::default();
        assert!(read_results("instance,cost\np1,1.0\n".as_bytes(), &set, &config).is_err());
    }

    #[test]
    fn test_load_from_files() -> Result<()> {
        let mut inst_file = NamedTempFile::new()?;
        write!(inst_file, "{}", INSTANCES)?;
        let mut res_file = NamedTempFile::new()?;
        writeln!(res_file, "instance,alg,cost")?;
        writeln!(res_file, "p1,a,1.0")?;
        writeln!(res_file, "p2,a,2.0")?;
        writeln!(res_file, "p3,a,3.0")?;

        let set = load_instances(inst_file.path())?;
        let rset = load_results(res_file.path(), &set, &TreeConfig::default())?;
        assert_eq!(rset.num_instances(), 3);
        assert_eq!(rset.num_algorithms(), 1);

        assert!(load_instances("/nonexistent/instances.csv").is_err());
        Ok(())
    }
}
