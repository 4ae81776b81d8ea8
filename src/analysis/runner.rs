//! Running the generated script in MATLAB and reading back its results.

use std::path::{Path, PathBuf};
use std::process::Command;

use csv::{ReaderBuilder, Trim};

use super::error::{AnalysisError, Result};
use super::plan::{Plan, PROPERTIES_FILE};
use crate::texture::fibre::{read_fibre_csv, FibreSample};

/// A MATLAB installation able to run MTEX.
#[derive(Debug, Clone)]
pub struct MatlabRunner {
    pub executable: PathBuf,
}

impl Default for MatlabRunner {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("matlab"),
        }
    }
}

impl MatlabRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Run `script` with `matlab -batch`.  Any MATLAB error, including a
    /// failed ODF fit, ends the run with a non-zero exit status.
    pub fn run(&self, script: &Path) -> Result<()> {
        let dir = script.parent().unwrap_or_else(|| Path::new("."));
        let command = format!("run('{}')", script.display().to_string().replace('\'', "''"));
        log::info!("Running {} -batch \"{command}\"", self.executable.display());

        let status = Command::new(&self.executable)
            .arg("-batch")
            .arg(&command)
            .current_dir(dir)
            .status()
            .map_err(|source| AnalysisError::MatlabSpawn {
                executable: self.executable.clone(),
                source,
            })?;

        if !status.success() {
            return Err(AnalysisError::MatlabFailed(status));
        }
        Ok(())
    }
}

/// Scalar results and fibre samples of a finished run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// `(key, value)` in the order the script wrote them.
    pub properties: Vec<(String, f64)>,
    pub fibres: Vec<(String, Vec<FibreSample>)>,
}

impl AnalysisReport {
    pub fn property(&self, key: &str) -> Option<f64> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn log_summary(&self) {
        for (key, value) in &self.properties {
            log::info!("{key:>20}: {value:.4}");
        }
        for (name, samples) in &self.fibres {
            let max = samples.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);
            log::info!("{name}: {} samples, peak f(g) = {max:.3}", samples.len());
        }
    }
}

/// Read `properties.csv` (`property, value`).
pub fn read_properties(path: &Path) -> Result<Vec<(String, f64)>> {
    if !path.is_file() {
        return Err(AnalysisError::MissingOutput(path.to_path_buf()));
    }
    let bad = |reason: String| AnalysisError::BadOutput {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| bad(e.to_string()))?;

    let mut out = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| bad(e.to_string()))?;
        match (row.get(0), row.get(1)) {
            (Some(key), Some(value)) => {
                let value = value
                    .parse::<f64>()
                    .map_err(|_| bad(format!("'{value}' is not a number for {key}")))?;
                out.push((key.to_string(), value));
            }
            _ => return Err(bad(format!("short row {:?}", row))),
        }
    }
    Ok(out)
}

/// Collect the outputs `plan` promises from `out_dir`, checking that every
/// property and every fibre sample is present.
pub fn collect_report(plan: &Plan, out_dir: &Path) -> Result<AnalysisReport> {
    let properties_path = out_dir.join(PROPERTIES_FILE);
    let properties = read_properties(&properties_path)?;
    for key in plan.property_keys() {
        if !properties.iter().any(|(k, _)| *k == key) {
            return Err(AnalysisError::BadOutput {
                path: properties_path.clone(),
                reason: format!("no value for '{key}'"),
            });
        }
    }

    let mut fibres = Vec::new();
    for (fibre, expected) in plan.fibre_outputs() {
        let path = out_dir.join(format!("{}.csv", fibre.name));
        if !path.is_file() {
            return Err(AnalysisError::MissingOutput(path));
        }
        let samples = read_fibre_csv(&path)?;
        if samples.len() != expected {
            return Err(AnalysisError::BadOutput {
                path,
                reason: format!("{} samples, expected {expected}", samples.len()),
            });
        }
        fibres.push((fibre.name.clone(), samples));
    }

    Ok(AnalysisReport { properties, fibres })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::recipe::AnalysisConfig;
    use crate::texture::fibre::write_fibre_csv;
    use crate::texture::orientation::EulerAngles;
    use std::fmt::Write as _;
    use tempfile::TempDir;

    fn plan() -> Plan {
        let files = (0..4).map(|i| PathBuf::from(format!("{i}.dat"))).collect();
        Plan::build(&AnalysisConfig::default(), files).unwrap()
    }

    fn write_outputs(dir: &Path, plan: &Plan, samples: usize) {
        let mut text = String::from("property, value\n");
        for (i, key) in plan.property_keys().iter().enumerate() {
            writeln!(text, "{key}, {:.6}", i as f64 * 0.5).unwrap();
        }
        std::fs::write(dir.join(PROPERTIES_FILE), text).unwrap();

        for (fibre, _) in plan.fibre_outputs() {
            let rows: Vec<FibreSample> = (0..samples)
                .map(|i| FibreSample {
                    euler: EulerAngles::new(90.0 - i as f64, 35.0, 45.0),
                    value: 1.0 + i as f64,
                })
                .collect();
            write_fibre_csv(&dir.join(format!("{}.csv", fibre.name)), &rows).unwrap();
        }
    }

    #[test]
    fn test_collect_report() {
        let dir = TempDir::new().unwrap();
        let plan = plan();
        write_outputs(dir.path(), &plan, 10);

        let report = collect_report(&plan, dir.path()).unwrap();
        assert_eq!(report.properties.len(), 12);
        assert_eq!(report.property("entropy"), Some(0.5));
        assert_eq!(report.fibres.len(), 2);
        assert_eq!(report.fibres[0].0, "beta_fibre");
        assert_eq!(report.fibres[1].1[9].value, 10.0);
    }

    #[test]
    fn test_missing_properties_file() {
        let dir = TempDir::new().unwrap();
        let err = collect_report(&plan(), dir.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingOutput(_)));
    }

    #[test]
    fn test_short_fibre_is_rejected() {
        let dir = TempDir::new().unwrap();
        let plan = plan();
        write_outputs(dir.path(), &plan, 9);
        let err = collect_report(&plan, dir.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::BadOutput { .. }), "{err}");
    }

    #[test]
    fn test_missing_property_is_rejected() {
        let dir = TempDir::new().unwrap();
        let plan = plan();
        write_outputs(dir.path(), &plan, 10);
        std::fs::write(dir.path().join(PROPERTIES_FILE), "property, value\nentropy, 1.0\n").unwrap();
        let err = collect_report(&plan, dir.path()).unwrap_err();
        assert!(err.to_string().contains("texture_index"), "{err}");
    }

    #[test]
    fn test_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("x.m");
        std::fs::write(&script, "disp(1)").unwrap();
        let runner = MatlabRunner::new(dir.path().join("no-such-matlab"));
        assert!(matches!(runner.run(&script), Err(AnalysisError::MatlabSpawn { .. })));
    }
}
