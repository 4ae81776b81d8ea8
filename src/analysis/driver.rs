use std::path::{Path, PathBuf};

use super::error::Result;
use super::mtex::write_script;
use super::plan::Plan;
use super::recipe::AnalysisConfig;
use super::runner::{collect_report, AnalysisReport, MatlabRunner};
use crate::data::loader::assemble;
use crate::data::model::PoleFigureSet;
use crate::res::output_path;

/// A validated analysis, ready to be written out and run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub config: AnalysisConfig,
    pub pole_figures: PoleFigureSet,
    pub plan: Plan,
}

/// Converter outputs the recipe reads for the RES file (or base path) `base`.
pub fn data_files(base: &Path, config: &AnalysisConfig) -> Vec<PathBuf> {
    config
        .pole_figures
        .iter()
        .map(|&miller| output_path(base, miller, config.intensities))
        .collect()
}

impl Analysis {
    /// Load and cross-check the data files, then lay out the plan.  Missing
    /// or inconsistent files abort here, before any MATLAB work.
    pub fn prepare(base: &Path, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        // MATLAB's run() changes directory, so the script needs absolute paths.
        let base = std::path::absolute(base).unwrap_or_else(|_| base.to_path_buf());
        let files = data_files(&base, &config);
        let pole_figures = assemble(
            &files,
            &config.pole_figures,
            config.crystal_symmetry.clone(),
            config.symmetry.measured,
        )?;
        let plan = Plan::build(&config, files)?;
        log::info!(
            "Prepared analysis of {} pole figures, {} steps",
            pole_figures.len(),
            plan.steps.len()
        );
        Ok(Self {
            config,
            pole_figures,
            plan,
        })
    }

    /// Write the MTEX script into `out_dir`.
    pub fn write_script(&self, out_dir: &Path) -> Result<PathBuf> {
        write_script(&self.plan, out_dir, self.config.mtex_path.as_deref())
    }

    /// Write the script, run it and read back the results.
    pub fn run(&self, out_dir: &Path, runner: &MatlabRunner) -> Result<AnalysisReport> {
        let script = self.write_script(out_dir)?;
        runner.run(&script)?;
        collect_report(&self.plan, out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::error::AnalysisError;
    use crate::data::loader::LoadError;
    use crate::res::format::{AngularGrid, ResFormat};
    use crate::res::render::{render_res, synthetic_res};
    use crate::res::split_res_file;
    use tempfile::TempDir;

    fn converted(dir: &Path, corrected: bool) -> PathBuf {
        let format = ResFormat::default();
        let grid = AngularGrid { polar_step: 5.0, azimuth_step: 5.0 };
        let input = dir.join("Al.RES");
        std::fs::write(&input, render_res(&synthetic_res(&format, grid, 4, corrected), &format, "Al")).unwrap();
        split_res_file(&input, 4, &format).unwrap();
        input
    }

    #[test]
    fn test_prepare_and_write_script() {
        let dir = TempDir::new().unwrap();
        let input = converted(dir.path(), true);

        let analysis = Analysis::prepare(&input, AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.pole_figures.len(), 4);
        assert_eq!(analysis.pole_figures.rows_per_pole_figure(), 18 * 72);
        assert_eq!(
            analysis.pole_figures.millers(),
            AnalysisConfig::default().pole_figures
        );

        let out = dir.path().join("out");
        let script = analysis.write_script(&out).unwrap();
        let text = std::fs::read_to_string(script).unwrap();
        assert!(text.contains("Al_pf311_corr.dat"));
    }

    #[test]
    fn test_missing_corrected_files_abort() {
        let dir = TempDir::new().unwrap();
        let input = converted(dir.path(), false);

        let err = Analysis::prepare(&input, AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Load(LoadError::Missing(_))), "{err}");
    }

    #[test]
    fn test_uncorrected_recipe() {
        let dir = TempDir::new().unwrap();
        let input = converted(dir.path(), false);
        let config = AnalysisConfig {
            intensities: crate::res::Intensities::Uncorrected,
            ..AnalysisConfig::default()
        };
        let analysis = Analysis::prepare(&input, config).unwrap();
        assert_eq!(analysis.pole_figures.rows_per_pole_figure(), 16 * 72);
    }
}
