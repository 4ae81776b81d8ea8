//! The fixed analysis recipe.  `AnalysisConfig::default()` is the recipe the
//! driver runs; a JSON file may override any part of it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};
use crate::data::model::{CrystalSymmetry, MillerIndex, SpecimenSymmetry};
use crate::res::Intensities;
use crate::texture::components::{default_components, DEFAULT_SPREAD_DEG};
use crate::texture::fibre::{default_fibres, FibreDef, FibreSampling};
use crate::texture::orientation::IdealComponent;

/// Contour levels of the contoured plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourLevels {
    #[serde(default = "default_pole_figure_levels")]
    pub pole_figures: Vec<f64>,
    #[serde(default = "default_odf_levels")]
    pub odf_sections: Vec<f64>,
}

fn default_pole_figure_levels() -> Vec<f64> {
    vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]
}

fn default_odf_levels() -> Vec<f64> {
    vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 12.0]
}

impl Default for ContourLevels {
    fn default() -> Self {
        Self {
            pole_figures: default_pole_figure_levels(),
            odf_sections: default_odf_levels(),
        }
    }
}

/// Specimen symmetry used by each kind of query and plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymmetryChoices {
    /// Symmetry the pole figures are loaded with.
    pub measured: SpecimenSymmetry,
    pub properties: SpecimenSymmetry,
    pub recalculated_pole_figures: SpecimenSymmetry,
    pub odf_sections: SpecimenSymmetry,
    pub inverse_pole_figure: SpecimenSymmetry,
    pub volume_fractions: SpecimenSymmetry,
    pub fibres: SpecimenSymmetry,
}

impl Default for SymmetryChoices {
    fn default() -> Self {
        use SpecimenSymmetry::*;
        Self {
            measured: Triclinic,
            properties: Orthorhombic,
            recalculated_pole_figures: Triclinic,
            odf_sections: Orthorhombic,
            inverse_pole_figure: Orthorhombic,
            volume_fractions: Orthorhombic,
            fibres: Orthorhombic,
        }
    }
}

/// Everything the analysis driver needs besides the data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub crystal_symmetry: CrystalSymmetry,
    /// Pole figures to load, in order.
    pub pole_figures: Vec<MillerIndex>,
    /// Which converter output to analyse.
    pub intensities: Intensities,
    pub symmetry: SymmetryChoices,
    pub contours: ContourLevels,
    /// `phi2` angles (degrees) of the ODF section plot.
    pub odf_phi2_sections: Vec<f64>,
    /// Number of equal sections of the overview ODF plot.
    pub odf_section_count: usize,
    pub components: Vec<IdealComponent>,
    /// Angular spread (degrees) of every volume fraction query.
    pub spread_deg: f64,
    pub fibres: Vec<FibreDef>,
    pub fibre_sampling: FibreSampling,
    /// MTEX installation added to the MATLAB path, if not already there.
    pub mtex_path: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let m = MillerIndex::new;
        Self {
            crystal_symmetry: CrystalSymmetry::default(),
            pole_figures: vec![m(1, 1, 1), m(2, 0, 0), m(2, 2, 0), m(3, 1, 1)],
            intensities: Intensities::Corrected,
            symmetry: SymmetryChoices::default(),
            contours: ContourLevels::default(),
            odf_phi2_sections: vec![0.0, 45.0, 65.0],
            odf_section_count: 18,
            components: default_components(),
            spread_deg: DEFAULT_SPREAD_DEG,
            fibres: default_fibres(),
            fibre_sampling: FibreSampling::default(),
            mtex_path: None,
        }
    }
}

impl AnalysisConfig {
    /// Load a recipe from JSON; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AnalysisError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| AnalysisError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a component by name.
    pub fn component(&self, name: &str) -> Option<&IdealComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Reject recipes MTEX would choke on halfway through a run.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(AnalysisError::Config(msg));

        if self.pole_figures.is_empty() {
            return bad("no pole figures listed".into());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.pole_figures.iter().find(|m| !seen.insert(**m)) {
            return bad(format!("pole figure {{{dup}}} listed twice"));
        }

        let mut names = HashSet::new();
        for c in &self.components {
            if c.name.is_empty() || !c.name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                return bad(format!("component name '{}' must be alphanumeric", c.name));
            }
            if !names.insert(c.name.as_str()) {
                return bad(format!("component '{}' defined twice", c.name));
            }
        }

        if !(self.spread_deg > 0.0 && self.spread_deg.is_finite()) {
            return bad(format!("spread must be positive, got {}", self.spread_deg));
        }
        if self.odf_section_count == 0 {
            return bad("odf_section_count must be at least 1".into());
        }
        for (label, levels) in [
            ("pole figure", &self.contours.pole_figures),
            ("ODF section", &self.contours.odf_sections),
        ] {
            if levels.is_empty() || levels.windows(2).any(|w| w[0] >= w[1]) {
                return bad(format!("{label} contour levels must be non-empty and increasing"));
            }
        }

        self.fibre_sampling.indices()?;
        let mut fibre_names = HashSet::new();
        for f in &self.fibres {
            if !fibre_names.insert(f.name.as_str()) {
                return bad(format!("fibre '{}' defined twice", f.name));
            }
            if f.name.is_empty() || f.name.contains(['/', '\\']) {
                return bad(format!("fibre name '{}' is not a valid file stem", f.name));
            }
            for end in [&f.from, &f.to] {
                if self.component(end).is_none() {
                    return bad(format!("fibre '{}' refers to unknown component '{end}'", f.name));
                }
            }
        }
        Ok(())
    }
}
