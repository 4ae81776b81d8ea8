//! The analysis as an ordered list of steps.
//!
//! Every symmetry-dependent step names the specimen symmetry it needs, so
//! the order of steps never changes what a query sees.

use std::path::PathBuf;

use super::error::{AnalysisError, Result};
use super::recipe::AnalysisConfig;
use crate::data::model::{CrystalSymmetry, MillerIndex, SpecimenSymmetry};
use crate::texture::fibre::FibreDef;
use crate::texture::orientation::{IdealComponent, OrientationSpec};

/// Scalar ODF properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    TextureIndex,
    Entropy,
    MaxDensity,
}

impl Property {
    /// Key in `properties.csv`.
    pub fn key(&self) -> &'static str {
        match self {
            Property::TextureIndex => "texture_index",
            Property::Entropy => "entropy",
            Property::MaxDensity => "max_density",
        }
    }
}

/// The fixed plot types.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotKind {
    /// Measured pole figures, contoured.
    RawPoleFigures,
    /// ODF recalculated onto the measured pole figures.
    RecalculatedPoleFigures { levels: Vec<f64> },
    /// ODF sections at fixed `phi2` angles (degrees).
    OdfPhi2Sections { angles: Vec<f64>, levels: Vec<f64> },
    /// ODF in `count` equal sections.
    OdfSections { count: usize },
    /// Inverse pole figure along the specimen Z axis.
    InversePoleFigure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    LoadPoleFigures {
        files: Vec<PathBuf>,
        millers: Vec<MillerIndex>,
        crystal_symmetry: CrystalSymmetry,
        symmetry: SpecimenSymmetry,
    },
    Plot {
        kind: PlotKind,
        symmetry: SpecimenSymmetry,
        /// PNG file name inside the output directory.
        file: String,
    },
    FitOdf,
    Property {
        property: Property,
        symmetry: SpecimenSymmetry,
    },
    VolumeFraction {
        component: IdealComponent,
        spread_deg: f64,
        symmetry: SpecimenSymmetry,
    },
    SampleFibre {
        fibre: FibreDef,
        from: OrientationSpec,
        to: OrientationSpec,
        /// 1-based positions along the discretized fibre.
        indices: Vec<usize>,
        symmetry: SpecimenSymmetry,
    },
    WriteProperties {
        file: String,
    },
}

/// File holding the scalar results of a run.
pub const PROPERTIES_FILE: &str = "properties.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    /// Lay out the full analysis for the data files `files`, which must be
    /// in the order of `config.pole_figures`.
    pub fn build(config: &AnalysisConfig, files: Vec<PathBuf>) -> Result<Plan> {
        config.validate()?;
        if files.len() != config.pole_figures.len() {
            return Err(AnalysisError::Config(format!(
                "{} data files for {} pole figures",
                files.len(),
                config.pole_figures.len()
            )));
        }

        let sym = &config.symmetry;
        let mut steps = vec![
            Step::LoadPoleFigures {
                files,
                millers: config.pole_figures.clone(),
                crystal_symmetry: config.crystal_symmetry.clone(),
                symmetry: sym.measured,
            },
            Step::Plot {
                kind: PlotKind::RawPoleFigures,
                symmetry: sym.measured,
                file: "pole_figures.png".into(),
            },
            Step::FitOdf,
        ];

        for property in [Property::TextureIndex, Property::Entropy, Property::MaxDensity] {
            steps.push(Step::Property {
                property,
                symmetry: sym.properties,
            });
        }

        steps.extend([
            Step::Plot {
                kind: PlotKind::RecalculatedPoleFigures {
                    levels: config.contours.pole_figures.clone(),
                },
                symmetry: sym.recalculated_pole_figures,
                file: "recalculated_pole_figures.png".into(),
            },
            Step::Plot {
                kind: PlotKind::OdfPhi2Sections {
                    angles: config.odf_phi2_sections.clone(),
                    levels: config.contours.odf_sections.clone(),
                },
                symmetry: sym.odf_sections,
                file: "odf_phi2_sections.png".into(),
            },
            Step::Plot {
                kind: PlotKind::OdfSections {
                    count: config.odf_section_count,
                },
                symmetry: sym.odf_sections,
                file: "odf_sections.png".into(),
            },
            Step::Plot {
                kind: PlotKind::InversePoleFigure,
                symmetry: sym.inverse_pole_figure,
                file: "inverse_pole_figure.png".into(),
            },
        ]);

        for component in &config.components {
            steps.push(Step::VolumeFraction {
                component: component.clone(),
                spread_deg: config.spread_deg,
                symmetry: sym.volume_fractions,
            });
        }

        let indices = config.fibre_sampling.indices()?;
        for fibre in &config.fibres {
            // Endpoints were checked by validate().
            let endpoint = |name: &str| {
                config
                    .component(name)
                    .map(|c| c.orientation.clone())
                    .ok_or_else(|| AnalysisError::Config(format!("unknown component '{name}'")))
            };
            steps.push(Step::SampleFibre {
                fibre: fibre.clone(),
                from: endpoint(&fibre.from)?,
                to: endpoint(&fibre.to)?,
                indices: indices.clone(),
                symmetry: sym.fibres,
            });
        }

        steps.push(Step::WriteProperties {
            file: PROPERTIES_FILE.into(),
        });

        Ok(Plan { steps })
    }

    /// Keys `properties.csv` will hold, in write order.
    pub fn property_keys(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Property { property, .. } => Some(property.key().to_string()),
                Step::VolumeFraction { component, .. } => Some(volume_key(&component.name)),
                _ => None,
            })
            .collect()
    }

    /// Fibre samplings of the plan: (fibre, number of samples).
    pub fn fibre_outputs(&self) -> Vec<(&FibreDef, usize)> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::SampleFibre { fibre, indices, .. } => Some((fibre, indices.len())),
                _ => None,
            })
            .collect()
    }
}

/// Key of a component's volume fraction in `properties.csv`.
pub fn volume_key(component: &str) -> String {
    format!("volume_{component}")
}
