use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ResError, Result};
use crate::data::model::MillerIndex;

/// Which intensity table of a RES file a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensities {
    Uncorrected,
    Corrected,
}

impl Intensities {
    /// File name suffix of the converted data files.
    pub fn suffix(&self) -> &'static str {
        match self {
            Intensities::Uncorrected => "uncorr",
            Intensities::Corrected => "corr",
        }
    }
}

impl fmt::Display for Intensities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensities::Uncorrected => write!(f, "uncorrected"),
            Intensities::Corrected => write!(f, "corrected"),
        }
    }
}

/// Polar and azimuthal step of the measurement grid, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularGrid {
    pub polar_step: f64,
    pub azimuth_step: f64,
}

impl AngularGrid {
    /// Polar rings covering `[0, polar_max)`.
    pub fn rings(&self, polar_max: f64) -> usize {
        (polar_max / self.polar_step) as usize
    }

    /// Azimuthal readings per ring.
    pub fn azimuths(&self) -> usize {
        (360.0 / self.azimuth_step) as usize
    }
}

/// Declarative layout of a TexEval RES export.
///
/// Line and field positions are 0-based.  The defaults describe the TexEval
/// exports this tool was written against; other variants can be described in
/// JSON and loaded with [`ResFormat::from_file`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResFormat {
    /// Pole figure planes in the order TexEval writes them.
    pub planes: Vec<MillerIndex>,
    /// Line whose first token starts with `correction_marker` when the file
    /// also carries defocus-corrected intensities.
    pub correction_marker_line: usize,
    pub correction_marker: String,
    /// Line holding the grid steps.
    pub step_line: usize,
    pub polar_step_field: usize,
    pub azimuth_step_field: usize,
    /// Text lines holding the intensities of one polar ring.
    pub lines_per_ring: usize,
    pub uncorrected_polar_max: f64,
    pub corrected_polar_max: f64,
}

impl Default for ResFormat {
    fn default() -> Self {
        let m = MillerIndex::new;
        Self {
            planes: vec![m(1, 1, 1), m(2, 0, 0), m(2, 2, 0), m(3, 1, 1), m(2, 2, 2), m(4, 0, 0)],
            correction_marker_line: 2,
            correction_marker: "LMAX".to_string(),
            step_line: 3,
            polar_step_field: 1,
            azimuth_step_field: 2,
            lines_per_ring: 8,
            uncorrected_polar_max: 80.0,
            corrected_polar_max: 90.0,
        }
    }
}

impl ResFormat {
    /// Load a descriptor from JSON; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ResError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ResError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn polar_max(&self, intensities: Intensities) -> f64 {
        match intensities {
            Intensities::Uncorrected => self.uncorrected_polar_max,
            Intensities::Corrected => self.corrected_polar_max,
        }
    }

    /// Minimum number of lines before the first block.
    pub fn preamble_lines(&self) -> usize {
        self.correction_marker_line.max(self.step_line) + 1
    }

    /// The exact line (without trailing whitespace) that introduces the
    /// block of `plane`.
    pub fn block_header(&self, plane: MillerIndex, intensities: Intensities, grid: &AngularGrid) -> String {
        format!(
            " {plane}       {:.2}   {}    0 {:.2}   {}    0",
            grid.azimuth_step,
            grid.azimuths(),
            grid.polar_step,
            grid.rings(self.polar_max(intensities)),
        )
    }
}
