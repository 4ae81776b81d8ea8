use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// MillerIndex – a crystallographic plane or direction
// ---------------------------------------------------------------------------

/// Integer triple identifying a lattice plane `(hkl)` or direction `[uvw]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MillerIndex {
    pub h: i32,
    pub k: i32,
    pub l: i32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid Miller index '{0}'")]
pub struct ParseMillerError(pub String);

impl MillerIndex {
    pub const fn new(h: i32, k: i32, l: i32) -> Self {
        Self { h, k, l }
    }

    /// Components as an array, in `h k l` order.
    pub fn components(&self) -> [i32; 3] {
        [self.h, self.k, self.l]
    }
}

/// Compact label as used in TexEval headers and output file names:
/// `111`, `200`, `1-12`.
impl fmt::Display for MillerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components().iter().all(|c| c.abs() < 10) {
            write!(f, "{}{}{}", self.h, self.k, self.l)
        } else {
            write!(f, "{} {} {}", self.h, self.k, self.l)
        }
    }
}

/// Accepts `"111"`, `"1-12"`, `"1 1 1"`, `"1,-1,2"` and bracketed forms such
/// as `"{111}"` or `"<1 -1 2>"`.
impl FromStr for MillerIndex {
    type Err = ParseMillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMillerError(s.to_string());
        let inner = s
            .trim()
            .trim_matches(|c| matches!(c, '{' | '}' | '(' | ')' | '[' | ']' | '<' | '>'))
            .trim();

        let parts: Vec<i32> = if inner.contains(|c: char| c.is_whitespace() || c == ',') {
            inner
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|tok| !tok.is_empty())
                .map(|tok| tok.parse::<i32>().map_err(|_| err()))
                .collect::<Result<_, _>>()?
        } else {
            // Compact form: one digit per component, optional leading minus.
            let mut out = Vec::with_capacity(3);
            let mut negative = false;
            for c in inner.chars() {
                match c {
                    '-' if !negative => negative = true,
                    d if d.is_ascii_digit() => {
                        let v = d.to_digit(10).ok_or_else(err)? as i32;
                        out.push(if negative { -v } else { v });
                        negative = false;
                    }
                    _ => return Err(err()),
                }
            }
            if negative {
                return Err(err());
            }
            out
        };

        match parts.as_slice() {
            [h, k, l] => Ok(MillerIndex::new(*h, *k, *l)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for MillerIndex {
    type Error = ParseMillerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MillerIndex> for String {
    fn from(value: MillerIndex) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Symmetry descriptors
// ---------------------------------------------------------------------------

/// Crystal symmetry handed to MTEX's `crystalSymmetry` constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalSymmetry {
    /// Point group in international notation, e.g. `m-3m`.
    pub point_group: String,
    /// Lattice constants a, b, c in Ångström.
    pub lattice: [f64; 3],
    /// Lattice angles alpha, beta, gamma in degrees.
    #[serde(default = "default_lattice_angles")]
    pub angles: [f64; 3],
    pub mineral: String,
}

fn default_lattice_angles() -> [f64; 3] {
    [90.0, 90.0, 90.0]
}

impl Default for CrystalSymmetry {
    fn default() -> Self {
        Self {
            point_group: "m-3m".to_string(),
            lattice: [4.04, 4.04, 4.04],
            angles: default_lattice_angles(),
            mineral: "Aluminium".to_string(),
        }
    }
}

/// Specimen (sample) symmetry.  Raw measurements are triclinic; property
/// queries on rolled sheet assume orthorhombic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpecimenSymmetry {
    #[default]
    Triclinic,
    Orthorhombic,
}

impl SpecimenSymmetry {
    /// Point group label understood by MTEX's `specimenSymmetry`.
    pub fn point_group(&self) -> &'static str {
        match self {
            SpecimenSymmetry::Triclinic => "1",
            SpecimenSymmetry::Orthorhombic => "222",
        }
    }
}

impl fmt::Display for SpecimenSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecimenSymmetry::Triclinic => write!(f, "triclinic"),
            SpecimenSymmetry::Orthorhombic => write!(f, "orthorhombic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Measurements and pole figures
// ---------------------------------------------------------------------------

/// One detector reading.  Angles in degrees, intensity in arbitrary units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRecord {
    pub polar: f64,
    pub azimuth: f64,
    pub intensity: f64,
}

/// All readings of one diffraction peak, tagged with its plane.
#[derive(Debug, Clone, PartialEq)]
pub struct PoleFigure {
    pub miller: MillerIndex,
    pub records: Vec<MeasurementRecord>,
}

impl PoleFigure {
    pub fn new(miller: MillerIndex, records: Vec<MeasurementRecord>) -> Self {
        Self { miller, records }
    }

    /// Number of measurement rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `(polar, azimuth)` sequence of this pole figure.
    pub fn grid(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.records.iter().map(|r| (r.polar, r.azimuth))
    }

    /// Largest measured intensity, `None` for an empty pole figure.
    pub fn max_intensity(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|r| r.intensity)
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

// ---------------------------------------------------------------------------
// PoleFigureSet – the combined dataset for one specimen
// ---------------------------------------------------------------------------

/// N pole figures sharing one measurement grid, plus symmetry metadata.
/// Built once by [`crate::data::loader::assemble`] and never mutated.
#[derive(Debug, Clone)]
pub struct PoleFigureSet {
    pole_figures: Vec<PoleFigure>,
    crystal_symmetry: CrystalSymmetry,
    specimen_symmetry: SpecimenSymmetry,
}

impl PoleFigureSet {
    pub(crate) fn new(
        pole_figures: Vec<PoleFigure>,
        crystal_symmetry: CrystalSymmetry,
        specimen_symmetry: SpecimenSymmetry,
    ) -> Self {
        Self {
            pole_figures,
            crystal_symmetry,
            specimen_symmetry,
        }
    }

    pub fn pole_figures(&self) -> &[PoleFigure] {
        &self.pole_figures
    }

    pub fn crystal_symmetry(&self) -> &CrystalSymmetry {
        &self.crystal_symmetry
    }

    pub fn specimen_symmetry(&self) -> SpecimenSymmetry {
        self.specimen_symmetry
    }

    /// Miller indices in set order.
    pub fn millers(&self) -> Vec<MillerIndex> {
        self.pole_figures.iter().map(|pf| pf.miller).collect()
    }

    /// Rows per pole figure (identical across the set).
    pub fn rows_per_pole_figure(&self) -> usize {
        self.pole_figures.first().map_or(0, PoleFigure::len)
    }

    /// Number of pole figures.
    pub fn len(&self) -> usize {
        self.pole_figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pole_figures.is_empty()
    }
}
