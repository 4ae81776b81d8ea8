//! Fibre definitions, sample index selection and the fibre CSV format.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::orientation::EulerAngles;

/// Header line of every fibre CSV.
pub const FIBRE_CSV_HEADER: [&str; 4] = ["phi1", "Phi", "phi2", "fibreValue"];

/// Points in MTEX's default fibre discretization.
pub const DEFAULT_FIBRE_POINTS: usize = 1000;

/// Samples taken along each fibre.
pub const DEFAULT_SAMPLE_COUNT: usize = 10;

#[derive(Error, Debug)]
pub enum FibreError {
    #[error("cannot take {count} samples from a fibre of {points} points")]
    InvalidSampling { points: usize, count: usize },

    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error for '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{path}' header is {found:?}, expected {:?}", FIBRE_CSV_HEADER)]
    Header { path: PathBuf, found: Vec<String> },

    #[error("{path}:{line}: {reason}")]
    BadRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, FibreError>;

/// A fibre between two named ideal components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibreDef {
    /// Output stem: `<name>.csv` and `<name>.png`.
    pub name: String,
    pub from: String,
    pub to: String,
}

impl FibreDef {
    pub fn new(name: &str, from: &str, to: &str) -> Self {
        Self {
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// The beta fibre (Copper → Brass) and the Cube-Goss fibre.
pub fn default_fibres() -> Vec<FibreDef> {
    vec![
        FibreDef::new("beta_fibre", "Copper", "Brass"),
        FibreDef::new("cube_goss_fibre", "Cube", "Goss"),
    ]
}

/// Discretization and sample count shared by all fibres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibreSampling {
    #[serde(default = "default_points")]
    pub points: usize,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_points() -> usize {
    DEFAULT_FIBRE_POINTS
}

fn default_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

impl Default for FibreSampling {
    fn default() -> Self {
        Self {
            points: DEFAULT_FIBRE_POINTS,
            count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

impl FibreSampling {
    /// 1-based indices into the discretized fibre; see [`sample_indices`].
    pub fn indices(&self) -> Result<Vec<usize>> {
        sample_indices(self.points, self.count)
    }
}

/// Evenly spaced 1-based positions `round(1 + i*(points-1)/(count-1))`,
/// always including both endpoints.  Depends only on its arguments.
pub fn sample_indices(points: usize, count: usize) -> Result<Vec<usize>> {
    if count == 0 || points == 0 || count > points {
        return Err(FibreError::InvalidSampling { points, count });
    }
    if count == 1 {
        return Ok(vec![1]);
    }
    let step = (points - 1) as f64 / (count - 1) as f64;
    Ok((0..count)
        .map(|i| 1 + (i as f64 * step).round() as usize)
        .collect())
}

/// One evaluated point on a fibre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibreSample {
    pub euler: EulerAngles,
    pub value: f64,
}

/// Write samples with the fixed header, replacing any existing file.
pub fn write_fibre_csv(path: &Path, samples: &[FibreSample]) -> Result<()> {
    let file = File::create(path).map_err(|source| FibreError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| FibreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    // Fields after the first carry a leading space: "phi1, Phi, phi2, fibreValue".
    let header: Vec<String> = FIBRE_CSV_HEADER
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { h.to_string() } else { format!(" {h}") })
        .collect();
    writer.write_record(&header).map_err(csv_err)?;

    for s in samples {
        writer
            .write_record(&[
                format!("{:.4}", s.euler.phi1),
                format!(" {:.4}", s.euler.big_phi),
                format!(" {:.4}", s.euler.phi2),
                format!(" {:.4}", s.value),
            ])
            .map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;
    Ok(())
}

/// Read a fibre CSV written by [`write_fibre_csv`] or the MTEX script.
pub fn read_fibre_csv(path: &Path) -> Result<Vec<FibreSample>> {
    let csv_err = |source| FibreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let found: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    if found != FIBRE_CSV_HEADER {
        return Err(FibreError::Header {
            path: path.to_path_buf(),
            found,
        });
    }

    let mut samples = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_err)?;
        let line = row.position().map_or(0, |p| p.line());
        let values = row
            .iter()
            .map(|f| f.parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| FibreError::BadRow {
                path: path.to_path_buf(),
                line,
                reason: e.to_string(),
            })?;
        match values.as_slice() {
            [phi1, big_phi, phi2, value] => samples.push(FibreSample {
                euler: EulerAngles::new(*phi1, *big_phi, *phi2),
                value: *value,
            }),
            other => {
                return Err(FibreError::BadRow {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("expected 4 fields, found {}", other.len()),
                })
            }
        }
    }
    Ok(samples)
}
