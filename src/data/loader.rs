use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use csv::{ReaderBuilder, Trim};
use thiserror::Error;

use super::model::{
    CrystalSymmetry, MeasurementRecord, MillerIndex, PoleFigure, PoleFigureSet, SpecimenSymmetry,
};
use super::profile::{MetadataValue, Profile, ProfileDataset};
use crate::texture::fibre::read_fibre_csv;

/// Column mapping of the converter's data files, in file order.  The same
/// names are handed to MTEX's generic loader.
pub const DAT_COLUMNS: [&str; 3] = ["Polar Angle", "Azimuth Angle", "Intensity"];

/// Errors raised while loading data files or assembling a pole-figure set.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("pole figure file not found: {0}")]
    Missing(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: {reason}")]
    BadRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("no measurement rows in {0}")]
    Empty(PathBuf),

    #[error("{files} pole figure files but {millers} Miller indices")]
    LengthMismatch { files: usize, millers: usize },

    #[error("{path} has {found} rows, expected {expected} like the first pole figure")]
    RowCountMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{path} row {row} is off the shared measurement grid")]
    GridMismatch { path: PathBuf, row: usize },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Pole figure data files
// ---------------------------------------------------------------------------

/// Load one converter data file (polar, azimuth, intensity per line,
/// whitespace-delimited, no header) and tag it with `miller`.
pub fn load_pole_figure(path: &Path, miller: MillerIndex) -> Result<PoleFigure> {
    if !path.is_file() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = row.position().map_or(0, |p| p.line());

        // Repeated delimiters show up as empty fields.
        let fields: Vec<&str> = row.iter().filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != DAT_COLUMNS.len() {
            return Err(LoadError::BadRow {
                path: path.to_path_buf(),
                line,
                reason: format!(
                    "expected {} columns ({}), found {}",
                    DAT_COLUMNS.len(),
                    DAT_COLUMNS.join(", "),
                    fields.len()
                ),
            });
        }

        let mut values = [0.0f64; 3];
        for (slot, (field, column)) in values.iter_mut().zip(fields.iter().zip(DAT_COLUMNS)) {
            *slot = field.parse::<f64>().map_err(|_| LoadError::BadRow {
                path: path.to_path_buf(),
                line,
                reason: format!("{column} '{field}' is not a number"),
            })?;
        }

        records.push(MeasurementRecord {
            polar: values[0],
            azimuth: values[1],
            intensity: values[2],
        });
    }

    if records.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    log::debug!("Loaded {} rows for {{{miller}}} from {}", records.len(), path.display());
    Ok(PoleFigure::new(miller, records))
}

/// Load every file, tag it with the Miller index at the same position and
/// combine them into one [`PoleFigureSet`].
///
/// All pole figures must share one `(polar, azimuth)` grid.
pub fn assemble(
    files: &[PathBuf],
    millers: &[MillerIndex],
    crystal_symmetry: CrystalSymmetry,
    specimen_symmetry: SpecimenSymmetry,
) -> Result<PoleFigureSet> {
    if files.len() != millers.len() {
        return Err(LoadError::LengthMismatch {
            files: files.len(),
            millers: millers.len(),
        });
    }

    let pole_figures = files
        .iter()
        .zip(millers)
        .map(|(path, &miller)| load_pole_figure(path, miller))
        .collect::<Result<Vec<_>>>()?;

    if let Some((first, rest)) = pole_figures.split_first() {
        for (pf, path) in rest.iter().zip(&files[1..]) {
            if pf.len() != first.len() {
                return Err(LoadError::RowCountMismatch {
                    path: path.clone(),
                    expected: first.len(),
                    found: pf.len(),
                });
            }
            if let Some(row) = first.grid().zip(pf.grid()).position(|(a, b)| a != b) {
                return Err(LoadError::GridMismatch {
                    path: path.clone(),
                    row,
                });
            }
        }
    }

    log::info!(
        "Assembled {} pole figures ({:?}) with {} rows each",
        pole_figures.len(),
        millers.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        pole_figures.first().map_or(0, PoleFigure::len)
    );

    Ok(PoleFigureSet::new(
        pole_figures,
        crystal_symmetry,
        specimen_symmetry,
    ))
}

// ---------------------------------------------------------------------------
// Viewer entry-point
// ---------------------------------------------------------------------------

/// Load a file into viewer profiles.  Dispatch by extension.
///
/// Supported formats:
/// * `.dat` – converter output; one profile per polar ring
/// * `.csv` – fibre samples; one profile per file
pub fn load_file(path: &Path) -> anyhow::Result<ProfileDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "dat" => load_dat_profiles(path),
        "csv" => load_fibre_profiles(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load several files into one dataset.
pub fn load_files(paths: &[PathBuf]) -> anyhow::Result<ProfileDataset> {
    paths.iter().try_fold(ProfileDataset::default(), |acc, path| {
        let ds = load_file(path).with_context(|| format!("loading {}", path.display()))?;
        Ok(acc.merge(ds))
    })
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("?")
        .to_string()
}

/// Plane and intensity variant encoded in a converter file name, e.g.
/// `sample_pf111_corr` → (`111`, `corr`).
fn parse_dat_name(stem: &str) -> (Option<String>, Option<String>) {
    let Some(pos) = stem.rfind("_pf") else {
        return (None, None);
    };
    let tail = &stem[pos + 3..];
    let mut parts = tail.splitn(2, '_');
    let plane = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
    let variant = parts.next().filter(|v| !v.is_empty()).map(str::to_string);
    (plane, variant)
}

fn load_dat_profiles(path: &Path) -> anyhow::Result<ProfileDataset> {
    let stem = file_label(path);
    let (plane, variant) = parse_dat_name(&stem);
    let miller = plane
        .as_deref()
        .and_then(|p| p.parse::<MillerIndex>().ok())
        .unwrap_or(MillerIndex::new(0, 0, 0));

    let pf = load_pole_figure(path, miller).context("reading pole figure data")?;

    // Group rows by polar angle, keeping file order.
    let mut rings: Vec<(f64, Vec<f64>, Vec<f64>)> = Vec::new();
    for r in &pf.records {
        match rings.last_mut() {
            Some((polar, x, y)) if *polar == r.polar => {
                x.push(r.azimuth);
                y.push(r.intensity);
            }
            _ => rings.push((r.polar, vec![r.azimuth], vec![r.intensity])),
        }
    }

    let profiles = rings
        .into_iter()
        .map(|(polar, x, y)| {
            let mut metadata = BTreeMap::new();
            metadata.insert("file".to_string(), MetadataValue::String(stem.clone()));
            metadata.insert("kind".to_string(), MetadataValue::String("pole figure".into()));
            metadata.insert("polar".to_string(), MetadataValue::Float(polar));
            if let Some(p) = &plane {
                metadata.insert("plane".to_string(), MetadataValue::String(p.clone()));
            }
            if let Some(v) = &variant {
                metadata.insert("intensities".to_string(), MetadataValue::String(v.clone()));
            }
            Profile { x, y, metadata }
        })
        .collect();

    Ok(ProfileDataset::from_profiles(profiles))
}

fn load_fibre_profiles(path: &Path) -> anyhow::Result<ProfileDataset> {
    let samples = read_fibre_csv(path).context("reading fibre CSV")?;
    if samples.is_empty() {
        bail!("{} holds no fibre samples", path.display());
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("file".to_string(), MetadataValue::String(file_label(path)));
    metadata.insert("kind".to_string(), MetadataValue::String("fibre".into()));
    metadata.insert(
        "samples".to_string(),
        MetadataValue::Integer(samples.len() as i64),
    );

    let profile = Profile {
        x: (1..=samples.len()).map(|i| i as f64).collect(),
        y: samples.iter().map(|s| s.value).collect(),
        metadata,
    };
    Ok(ProfileDataset::from_profiles(vec![profile]))
}
