use std::path::PathBuf;

use thiserror::Error;

use super::format::Intensities;
use crate::data::model::MillerIndex;

/// Errors raised while reading, validating or splitting a RES file.
#[derive(Error, Debug)]
pub enum ResError {
    #[error("input must be a .RES file: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid format descriptor '{path}': {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("file has {lines} lines, the header needs at least {needed}")]
    TooShort { lines: usize, needed: usize },

    #[error("line {line}: cannot read {what} from '{text}'")]
    InvalidStep {
        line: usize,
        what: &'static str,
        text: String,
    },

    #[error("at least one pole figure must be requested")]
    NoPoleFigures,

    #[error("{declared} pole figures requested but the format knows only {supported} planes")]
    TooManyPoleFigures { declared: usize, supported: usize },

    #[error("{declared} pole figures declared but the file holds {found} {intensities} blocks")]
    BlockCountMismatch {
        intensities: Intensities,
        declared: usize,
        found: usize,
    },

    #[error("no {intensities} block for {{{plane}}}")]
    MissingBlock {
        plane: MillerIndex,
        intensities: Intensities,
    },

    #[error("{{{plane}}} {intensities} block ends early at polar ring {ring}")]
    Truncated {
        plane: MillerIndex,
        intensities: Intensities,
        ring: usize,
    },

    #[error("{{{plane}}} {intensities} ring {ring} has {found} intensities, the grid needs {expected}")]
    RingSize {
        plane: MillerIndex,
        intensities: Intensities,
        ring: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: '{token}' is not an intensity")]
    InvalidIntensity { line: usize, token: String },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for RES operations.
pub type Result<T> = std::result::Result<T, ResError>;
