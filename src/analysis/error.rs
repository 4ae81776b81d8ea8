use std::path::PathBuf;

use thiserror::Error;

use crate::data::loader::LoadError;
use crate::texture::fibre::FibreError;

/// Errors raised by the analysis driver.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid analysis recipe: {0}")]
    Config(String),

    #[error("failed to read recipe '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse recipe '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Fibre(#[from] FibreError),

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start '{executable}': {source}")]
    MatlabSpawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MATLAB exited with {0}")]
    MatlabFailed(std::process::ExitStatus),

    #[error("expected output missing after the MATLAB run: {0}")]
    MissingOutput(PathBuf),

    #[error("'{path}': {reason}")]
    BadOutput { path: PathBuf, reason: String },
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
