//! Bridge between TexEval pole-figure exports and the MTEX texture toolbox.
//!
//! This crate provides:
//! - Splitting a TexEval RES file into one data file per pole figure
//! - Loading and cross-checking those files as one pole-figure set
//! - Driving the MTEX texture analysis through a generated MATLAB script
//! - Fibre CSVs and the profile model behind the desktop viewer
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use texeval2mtex::res::{split_res_file, ResFormat};
//! use texeval2mtex::analysis::{Analysis, AnalysisConfig};
//!
//! let input = Path::new("Al_sheet.RES");
//! split_res_file(input, 4, &ResFormat::default()).unwrap();
//! let analysis = Analysis::prepare(input, AnalysisConfig::default()).unwrap();
//! analysis.write_script(Path::new("analysis")).unwrap();
//! ```

pub mod analysis;
pub mod data;
pub mod res;
pub mod texture;

pub use data::model::{MillerIndex, PoleFigure, PoleFigureSet, SpecimenSymmetry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
