//! The analysis driver.
//!
//! ```text
//!   AnalysisConfig ──► Plan (ordered steps, explicit specimen symmetry)
//!        │                 │
//!   data files ──► PoleFigureSet (validated)
//!                          │
//!                          ▼
//!                   texture_analysis.m ──► MATLAB/MTEX ──► PNGs,
//!                                                         fibre CSVs,
//!                                                         properties.csv
//!                                                              │
//!                                                              ▼
//!                                                        AnalysisReport
//! ```

pub mod driver;
pub mod error;
pub mod mtex;
pub mod plan;
pub mod recipe;
pub mod runner;

pub use driver::{data_files, Analysis};
pub use error::AnalysisError;
pub use plan::Plan;
pub use recipe::AnalysisConfig;
pub use runner::{AnalysisReport, MatlabRunner};
