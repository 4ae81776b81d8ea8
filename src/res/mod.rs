/// TexEval RES conversion.
///
/// ```text
///   sample.RES
///        │
///        ▼
///   ┌──────────┐   ResFormat (planes, marker, step line,
///   │  parser   │◄── lines per ring, polar coverage)
///   └──────────┘
///        │  ResFile: grid + one ResBlock per plane and table
///        ▼
///   ┌──────────┐
///   │ splitter  │  sample_pf111_uncorr.dat, sample_pf111_corr.dat, …
///   └──────────┘
/// ```

pub mod error;
pub mod format;
pub mod parser;
pub mod render;
pub mod splitter;

pub use error::ResError;
pub use format::{AngularGrid, Intensities, ResFormat};
pub use parser::{parse_res, read_res, ResBlock, ResFile};
pub use splitter::{output_path, split_res_file, SplitSummary};
