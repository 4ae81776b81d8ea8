/// Data layer: pole figures, loading, and the viewer's profile model.
///
/// Architecture:
/// ```text
///   *_pf111_corr.dat  (written by crate::res)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → PoleFigure, validate → PoleFigureSet
///   └──────────┘
///        │                          fibre *.csv
///        ▼                               │
///   ┌──────────────┐                     ▼
///   │ PoleFigureSet │──► analysis   ┌──────────────┐
///   └──────────────┘                │ ProfileDataset│  curves for the viewer
///                                   └──────────────┘
///                                        │
///                                        ▼
///                                   ┌──────────┐
///                                   │  filter   │  metadata predicates
///                                   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod profile;
