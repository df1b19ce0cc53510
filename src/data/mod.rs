/// Data layer: core types, loading, and threshold filtering.
///
/// Architecture:
/// ```text
///  COMMIT output directory
///    ├── dictionary_TRK_fibers.trk ──► trk ─┐
///    └── Coeff_x_<Model>/NNNN.npy ──► npy ─┤
///                                          ▼
///                                    ┌──────────┐
///                                    │  loader  │  coefficients → weights
///                                    └──────────┘
///                                          │
///                                          ▼
///                                 ┌─────────────────┐
///                                 │ ConvergenceData │  streamlines × iterations
///                                 └─────────────────┘
///                                          │
///                                          ▼
///                                    ┌──────────┐
///                                    │  filter  │  weight → band in/out of range
///                                    └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod npy;
pub mod trk;
