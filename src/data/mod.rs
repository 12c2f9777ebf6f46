/// Data layer: spectral tables, curves and per-fluorophore aggregates.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse table → SpectralCurve (normalized to %)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SpectralCurve │  sorted samples, exact lookup, band slices
///   └──────────────┘
///        │   + lasers, channels
///        ▼
///   ┌───────────────────┐
///   │ FluorophoreProfile │  excitation per laser, integral per channel
///   └───────────────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod profile;
