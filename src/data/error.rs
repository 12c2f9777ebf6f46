use thiserror::Error;

// ---------------------------------------------------------------------------
// DataFormatError – a spectral table that cannot become a curve
// ---------------------------------------------------------------------------

/// Structural problems with a spectral table.
///
/// Fatal for the fluorophore being loaded, never for the others.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("expected 3 columns (wavelength, excitation, emission), found {found}")]
    ColumnCount { found: usize },

    #[error("row {row}, column '{column}': '{value}' is not a number")]
    NotANumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}, column '{column}': value is missing")]
    MissingValue { row: usize, column: &'static str },

    #[error("column lengths differ: wavelength {wavelength}, excitation {excitation}, emission {emission}")]
    LengthMismatch {
        wavelength: usize,
        excitation: usize,
        emission: usize,
    },

    #[error("table has no samples")]
    Empty,

    #[error("row {row}: {column} value {value} is not finite")]
    NonFinite {
        row: usize,
        column: &'static str,
        value: f64,
    },

    #[error("wavelength {0} nm appears more than once")]
    DuplicateWavelength(f64),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType {
        column: String,
        data_type: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}
