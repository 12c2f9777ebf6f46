use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataFormatError;
use super::model::SpectralCurve;

/// Extensions recognised as spectral tables.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "parquet", "pq", "json"];

const COLUMNS: [&str; 3] = ["wavelength", "excitation", "emission"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a spectral table from a file.  Dispatch by extension.
///
/// Supported formats, each holding exactly three columns in the order
/// wavelength, excitation, emission:
/// * `.csv`     – header row followed by numeric rows
/// * `.parquet` – three numeric columns (any names)
/// * `.json`    – `[[w, ex, em], ...]`
pub fn load_spectral_table(path: &Path) -> Result<SpectralCurve> {
    let ext = extension_of(path);

    let curve = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv_table(file)
        }
        "parquet" | "pq" => {
            let file = std::fs::File::open(path).context("opening parquet file")?;
            read_parquet_table(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            read_json_table(&text)
        }
        other => bail!("Unsupported file extension: .{other}"),
    };

    curve.with_context(|| format!("malformed spectral table {}", path.display()))
}

/// Find the table file for each fluorophore name under `root`.
///
/// Directories are walked recursively in sorted order; the first file whose
/// stem matches a name wins. Names without a table are absent from the result.
pub fn discover_tables(root: &Path, names: &[String]) -> Result<BTreeMap<String, PathBuf>> {
    let mut found = BTreeMap::new();
    walk(root, names, &mut found)?;

    for name in names {
        if !found.contains_key(name) {
            log::warn!("No spectral table found for {name} under {}", root.display());
        }
    }
    Ok(found)
}

fn walk(dir: &Path, names: &[String], found: &mut BTreeMap<String, PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("listing directory {}", dir.display()))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, names, found)?;
            continue;
        }
        if !SUPPORTED_EXTENSIONS.contains(&extension_of(&path).as_str()) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !names.iter().any(|n| n == stem) {
            continue;
        }
        match found.get(stem) {
            Some(first) => log::warn!(
                "Ignoring {} for {stem}, already using {}",
                path.display(),
                first.display()
            ),
            None => {
                log::debug!("Found table for {stem}: {}", path.display());
                found.insert(stem.to_string(), path);
            }
        }
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: one header row (names are ignored), then
/// `wavelength,excitation,emission` per line.
pub fn read_csv_table<R: Read>(source: R) -> Result<SpectralCurve, DataFormatError> {
    let mut reader = csv::Reader::from_reader(source);

    let n_headers = reader.headers()?.len();
    if n_headers != COLUMNS.len() {
        return Err(DataFormatError::ColumnCount { found: n_headers });
    }

    let mut columns: [Vec<f64>; 3] = Default::default();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != COLUMNS.len() {
            return Err(DataFormatError::ColumnCount {
                found: record.len(),
            });
        }
        for (col, cell) in record.iter().enumerate() {
            let value = parse_cell(cell, row, COLUMNS[col])?;
            columns[col].push(value);
        }
    }

    let [wavelength, excitation, emission] = columns;
    SpectralCurve::from_columns(wavelength, excitation, emission)
}

fn parse_cell(cell: &str, row: usize, column: &'static str) -> Result<f64, DataFormatError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Err(DataFormatError::MissingValue { row, column });
    }
    cell.parse::<f64>().map_err(|_| DataFormatError::NotANumber {
        row,
        column,
        value: cell.to_string(),
    })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON shape:
///
/// ```json
/// [[480.0, 50.0, 10.0], [481.0, 51.2, 10.4], ...]
/// ```
pub fn read_json_table(text: &str) -> Result<SpectralCurve, DataFormatError> {
    let rows: Vec<JsonValue> = serde_json::from_str(text)?;

    let mut columns: [Vec<f64>; 3] = Default::default();
    for (row, value) in rows.iter().enumerate() {
        let cells = match value.as_array() {
            Some(cells) if cells.len() == COLUMNS.len() => cells,
            Some(cells) => return Err(DataFormatError::ColumnCount { found: cells.len() }),
            None => return Err(DataFormatError::ColumnCount { found: 1 }),
        };
        for (col, cell) in cells.iter().enumerate() {
            let value = cell.as_f64().ok_or_else(|| DataFormatError::NotANumber {
                row,
                column: COLUMNS[col],
                value: cell.to_string(),
            })?;
            columns[col].push(value);
        }
    }

    let [wavelength, excitation, emission] = columns;
    SpectralCurve::from_columns(wavelength, excitation, emission)
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet table with exactly three numeric columns.
///
/// Float64, Float32, Int32 and Int64 columns are accepted, so tables written
/// by both **Pandas** and **Polars** load without conversion.
pub fn read_parquet_table<T>(source: T) -> Result<SpectralCurve, DataFormatError>
where
    T: parquet::file::reader::ChunkReader + 'static,
{
    let builder = ParquetRecordBatchReaderBuilder::try_new(source)?;
    let n_fields = builder.schema().fields().len();
    if n_fields != COLUMNS.len() {
        return Err(DataFormatError::ColumnCount { found: n_fields });
    }
    let reader = builder.build()?;

    let mut columns: [Vec<f64>; 3] = Default::default();
    for batch_result in reader {
        let batch = batch_result?;
        for (col, target) in columns.iter_mut().enumerate() {
            let offset = target.len();
            extend_f64_column(batch.column(col), COLUMNS[col], offset, target)?;
        }
    }

    let [wavelength, excitation, emission] = columns;
    SpectralCurve::from_columns(wavelength, excitation, emission)
}

/// Append a numeric Arrow column to `target` as `f64`.
fn extend_f64_column(
    col: &Arc<dyn Array>,
    column: &'static str,
    row_offset: usize,
    target: &mut Vec<f64>,
) -> Result<(), DataFormatError> {
    match col.data_type() {
        DataType::Float64 | DataType::Float32 | DataType::Int32 | DataType::Int64 => {}
        other => {
            return Err(DataFormatError::UnsupportedType {
                column: column.to_string(),
                data_type: format!("{other:?}"),
            })
        }
    }

    let as_f64 = cast(col.as_ref(), &DataType::Float64)?;
    let values = as_f64
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| DataFormatError::UnsupportedType {
            column: column.to_string(),
            data_type: format!("{:?}", as_f64.data_type()),
        })?;

    for (i, value) in values.iter().enumerate() {
        let value = value.ok_or(DataFormatError::MissingValue {
            row: row_offset + i,
            column,
        })?;
        target.push(value);
    }
    Ok(())
}
