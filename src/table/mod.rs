//! Flat table I/O (CSV / Parquet over Arrow)
//!
//! The file extension is the only format negotiation: `.csv` (any case)
//! selects CSV, everything else selects Parquet, on both read and write.
//!
//! CSV columns are typed on read: a column whose non-empty cells all parse as
//! numbers becomes `Float64`, anything else stays `Utf8`. Empty cells are null.

use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// On-disk table format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl TableFormat {
    /// Pick the format from a path's extension
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Parquet,
        }
    }
}

/// Read a whole table into one `RecordBatch`
///
/// # Errors
/// Returns error if the file cannot be opened or parsed
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    match TableFormat::from_path(path) {
        TableFormat::Csv => read_csv(path),
        TableFormat::Parquet => read_parquet(path),
    }
}

/// Write a `RecordBatch` in the format selected by `path`
///
/// # Errors
/// Returns error if the file cannot be created or encoded
pub fn write_table<P: AsRef<Path>>(path: P, batch: &RecordBatch) -> Result<()> {
    let path = path.as_ref();
    match TableFormat::from_path(path) {
        TableFormat::Csv => write_csv(path, batch),
        TableFormat::Parquet => write_parquet(path, batch),
    }
}

/// Read all row groups of a Parquet file, concatenated
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path)
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;
    let schema = builder.schema().clone();

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch = batch
            .map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        batches.push(batch);
    }

    Ok(arrow::compute::concat_batches(&schema, &batches)?)
}

/// Write a single batch as a Parquet file, replacing any existing file
///
/// # Errors
/// Returns error if the file cannot be created or encoded
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    use parquet::arrow::ArrowWriter;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn read_csv(path: &Path) -> Result<RecordBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    // csv rejects ragged rows itself (flexible = false)
    for record in reader.records() {
        let record = record?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());
    for (name, values) in headers.iter().zip(cells) {
        let (field, array) = infer_csv_column(name, values);
        fields.push(field);
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn infer_csv_column(name: &str, values: Vec<String>) -> (Field, ArrayRef) {
    let numeric: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|v| {
            let v = v.trim();
            if v.is_empty() {
                Some(None)
            } else {
                v.parse::<f64>().ok().map(Some)
            }
        })
        .collect();

    match numeric {
        Some(parsed) => (
            Field::new(name, DataType::Float64, true),
            Arc::new(Float64Array::from(parsed)),
        ),
        None => {
            let strings: Vec<Option<String>> = values
                .into_iter()
                .map(|v| if v.is_empty() { None } else { Some(v) })
                .collect();
            (
                Field::new(name, DataType::Utf8, true),
                Arc::new(StringArray::from(strings)),
            )
        }
    }
}

fn write_csv(path: &Path, batch: &RecordBatch) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let schema = batch.schema();
    writer.write_record(schema.fields().iter().map(|f| f.name().as_str()))?;

    let text_columns = batch
        .columns()
        .iter()
        .map(utf8_view)
        .collect::<Result<Vec<_>>>()?;

    for row in 0..batch.num_rows() {
        writer.write_record(text_columns.iter().map(|column| {
            if column.is_null(row) {
                ""
            } else {
                column.value(row)
            }
        }))?;
    }
    writer.flush()?;
    Ok(())
}

fn utf8_view(column: &ArrayRef) -> Result<StringArray> {
    let casted = arrow::compute::cast(column, &DataType::Utf8)?;
    casted
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| Error::StorageError("Utf8 cast did not yield a StringArray".to_string()))
}

/// Column `name` coerced to `f64`; nulls and unparseable text become NaN
///
/// # Errors
/// Returns [`Error::MissingColumn`] if the column does not exist
pub fn column_f64(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
    let casted = arrow::compute::cast(column, &DataType::Float64)?;
    let values = casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::StorageError(format!("Column {name} is not castable to Float64")))?;

    Ok((0..values.len())
        .map(|i| if values.is_null(i) { f64::NAN } else { values.value(i) })
        .collect())
}

/// Column `name` rendered as text, or `None` if the table lacks it
///
/// # Errors
/// Returns error if the column cannot be cast to `Utf8`
pub fn column_text(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>> {
    batch.column_by_name(name).map(utf8_view).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path("a/b.csv"), TableFormat::Csv);
        assert_eq!(TableFormat::from_path("a/b.CSV"), TableFormat::Csv);
        assert_eq!(TableFormat::from_path("a/b.parquet"), TableFormat::Parquet);
        assert_eq!(TableFormat::from_path("a/b"), TableFormat::Parquet);
        assert_eq!(TableFormat::from_path("a/b.tsv"), TableFormat::Parquet);
    }

    #[test]
    fn test_csv_type_inference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "Q,label\n1.5,a\n,b\n2,\n").unwrap();

        let batch = read_table(&path).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Float64);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);

        let q = column_f64(&batch, "Q").unwrap();
        assert!((q[0] - 1.5).abs() < f64::EPSILON);
        assert!(q[1].is_nan());
        assert!((q[2] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_column_f64_parses_text() {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec![Some("0.25"), Some("abc"), None]))],
        )
        .unwrap();

        let x = column_f64(&batch, "x").unwrap();
        assert!((x[0] - 0.25).abs() < f64::EPSILON);
        assert!(x[1].is_nan());
        assert!(x[2].is_nan());
        assert!(matches!(column_f64(&batch, "y"), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_csv_and_parquet_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Arc::new(Schema::new(vec![
            Field::new("E", DataType::Float64, true),
            Field::new("question", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![Some(0.5), None])),
                Arc::new(StringArray::from(vec![Some("why, though?"), Some("ok")])),
            ],
        )
        .unwrap();

        let csv_path = dir.path().join("out.csv");
        write_table(&csv_path, &batch).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("E,question\n"));
        assert!(text.contains("\"why, though?\""));

        let back = read_table(&csv_path).unwrap();
        assert_eq!(back.num_rows(), 2);
        assert!(column_f64(&back, "E").unwrap()[1].is_nan());

        let pq_path = dir.path().join("out.parquet");
        write_table(&pq_path, &batch).unwrap();
        let back = read_table(&pq_path).unwrap();
        assert_eq!(back.num_rows(), 2);
        assert_eq!(back.columns(), batch.columns());
    }

    #[test]
    fn test_csv_ragged_row_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        assert!(read_table(&path).is_err());
    }
}
