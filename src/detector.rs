//! PoR detection over response tables
//!
//! A row is flagged when its `cosine_shift` exceeds the detector threshold or
//! its `curr_resp` text contains `Q`. Every row also gets an `intensity`
//! (`sigmoid(cosine_shift)`).
//!
//! Missing inputs are filled rather than rejected: an absent or non-numeric
//! `cosine_shift` reads as `0.0`, an absent `curr_resp` as empty text. The
//! normalized columns replace the originals; every other column passes
//! through untouched.

use crate::scoring::sigmoid;
use crate::{table, Config, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Similarity shift column
pub const COSINE_SHIFT_COLUMN: &str = "cosine_shift";
/// Current response text column
pub const RESPONSE_COLUMN: &str = "curr_resp";
/// Output flag column (1 = fired, 0 = not fired)
pub const FLAG_COLUMN: &str = "PoR_flag";
/// Output intensity column
pub const INTENSITY_COLUMN: &str = "intensity";

const RESPONSE_MARKER: char = 'Q';

/// Flag PoRs in `input`
///
/// # Errors
///
/// Returns error if a column cannot be cast or the output batch is invalid
pub fn detect_pors(input: &RecordBatch, config: &Config) -> Result<RecordBatch> {
    let rows = input.num_rows();

    let shift: Vec<f64> = if input.column_by_name(COSINE_SHIFT_COLUMN).is_some() {
        table::column_f64(input, COSINE_SHIFT_COLUMN)?
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .collect()
    } else {
        vec![0.0; rows]
    };

    let response: StringArray = match table::column_text(input, RESPONSE_COLUMN)? {
        Some(text) => (0..rows)
            .map(|i| Some(if text.is_null(i) { "" } else { text.value(i) }))
            .collect(),
        None => std::iter::repeat(Some("")).take(rows).collect(),
    };

    let threshold = config.detector_threshold();
    let flags: Vec<i64> = shift
        .iter()
        .enumerate()
        .map(|(i, &s)| i64::from(s > threshold || response.value(i).contains(RESPONSE_MARKER)))
        .collect();
    let intensity = shift
        .iter()
        .map(|&s| sigmoid(s))
        .collect::<Result<Vec<f64>>>()?;

    info!(
        rows,
        flagged = flags.iter().sum::<i64>(),
        "PoR detection completed"
    );

    let mut output = ColumnSet::from_batch(input);
    output.upsert(
        Field::new(COSINE_SHIFT_COLUMN, DataType::Float64, false),
        Arc::new(Float64Array::from(shift)),
    );
    output.upsert(
        Field::new(RESPONSE_COLUMN, DataType::Utf8, false),
        Arc::new(response),
    );
    output.upsert(
        Field::new(FLAG_COLUMN, DataType::Int64, false),
        Arc::new(Int64Array::from(flags)),
    );
    output.upsert(
        Field::new(INTENSITY_COLUMN, DataType::Float64, false),
        Arc::new(Float64Array::from(intensity)),
    );
    output.finish()
}

/// Read `input`, detect, and write to `output` (formats from extensions)
///
/// # Errors
///
/// Returns error on I/O or encoding failure
pub fn detect_file<I: AsRef<Path>, O: AsRef<Path>>(
    input: I,
    output: O,
    config: &Config,
) -> Result<RecordBatch> {
    let batch = table::read_table(input.as_ref())?;
    info!(
        path = %input.as_ref().display(),
        rows = batch.num_rows(),
        "loaded detection input"
    );
    let detected = detect_pors(&batch, config)?;
    table::write_table(output.as_ref(), &detected)?;
    Ok(detected)
}

/// Ordered columns with replace-or-append by name
struct ColumnSet {
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
}

impl ColumnSet {
    fn from_batch(batch: &RecordBatch) -> Self {
        Self {
            fields: batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.as_ref().clone())
                .collect(),
            columns: batch.columns().to_vec(),
        }
    }

    fn upsert(&mut self, field: Field, column: ArrayRef) {
        match self.fields.iter().position(|f| f.name() == field.name()) {
            Some(idx) => {
                self.fields[idx] = field;
                self.columns[idx] = column;
            }
            None => {
                self.fields.push(field);
                self.columns.push(column);
            }
        }
    }

    fn finish(self) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Arc::new(Schema::new(self.fields)),
            self.columns,
        )?)
    }
}
