//! Evaluation tables
//!
//! Input: a table with `Q`, `S_q`, `t` and an optional `question` label.
//! Output: `question` (when present), `Q`, `S_q`, `t`, then `E` rounded to
//! the configured precision and a boolean `fired` (`E >= fire_threshold`).
//! Rows that cannot be scored get null `E` and `fired`.

use crate::batch::{BatchEvaluator, ExistenceModel};
use crate::scoring::ScoreSample;
use crate::{table, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Optional pass-through label column
pub const QUESTION_COLUMN: &str = "question";

/// Round half away from zero to `places` decimals
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

impl<M: ExistenceModel> BatchEvaluator<M> {
    /// Score every row of an evaluation table
    ///
    /// `Q`, `S_q` and `t` may be numeric or numeric text; a cell that does
    /// not parse only voids its own row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingColumn`] if `Q`, `S_q` or `t` is absent
    pub fn evaluate_table(&self, input: &RecordBatch) -> Result<RecordBatch> {
        let q = table::column_f64(input, "Q")?;
        let s_q = table::column_f64(input, "S_q")?;
        let t = table::column_f64(input, "t")?;

        let samples: Vec<ScoreSample> = q
            .iter()
            .zip(&s_q)
            .zip(&t)
            .map(|((&q, &s_q), &t)| ScoreSample::new(q, s_q, t))
            .collect();
        let results = self.run(&samples, None)?;

        let precision = self.config().display_precision();
        let threshold = self.config().fire_threshold();

        let mut fields = Vec::with_capacity(6);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(6);

        if let Some(question) = input.column_by_name(QUESTION_COLUMN) {
            fields.push(Field::new(QUESTION_COLUMN, question.data_type().clone(), true));
            columns.push(Arc::clone(question));
        }

        for (name, values) in [("Q", q), ("S_q", s_q), ("t", t)] {
            fields.push(Field::new(name, DataType::Float64, false));
            columns.push(Arc::new(Float64Array::from(values)));
        }

        fields.push(Field::new("E", DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.map(|e| round_to(e, precision)))
                .collect::<Vec<_>>(),
        )));

        // fired compares the unrounded score
        fields.push(Field::new("fired", DataType::Boolean, true));
        columns.push(Arc::new(BooleanArray::from(
            results
                .iter()
                .map(|r| r.map(|e| e >= threshold))
                .collect::<Vec<_>>(),
        )));

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    /// Read `input`, score it and write the result to `output`
    ///
    /// Both formats are picked from the file extensions.
    ///
    /// # Errors
    ///
    /// Returns error on I/O failure or a missing input column
    pub fn evaluate_file<I: AsRef<Path>, O: AsRef<Path>>(
        &self,
        input: I,
        output: O,
    ) -> Result<RecordBatch> {
        let batch = table::read_table(input.as_ref())?;
        let evaluated = self.evaluate_table(&batch)?;
        table::write_table(output.as_ref(), &evaluated)?;
        info!(
            input = %input.as_ref().display(),
            output = %output.as_ref().display(),
            rows = evaluated.num_rows(),
            "evaluation table written"
        );
        Ok(evaluated)
    }
}
