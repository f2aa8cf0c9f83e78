//! Turn Record - one dialogue turn and its resonance metrics

use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Turn Record captures one simulated or real dialogue turn.
///
/// Records are immutable once built; the store owns them after append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnRecord {
    turn_id: i64,
    prompt: String,
    response: String,
    q_self: f64,
    s_q: f64,
    t_total: i64,
    m: f64,
}

impl TurnRecord {
    /// Create a turn record with all metrics at zero.
    #[must_use]
    pub fn new(turn_id: i64, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self::builder(turn_id, prompt, response).build()
    }

    /// Create a builder for setting the turn's metrics.
    #[must_use]
    pub fn builder(
        turn_id: i64,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> TurnRecordBuilder {
        TurnRecordBuilder::new(turn_id, prompt, response)
    }

    /// Get the turn identifier.
    #[must_use]
    pub const fn turn_id(&self) -> i64 {
        self.turn_id
    }

    /// Get the user prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Get the generated response.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Get the self-match score.
    #[must_use]
    pub const fn q_self(&self) -> f64 {
        self.q_self
    }

    /// Get the semantic density.
    #[must_use]
    pub const fn s_q(&self) -> f64 {
        self.s_q
    }

    /// Get the turn's processing time in milliseconds.
    #[must_use]
    pub const fn t_total(&self) -> i64 {
        self.t_total
    }

    /// Get the free-form extra metric.
    #[must_use]
    pub const fn m(&self) -> f64 {
        self.m
    }
}

/// Builder for `TurnRecord`.
#[derive(Debug)]
pub struct TurnRecordBuilder {
    record: TurnRecord,
}

impl TurnRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(turn_id: i64, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            record: TurnRecord {
                turn_id,
                prompt: prompt.into(),
                response: response.into(),
                q_self: 0.0,
                s_q: 0.0,
                t_total: 0,
                m: 0.0,
            },
        }
    }

    /// Set the self-match score.
    #[must_use]
    pub fn q_self(mut self, q_self: f64) -> Self {
        self.record.q_self = q_self;
        self
    }

    /// Set the semantic density.
    #[must_use]
    pub fn s_q(mut self, s_q: f64) -> Self {
        self.record.s_q = s_q;
        self
    }

    /// Set the processing time in milliseconds.
    #[must_use]
    pub fn t_total(mut self, t_total_ms: i64) -> Self {
        self.record.t_total = t_total_ms;
        self
    }

    /// Set the extra metric.
    #[must_use]
    pub fn m(mut self, m: f64) -> Self {
        self.record.m = m;
        self
    }

    /// Build the `TurnRecord`.
    #[must_use]
    pub fn build(self) -> TurnRecord {
        self.record
    }
}

/// Arrow schema of a persisted turn log
#[must_use]
pub fn turn_record_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("turn_id", DataType::Int64, false),
        Field::new("prompt", DataType::Utf8, false),
        Field::new("response", DataType::Utf8, false),
        Field::new("q_self", DataType::Float64, false),
        Field::new("s_q", DataType::Float64, false),
        Field::new("t_total", DataType::Int64, false),
        Field::new("m", DataType::Float64, false),
    ]))
}

/// Columnar form of `records`, in order
///
/// # Errors
/// Returns error if Arrow rejects the assembled batch
pub fn records_to_batch(records: &[TurnRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.turn_id))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| &r.prompt))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| &r.response))),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.q_self))),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.s_q))),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.t_total))),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.m))),
    ];
    Ok(RecordBatch::try_new(turn_record_schema(), columns)?)
}

fn typed_column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::StorageError(format!("Turn log is missing column {name}")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::StorageError(format!("Turn log column {name} has the wrong type")))
}

/// Rebuild records from a turn-log batch
///
/// # Errors
/// Returns [`Error::StorageError`] if the batch does not match
/// [`turn_record_schema`] or holds nulls
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<TurnRecord>> {
    let turn_id = typed_column::<Int64Array>(batch, "turn_id")?;
    let prompt = typed_column::<StringArray>(batch, "prompt")?;
    let response = typed_column::<StringArray>(batch, "response")?;
    let q_self = typed_column::<Float64Array>(batch, "q_self")?;
    let s_q = typed_column::<Float64Array>(batch, "s_q")?;
    let t_total = typed_column::<Int64Array>(batch, "t_total")?;
    let m = typed_column::<Float64Array>(batch, "m")?;

    let columns: [&dyn Array; 7] = [turn_id, prompt, response, q_self, s_q, t_total, m];
    if columns.iter().any(|c| c.null_count() > 0) {
        return Err(Error::StorageError("Turn log contains null values".to_string()));
    }

    Ok((0..batch.num_rows())
        .map(|i| TurnRecord {
            turn_id: turn_id.value(i),
            prompt: prompt.value(i).to_string(),
            response: response.value(i).to_string(),
            q_self: q_self.value(i),
            s_q: s_q.value(i),
            t_total: t_total.value(i),
            m: m.value(i),
        })
        .collect())
}
