//! Turn-record store (Parquet)
//!
//! **Read-Merge-Rewrite Append**:
//! - Every append loads the current file, adds one record and rewrites it
//! - Append cost: O(current file size), not O(1)
//! - Rotation is checked against the file as it stood *before* the new record
//!
//! **Single writer per target**: there is no locking. Two appenders racing on
//! the same file can lose records; serializing writers is the caller's job.
//!
//! Toyota Way Principles:
//! - Poka-Yoke: rotated files never overwrite each other (`_<n>` suffix on collision)
//! - Genchi Genbutsu: rotation decisions use the on-disk size, not an estimate

pub mod result_log;
pub mod turn_record;

pub use result_log::{ResultEntry, ResultLogWriter};
pub use turn_record::{
    batch_to_records, records_to_batch, turn_record_schema, TurnRecord, TurnRecordBuilder,
};

use crate::{table, Config, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Timestamp format of rotated siblings (`<stem>_<timestamp>.<ext>`)
pub const ROTATION_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const ROTATION_TIMESTAMP_LEN: usize = 14;
const DEFAULT_EXTENSION: &str = "parquet";

/// What a single append did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Where the previous file went, if it was rotated
    pub rotated_to: Option<PathBuf>,
    /// Records now held by the current target
    pub records_in_file: usize,
}

/// Append-only store of [`TurnRecord`]s with size-triggered rotation
#[derive(Debug, Clone)]
pub struct RecordStore {
    max_bytes: u64,
}

impl RecordStore {
    /// Store rotating at `config.max_log_bytes()`
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self::with_max_bytes(config.max_log_bytes())
    }

    /// Store rotating once a file exceeds `max_bytes`
    #[must_use]
    pub const fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Rotation threshold in bytes
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Append `record` to `target`
    ///
    /// Creates the parent directory if needed, rotates `target` when it
    /// already exceeds the threshold, then rewrites `target` with every
    /// existing record followed by `record`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use por_engine::store::{RecordStore, TurnRecord};
    /// # use por_engine::Config;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dir = tempfile::tempdir()?;
    /// let target = dir.path().join("logs").join("turns.parquet");
    ///
    /// let store = RecordStore::new(&Config::default());
    /// store.append(&TurnRecord::new(0, "Who are you?", "A question."), &target)?;
    /// let outcome = store.append(&TurnRecord::new(1, "Why?", "Because."), &target)?;
    ///
    /// assert_eq!(outcome.records_in_file, 2);
    /// assert!(outcome.rotated_to.is_none());
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created, the rename fails,
    /// or the existing file is not a turn log
    pub fn append(&self, record: &TurnRecord, target: &Path) -> Result<AppendOutcome> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let rotated_to = self.rotate_if_needed(target)?;

        let mut records = if target.exists() {
            read_records(target)?
        } else {
            Vec::new()
        };
        records.push(record.clone());

        let batch = records_to_batch(&records)?;
        table::write_parquet(target, &batch)?;

        debug!(
            path = %target.display(),
            turn_id = record.turn_id(),
            records = records.len(),
            "turn record appended"
        );

        Ok(AppendOutcome {
            rotated_to,
            records_in_file: records.len(),
        })
    }

    fn rotate_if_needed(&self, target: &Path) -> Result<Option<PathBuf>> {
        let size = match fs::metadata(target) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if size <= self.max_bytes {
            return Ok(None);
        }

        let rotated = rotation_path(target)?;
        fs::rename(target, &rotated)?;
        info!(
            from = %target.display(),
            to = %rotated.display(),
            size,
            max_bytes = self.max_bytes,
            "turn log rotated"
        );
        Ok(Some(rotated))
    }
}

/// Read every record from a current or rotated turn log
///
/// # Errors
///
/// Returns error if the file cannot be read or has a foreign schema
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<TurnRecord>> {
    let batch = table::read_parquet(path.as_ref())?;
    batch_to_records(&batch)
}

/// Rotated siblings of `target`, oldest first
///
/// # Errors
///
/// Returns error if the directory cannot be listed
pub fn rotated_siblings(target: &Path) -> Result<Vec<PathBuf>> {
    let stem = file_stem(target)?;
    let dir = parent_dir(target);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{stem}_");
    let mut siblings = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|name| name.strip_prefix(&prefix))
            .and_then(rotation_key);
        if let Some(key) = key {
            siblings.push((key, path));
        }
    }
    siblings.sort();
    Ok(siblings.into_iter().map(|(_, path)| path).collect())
}

/// `(timestamp, collision index)` of a rotated name's suffix
fn rotation_key(suffix: &str) -> Option<(u64, usize)> {
    let timestamp = suffix.get(..ROTATION_TIMESTAMP_LEN)?;
    if !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = match &suffix[ROTATION_TIMESTAMP_LEN..] {
        "" => 0,
        rest => rest.strip_prefix('_')?.parse().ok()?,
    };
    Some((timestamp.parse().ok()?, index))
}

fn parent_dir(target: &Path) -> &Path {
    target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn file_stem(target: &Path) -> Result<&str> {
    target
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::StorageError(format!("Invalid turn log path: {}", target.display())))
}

/// `<stem>_<timestamp>.<ext>`, with `_<n>` added until the name is free
fn rotation_path(target: &Path) -> Result<PathBuf> {
    let stem = file_stem(target)?;
    let ext = target
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    let timestamp = chrono::Local::now().format(ROTATION_TIMESTAMP_FORMAT);
    let dir = parent_dir(target);

    let mut candidate = dir.join(format!("{stem}_{timestamp}.{ext}"));
    let mut n = 1usize;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}_{timestamp}_{n}.{ext}"));
        n += 1;
    }
    Ok(candidate)
}
