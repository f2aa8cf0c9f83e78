//! Buffered JSONL result log
//!
//! Scored questions are buffered in memory and written one JSON object per
//! line. The file is rotated to `<path>.<YYYYmmdd_HHMMSS>` before a flush once
//! it exceeds the configured size.

use crate::{Config, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const RESERVED_KEYS: [&str; 7] = [
    "question",
    "score",
    "timestamp",
    "context",
    "time_score",
    "threshold",
    "fired",
];

/// One logged result line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Question text
    pub question: String,
    /// PoR score
    pub score: f64,
    /// Local time the entry was buffered (RFC 3339)
    pub timestamp: String,
    /// Evaluation context label
    pub context: String,
    /// Temporal match score shared by the call
    pub time_score: f64,
    /// Threshold the score was compared against
    pub threshold: f64,
    /// `score >= threshold`
    pub fired: bool,
    /// Caller-supplied fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Buffered writer for a JSONL result log
///
/// Dropping the writer flushes whatever is still buffered.
#[derive(Debug)]
pub struct ResultLogWriter {
    path: PathBuf,
    max_bytes: u64,
    buffer_limit: usize,
    buffer: Vec<ResultEntry>,
}

impl ResultLogWriter {
    /// Writer for `path`, creating its directory
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created
    pub fn new<P: Into<PathBuf>>(path: P, config: &Config) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            max_bytes: config.result_log_max_bytes(),
            buffer_limit: config.result_log_buffer(),
            buffer: Vec::new(),
        })
    }

    /// Log file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries waiting for the next flush
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer one entry per `(question, score)` pair
    ///
    /// `extra` fields are added to every entry; keys that collide with the
    /// entry's own fields are ignored. Flushes once the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotNumeric`] if any score, `time_score` or `threshold`
    /// is NaN (nothing is buffered then), or error if a triggered flush fails
    pub fn log_results<S: AsRef<str>>(
        &mut self,
        results: &[(S, f64)],
        context: &str,
        time_score: f64,
        threshold: f64,
        extra: Option<&Map<String, Value>>,
    ) -> Result<()> {
        if time_score.is_nan() {
            return Err(Error::not_numeric("time_score"));
        }
        if threshold.is_nan() {
            return Err(Error::not_numeric("threshold"));
        }
        if let Some(idx) = results.iter().position(|(_, score)| score.is_nan()) {
            return Err(Error::not_numeric(format!("score[{idx}]")));
        }

        let extra = extra.map(sanitize_extra).unwrap_or_default();

        for (question, score) in results {
            self.buffer.push(ResultEntry {
                question: question.as_ref().to_string(),
                score: *score,
                timestamp: chrono::Local::now().to_rfc3339(),
                context: context.to_string(),
                time_score,
                threshold,
                fired: *score >= threshold,
                extra: extra.clone(),
            });
        }

        if self.buffer.len() >= self.buffer_limit {
            self.flush()?;
        }
        Ok(())
    }

    /// Write buffered entries, rotating first if the file is too large
    ///
    /// # Errors
    ///
    /// Returns error on rotation, I/O or encoding failure; the buffer is kept
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.rotate_if_needed()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for entry in &self.buffer {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        info!(
            path = %self.path.display(),
            entries = self.buffer.len(),
            "result log flushed"
        );
        self.buffer.clear();
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if size <= self.max_bytes {
            return Ok(());
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("{}.{timestamp}", self.path.display());
        let mut rotated = PathBuf::from(&base);
        let mut n = 1usize;
        while rotated.exists() {
            rotated = PathBuf::from(format!("{base}_{n}"));
            n += 1;
        }

        fs::rename(&self.path, &rotated)?;
        info!(from = %self.path.display(), to = %rotated.display(), "result log rotated");
        Ok(())
    }
}

impl Drop for ResultLogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!(path = %self.path.display(), error = %e, "failed to flush result log on drop");
        }
    }
}

fn sanitize_extra(extra: &Map<String, Value>) -> Map<String, Value> {
    extra
        .iter()
        .filter(|(key, _)| {
            let reserved = RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                warn!(key = %key, "ignoring extra field that shadows a result field");
            }
            !reserved
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Read every entry of a JSONL result log
///
/// # Errors
///
/// Returns error if the file cannot be read or a line is not a valid entry
pub fn read_entries<P: AsRef<Path>>(path: P) -> Result<Vec<ResultEntry>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn config(buffer: usize, max_bytes: u64) -> Config {
        Config::builder()
            .result_log_buffer(buffer)
            .result_log_max_bytes(max_bytes)
            .build()
            .unwrap()
    }

    #[test]
    fn test_buffer_flushes_at_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("por_log.jsonl");
        let mut writer = ResultLogWriter::new(&path, &config(3, u64::MAX)).unwrap();

        writer
            .log_results(&[("a", 0.2), ("b", 0.7)], "ctx", 0.9, 0.5, None)
            .unwrap();
        assert_eq!(writer.buffered(), 2);
        assert!(!path.exists());

        writer.log_results(&[("c", 0.5)], "ctx", 0.9, 0.5, None).unwrap();
        assert_eq!(writer.buffered(), 0);

        let entries = read_entries(&path).unwrap();
        let fired: Vec<_> = entries.iter().map(|e| e.fired).collect();
        assert_eq!(fired, vec![false, true, true]);
    }

    #[test]
    fn test_nan_scores_are_rejected_whole_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("por_log.jsonl");

        {
            let mut writer = ResultLogWriter::new(&path, &config(100, u64::MAX)).unwrap();
            writer.log_results(&[("ok", 0.9)], "ctx", 0.5, 0.5, None).unwrap();

            let err = writer
                .log_results(&[("fine", 0.1), ("bad", f64::NAN)], "ctx", 0.5, 0.5, None)
                .unwrap_err();
            assert!(matches!(err, Error::NotNumeric { ref name } if name == "score[1]"));
            assert!(writer.log_results(&[("q", 0.1)], "ctx", f64::NAN, 0.5, None).is_err());
            assert!(writer.log_results(&[("q", 0.1)], "ctx", 0.5, f64::NAN, None).is_err());
            assert_eq!(writer.buffered(), 1);
        }

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "ok");
    }

    #[test]
    fn test_extra_fields_cannot_shadow() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("por_log.jsonl");
        let extra = json!({"model": "demo", "score": 99.0});

        {
            let mut writer = ResultLogWriter::new(&path, &config(100, u64::MAX)).unwrap();
            writer
                .log_results(&[("q", 0.1)], "ctx", 0.0, 0.5, extra.as_object())
                .unwrap();
        }

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert!((entries[0].score - 0.1).abs() < f64::EPSILON);
        assert_eq!(entries[0].extra.get("model"), Some(&json!("demo")));
        assert!(!entries[0].extra.contains_key("score"));
    }

    #[test]
    fn test_rotation_before_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("por_log.jsonl");
        let mut writer = ResultLogWriter::new(&path, &config(1, 1)).unwrap();

        writer.log_results(&[("first", 0.9)], "ctx", 0.0, 0.5, None).unwrap();
        writer.log_results(&[("second", 0.9)], "ctx", 0.0, 0.5, None).unwrap();

        let current = read_entries(&path).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].question, "second");

        let rotated: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p != &path)
            .collect();
        assert_eq!(rotated.len(), 1);
        assert_eq!(read_entries(&rotated[0]).unwrap()[0].question, "first");
    }
}
