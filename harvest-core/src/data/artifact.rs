//! Incremental CSV artifact: one growing file shared by the whole run.
//!
//! Every append is self-contained: open in append mode, write, flush, close.
//! A run that dies midway therefore leaves a parseable prefix. The header is
//! written only when the file is absent or empty.

use super::provider::SeriesRow;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persistence failures. Any of these ends a collection run.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("artifact I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("refusing to append an empty batch")]
    EmptyBatch,
}

/// The single output file of a collection run.
#[derive(Debug, Clone)]
pub struct CsvArtifact {
    path: PathBuf,
}

impl CsvArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard any artifact left over from a previous run.
    ///
    /// Runs are not resumable: the file is removed before the first fetch.
    pub fn prepare(&self) -> Result<(), WriteError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_err(source)),
        }
    }

    /// Append tagged rows and return the artifact's size on disk afterwards.
    pub fn append(&self, rows: &[SeriesRow]) -> Result<u64, WriteError> {
        if rows.is_empty() {
            return Err(WriteError::EmptyBatch);
        }

        let needs_header = self.size()? == 0;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        for row in rows {
            wtr.serialize(row)?;
        }

        wtr.flush().map_err(|e| self.io_err(e))?;
        drop(wtr);

        self.size()
    }

    /// Current size in bytes, read from filesystem metadata. Absent file = 0.
    pub fn size(&self) -> Result<u64, WriteError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(self.io_err(source)),
        }
    }

    fn io_err(&self, source: io::Error) -> WriteError {
        WriteError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(ticker: &str, day: u32) -> SeriesRow {
        SeriesRow {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.5,
            close: 10.5,
            adj_close: 10.25,
            volume: 1234,
            ticker: ticker.into(),
        }
    }

    #[test]
    fn first_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = CsvArtifact::new(dir.path().join("out.csv"));

        artifact.append(&[row("FOO.NS", 1), row("FOO.NS", 2)]).unwrap();
        artifact.append(&[row("BAR.NS", 1)]).unwrap();

        let content = std::fs::read_to_string(artifact.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Date,Open,High,Low,Close,Adj Close,Volume,Ticker");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "2024-03-01,10.0,11.0,9.5,10.5,10.25,1234,FOO.NS");
        assert_eq!(lines.iter().filter(|l| l.starts_with("Date,")).count(), 1);
    }

    #[test]
    fn returned_size_matches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = CsvArtifact::new(dir.path().join("out.csv"));

        let first = artifact.append(&[row("FOO.NS", 1)]).unwrap();
        let second = artifact.append(&[row("FOO.NS", 2)]).unwrap();

        assert!(second > first);
        assert_eq!(second, std::fs::metadata(artifact.path()).unwrap().len());
    }

    #[test]
    fn empty_batch_is_rejected_without_touching_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = CsvArtifact::new(dir.path().join("out.csv"));

        assert!(matches!(artifact.append(&[]), Err(WriteError::EmptyBatch)));
        assert!(!artifact.path().exists());
    }

    #[test]
    fn prepare_removes_stale_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale,data\n").unwrap();

        let artifact = CsvArtifact::new(&path);
        artifact.prepare().unwrap();
        assert!(!path.exists());

        // Idempotent when nothing is there
        artifact.prepare().unwrap();
    }

    #[test]
    fn unwritable_location_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = CsvArtifact::new(dir.path().join("missing/sub/out.csv"));
        assert!(matches!(
            artifact.append(&[row("FOO.NS", 1)]),
            Err(WriteError::Io { .. })
        ));
    }
}
