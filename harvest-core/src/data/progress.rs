//! Progress events for collection runs.
//!
//! Reporters are observers only: `report` returns nothing and cannot influence
//! the loop.

use super::collect::RunSummary;
use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Something worth telling the operator about.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// Rows for `symbol` were appended; `size_bytes` is the artifact size afterwards.
    ItemSucceeded {
        index: usize,
        total: usize,
        symbol: &'a str,
        size_bytes: u64,
    },
    /// The provider call for `symbol` failed; the run continues.
    ItemFailed {
        index: usize,
        total: usize,
        symbol: &'a str,
        cause: &'a str,
    },
    /// The loop reached a terminal state.
    RunFinished { summary: &'a RunSummary },
}

/// Progress callback for collection runs.
pub trait ProgressReporter {
    fn report(&self, event: &ProgressEvent<'_>);
}

/// Line-oriented progress printer over any writer.
///
/// Write failures (closed pipe, full disk) are logged at debug level and
/// otherwise ignored, so a broken console never interrupts a run.
pub struct ConsoleProgress<W: Write> {
    out: Mutex<W>,
}

/// The reporter the CLI uses.
pub type StdoutProgress = ConsoleProgress<Stdout>;

impl ConsoleProgress<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> ProgressReporter for ConsoleProgress<W> {
    fn report(&self, event: &ProgressEvent<'_>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write_event(&mut *out, event).and_then(|()| out.flush()) {
            debug!(error = %e, "progress output unavailable");
        }
    }
}

fn write_event(out: &mut impl Write, event: &ProgressEvent<'_>) -> io::Result<()> {
    match *event {
        ProgressEvent::ItemSucceeded {
            index,
            total,
            symbol,
            size_bytes,
        } => writeln!(out, "[{}/{total}] {symbol} added -> {}", index + 1, format_size(size_bytes)),
        ProgressEvent::ItemFailed {
            index,
            total,
            symbol,
            cause,
        } => writeln!(out, "[{}/{total}] Error with {symbol}: {cause}", index + 1),
        ProgressEvent::RunFinished { summary } => {
            writeln!(out)?;
            writeln!(out, "Collection stopped: {}", summary.state)?;
            writeln!(
                out,
                "Items: {} attempted, {} written, {} empty, {} failed",
                summary.attempted,
                summary.written,
                summary.empty,
                summary.failures.len()
            )?;
            writeln!(
                out,
                "Artifact: {} rows, {}",
                summary.rows_written,
                format_size(summary.size_bytes)
            )?;
            for failure in &summary.failures {
                writeln!(out, "  FAIL [{}] {}: {}", failure.index + 1, failure.symbol, failure.cause)?;
            }
            Ok(())
        }
    }
}

/// Reporter that discards every event.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _event: &ProgressEvent<'_>) {}
}

/// Human-readable byte count (B, KB, MB, GB).
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}
