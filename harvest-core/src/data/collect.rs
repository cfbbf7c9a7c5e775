//! Bounded collection loop: fetch each work item in order, append its rows to
//! the artifact and stop once the artifact reaches the size ceiling.
//!
//! Provider failures and empty results are local to one item. Only a
//! persistence failure ends the run early with an error state.

use super::artifact::CsvArtifact;
use super::progress::{ProgressEvent, ProgressReporter};
use super::provider::{FetchOutcome, SeriesProvider, SeriesRequest, SeriesRow};
use super::symbols::{build_work_list, SymbolError, WorkItem};
use crate::config::CollectConfig;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Loop state. Everything except `Running` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunState {
    Running,
    StoppedBySize,
    StoppedExhausted,
    StoppedByError { cause: String },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RunState::StoppedByError { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => f.write_str("running"),
            RunState::StoppedBySize => f.write_str("size ceiling reached"),
            RunState::StoppedExhausted => f.write_str("work list exhausted"),
            RunState::StoppedByError { cause } => write!(f, "fatal: {cause}"),
        }
    }
}

/// Mutable run state, owned by the loop.
///
/// `size_bytes` never decreases, and once the state is terminal no further
/// fetches happen.
#[derive(Debug)]
pub struct CollectionState {
    size_bytes: u64,
    state: RunState,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            size_bytes: 0,
            state: RunState::Running,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Record the artifact size after an append and check the ceiling.
    fn record_size(&mut self, size_bytes: u64, ceiling: u64) {
        debug_assert!(size_bytes >= self.size_bytes, "artifact shrank during run");
        self.size_bytes = size_bytes;
        if size_bytes >= ceiling {
            self.state = RunState::StoppedBySize;
        }
    }

    fn fail(&mut self, cause: String) {
        self.state = RunState::StoppedByError { cause };
    }

    fn finish(&mut self) {
        if self.state.is_running() {
            self.state = RunState::StoppedExhausted;
        }
    }
}

/// A provider failure recorded against one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub symbol: String,
    pub cause: String,
}

/// Outcome of a collection run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub state: RunState,
    /// Items in the plan.
    pub total: usize,
    /// Items whose fetch was attempted.
    pub attempted: usize,
    /// Items that contributed rows.
    pub written: usize,
    /// Items whose fetch returned no rows.
    pub empty: usize,
    pub rows_written: u64,
    pub size_bytes: u64,
    pub failures: Vec<ItemFailure>,
}

/// Everything the loop needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub items: Vec<WorkItem>,
    pub request: SeriesRequest,
    pub target_size_bytes: u64,
}

impl CollectionPlan {
    /// Load the symbol file and build the expanded plan.
    pub fn from_config(config: &CollectConfig) -> Result<Self, SymbolError> {
        let items = build_work_list(
            &config.ticker_file,
            &config.market_suffix,
            config.repetition_factor,
        )?;
        Ok(Self {
            items,
            request: config.request(),
            target_size_bytes: config.target_size_bytes,
        })
    }
}

/// Run the bounded collection loop.
///
/// Any artifact already at the target path is removed first. The returned
/// summary always carries a terminal state.
pub fn collect_series(
    provider: &dyn SeriesProvider,
    artifact: &CsvArtifact,
    plan: &CollectionPlan,
    progress: &dyn ProgressReporter,
) -> RunSummary {
    let total = plan.items.len();
    let mut state = CollectionState::new();
    let mut attempted = 0;
    let mut written = 0;
    let mut empty = 0;
    let mut rows_written = 0u64;
    let mut failures: Vec<ItemFailure> = Vec::new();

    info!(
        provider = provider.name(),
        items = total,
        target_size_bytes = plan.target_size_bytes,
        artifact = %artifact.path().display(),
        "starting collection"
    );

    if let Err(e) = artifact.prepare() {
        error!(error = %e, "cannot reset artifact");
        state.fail(e.to_string());
    }

    for item in &plan.items {
        if !state.state().is_running() {
            break;
        }

        attempted += 1;
        debug!(index = item.index, symbol = %item.symbol, "fetching");

        let bars = match provider.fetch(&item.symbol, &plan.request) {
            Ok(FetchOutcome::Rows(bars)) => bars,
            Ok(FetchOutcome::Empty) => {
                debug!(symbol = %item.symbol, "no data, skipping");
                empty += 1;
                continue;
            }
            Err(e) => {
                let cause = e.to_string();
                warn!(symbol = %item.symbol, error = %cause, "fetch failed, skipping");
                progress.report(&ProgressEvent::ItemFailed {
                    index: item.index,
                    total,
                    symbol: &item.symbol,
                    cause: &cause,
                });
                failures.push(ItemFailure {
                    index: item.index,
                    symbol: item.symbol.clone(),
                    cause,
                });
                continue;
            }
        };

        let rows: Vec<SeriesRow> = bars
            .into_iter()
            .map(|bar| SeriesRow::tagged(bar, &item.symbol))
            .collect();

        match artifact.append(&rows) {
            Ok(size_bytes) => {
                written += 1;
                rows_written += rows.len() as u64;
                state.record_size(size_bytes, plan.target_size_bytes);
                progress.report(&ProgressEvent::ItemSucceeded {
                    index: item.index,
                    total,
                    symbol: &item.symbol,
                    size_bytes,
                });
            }
            Err(e) => {
                error!(symbol = %item.symbol, error = %e, "artifact write failed");
                state.fail(e.to_string());
            }
        }
    }

    state.finish();

    let summary = RunSummary {
        state: state.state().clone(),
        total,
        attempted,
        written,
        empty,
        rows_written,
        size_bytes: state.size_bytes(),
        failures,
    };

    info!(
        state = %summary.state,
        attempted = summary.attempted,
        written = summary.written,
        failed = summary.failures.len(),
        size_bytes = summary.size_bytes,
        "collection finished"
    );
    progress.report(&ProgressEvent::RunFinished { summary: &summary });

    summary
}
