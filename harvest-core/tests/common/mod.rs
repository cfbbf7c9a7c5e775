//! Scripted provider and recording reporter shared by the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use harvest_core::data::{
    FetchOutcome, Interval, ProgressEvent, ProgressReporter, ProviderError, RawBar,
    SeriesProvider, SeriesRequest,
};
use std::cell::RefCell;
use std::collections::HashMap;

/// What the scripted provider answers for a symbol.
#[derive(Debug, Clone)]
pub enum Script {
    Rows(usize),
    Empty,
    Fail(&'static str),
}

/// In-memory provider answering from a per-symbol script and logging every call.
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(s, script)| (s.to_string(), script.clone()))
                .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

pub fn bars(n: usize) -> Vec<RawBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let px = 100.0 + i as f64;
            RawBar {
                date: start + chrono::Duration::days(i as i64),
                open: px,
                high: px + 1.0,
                low: px - 1.0,
                close: px + 0.5,
                adj_close: px + 0.25,
                volume: 1_000 + i as u64,
            }
        })
        .collect()
}

impl SeriesProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &str, _request: &SeriesRequest) -> Result<FetchOutcome, ProviderError> {
        self.calls.borrow_mut().push(symbol.to_string());
        match self.scripts.get(symbol) {
            Some(Script::Rows(n)) => Ok(FetchOutcome::from_bars(bars(*n))),
            Some(Script::Empty) | None => Ok(FetchOutcome::Empty),
            Some(Script::Fail(msg)) => Err(ProviderError::Other(msg.to_string())),
        }
    }
}

/// Reporter that keeps a text line per event.
#[derive(Default)]
pub struct RecordingProgress {
    pub lines: RefCell<Vec<String>>,
    pub sizes: RefCell<Vec<u64>>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: &ProgressEvent<'_>) {
        let line = match *event {
            ProgressEvent::ItemSucceeded {
                index,
                symbol,
                size_bytes,
                ..
            } => {
                self.sizes.borrow_mut().push(size_bytes);
                format!("ok {index} {symbol}")
            }
            ProgressEvent::ItemFailed {
                index, symbol, cause, ..
            } => format!("fail {index} {symbol}: {cause}"),
            ProgressEvent::RunFinished { summary } => format!("done {}", summary.state),
        };
        self.lines.borrow_mut().push(line);
    }
}

pub fn request() -> SeriesRequest {
    SeriesRequest {
        start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        interval: Interval::Daily,
    }
}

/// Header lines and data lines of a CSV artifact.
pub fn split_artifact(content: &str) -> (usize, usize) {
    let headers = content.lines().filter(|l| l.starts_with("Date,")).count();
    let data = content.lines().filter(|l| !l.starts_with("Date,")).count();
    (headers, data)
}
