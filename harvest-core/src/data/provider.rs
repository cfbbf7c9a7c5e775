//! Series provider trait, row types and structured provider errors.
//!
//! The SeriesProvider trait abstracts over market-data sources (Yahoo Finance,
//! scripted providers in tests) so the collection loop never depends on a
//! concrete network client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw OHLCV observation as returned by a provider (before ticker tagging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// One persisted artifact row: the provider's native columns plus `Ticker`.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Ticker")]
    pub ticker: String,
}

impl SeriesRow {
    /// Stamp a provider bar with the symbol it was fetched for.
    pub fn tagged(bar: RawBar, ticker: &str) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adj_close: bar.adj_close,
            volume: bar.volume,
            ticker: ticker.to_string(),
        }
    }
}

/// Artifact header, in column order.
pub const SERIES_HEADER: [&str; 8] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Adj Close",
    "Volume",
    "Ticker",
];

/// Sampling granularity passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    Daily,
    FiveDay,
    Weekly,
    Monthly,
    Quarterly,
}

impl Interval {
    /// Provider query-string form (`1d`, `1wk`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::FiveDay => "5d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
            Interval::Quarterly => "3mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(Interval::Daily),
            "5d" => Ok(Interval::FiveDay),
            "1wk" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            "3mo" => Ok(Interval::Quarterly),
            other => Err(format!(
                "unsupported interval '{other}' (expected one of 1d, 5d, 1wk, 1mo, 3mo)"
            )),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}

/// Structured provider failures. Every variant is recoverable at the loop level.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider returned HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider error: {0}")]
    Other(String),
}

/// Outcome of a successful provider call.
///
/// `Empty` is a valid answer ("no observations for this symbol, range and
/// interval"), distinct from a failed call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Rows(Vec<RawBar>),
    Empty,
}

impl FetchOutcome {
    /// Normalize a possibly-empty row list into an outcome.
    pub fn from_bars(bars: Vec<RawBar>) -> Self {
        if bars.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Rows(bars)
        }
    }
}

/// A historical series request. Dates are inclusive calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

/// Trait for market-data providers.
///
/// Implementations perform one independent blocking call per invocation:
/// no caching, no retries.
pub trait SeriesProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch observations for one symbol.
    fn fetch(&self, symbol: &str, request: &SeriesRequest) -> Result<FetchOutcome, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            adj_close: 1.4,
            volume: 100,
        }
    }

    #[test]
    fn interval_parses_provider_codes() {
        assert_eq!("1d".parse::<Interval>().unwrap(), Interval::Daily);
        assert_eq!(" 1wk ".parse::<Interval>().unwrap(), Interval::Weekly);
        assert_eq!(Interval::Quarterly.to_string(), "3mo");
        assert!("1m".parse::<Interval>().is_err());
    }

    #[test]
    fn empty_bar_list_is_empty_outcome() {
        assert_eq!(FetchOutcome::from_bars(vec![]), FetchOutcome::Empty);
        assert!(matches!(
            FetchOutcome::from_bars(vec![bar(2)]),
            FetchOutcome::Rows(rows) if rows.len() == 1
        ));
    }

    #[test]
    fn tagging_stamps_ticker() {
        let row = SeriesRow::tagged(bar(3), "FOO.NS");
        assert_eq!(row.ticker, "FOO.NS");
        assert_eq!(row.volume, 100);
    }
}
