//! Yahoo Finance series provider.
//!
//! Fetches OHLCV observations from Yahoo's v8 chart API. One request per call;
//! failures are mapped onto [`ProviderError`] and left to the caller, which
//! skips the symbol.
//!
//! Requests time out after 30 seconds. A timed-out request, whether waiting
//! for the response or reading its body, is reported as
//! [`ProviderError::NetworkUnreachable`] for that symbol, so a stalled
//! provider costs one item instead of hanging the run.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{
    FetchOutcome, ProviderError, RawBar, SeriesProvider, SeriesRequest,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance series provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different chart endpoint (mirrors, local stubs).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for a symbol and request.
    ///
    /// The end date is inclusive, so `period2` is the last second of that day.
    fn chart_url(&self, symbol: &str, request: &SeriesRequest) -> String {
        let start_ts = day_start_ts(request.start);
        let end_ts = day_start_ts(request.end) + 86_399;
        format!(
            "{}/{symbol}?period1={start_ts}&period2={end_ts}&interval={}\
             &includeAdjustedClose=true",
            self.base_url, request.interval
        )
    }

    /// Parse the chart API response into bars.
    ///
    /// A result with no timestamps means "no data in range" and yields `Empty`.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<FetchOutcome, ProviderError> {
        let result = match resp.chart.result {
            Some(result) => result,
            None => return Err(chart_error(symbol, resp.chart.error)),
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(FetchOutcome::Empty);
        };

        let Some(timestamps) = data.timestamp else {
            return Ok(FetchOutcome::Empty);
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    ProviderError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays come back as all-null rows
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            let close = close.unwrap_or(f64::NAN);
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .unwrap_or(close);

            bars.push(RawBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close,
                adj_close,
                volume: volume.unwrap_or(0),
            });
        }

        Ok(FetchOutcome::from_bars(bars))
    }
}

fn day_start_ts(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn chart_error(symbol: &str, error: Option<ChartError>) -> ProviderError {
    match error {
        Some(err) if err.code == "Not Found" => ProviderError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => ProviderError::Other(format!("{}: {}", err.code, err.description)),
        None => ProviderError::ResponseFormatChanged("empty result with no error".into()),
    }
}

impl SeriesProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, request: &SeriesRequest) -> Result<FetchOutcome, ProviderError> {
        let url = self.chart_url(symbol, request);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ProviderError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                ProviderError::NetworkUnreachable(e.to_string())
            } else {
                ProviderError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            }
        })?;

        Self::parse_response(symbol, chart)
    }
}
