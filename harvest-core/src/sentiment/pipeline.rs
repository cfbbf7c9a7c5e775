//! Unbounded per-ticker loop: generate a comment, classify it, collect a row.

use super::{SentimentLabel, TextGenerator, TextSentiment};
use crate::data::artifact::WriteError;
use crate::data::collect::ItemFailure;
use crate::data::symbols::normalize;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// One output row of the sentiment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRow {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Comment")]
    pub comment: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
    #[serde(rename = "Score")]
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SentimentReport {
    pub rows: Vec<SentimentRow>,
    pub failures: Vec<ItemFailure>,
}

/// Prompt used for every ticker.
pub fn outlook_prompt(ticker: &str) -> String {
    format!("{ticker} stock outlook:")
}

/// Run both capabilities over every ticker, in order.
///
/// The prompt uses the raw ticker; the row is keyed by the ticker normalized
/// with `market_suffix`, the same id the collection artifact carries. A
/// failure on one ticker is recorded and the loop moves on.
pub fn analyze_tickers(
    tickers: &[String],
    market_suffix: &str,
    generator: &dyn TextGenerator,
    classifier: &dyn TextSentiment,
) -> SentimentReport {
    let mut report = SentimentReport::default();
    info!(tickers = tickers.len(), "starting sentiment analysis");

    for (index, ticker) in tickers.iter().enumerate() {
        let outcome = generator
            .generate(&outlook_prompt(ticker))
            .and_then(|comment| classifier.classify(&comment).map(|s| (comment, s)));

        match outcome {
            Ok((comment, sentiment)) => {
                debug!(%ticker, label = %sentiment.label, score = sentiment.score, "classified");
                report.rows.push(SentimentRow {
                    ticker: normalize(ticker, market_suffix),
                    comment,
                    sentiment: sentiment.label,
                    score: sentiment.score,
                });
            }
            Err(e) => {
                warn!(%ticker, error = %e, "inference failed, skipping");
                report.failures.push(ItemFailure {
                    index,
                    symbol: ticker.clone(),
                    cause: e.to_string(),
                });
            }
        }
    }

    info!(
        rows = report.rows.len(),
        failed = report.failures.len(),
        "sentiment analysis finished"
    );
    report
}

/// Write all rows in one go (header `Ticker,Comment,Sentiment,Score`).
pub fn write_sentiments(path: &Path, rows: &[SentimentRow]) -> Result<(), WriteError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}
