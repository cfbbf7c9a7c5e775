//! Offline preprocessing: dedup the collected price rows and the sentiment
//! rows, then join every price row with the comments for its ticker.
//!
//! Input headers are matched leniently (case-insensitive, several common
//! spellings) so CSVs from other exporters load as well as our own artifact.
//! Numbers are parsed leniently too: blanks, `NA`, `NaN` and `NULL` read as 0
//! and thousands separators are ignored.

use crate::config::PreprocessConfig;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{file}: no column matching {column}")]
    MissingColumn { file: PathBuf, column: &'static str },

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

const DATE_COLUMNS: &[&str] = &["Date", "Timestamp", "Datetime"];
const TICKER_COLUMNS: &[&str] = &[
    "Ticker",
    "Symbol",
    "Security",
    "TickerSymbol",
    "Symbol Name",
];
const CLOSE_COLUMNS: &[&str] = &[
    "Close",
    "Last",
    "Adj Close",
    "AdjClose",
    "LTP",
    "Last Traded Price",
    "Close Price",
];
const OPEN_COLUMNS: &[&str] = &["Open", "Open Price"];
const HIGH_COLUMNS: &[&str] = &["High", "High Price"];
const LOW_COLUMNS: &[&str] = &["Low", "Low Price"];
const VOLUME_COLUMNS: &[&str] = &[
    "Volume",
    "Vol",
    "Shares Traded",
    "Total Trade Quantity",
    "Traded Volume",
    "Volume Traded",
];

/// One price observation. `price` mirrors `close`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Comment")]
    pub comment: String,
    #[serde(rename = "SentimentScore")]
    pub sentiment: String,
}

/// A price row with every comment known for its ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub stock: StockRecord,
    pub comments: Vec<String>,
}

/// Row counts at each step, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessSummary {
    pub stocks_read: usize,
    pub sentiments_read: usize,
    pub stocks_kept: usize,
    pub sentiments_kept: usize,
    pub joined: usize,
    pub outputs: Vec<PathBuf>,
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: Option<usize>,
    ticker: usize,
    close: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.to_lowercase();
        lowered.iter().position(|h| *h == candidate)
    })
}

impl ColumnMap {
    fn detect(path: &Path, headers: &csv::StringRecord) -> Result<Self, PreprocessError> {
        let ticker =
            find_column(headers, TICKER_COLUMNS).ok_or_else(|| PreprocessError::MissingColumn {
                file: path.to_path_buf(),
                column: "Ticker",
            })?;

        let map = Self {
            date: find_column(headers, DATE_COLUMNS),
            ticker,
            close: find_column(headers, CLOSE_COLUMNS),
            open: find_column(headers, OPEN_COLUMNS),
            high: find_column(headers, HIGH_COLUMNS),
            low: find_column(headers, LOW_COLUMNS),
            volume: find_column(headers, VOLUME_COLUMNS),
        };

        if map.date.is_none() {
            warn!(file = %path.display(), "no date column found");
        }
        if map.close.is_none() {
            warn!(file = %path.display(), "no close column found, prices will be 0");
        }
        Ok(map)
    }
}

/// Lenient number parsing. Anything unparseable reads as 0.
pub fn parse_number(field: &str) -> f64 {
    let t = field.trim();
    if t.is_empty() || ["na", "nan", "null"].contains(&t.to_lowercase().as_str()) {
        return 0.0;
    }
    let cleaned: String = t.chars().filter(|&c| c != ',').collect();
    cleaned.parse().unwrap_or(0.0)
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Read price rows. Rows without a ticker are dropped.
pub fn read_stocks(path: &Path) -> Result<Vec<StockRecord>, PreprocessError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let map = ColumnMap::detect(path, rdr.headers()?)?;

    let mut stocks = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let ticker = field(&record, Some(map.ticker)).trim();
        if ticker.is_empty() {
            continue;
        }
        let close = parse_number(field(&record, map.close));
        stocks.push(StockRecord {
            date: field(&record, map.date).trim().to_string(),
            ticker: ticker.to_string(),
            price: close,
            close,
            open: parse_number(field(&record, map.open)),
            high: parse_number(field(&record, map.high)),
            low: parse_number(field(&record, map.low)),
            volume: parse_number(field(&record, map.volume)),
        });
    }

    if prices_look_like_years(&stocks) {
        warn!(
            file = %path.display(),
            "price values look like years, check the column mapping"
        );
    }
    Ok(stocks)
}

/// Rows sampled by [`prices_look_like_years`].
const YEAR_SAMPLE: usize = 2000;
/// Year-like prices in the sample above which the mapping is suspect.
const YEAR_THRESHOLD: usize = 100;

/// True when many whole-number prices in `1900..=2100` show up near the top
/// of the file, the usual sign of a date column mapped as the price.
pub fn prices_look_like_years(stocks: &[StockRecord]) -> bool {
    stocks
        .iter()
        .take(YEAR_SAMPLE)
        .filter(|s| (1900.0..=2100.0).contains(&s.price) && s.price.fract() == 0.0)
        .count()
        > YEAR_THRESHOLD
}

/// Read sentiment rows positionally: ticker, comment, label.
///
/// Blank comments and labels become `Unknown`; rows without a ticker are dropped.
pub fn read_sentiments(path: &Path) -> Result<Vec<SentimentRecord>, PreprocessError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let mut sentiments = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let ticker = record.get(0).unwrap_or("").trim();
        if ticker.is_empty() {
            continue;
        }
        let or_unknown = |s: &str| {
            if s.trim().is_empty() {
                "Unknown".to_string()
            } else {
                s.to_string()
            }
        };
        sentiments.push(SentimentRecord {
            ticker: ticker.to_string(),
            comment: or_unknown(record.get(1).unwrap_or("")),
            sentiment: or_unknown(record.get(2).unwrap_or("").trim()),
        });
    }
    Ok(sentiments)
}

/// Keep the first row per `(ticker, date)`, preserving order.
pub fn dedup_stocks(stocks: Vec<StockRecord>) -> Vec<StockRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(stocks.len());
    stocks
        .into_iter()
        .filter(|s| seen.insert((s.ticker.clone(), s.date.clone())))
        .collect()
}

/// Keep the first row per `(ticker, comment)`, preserving order.
pub fn dedup_sentiments(sentiments: Vec<SentimentRecord>) -> Vec<SentimentRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(sentiments.len());
    sentiments
        .into_iter()
        .filter(|s| seen.insert((s.ticker.clone(), s.comment.clone())))
        .collect()
}

/// Attach every comment for a row's ticker to that row. Output order = input order.
pub fn join(stocks: &[StockRecord], sentiments: &[SentimentRecord]) -> Vec<JoinedRecord> {
    let mut by_ticker: HashMap<&str, Vec<String>> = HashMap::new();
    for s in sentiments {
        by_ticker
            .entry(s.ticker.as_str())
            .or_default()
            .push(s.comment.clone());
    }

    stocks
        .par_iter()
        .map(|stock| JoinedRecord {
            stock: stock.clone(),
            comments: by_ticker
                .get(stock.ticker.as_str())
                .cloned()
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Serialize)]
struct JoinedRow<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Ticker")]
    ticker: &'a str,
    #[serde(rename = "Price")]
    price: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Volume")]
    volume: f64,
    #[serde(rename = "Sentiments")]
    sentiments: String,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), PreprocessError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub const DEDUPED_STOCKS_FILE: &str = "deduped_stocks.csv";
pub const DEDUPED_SENTIMENTS_FILE: &str = "deduped_sentiments.csv";
pub const JOINED_FILE: &str = "preprocessed_output.csv";

/// Read, dedup, join and export the three output files.
pub fn run_preprocess(config: &PreprocessConfig) -> Result<PreprocessSummary, PreprocessError> {
    let stocks = read_stocks(&config.stocks_file)?;
    let sentiments = read_sentiments(&config.sentiments_file)?;
    let stocks_read = stocks.len();
    let sentiments_read = sentiments.len();
    info!(stocks = stocks_read, sentiments = sentiments_read, "read inputs");

    let stocks = dedup_stocks(stocks);
    let sentiments = dedup_sentiments(sentiments);
    info!(stocks = stocks.len(), sentiments = sentiments.len(), "after dedup");

    let joined = match config.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| join(&stocks, &sentiments))
        }
        None => join(&stocks, &sentiments),
    };
    info!(rows = joined.len(), "join complete");

    std::fs::create_dir_all(&config.output_dir).map_err(|source| PreprocessError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let stocks_path = config.output_dir.join(DEDUPED_STOCKS_FILE);
    let sentiments_path = config.output_dir.join(DEDUPED_SENTIMENTS_FILE);
    let joined_path = config.output_dir.join(JOINED_FILE);

    write_rows(&stocks_path, &stocks)?;
    write_rows(&sentiments_path, &sentiments)?;
    write_rows(
        &joined_path,
        joined.iter().map(|j| JoinedRow {
            date: &j.stock.date,
            ticker: &j.stock.ticker,
            price: j.stock.price,
            close: j.stock.close,
            open: j.stock.open,
            high: j.stock.high,
            low: j.stock.low,
            volume: j.stock.volume,
            sentiments: j.comments.join(" | "),
        }),
    )?;

    Ok(PreprocessSummary {
        stocks_read,
        sentiments_read,
        stocks_kept: stocks.len(),
        sentiments_kept: sentiments.len(),
        joined: joined.len(),
        outputs: vec![stocks_path, sentiments_path, joined_path],
    })
}
