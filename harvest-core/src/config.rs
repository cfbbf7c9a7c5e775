//! TOML configuration for the three stages: collect, sentiment, preprocess.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. The CLI overrides individual fields after loading.

use crate::data::provider::{Interval, SeriesRequest};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    pub collect: CollectConfig,
    pub sentiment: SentimentConfig,
    pub preprocess: PreprocessConfig,
}

impl HarvestConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collect.validate()?;
        self.sentiment.validate()?;
        self.preprocess.validate()
    }
}

/// Bounded collection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectConfig {
    /// Line-delimited raw symbols.
    pub ticker_file: PathBuf,
    /// The CSV artifact. Removed at the start of every run.
    pub output_file: PathBuf,
    /// Stop once the artifact reaches this many bytes.
    pub target_size_bytes: u64,
    /// First calendar date requested (inclusive).
    pub start_date: NaiveDate,
    /// Last calendar date requested (inclusive).
    pub end_date: NaiveDate,
    pub interval: Interval,
    /// Appended to every raw symbol, e.g. `NS` turns `FOO` into `FOO.NS`.
    pub market_suffix: String,
    /// How many times the symbol list is repeated to build the work list.
    pub repetition_factor: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            ticker_file: PathBuf::from("tickers.txt"),
            output_file: PathBuf::from("india_stocks.csv"),
            target_size_bytes: 3 * 1024 * 1024 * 1024,
            start_date: ymd(2000, 1, 1),
            end_date: ymd(2025, 1, 1),
            interval: Interval::Daily,
            market_suffix: "NS".into(),
            repetition_factor: 10,
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

impl CollectConfig {
    pub fn request(&self) -> SeriesRequest {
        SeriesRequest {
            start: self.start_date,
            end: self.end_date,
            interval: self.interval,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_date < self.start_date {
            return Err(ConfigError::Invalid(format!(
                "collect.end_date {} is before collect.start_date {}",
                self.end_date, self.start_date
            )));
        }
        if self.repetition_factor == 0 {
            return Err(ConfigError::Invalid(
                "collect.repetition_factor must be at least 1".into(),
            ));
        }
        if self.target_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "collect.target_size_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Sentiment stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentimentConfig {
    pub ticker_file: PathBuf,
    pub output_file: PathBuf,
    /// Suffix for the `Ticker` column, so rows join with the collected prices.
    pub market_suffix: String,
    /// Upper bound on generated comment length, prompt included.
    pub max_words: usize,
    /// Fixed seed for reproducible comments. Random when absent.
    pub seed: Option<u64>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            ticker_file: PathBuf::from("tickers.txt"),
            output_file: PathBuf::from("ticker_sentiments.csv"),
            market_suffix: "NS".into(),
            max_words: 40,
            seed: None,
        }
    }
}

impl SentimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_words == 0 {
            return Err(ConfigError::Invalid(
                "sentiment.max_words must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Preprocessing (dedup + join) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    pub stocks_file: PathBuf,
    pub sentiments_file: PathBuf,
    pub output_dir: PathBuf,
    /// Worker threads for the join. Rayon's default when absent.
    pub threads: Option<usize>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            stocks_file: PathBuf::from("india_stocks.csv"),
            sentiments_file: PathBuf::from("ticker_sentiments.csv"),
            output_dir: PathBuf::from("."),
            threads: None,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid(
                "preprocess.threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
