//! Per-ticker pseudo-commentary and sentiment scoring.
//!
//! Two capabilities are consumed as trait objects, constructed once by the
//! caller and passed in by reference:
//! - [`TextGenerator`]: prompt → comment
//! - [`TextSentiment`]: text → label + confidence
//!
//! The pipeline visits every ticker (no size bound), skips tickers whose
//! inference fails, and writes the result file once at the end.

pub mod generator;
pub mod lexicon;
pub mod pipeline;

pub use generator::PhraseGenerator;
pub use lexicon::LexiconSentiment;
pub use pipeline::{analyze_tickers, write_sentiments, SentimentReport, SentimentRow};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("classification failed: {0}")]
    Classification(String),
}

/// Sentiment class, spelled the way finance-tone classifiers report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

/// Classifier output: a label and a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

/// Text generation capability.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Text classification capability.
pub trait TextSentiment {
    fn classify(&self, text: &str) -> Result<Sentiment, InferenceError>;
}
