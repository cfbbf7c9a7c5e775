//! Word-list sentiment classifier for financial text.

use super::{InferenceError, Sentiment, SentimentLabel, TextSentiment};
use std::collections::HashSet;

const POSITIVE: &[&str] = &[
    "beat", "benefits", "bullish", "buy", "expand", "gain", "gains", "growth", "high",
    "momentum", "optimistic", "outperform", "positive", "profit", "rally", "record",
    "recovery", "robust", "solid", "steady", "strong", "surge", "upgrade", "upside",
];

const NEGATIVE: &[&str] = &[
    "bearish", "concerns", "cut", "debt", "decline", "disappoints", "downgrade", "downside",
    "drop", "headwinds", "loss", "losses", "miss", "negative", "pessimistic", "pressure",
    "risk", "sell", "slump", "underperform", "volatile", "weak", "weakens", "weighing",
];

/// Counts polarity words and labels by the net balance.
///
/// Scores: a polar label gets `(winner + 1) / (hits + 2)`, which sits in
/// `(0.5, 1)`. Neutral gets `1 / (1 + hits)`: certain when no polar word
/// appears, less so for a tie.
#[derive(Debug, Clone)]
pub struct LexiconSentiment {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE.iter().copied().collect(),
            negative: NEGATIVE.iter().copied().collect(),
        }
    }
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSentiment for LexiconSentiment {
    fn classify(&self, text: &str) -> Result<Sentiment, InferenceError> {
        if text.trim().is_empty() {
            return Err(InferenceError::Classification("empty text".into()));
        }

        let mut pos = 0usize;
        let mut neg = 0usize;
        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if self.positive.contains(token.as_str()) {
                pos += 1;
            } else if self.negative.contains(token.as_str()) {
                neg += 1;
            }
        }

        let hits = (pos + neg) as f64;
        let sentiment = if pos > neg {
            Sentiment {
                label: SentimentLabel::Positive,
                score: (pos as f64 + 1.0) / (hits + 2.0),
            }
        } else if neg > pos {
            Sentiment {
                label: SentimentLabel::Negative,
                score: (neg as f64 + 1.0) / (hits + 2.0),
            }
        } else {
            Sentiment {
                label: SentimentLabel::Neutral,
                score: 1.0 / (1.0 + hits),
            }
        };
        Ok(sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Sentiment {
        LexiconSentiment::new().classify(text).unwrap()
    }

    #[test]
    fn bullish_text_is_positive() {
        let s = classify("FOO shows strong momentum after a record quarter.");
        assert_eq!(s.label, SentimentLabel::Positive);
        assert!(s.score > 0.5 && s.score < 1.0);
    }

    #[test]
    fn bearish_text_is_negative() {
        let s = classify("BAR may slump further as demand weakens.");
        assert_eq!(s.label, SentimentLabel::Negative);
    }

    #[test]
    fn no_polar_words_is_confident_neutral() {
        let s = classify("BAZ is flat for the week.");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn tie_is_uncertain_neutral() {
        let s = classify("strong but volatile");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert!((s.score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(classify("STRONG GROWTH").label, SentimentLabel::Positive);
    }

    #[test]
    fn empty_text_fails() {
        assert!(LexiconSentiment::new().classify("  ").is_err());
    }
}
