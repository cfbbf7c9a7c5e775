//! Symbol list loading, market-suffix normalization and work-list expansion.
//!
//! The ticker file is plain text with one raw symbol per line. Blank lines are
//! ignored and surrounding whitespace is trimmed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("failed to read symbol file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One normalized symbol scheduled at a fixed position in the run's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Zero-based position in the expanded plan.
    pub index: usize,
    /// Provider identifier, e.g. `FOO.NS`.
    pub symbol: String,
}

/// Load raw symbols from a line-delimited file.
pub fn load_symbols(path: &Path) -> Result<Vec<String>, SymbolError> {
    let content = std::fs::read_to_string(path).map_err(|source| SymbolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_symbols(&content))
}

/// Parse symbols from file contents. Each non-blank line is one symbol.
pub fn parse_symbols(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Append the market suffix to a raw symbol.
///
/// `suffix` may be given with or without the leading dot. A symbol that
/// already ends in the suffix (case-insensitive) is returned unchanged, and an
/// empty suffix leaves the symbol as is.
pub fn normalize(raw: &str, suffix: &str) -> String {
    let raw = raw.trim();
    let suffix = suffix.trim().trim_start_matches('.');
    if suffix.is_empty() {
        return raw.to_string();
    }

    let dotted = format!(".{suffix}");
    if raw.len() >= dotted.len()
        && raw.is_char_boundary(raw.len() - dotted.len())
        && raw[raw.len() - dotted.len()..].eq_ignore_ascii_case(&dotted)
    {
        return raw.to_string();
    }

    format!("{raw}{dotted}")
}

/// Repeat the symbol list `factor` times, in order, and assign plan positions.
///
/// No deduplication is performed. A factor of zero yields an empty plan.
pub fn expand(symbols: &[String], factor: usize) -> Vec<WorkItem> {
    symbols
        .iter()
        .cycle()
        .take(symbols.len() * factor)
        .enumerate()
        .map(|(index, symbol)| WorkItem {
            index,
            symbol: symbol.clone(),
        })
        .collect()
}

/// Load, normalize and expand in one step.
pub fn build_work_list(
    path: &Path,
    suffix: &str,
    factor: usize,
) -> Result<Vec<WorkItem>, SymbolError> {
    let normalized: Vec<String> = load_symbols(path)?
        .iter()
        .map(|raw| normalize(raw, suffix))
        .collect();
    Ok(expand(&normalized, factor))
}
