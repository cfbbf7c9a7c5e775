//! Harvest Core: bounded price-dataset collection plus sentiment and preprocessing stages.
//!
//! - Symbol file loading, market-suffix normalization and work-list expansion
//! - Series provider trait with a Yahoo Finance implementation
//! - Incremental CSV artifact with header-once appends and on-disk size checks
//! - Bounded collection loop with named terminal states and per-item failure isolation
//! - Per-ticker comment generation and sentiment scoring behind capability traits
//! - Dedup + join preprocessing of the collected artifacts
//! - TOML configuration and JSON run manifests

pub mod config;
pub mod data;
pub mod manifest;
pub mod preprocess;
pub mod rng;
pub mod sentiment;

pub use config::{CollectConfig, ConfigError, HarvestConfig, PreprocessConfig, SentimentConfig};
