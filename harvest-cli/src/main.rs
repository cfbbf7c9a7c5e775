//! Harvest CLI: collect, sentiment and preprocess commands.
//!
//! Commands:
//! - `collect`: fetch price series for every symbol until the artifact reaches its size ceiling
//! - `sentiment`: generate and score one outlook comment per ticker
//! - `preprocess`: dedup both outputs and join prices with comments
//!
//! Each command reads defaults from an optional TOML config; flags override
//! individual fields. Logs go to stderr (`RUST_LOG`, default `info`), progress
//! to stdout.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use harvest_core::data::{
    collect_series, format_size, load_symbols, CollectionPlan, CsvArtifact, Interval,
    RunSummary, StdoutProgress, YahooProvider,
};
use harvest_core::manifest::{write_manifest, ManifestError};
use harvest_core::preprocess::run_preprocess;
use harvest_core::rng::SeedDeriver;
use harvest_core::sentiment::{analyze_tickers, write_sentiments, LexiconSentiment, PhraseGenerator};
use harvest_core::HarvestConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Harvest CLI: size-bounded price dataset collection"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch price series into a single CSV until the size ceiling is reached.
    Collect {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Line-delimited raw symbols.
        #[arg(long)]
        tickers: Option<PathBuf>,

        /// Output CSV. Replaced at the start of the run.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Stop once the output reaches this many bytes.
        #[arg(long)]
        target_bytes: Option<u64>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Bar interval: 1d, 5d, 1wk, 1mo, 3mo.
        #[arg(long)]
        interval: Option<Interval>,

        /// Market suffix appended to raw symbols (e.g. NS).
        #[arg(long)]
        suffix: Option<String>,

        /// How many times the symbol list is repeated.
        #[arg(long)]
        repeat: Option<usize>,
    },
    /// Generate one outlook comment per ticker and score its sentiment.
    Sentiment {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Line-delimited tickers.
        #[arg(long)]
        tickers: Option<PathBuf>,

        /// Output CSV.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Market suffix for the Ticker column (e.g. NS).
        #[arg(long)]
        suffix: Option<String>,

        /// Maximum words per comment, prompt included.
        #[arg(long)]
        max_words: Option<usize>,

        /// Seed for reproducible comments.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Dedup the price and sentiment files and join them per ticker.
    Preprocess {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price CSV (e.g. the output of `collect`).
        #[arg(long)]
        stocks: Option<PathBuf>,

        /// Sentiment CSV (e.g. the output of `sentiment`).
        #[arg(long)]
        sentiments: Option<PathBuf>,

        /// Directory for the three output files.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Worker threads for the join.
        #[arg(long)]
        threads: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            config,
            tickers,
            output,
            target_bytes,
            start,
            end,
            interval,
            suffix,
            repeat,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            let c = &mut cfg.collect;
            override_with(&mut c.ticker_file, tickers);
            override_with(&mut c.output_file, output);
            override_with(&mut c.target_size_bytes, target_bytes);
            override_with(&mut c.start_date, start);
            override_with(&mut c.end_date, end);
            override_with(&mut c.interval, interval);
            override_with(&mut c.market_suffix, suffix);
            override_with(&mut c.repetition_factor, repeat);
            cfg.validate().context("invalid collect settings")?;
            run_collect(&cfg)
        }
        Commands::Sentiment {
            config,
            tickers,
            output,
            suffix,
            max_words,
            seed,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            let s = &mut cfg.sentiment;
            override_with(&mut s.ticker_file, tickers);
            override_with(&mut s.output_file, output);
            override_with(&mut s.market_suffix, suffix);
            override_with(&mut s.max_words, max_words);
            if seed.is_some() {
                s.seed = seed;
            }
            cfg.validate().context("invalid sentiment settings")?;
            run_sentiment(&cfg)
        }
        Commands::Preprocess {
            config,
            stocks,
            sentiments,
            output_dir,
            threads,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            let p = &mut cfg.preprocess;
            override_with(&mut p.stocks_file, stocks);
            override_with(&mut p.sentiments_file, sentiments);
            override_with(&mut p.output_dir, output_dir);
            if threads.is_some() {
                p.threads = threads;
            }
            cfg.validate().context("invalid preprocess settings")?;
            run_preprocess_cmd(&cfg)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<HarvestConfig> {
    match path {
        Some(path) => HarvestConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(HarvestConfig::default()),
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn run_collect(cfg: &HarvestConfig) -> Result<()> {
    let c = &cfg.collect;
    let plan = CollectionPlan::from_config(c)?;
    if plan.items.is_empty() {
        tracing::warn!(file = %c.ticker_file.display(), "symbol file has no symbols");
    }

    let provider = YahooProvider::new().context("building HTTP client")?;
    let artifact = CsvArtifact::new(&c.output_file);
    let summary = collect_series(&provider, &artifact, &plan, &StdoutProgress::stdout());

    let manifest = settle_run(&summary, write_manifest(c, &summary))?;
    println!("Manifest saved to: {}", manifest.display());
    Ok(())
}

/// A fatal run state takes precedence over a manifest failure as the
/// process error; the manifest failure is only logged then.
fn settle_run(
    summary: &RunSummary,
    manifest: Result<PathBuf, ManifestError>,
) -> Result<PathBuf> {
    if summary.state.is_fatal() {
        if let Err(e) = &manifest {
            tracing::warn!(error = %e, "manifest not written");
        }
        bail!("collection aborted: {}", summary.state);
    }
    Ok(manifest?)
}

fn run_sentiment(cfg: &HarvestConfig) -> Result<()> {
    let s = &cfg.sentiment;
    let tickers = load_symbols(&s.ticker_file)?;

    let seeds = match s.seed {
        Some(seed) => SeedDeriver::new(seed),
        None => SeedDeriver::from_entropy(),
    };
    tracing::info!(seed = seeds.master_seed(), "sentiment seed");

    let generator = PhraseGenerator::new(seeds, s.max_words);
    let classifier = LexiconSentiment::new();
    let report = analyze_tickers(&tickers, &s.market_suffix, &generator, &classifier);

    write_sentiments(&s.output_file, &report.rows)
        .with_context(|| format!("writing {}", s.output_file.display()))?;

    println!(
        "Scored {} of {} tickers -> {}",
        report.rows.len(),
        tickers.len(),
        s.output_file.display()
    );
    for failure in &report.failures {
        eprintln!("Error for {}: {}", failure.symbol, failure.cause);
    }
    Ok(())
}

fn run_preprocess_cmd(cfg: &HarvestConfig) -> Result<()> {
    let summary = run_preprocess(&cfg.preprocess)?;

    println!();
    println!("=== Preprocess Result ===");
    println!(
        "Stocks:         {} read, {} after dedup",
        summary.stocks_read, summary.stocks_kept
    );
    println!(
        "Sentiments:     {} read, {} after dedup",
        summary.sentiments_read, summary.sentiments_kept
    );
    println!("Joined rows:    {}", summary.joined);
    for path in &summary.outputs {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!("  {} ({})", path.display(), format_size(size));
    }
    Ok(())
}
