//! Collection → sentiment → preprocessing, chained through files on disk.

mod common;

use common::{Script, ScriptedProvider};
use harvest_core::data::{collect_series, load_symbols, CollectionPlan, CsvArtifact, SilentProgress};
use harvest_core::preprocess::{run_preprocess, JOINED_FILE};
use harvest_core::rng::SeedDeriver;
use harvest_core::sentiment::{
    analyze_tickers, write_sentiments, LexiconSentiment, PhraseGenerator, SentimentRow,
};
use harvest_core::{CollectConfig, PreprocessConfig};

fn tickers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn sentiment_stage_is_reproducible_for_a_seed() {
    let names = tickers(&["FOO", "BAR", "BAZ"]);
    let classifier = LexiconSentiment::new();

    let first = analyze_tickers(&names, "NS", &PhraseGenerator::new(SeedDeriver::new(7), 40), &classifier);
    let second = analyze_tickers(&names, "NS", &PhraseGenerator::new(SeedDeriver::new(7), 40), &classifier);

    assert!(first.failures.is_empty());
    assert_eq!(first.rows, second.rows);
    for (row, ticker) in first.rows.iter().zip(&names) {
        assert_eq!(row.ticker, format!("{ticker}.NS"));
        assert!(row.comment.starts_with(&format!("{ticker} stock outlook:")));
        assert!(row.comment.split_whitespace().count() <= 40);
        assert!((0.0..=1.0).contains(&row.score));
    }
}

#[test]
fn sentiment_file_round_trips_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ticker_sentiments.csv");
    let report = analyze_tickers(
        &tickers(&["FOO", "BAR"]),
        "NS",
        &PhraseGenerator::new(SeedDeriver::new(1), 25),
        &LexiconSentiment::new(),
    );

    write_sentiments(&path, &report.rows).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    assert_eq!(
        rdr.headers().unwrap(),
        vec!["Ticker", "Comment", "Sentiment", "Score"]
    );
    let read: Vec<SentimentRow> = rdr.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].ticker, "FOO.NS");
    assert_eq!(read[0].sentiment, report.rows[0].sentiment);
}

#[test]
fn three_stages_join_on_the_same_ticker_ids() {
    let dir = tempfile::tempdir().unwrap();
    let ticker_file = dir.path().join("tickers.txt");
    std::fs::write(&ticker_file, "FOO\nBAR\n").unwrap();

    // Collect: FOO twice in the plan so its rows are duplicated in the artifact.
    let collect = CollectConfig {
        ticker_file: ticker_file.clone(),
        output_file: dir.path().join("prices.csv"),
        repetition_factor: 2,
        target_size_bytes: u64::MAX,
        ..CollectConfig::default()
    };
    let provider = ScriptedProvider::new(&[("FOO.NS", Script::Rows(3)), ("BAR.NS", Script::Rows(2))]);
    let plan = CollectionPlan::from_config(&collect).unwrap();
    let summary = collect_series(
        &provider,
        &CsvArtifact::new(&collect.output_file),
        &plan,
        &SilentProgress,
    );
    assert_eq!(summary.rows_written, 10);

    // Sentiment: same symbol file, same suffix, as the CLI wires it.
    let sentiments_file = dir.path().join("ticker_sentiments.csv");
    let report = analyze_tickers(
        &load_symbols(&ticker_file).unwrap(),
        &collect.market_suffix,
        &PhraseGenerator::new(SeedDeriver::new(3), 30),
        &LexiconSentiment::new(),
    );
    assert_eq!(report.rows.len(), 2);
    write_sentiments(&sentiments_file, &report.rows).unwrap();

    // Preprocess
    let out = dir.path().join("out");
    let result = run_preprocess(&PreprocessConfig {
        stocks_file: collect.output_file.clone(),
        sentiments_file,
        output_dir: out.clone(),
        threads: Some(2),
    })
    .unwrap();

    assert_eq!(result.stocks_read, 10);
    assert_eq!(result.stocks_kept, 5);
    assert_eq!(result.sentiments_kept, 2);
    assert_eq!(result.joined, 5);
    assert!(result.outputs.iter().all(|p| p.exists()));

    let mut rdr = csv::Reader::from_path(out.join(JOINED_FILE)).unwrap();
    assert_eq!(
        rdr.headers().unwrap(),
        vec!["Date", "Ticker", "Price", "Close", "Open", "High", "Low", "Volume", "Sentiments"]
    );
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();

    // Input order survives the parallel join.
    let order: Vec<&str> = records.iter().map(|r| r.get(1).unwrap()).collect();
    assert_eq!(order, vec!["FOO.NS", "FOO.NS", "FOO.NS", "BAR.NS", "BAR.NS"]);

    // Every price row carries the generated comment for its ticker.
    for record in &records {
        let ticker = record.get(1).unwrap();
        let expected = &report
            .rows
            .iter()
            .find(|r| r.ticker == ticker)
            .unwrap()
            .comment;
        assert_eq!(record.get(8).unwrap(), expected);
    }
    assert_eq!(records[0].get(2), records[0].get(3));
}

#[test]
fn duplicate_comments_collapse_and_distinct_ones_are_joined() {
    let dir = tempfile::tempdir().unwrap();
    let stocks_file = dir.path().join("prices.csv");
    let sentiments_file = dir.path().join("sentiments.csv");
    std::fs::write(
        &stocks_file,
        "Date,Open,High,Low,Close,Adj Close,Volume,Ticker\n\
         2024-01-01,1,2,0.5,1.5,1.5,100,FOO.NS\n\
         2024-01-01,1,2,0.5,1.5,1.5,100,BAR.NS\n",
    )
    .unwrap();

    let row = |comment: &str, label| SentimentRow {
        ticker: "FOO.NS".into(),
        comment: comment.into(),
        sentiment: label,
        score: 0.8,
    };
    use harvest_core::sentiment::SentimentLabel::{Negative, Positive};
    write_sentiments(
        &sentiments_file,
        &[
            row("FOO stock outlook: strong growth", Positive),
            row("FOO stock outlook: strong growth", Positive),
            row("FOO stock outlook: weak demand", Negative),
        ],
    )
    .unwrap();

    let out = dir.path().join("out");
    let result = run_preprocess(&PreprocessConfig {
        stocks_file,
        sentiments_file,
        output_dir: out.clone(),
        threads: None,
    })
    .unwrap();
    assert_eq!(result.sentiments_read, 3);
    assert_eq!(result.sentiments_kept, 2);

    let mut rdr = csv::Reader::from_path(out.join(JOINED_FILE)).unwrap();
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(
        records[0].get(8).unwrap(),
        "FOO stock outlook: strong growth | FOO stock outlook: weak demand"
    );
    assert_eq!(records[1].get(8).unwrap(), "");
}
