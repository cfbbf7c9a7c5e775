//! Price collection: symbols, provider, artifact, bounded loop, progress

pub mod artifact;
pub mod collect;
pub mod progress;
pub mod provider;
pub mod symbols;
pub mod yahoo;

pub use artifact::{CsvArtifact, WriteError};
pub use collect::{collect_series, CollectionPlan, CollectionState, ItemFailure, RunState, RunSummary};
pub use progress::{
    format_size, ConsoleProgress, ProgressEvent, ProgressReporter, SilentProgress, StdoutProgress,
};
pub use provider::{
    FetchOutcome, Interval, ProviderError, RawBar, SeriesProvider, SeriesRequest, SeriesRow,
    SERIES_HEADER,
};
pub use symbols::{build_work_list, expand, load_symbols, normalize, SymbolError, WorkItem};
pub use yahoo::YahooProvider;
