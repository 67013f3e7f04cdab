use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no race results to aggregate")]
    NoRuns,

    #[error("invalid race results: {0}")]
    InvalidShape(String),

    #[error("driver {initials} is missing from race result {run}")]
    MissingDriver { run: usize, initials: String },

    #[error("driver {initials} has no positions in race result {run}")]
    EmptyPositions { run: usize, initials: String },

    #[error("driver {initials} finished P{rank} in race result {run}, but only {drivers} drivers took part")]
    RankOutOfRange {
        run: usize,
        initials: String,
        rank: u32,
        drivers: usize,
    },

    #[error("driver {initials} is not part of the replayed race")]
    UnknownDriver { initials: String },

    #[error("stint {stint} of driver {initials} has no whole-number in-lap")]
    MalformedStint { initials: String, stint: usize },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
