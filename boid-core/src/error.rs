use std::collections::TryReserveError;

/// Failures that abort a simulation run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not allocate storage for {count} {what}: {source}")]
    Allocation {
        what: &'static str,
        count: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("failed to build a worker pool with {threads} threads: {source}")]
    ThreadPool {
        threads: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
    #[error("failed to append speedup sample to {path}: {source}")]
    Results {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid flock: {0}")]
    InvalidFlock(String),
}

pub type Result<T> = std::result::Result<T, Error>;
