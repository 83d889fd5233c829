use thiserror::Error;

use crate::profile::ProfileError;

/// Result alias used throughout the search engine.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors raised while building weights, scorers, or collecting hits.
#[derive(Debug, Error)]
pub enum SearchError {
    /// An engine invariant did not hold.
    #[error("invalid state: {0}")]
    Invalid(&'static str),
    /// A boolean query exceeded the configured clause budget.
    #[error("boolean query exceeds {max} clauses (got {count})")]
    TooManyClauses {
        /// Clauses in the offending query.
        count: usize,
        /// Configured limit.
        max: usize,
    },
    /// A segment ordinal did not resolve against the reader.
    #[error("segment {0} not found")]
    UnknownSegment(u32),
    /// Profiling decorators were wired incorrectly.
    #[error("profiler misuse: {0}")]
    Profile(#[from] ProfileError),
    /// Failure reported by a query, scorer, or collector implementation.
    #[error("engine error: {0}")]
    Engine(String),
}

impl SearchError {
    /// Builds an [`SearchError::Engine`] from any displayable message.
    pub fn engine(msg: impl std::fmt::Display) -> Self {
        Self::Engine(msg.to_string())
    }
}
