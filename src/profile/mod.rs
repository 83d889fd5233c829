#![forbid(unsafe_code)]

//! Per-query execution profiling.
//!
//! A [`Profiler`] attached to an [`crate::search::IndexSearcher`] records, for
//! every query node of a search, the time spent in each [`TimingType`]. The
//! searcher installs the decorators; callers read the finished forest with
//! [`Profiler::tree`]. [`ProfileCollector`] times result collection on its own
//! counter.

/// Phase timings of a single query node.
pub mod breakdown;

/// Collector decorator with its own time counter.
pub mod collector;

/// Profiling misuse errors.
pub mod errors;

/// Scorer decorator.
pub mod scorer;

/// Tree builder and result snapshots.
pub mod tree;

/// Weight decorator.
pub mod weight;

pub use breakdown::{PhaseTimer, ProfileBreakdown, TimingType};
pub use collector::{ProfileCollector, ProfileLeafCollector};
pub use errors::ProfileError;
pub use scorer::ProfileScorer;
pub use tree::{ProfileResult, ProfileScope, Profiler};
pub use weight::ProfileWeight;
