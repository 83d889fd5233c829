#![forbid(unsafe_code)]

//! Query execution over an [`crate::index::IndexReader`].
//!
//! A [`Query`] is rewritten, compiled into a [`Weight`] once per search, and
//! the weight builds one [`Scorer`] per segment. Matches flow into a
//! [`Collector`].

/// Two-phase query wrapper.
pub mod approximation;

/// Boolean combinations of clauses.
pub mod boolean;

/// Result collection.
pub mod collector;

/// Match-everything query.
pub mod match_all;

/// Searcher configuration.
pub mod options;

/// The query trait and score modes.
pub mod query;

/// Scorer traits and composite scorers.
pub mod scorer;

/// Search entry point.
pub mod searcher;

/// Exact term query.
pub mod term;

/// Compiled queries.
pub mod weight;

pub use approximation::{ApproximationQuery, ApproximationScorer};
pub use boolean::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur};
pub use collector::{
    Collector, LeafCollector, ScoreDoc, Sort, TopDocs, TopDocsCollector, TopDocsLeaf,
    TotalHitCountCollector, TotalHitCountLeaf,
};
pub use match_all::{AllScorer, MatchAllQuery};
pub use options::SearcherOptions;
pub use query::{Query, ScoreMode};
pub use scorer::{
    ConjunctionScorer, DisjunctionScorer, EmptyScorer, ReqExclScorer, ReqOptScorer, Scorer,
    TwoPhase,
};
pub use searcher::IndexSearcher;
pub use term::{TermQuery, TermScorer};
pub use weight::Weight;
