use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::index::IndexReader;
use crate::search::searcher::IndexSearcher;
use crate::search::weight::Weight;

/// Whether a search needs relevance scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreMode {
    /// Every match is scored.
    Complete,
    /// Matches are enumerated but never scored.
    CompleteNoScores,
}

impl ScoreMode {
    /// Whether scorers will be asked for scores.
    pub fn needs_scores(self) -> bool {
        matches!(self, ScoreMode::Complete)
    }
}

/// A node of a query tree.
///
/// Queries are shared as `Arc<dyn Query>`; the profiler keys its nodes on the
/// identity of that allocation, so two equal queries built separately are
/// profiled as two nodes.
pub trait Query: fmt::Debug + fmt::Display {
    /// Short type name reported in profiles.
    fn name(&self) -> &'static str;

    /// Rewrites the query into a simpler form, `None` when already primitive.
    fn rewrite(&self, _reader: &IndexReader) -> Result<Option<Arc<dyn Query>>> {
        Ok(None)
    }

    /// Compiles the query for one search. Sub-queries must be compiled through
    /// [`IndexSearcher::create_weight`] so they are profiled as children.
    fn create_weight(
        &self,
        searcher: &IndexSearcher,
        score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>>;

    /// Answers a hit count from index statistics alone, when possible.
    fn count_from_stats(&self, _reader: &IndexReader) -> Option<u64> {
        None
    }
}
