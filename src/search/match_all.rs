use std::fmt;

use crate::error::Result;
use crate::index::{DocId, IndexReader, SegmentReader, NO_MORE_DOCS};
use crate::search::query::{Query, ScoreMode};
use crate::search::scorer::Scorer;
use crate::search::searcher::IndexSearcher;
use crate::search::weight::Weight;

/// Matches every document with a constant score of 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchAllQuery;

impl MatchAllQuery {
    /// Creates the query.
    pub fn new() -> Self {
        Self
    }
}

impl fmt::Display for MatchAllQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*:*")
    }
}

impl Query for MatchAllQuery {
    fn name(&self) -> &'static str {
        "MatchAllQuery"
    }

    fn create_weight(
        &self,
        _searcher: &IndexSearcher,
        _score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>> {
        Ok(Box::new(MatchAllWeight))
    }

    fn count_from_stats(&self, reader: &IndexReader) -> Option<u64> {
        Some(reader.num_docs())
    }
}

struct MatchAllWeight;

impl Weight for MatchAllWeight {
    fn scorer(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        if segment.max_doc() == 0 {
            return Ok(None);
        }
        Ok(Some(Box::new(AllScorer::new(segment.max_doc()))))
    }
}

/// Dense scorer over `0..max_doc`.
pub struct AllScorer {
    max_doc: u32,
    doc: Option<DocId>,
}

impl AllScorer {
    /// Iterates every doc id below `max_doc`.
    pub fn new(max_doc: u32) -> Self {
        Self { max_doc, doc: None }
    }

    fn land(&mut self, candidate: DocId) -> DocId {
        let doc = if candidate >= self.max_doc {
            NO_MORE_DOCS
        } else {
            candidate
        };
        self.doc = Some(doc);
        doc
    }
}

impl Scorer for AllScorer {
    fn doc(&self) -> DocId {
        self.doc.unwrap_or(NO_MORE_DOCS)
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let candidate = match self.doc {
            None => 0,
            Some(NO_MORE_DOCS) => NO_MORE_DOCS,
            Some(doc) => doc + 1,
        };
        Ok(self.land(candidate))
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let candidate = match self.doc {
            Some(doc) if doc >= target => doc,
            _ => target,
        };
        Ok(self.land(candidate))
    }

    fn score(&mut self) -> Result<f32> {
        Ok(1.0)
    }

    fn cost(&self) -> u64 {
        u64::from(self.max_doc)
    }
}
