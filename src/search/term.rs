use std::fmt;

use crate::error::Result;
use crate::index::{DocId, IndexReader, PostingCursor, SegmentReader, Term};
use crate::search::query::{Query, ScoreMode};
use crate::search::scorer::Scorer;
use crate::search::searcher::IndexSearcher;
use crate::search::weight::Weight;

/// Matches documents carrying an exact term.
#[derive(Clone, Debug)]
pub struct TermQuery {
    term: Term,
}

impl TermQuery {
    /// Matches documents where `field` holds exactly `text`.
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            term: Term::new(field, text),
        }
    }

    /// The queried term.
    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)
    }
}

impl Query for TermQuery {
    fn name(&self) -> &'static str {
        "TermQuery"
    }

    fn create_weight(
        &self,
        searcher: &IndexSearcher,
        score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>> {
        let reader = searcher.reader();
        let idf = idf(reader.doc_freq(&self.term), reader.max_doc());
        Ok(Box::new(TermWeight {
            term: self.term.clone(),
            idf,
            score_mode,
        }))
    }

    fn count_from_stats(&self, reader: &IndexReader) -> Option<u64> {
        if reader.has_deletions() {
            return None;
        }
        Some(reader.doc_freq(&self.term))
    }
}

/// Classic inverse document frequency, `1 + ln(max_doc / (doc_freq + 1))`.
fn idf(doc_freq: u64, max_doc: u64) -> f32 {
    let ratio = (max_doc as f64 + 1.0) / (doc_freq as f64 + 1.0);
    (1.0 + ratio.ln()) as f32
}

struct TermWeight {
    term: Term,
    idf: f32,
    score_mode: ScoreMode,
}

impl Weight for TermWeight {
    fn scorer(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(postings) = segment.postings(&self.term) else {
            return Ok(None);
        };
        let idf = if self.score_mode.needs_scores() {
            self.idf
        } else {
            0.0
        };
        Ok(Some(Box::new(TermScorer {
            cursor: PostingCursor::new(postings),
            idf,
        })))
    }
}

/// Sequential scorer over one postings list; scores with `idf * sqrt(tf)`.
pub struct TermScorer {
    cursor: PostingCursor,
    idf: f32,
}

impl Scorer for TermScorer {
    fn doc(&self) -> DocId {
        self.cursor.doc()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        Ok(self.cursor.next())
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        Ok(self.cursor.seek(target))
    }

    fn score(&mut self) -> Result<f32> {
        Ok(self.idf * (self.cursor.term_freq() as f32).sqrt())
    }

    fn cost(&self) -> u64 {
        self.cursor.len() as u64
    }
}
