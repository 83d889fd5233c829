use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::index::{DocId, IndexReader, SegmentReader, NO_MORE_DOCS};
use crate::search::query::{Query, ScoreMode};
use crate::search::scorer::{Scorer, TwoPhase};
use crate::search::searcher::IndexSearcher;
use crate::search::weight::Weight;

/// Wraps a query behind a two-phase scorer.
///
/// The approximation visits every document of the segment and each candidate
/// is confirmed by advancing the wrapped query's scorer onto it. Matches and
/// scores are those of the wrapped query.
#[derive(Clone, Debug)]
pub struct ApproximationQuery {
    inner: Arc<dyn Query>,
}

impl ApproximationQuery {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn Query>) -> Self {
        Self { inner }
    }

    /// The wrapped query.
    pub fn inner(&self) -> &Arc<dyn Query> {
        &self.inner
    }
}

impl fmt::Display for ApproximationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "approx({})", self.inner)
    }
}

impl Query for ApproximationQuery {
    fn name(&self) -> &'static str {
        "ApproximationQuery"
    }

    fn rewrite(&self, reader: &IndexReader) -> Result<Option<Arc<dyn Query>>> {
        Ok(self
            .inner
            .rewrite(reader)?
            .map(|inner| Arc::new(ApproximationQuery::new(inner)) as Arc<dyn Query>))
    }

    fn create_weight(
        &self,
        searcher: &IndexSearcher,
        score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>> {
        let inner = searcher.create_weight(&self.inner, score_mode)?;
        Ok(Box::new(ApproximationWeight { inner }))
    }
}

struct ApproximationWeight {
    inner: Box<dyn Weight>,
}

impl Weight for ApproximationWeight {
    fn scorer(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(inner) = self.inner.scorer(segment)? else {
            return Ok(None);
        };
        Ok(Some(Box::new(ApproximationScorer::new(inner, segment.max_doc()))))
    }
}

/// Two-phase scorer: dense approximation, exact confirmation against `inner`.
pub struct ApproximationScorer {
    inner: Box<dyn Scorer>,
    max_doc: u32,
    candidate: Option<DocId>,
    inner_doc: Option<DocId>,
}

impl ApproximationScorer {
    /// Confirms every doc below `max_doc` against `inner`.
    pub fn new(inner: Box<dyn Scorer>, max_doc: u32) -> Self {
        Self {
            inner,
            max_doc,
            candidate: None,
            inner_doc: None,
        }
    }

    fn land(&mut self, candidate: DocId) -> DocId {
        let doc = if candidate >= self.max_doc {
            NO_MORE_DOCS
        } else {
            candidate
        };
        self.candidate = Some(doc);
        doc
    }
}

impl TwoPhase for ApproximationScorer {
    fn approximation_next_doc(&mut self) -> Result<DocId> {
        let candidate = match self.candidate {
            None => 0,
            Some(NO_MORE_DOCS) => NO_MORE_DOCS,
            Some(doc) => doc + 1,
        };
        Ok(self.land(candidate))
    }

    fn approximation_advance(&mut self, target: DocId) -> Result<DocId> {
        let candidate = match self.candidate {
            Some(doc) if doc >= target => doc,
            _ => target,
        };
        Ok(self.land(candidate))
    }

    fn matches(&mut self) -> Result<bool> {
        let Some(candidate) = self.candidate else {
            return Ok(false);
        };
        if candidate == NO_MORE_DOCS {
            return Ok(false);
        }
        let inner_doc = match self.inner_doc {
            Some(doc) if doc >= candidate => doc,
            _ => {
                let doc = self.inner.advance(candidate)?;
                self.inner_doc = Some(doc);
                doc
            }
        };
        Ok(inner_doc == candidate)
    }
}

impl Scorer for ApproximationScorer {
    fn doc(&self) -> DocId {
        self.candidate.unwrap_or(NO_MORE_DOCS)
    }

    fn next_doc(&mut self) -> Result<DocId> {
        loop {
            let doc = self.approximation_next_doc()?;
            if doc == NO_MORE_DOCS || self.matches()? {
                return Ok(doc);
            }
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let mut doc = self.approximation_advance(target)?;
        loop {
            if doc == NO_MORE_DOCS || self.matches()? {
                return Ok(doc);
            }
            doc = self.approximation_next_doc()?;
        }
    }

    fn score(&mut self) -> Result<f32> {
        self.inner.score()
    }

    fn cost(&self) -> u64 {
        u64::from(self.max_doc)
    }

    fn two_phase(&mut self) -> Option<&mut dyn TwoPhase> {
        Some(self)
    }
}
