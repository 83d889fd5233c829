use std::cmp::Ordering;

use crate::error::Result;
use crate::index::{DocId, SegmentReader};
use crate::search::query::ScoreMode;
use crate::search::scorer::Scorer;

/// Receives the matches of a search, one segment at a time.
pub trait Collector {
    /// Per-segment collector.
    type Leaf: LeafCollector;

    /// Whether collected documents will be scored.
    fn score_mode(&self) -> ScoreMode;

    /// Prepares collection for `segment`.
    fn leaf_collector(&mut self, segment: &SegmentReader) -> Result<Self::Leaf>;

    /// Hands back a finished leaf collector.
    fn finish_leaf(&mut self, leaf: Self::Leaf) -> Result<()>;
}

/// Per-segment sink for matching documents.
pub trait LeafCollector {
    /// Called once before the first `collect` of the segment.
    fn set_scorer(&mut self, scorer: &dyn Scorer) -> Result<()>;

    /// Collects a live matching `doc` (segment-relative). `scorer` is
    /// positioned on `doc`.
    fn collect(&mut self, doc: DocId, scorer: &mut dyn Scorer) -> Result<()>;
}

/// Counts matches without scoring them.
#[derive(Debug, Default)]
pub struct TotalHitCountCollector {
    total_hits: u64,
}

impl TotalHitCountCollector {
    /// Starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches counted so far.
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }
}

/// Leaf of [`TotalHitCountCollector`].
#[derive(Debug, Default)]
pub struct TotalHitCountLeaf {
    count: u64,
}

impl Collector for TotalHitCountCollector {
    type Leaf = TotalHitCountLeaf;

    fn score_mode(&self) -> ScoreMode {
        ScoreMode::CompleteNoScores
    }

    fn leaf_collector(&mut self, _segment: &SegmentReader) -> Result<Self::Leaf> {
        Ok(TotalHitCountLeaf::default())
    }

    fn finish_leaf(&mut self, leaf: Self::Leaf) -> Result<()> {
        self.total_hits += leaf.count;
        Ok(())
    }
}

impl LeafCollector for TotalHitCountLeaf {
    fn set_scorer(&mut self, _scorer: &dyn Scorer) -> Result<()> {
        Ok(())
    }

    fn collect(&mut self, _doc: DocId, _scorer: &mut dyn Scorer) -> Result<()> {
        self.count += 1;
        Ok(())
    }
}

/// Hit ordering for [`TopDocsCollector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Sort {
    /// Highest score first, ties broken by ascending doc id.
    #[default]
    Relevance,
    /// Ascending doc id; documents are never scored.
    IndexOrder,
}

/// One hit with its global doc id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreDoc {
    /// Global doc id (segment base plus segment-relative id).
    pub doc: DocId,
    /// Score, absent when the search did not score.
    pub score: Option<f32>,
}

/// Result of a top-n search.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TopDocs {
    /// Every live match, not only the returned ones.
    pub total_hits: u64,
    /// Best hits in sort order.
    pub hits: Vec<ScoreDoc>,
}

/// Keeps the best `n` hits under a [`Sort`].
#[derive(Debug)]
pub struct TopDocsCollector {
    n: usize,
    sort: Sort,
    total_hits: u64,
    hits: Vec<ScoreDoc>,
}

impl TopDocsCollector {
    /// Keeps at most `n` hits ordered by `sort`.
    pub fn new(n: usize, sort: Sort) -> Self {
        Self {
            n,
            sort,
            total_hits: 0,
            hits: Vec::new(),
        }
    }

    /// Consumes the collector into its final hits.
    pub fn into_top_docs(self) -> TopDocs {
        TopDocs {
            total_hits: self.total_hits,
            hits: self.hits,
        }
    }
}

fn by_relevance(a: &ScoreDoc, b: &ScoreDoc) -> Ordering {
    let sa = a.score.unwrap_or(f32::NEG_INFINITY);
    let sb = b.score.unwrap_or(f32::NEG_INFINITY);
    sb.total_cmp(&sa).then(a.doc.cmp(&b.doc))
}

fn prune(hits: &mut Vec<ScoreDoc>, n: usize, sort: Sort) {
    if sort == Sort::Relevance {
        hits.sort_by(by_relevance);
    }
    hits.truncate(n);
}

/// Leaf of [`TopDocsCollector`].
#[derive(Debug)]
pub struct TopDocsLeaf {
    doc_base: DocId,
    n: usize,
    sort: Sort,
    count: u64,
    hits: Vec<ScoreDoc>,
}

impl Collector for TopDocsCollector {
    type Leaf = TopDocsLeaf;

    fn score_mode(&self) -> ScoreMode {
        match self.sort {
            Sort::Relevance => ScoreMode::Complete,
            Sort::IndexOrder => ScoreMode::CompleteNoScores,
        }
    }

    fn leaf_collector(&mut self, segment: &SegmentReader) -> Result<Self::Leaf> {
        let n = match self.sort {
            // Earlier segments hold smaller global ids.
            Sort::IndexOrder => self.n.saturating_sub(self.hits.len()),
            Sort::Relevance => self.n,
        };
        Ok(TopDocsLeaf {
            doc_base: segment.doc_base(),
            n,
            sort: self.sort,
            count: 0,
            hits: Vec::new(),
        })
    }

    fn finish_leaf(&mut self, leaf: Self::Leaf) -> Result<()> {
        self.total_hits += leaf.count;
        self.hits.extend(leaf.hits);
        prune(&mut self.hits, self.n, self.sort);
        Ok(())
    }
}

impl LeafCollector for TopDocsLeaf {
    fn set_scorer(&mut self, _scorer: &dyn Scorer) -> Result<()> {
        Ok(())
    }

    fn collect(&mut self, doc: DocId, scorer: &mut dyn Scorer) -> Result<()> {
        self.count += 1;
        let doc = self.doc_base + doc;
        match self.sort {
            Sort::IndexOrder => {
                if self.hits.len() < self.n {
                    self.hits.push(ScoreDoc { doc, score: None });
                }
            }
            Sort::Relevance => {
                if self.n == 0 {
                    return Ok(());
                }
                let score = scorer.score()?;
                self.hits.push(ScoreDoc {
                    doc,
                    score: Some(score),
                });
                if self.hits.len() >= self.n.saturating_mul(2).max(64) {
                    prune(&mut self.hits, self.n, self.sort);
                }
            }
        }
        Ok(())
    }
}
