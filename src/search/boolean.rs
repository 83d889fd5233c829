use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, SearchError};
use crate::index::{IndexReader, SegmentReader};
use crate::search::query::{Query, ScoreMode};
use crate::search::scorer::{
    ConjunctionScorer, DisjunctionScorer, ReqExclScorer, ReqOptScorer, Scorer,
};
use crate::search::searcher::IndexSearcher;
use crate::search::weight::Weight;

/// How a clause takes part in a boolean match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match and contributes to the score.
    Must,
    /// The clause may match; it is required only when no `Must` clause exists.
    Should,
    /// Documents matching the clause are excluded.
    MustNot,
}

impl Occur {
    fn prefix(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

/// One sub-query with its occurrence.
#[derive(Clone, Debug)]
pub struct BooleanClause {
    query: Arc<dyn Query>,
    occur: Occur,
}

impl BooleanClause {
    /// Pairs `query` with `occur`.
    pub fn new(query: Arc<dyn Query>, occur: Occur) -> Self {
        Self { query, occur }
    }

    /// The clause's query.
    pub fn query(&self) -> &Arc<dyn Query> {
        &self.query
    }

    /// The clause's occurrence.
    pub fn occur(&self) -> Occur {
        self.occur
    }
}

/// Combination of required, optional and prohibited clauses.
#[derive(Clone, Debug, Default)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
}

/// Incremental [`BooleanQuery`] construction.
#[derive(Debug, Default)]
pub struct BooleanQueryBuilder {
    clauses: Vec<BooleanClause>,
}

impl BooleanQueryBuilder {
    /// Adds a required clause.
    pub fn must(self, query: Arc<dyn Query>) -> Self {
        self.add(query, Occur::Must)
    }

    /// Adds an optional clause.
    pub fn should(self, query: Arc<dyn Query>) -> Self {
        self.add(query, Occur::Should)
    }

    /// Adds a prohibited clause.
    pub fn must_not(self, query: Arc<dyn Query>) -> Self {
        self.add(query, Occur::MustNot)
    }

    /// Adds a clause with an explicit occurrence.
    pub fn add(mut self, query: Arc<dyn Query>, occur: Occur) -> Self {
        self.clauses.push(BooleanClause::new(query, occur));
        self
    }

    /// Finishes the query.
    pub fn build(self) -> BooleanQuery {
        BooleanQuery {
            clauses: self.clauses,
        }
    }
}

impl BooleanQuery {
    /// Starts an empty builder.
    pub fn builder() -> BooleanQueryBuilder {
        BooleanQueryBuilder::default()
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    fn positive_clauses(&self) -> impl Iterator<Item = &BooleanClause> {
        self.clauses.iter().filter(|c| c.occur != Occur::MustNot)
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(clause.occur.prefix())?;
            if clause.query.name() == "BooleanQuery" {
                write!(f, "({})", clause.query)?;
            } else {
                write!(f, "{}", clause.query)?;
            }
        }
        Ok(())
    }
}

impl Query for BooleanQuery {
    fn name(&self) -> &'static str {
        "BooleanQuery"
    }

    fn rewrite(&self, reader: &IndexReader) -> Result<Option<Arc<dyn Query>>> {
        if self.clauses.len() == 1 && self.clauses[0].occur != Occur::MustNot {
            let only = &self.clauses[0].query;
            trace!(clause = %only, "search.boolean.rewrite_single_clause");
            return Ok(Some(Arc::clone(only)));
        }
        let mut changed = false;
        let mut clauses = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            match clause.query.rewrite(reader)? {
                Some(rewritten) => {
                    changed = true;
                    clauses.push(BooleanClause::new(rewritten, clause.occur));
                }
                None => clauses.push(clause.clone()),
            }
        }
        if !changed {
            return Ok(None);
        }
        Ok(Some(Arc::new(BooleanQuery { clauses })))
    }

    fn create_weight(
        &self,
        searcher: &IndexSearcher,
        score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>> {
        let max = searcher.options().max_clause_count;
        if self.clauses.len() > max {
            return Err(SearchError::TooManyClauses {
                count: self.clauses.len(),
                max,
            });
        }
        let mut must = Vec::new();
        let mut should = Vec::new();
        let mut must_not = Vec::new();
        for clause in &self.clauses {
            match clause.occur {
                Occur::Must => must.push(searcher.create_weight(&clause.query, score_mode)?),
                Occur::Should => should.push(searcher.create_weight(&clause.query, score_mode)?),
                Occur::MustNot => must_not.push(
                    searcher.create_weight(&clause.query, ScoreMode::CompleteNoScores)?,
                ),
            }
        }
        Ok(Box::new(BooleanWeight {
            must,
            should,
            must_not,
            needs_scores: score_mode.needs_scores(),
            matches_nothing: self.positive_clauses().next().is_none(),
        }))
    }
}

struct BooleanWeight {
    must: Vec<Box<dyn Weight>>,
    should: Vec<Box<dyn Weight>>,
    must_not: Vec<Box<dyn Weight>>,
    needs_scores: bool,
    matches_nothing: bool,
}

impl BooleanWeight {
    fn optional(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let mut subs = Vec::with_capacity(self.should.len());
        for weight in &self.should {
            if let Some(scorer) = weight.scorer(segment)? {
                subs.push(scorer);
            }
        }
        Ok(match subs.len() {
            0 => None,
            1 => subs.pop(),
            _ => Some(Box::new(DisjunctionScorer::new(subs))),
        })
    }

    fn prohibited(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let mut subs = Vec::with_capacity(self.must_not.len());
        for weight in &self.must_not {
            if let Some(scorer) = weight.scorer(segment)? {
                subs.push(scorer);
            }
        }
        Ok(match subs.len() {
            0 => None,
            1 => subs.pop(),
            _ => Some(Box::new(DisjunctionScorer::new(subs))),
        })
    }
}

impl Weight for BooleanWeight {
    fn scorer(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        if self.matches_nothing {
            return Ok(None);
        }
        let mut required = Vec::with_capacity(self.must.len());
        for weight in &self.must {
            match weight.scorer(segment)? {
                Some(scorer) => required.push(scorer),
                None => return Ok(None),
            }
        }

        let positive: Box<dyn Scorer> = if required.is_empty() {
            match self.optional(segment)? {
                Some(scorer) => scorer,
                None => return Ok(None),
            }
        } else {
            let required: Box<dyn Scorer> = if required.len() == 1 {
                match required.pop() {
                    Some(scorer) => scorer,
                    None => return Ok(None),
                }
            } else {
                match ConjunctionScorer::new(required) {
                    Some(scorer) => Box::new(scorer),
                    None => return Ok(None),
                }
            };
            match (self.needs_scores, self.optional(segment)?) {
                (true, Some(optional)) => Box::new(ReqOptScorer::new(required, optional)),
                _ => required,
            }
        };

        Ok(Some(match self.prohibited(segment)? {
            Some(excluded) => Box::new(ReqExclScorer::new(positive, excluded)),
            None => positive,
        }))
    }
}
