//! Scorer traits and the composite scorers used by boolean queries.

use crate::error::{Result, SearchError};
use crate::index::{DocId, NO_MORE_DOCS};

/// Iterator over the matching documents of one segment.
///
/// Iteration is forward only. `advance(target)` moves to the first match at or
/// after `target`; a scorer already positioned at or beyond `target` stays
/// where it is. `doc` is only meaningful once the scorer has been positioned.
pub trait Scorer {
    /// Current document, [`NO_MORE_DOCS`] once exhausted.
    fn doc(&self) -> DocId;

    /// Moves to the next matching document.
    fn next_doc(&mut self) -> Result<DocId>;

    /// Moves to the first matching document `>= target`.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Relevance score of the current document.
    fn score(&mut self) -> Result<f32>;

    /// Upper bound on the number of documents this scorer may visit.
    fn cost(&self) -> u64;

    /// Two-phase view of this scorer, when matching splits into a cheap
    /// approximation and an exact confirmation.
    fn two_phase(&mut self) -> Option<&mut dyn TwoPhase> {
        None
    }
}

/// Approximation plus confirmation view over a scorer.
///
/// The approximation may return documents that do not match; callers confirm
/// each candidate with `matches` before using it.
pub trait TwoPhase {
    /// Moves the approximation to its next candidate.
    fn approximation_next_doc(&mut self) -> Result<DocId>;

    /// Moves the approximation to the first candidate `>= target`.
    fn approximation_advance(&mut self, target: DocId) -> Result<DocId>;

    /// Confirms the current candidate.
    fn matches(&mut self) -> Result<bool>;
}

/// Two-phase view of a scorer that advertised one.
pub(crate) fn two_phase_of(scorer: &mut dyn Scorer) -> Result<&mut dyn TwoPhase> {
    scorer
        .two_phase()
        .ok_or(SearchError::Invalid("scorer dropped its two-phase view"))
}

/// Scorer that matches nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyScorer;

impl Scorer for EmptyScorer {
    fn doc(&self) -> DocId {
        NO_MORE_DOCS
    }

    fn next_doc(&mut self) -> Result<DocId> {
        Ok(NO_MORE_DOCS)
    }

    fn advance(&mut self, _target: DocId) -> Result<DocId> {
        Ok(NO_MORE_DOCS)
    }

    fn score(&mut self) -> Result<f32> {
        Ok(0.0)
    }

    fn cost(&self) -> u64 {
        0
    }
}

/// Intersection of required scorers.
///
/// The cheapest scorer leads with `next_doc`; the others are only ever moved
/// with `advance`, so intersections are skip-driven.
pub struct ConjunctionScorer {
    lead: Box<dyn Scorer>,
    others: Vec<Box<dyn Scorer>>,
    other_docs: Vec<Option<DocId>>,
    doc: Option<DocId>,
}

impl ConjunctionScorer {
    /// Builds a conjunction; `scorers` must not be empty.
    pub fn new(mut scorers: Vec<Box<dyn Scorer>>) -> Option<Self> {
        if scorers.is_empty() {
            return None;
        }
        scorers.sort_by_key(|s| s.cost());
        let lead = scorers.remove(0);
        let other_docs = vec![None; scorers.len()];
        Some(Self {
            lead,
            others: scorers,
            other_docs,
            doc: None,
        })
    }

    fn align(&mut self, mut target: DocId) -> Result<DocId> {
        'head: loop {
            if target == NO_MORE_DOCS {
                self.doc = Some(NO_MORE_DOCS);
                return Ok(NO_MORE_DOCS);
            }
            for (other, cached) in self.others.iter_mut().zip(self.other_docs.iter_mut()) {
                let current = match *cached {
                    Some(doc) if doc >= target => doc,
                    _ => {
                        let doc = other.advance(target)?;
                        *cached = Some(doc);
                        doc
                    }
                };
                if current == NO_MORE_DOCS {
                    self.doc = Some(NO_MORE_DOCS);
                    return Ok(NO_MORE_DOCS);
                }
                if current > target {
                    target = self.lead.advance(current)?;
                    continue 'head;
                }
            }
            self.doc = Some(target);
            return Ok(target);
        }
    }
}

impl Scorer for ConjunctionScorer {
    fn doc(&self) -> DocId {
        self.doc.unwrap_or(NO_MORE_DOCS)
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == Some(NO_MORE_DOCS) {
            return Ok(NO_MORE_DOCS);
        }
        let target = self.lead.next_doc()?;
        self.align(target)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if let Some(doc) = self.doc {
            if doc >= target {
                return Ok(doc);
            }
        }
        let target = self.lead.advance(target)?;
        self.align(target)
    }

    fn score(&mut self) -> Result<f32> {
        let mut score = self.lead.score()?;
        for other in self.others.iter_mut() {
            score += other.score()?;
        }
        Ok(score)
    }

    fn cost(&self) -> u64 {
        self.lead.cost()
    }
}

/// Union of optional scorers; each sub-scorer is driven with `next_doc`.
pub struct DisjunctionScorer {
    subs: Vec<Box<dyn Scorer>>,
    docs: Vec<DocId>,
    doc: Option<DocId>,
}

impl DisjunctionScorer {
    /// Builds a union over `subs`.
    pub fn new(subs: Vec<Box<dyn Scorer>>) -> Self {
        let docs = vec![NO_MORE_DOCS; subs.len()];
        Self {
            subs,
            docs,
            doc: None,
        }
    }

    fn settle(&mut self) -> DocId {
        let doc = self.docs.iter().copied().min().unwrap_or(NO_MORE_DOCS);
        self.doc = Some(doc);
        doc
    }
}

impl Scorer for DisjunctionScorer {
    fn doc(&self) -> DocId {
        self.doc.unwrap_or(NO_MORE_DOCS)
    }

    fn next_doc(&mut self) -> Result<DocId> {
        match self.doc {
            Some(NO_MORE_DOCS) => return Ok(NO_MORE_DOCS),
            Some(current) => {
                for (sub, doc) in self.subs.iter_mut().zip(self.docs.iter_mut()) {
                    if *doc == current {
                        *doc = sub.next_doc()?;
                    }
                }
            }
            None => {
                for (sub, doc) in self.subs.iter_mut().zip(self.docs.iter_mut()) {
                    *doc = sub.next_doc()?;
                }
            }
        }
        Ok(self.settle())
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let started = self.doc.is_some();
        if let Some(doc) = self.doc {
            if doc >= target {
                return Ok(doc);
            }
        }
        for (sub, doc) in self.subs.iter_mut().zip(self.docs.iter_mut()) {
            if !started || *doc < target {
                *doc = sub.advance(target)?;
            }
        }
        Ok(self.settle())
    }

    fn score(&mut self) -> Result<f32> {
        let current = self.doc();
        let mut score = 0.0;
        for (sub, doc) in self.subs.iter_mut().zip(self.docs.iter()) {
            if *doc == current {
                score += sub.score()?;
            }
        }
        Ok(score)
    }

    fn cost(&self) -> u64 {
        self.subs.iter().map(|s| s.cost()).sum()
    }
}

/// Required scorer whose score is raised by an optional scorer when both
/// match the same document.
pub struct ReqOptScorer {
    required: Box<dyn Scorer>,
    optional: Box<dyn Scorer>,
    optional_doc: Option<DocId>,
}

impl ReqOptScorer {
    /// Combines a required and an optional scorer.
    pub fn new(required: Box<dyn Scorer>, optional: Box<dyn Scorer>) -> Self {
        Self {
            required,
            optional,
            optional_doc: None,
        }
    }
}

impl Scorer for ReqOptScorer {
    fn doc(&self) -> DocId {
        self.required.doc()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        self.required.next_doc()
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.required.advance(target)
    }

    fn score(&mut self) -> Result<f32> {
        let doc = self.required.doc();
        let mut score = self.required.score()?;
        let optional_doc = match self.optional_doc {
            Some(current) if current >= doc => current,
            _ => {
                let next = self.optional.advance(doc)?;
                self.optional_doc = Some(next);
                next
            }
        };
        if optional_doc == doc {
            score += self.optional.score()?;
        }
        Ok(score)
    }

    fn cost(&self) -> u64 {
        self.required.cost()
    }
}

/// Required scorer with documents matched by an exclusion scorer removed.
pub struct ReqExclScorer {
    required: Box<dyn Scorer>,
    excluded: Box<dyn Scorer>,
    excluded_doc: Option<DocId>,
}

impl ReqExclScorer {
    /// Removes matches of `excluded` from `required`.
    pub fn new(required: Box<dyn Scorer>, excluded: Box<dyn Scorer>) -> Self {
        Self {
            required,
            excluded,
            excluded_doc: None,
        }
    }

    fn confirm(&mut self, mut doc: DocId) -> Result<DocId> {
        loop {
            if doc == NO_MORE_DOCS {
                return Ok(doc);
            }
            let excluded = match self.excluded_doc {
                Some(current) if current >= doc => current,
                _ => {
                    let next = self.excluded.advance(doc)?;
                    self.excluded_doc = Some(next);
                    next
                }
            };
            if excluded != doc {
                return Ok(doc);
            }
            doc = self.required.next_doc()?;
        }
    }
}

impl Scorer for ReqExclScorer {
    fn doc(&self) -> DocId {
        self.required.doc()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let doc = self.required.next_doc()?;
        self.confirm(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        let doc = self.required.advance(target)?;
        self.confirm(doc)
    }

    fn score(&mut self) -> Result<f32> {
        self.required.score()
    }

    fn cost(&self) -> u64 {
        self.required.cost()
    }
}
