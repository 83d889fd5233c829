use std::rc::Rc;

use crate::error::Result;
use crate::index::{DocId, NO_MORE_DOCS};
use crate::profile::breakdown::{ProfileBreakdown, TimingType};
use crate::search::scorer::two_phase_of;
use crate::search::{Scorer, TwoPhase};

/// Scorer decorator charging iteration and scoring to a node's breakdown.
///
/// `doc` and `cost` are not timed. When the inner scorer is two-phase, plain
/// iteration goes through the timed approximation and `matches`, so a parent
/// scorer driving this one still charges confirmation to MATCH.
pub struct ProfileScorer {
    inner: Box<dyn Scorer>,
    breakdown: Rc<ProfileBreakdown>,
    two_phase: bool,
}

impl ProfileScorer {
    /// Wraps `inner`, recording into `breakdown`.
    pub fn new(mut inner: Box<dyn Scorer>, breakdown: Rc<ProfileBreakdown>) -> Self {
        let two_phase = inner.two_phase().is_some();
        Self {
            inner,
            breakdown,
            two_phase,
        }
    }

    /// Breakdown receiving this scorer's timings.
    pub fn breakdown(&self) -> &Rc<ProfileBreakdown> {
        &self.breakdown
    }
}

impl Scorer for ProfileScorer {
    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if !self.two_phase {
            let _timer = self.breakdown.timer(TimingType::NextDoc)?;
            return self.inner.next_doc();
        }
        loop {
            let doc = self.approximation_next_doc()?;
            if doc == NO_MORE_DOCS || self.matches()? {
                return Ok(doc);
            }
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if !self.two_phase {
            let _timer = self.breakdown.timer(TimingType::Advance)?;
            return self.inner.advance(target);
        }
        let mut doc = self.approximation_advance(target)?;
        while doc != NO_MORE_DOCS && !self.matches()? {
            doc = self.approximation_next_doc()?;
        }
        Ok(doc)
    }

    fn score(&mut self) -> Result<f32> {
        let _timer = self.breakdown.timer(TimingType::Score)?;
        self.inner.score()
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }

    fn two_phase(&mut self) -> Option<&mut dyn TwoPhase> {
        if self.two_phase {
            Some(self)
        } else {
            None
        }
    }
}

impl TwoPhase for ProfileScorer {
    fn approximation_next_doc(&mut self) -> Result<DocId> {
        let _timer = self.breakdown.timer(TimingType::NextDoc)?;
        two_phase_of(self.inner.as_mut())?.approximation_next_doc()
    }

    fn approximation_advance(&mut self, target: DocId) -> Result<DocId> {
        let _timer = self.breakdown.timer(TimingType::Advance)?;
        two_phase_of(self.inner.as_mut())?.approximation_advance(target)
    }

    fn matches(&mut self) -> Result<bool> {
        let _timer = self.breakdown.timer(TimingType::Match)?;
        two_phase_of(self.inner.as_mut())?.matches()
    }
}
