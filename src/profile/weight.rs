use std::rc::Rc;
use std::sync::Arc;

use crate::error::Result;
use crate::index::SegmentReader;
use crate::profile::breakdown::TimingType;
use crate::profile::scorer::ProfileScorer;
use crate::profile::tree::Profiler;
use crate::search::{Query, Scorer, Weight};

/// Weight decorator that times scorer construction and wraps every scorer it
/// builds in a [`ProfileScorer`].
pub struct ProfileWeight {
    inner: Box<dyn Weight>,
    query: Arc<dyn Query>,
    profiler: Rc<Profiler>,
}

impl ProfileWeight {
    /// Wraps the weight compiled for `query`.
    pub fn new(inner: Box<dyn Weight>, query: Arc<dyn Query>, profiler: Rc<Profiler>) -> Self {
        Self {
            inner,
            query,
            profiler,
        }
    }
}

impl Weight for ProfileWeight {
    fn scorer(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        let scope = self.profiler.scope(&self.query);
        let breakdown = Rc::clone(scope.breakdown());
        let scorer = {
            let _timer = breakdown.timer(TimingType::BuildScorer)?;
            self.inner.scorer(segment)?
        };
        Ok(scorer.map(|inner| Box::new(ProfileScorer::new(inner, breakdown)) as Box<dyn Scorer>))
    }
}
