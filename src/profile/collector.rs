use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::error::Result;
use crate::index::{DocId, SegmentReader};
use crate::profile::breakdown::interval_nanos;
use crate::search::{Collector, LeafCollector, ScoreMode, Scorer};

/// Adds the time of one call to the shared counter when dropped.
struct CollectorTimer<'a> {
    total: &'a Cell<u64>,
    start: Instant,
}

impl<'a> CollectorTimer<'a> {
    fn start(total: &'a Cell<u64>) -> Self {
        Self {
            total,
            start: Instant::now(),
        }
    }
}

impl Drop for CollectorTimer<'_> {
    fn drop(&mut self) {
        self.total
            .set(self.total.get().saturating_add(interval_nanos(self.start)));
    }
}

/// Collector decorator timing result collection.
///
/// Leaf-collector acquisition, scorer attachment and every `collect` add to a
/// single counter, kept apart from the per-query breakdowns.
#[derive(Debug)]
pub struct ProfileCollector<C> {
    inner: C,
    time: Rc<Cell<u64>>,
}

impl<C: Collector> ProfileCollector<C> {
    /// Wraps `inner` with the counter at zero.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            time: Rc::new(Cell::new(0)),
        }
    }

    /// Nanoseconds spent in the wrapped collector so far.
    pub fn time(&self) -> u64 {
        self.time.get()
    }

    /// The wrapped collector.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwraps the collector.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Collector> Collector for ProfileCollector<C> {
    type Leaf = ProfileLeafCollector<C::Leaf>;

    fn score_mode(&self) -> ScoreMode {
        self.inner.score_mode()
    }

    fn leaf_collector(&mut self, segment: &SegmentReader) -> Result<Self::Leaf> {
        let inner = {
            let _timer = CollectorTimer::start(&self.time);
            self.inner.leaf_collector(segment)?
        };
        Ok(ProfileLeafCollector {
            inner,
            time: Rc::clone(&self.time),
        })
    }

    fn finish_leaf(&mut self, leaf: Self::Leaf) -> Result<()> {
        self.inner.finish_leaf(leaf.inner)
    }
}

/// Leaf side of [`ProfileCollector`].
#[derive(Debug)]
pub struct ProfileLeafCollector<L> {
    inner: L,
    time: Rc<Cell<u64>>,
}

impl<L: LeafCollector> LeafCollector for ProfileLeafCollector<L> {
    fn set_scorer(&mut self, scorer: &dyn Scorer) -> Result<()> {
        let _timer = CollectorTimer::start(&self.time);
        self.inner.set_scorer(scorer)
    }

    fn collect(&mut self, doc: DocId, scorer: &mut dyn Scorer) -> Result<()> {
        let _timer = CollectorTimer::start(&self.time);
        self.inner.collect(doc, scorer)
    }
}
