use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Result, SearchError};
use crate::index::{IndexReader, SegmentReader, NO_MORE_DOCS};
use crate::profile::{ProfileWeight, Profiler, TimingType};
use crate::search::collector::{
    Collector, LeafCollector, Sort, TopDocs, TopDocsCollector, TotalHitCountCollector,
};
use crate::search::options::SearcherOptions;
use crate::search::query::{Query, ScoreMode};
use crate::search::scorer::{two_phase_of, Scorer};
use crate::search::weight::Weight;

/// Upper bound on rewrite rounds before a query is considered non-convergent.
const MAX_REWRITE_ROUNDS: usize = 64;

/// Runs queries against an [`IndexReader`] snapshot.
///
/// With a [`Profiler`] attached, rewrites, weights and scorers are timed per
/// query node. Results are the same with or without a profiler.
#[derive(Debug)]
pub struct IndexSearcher {
    reader: IndexReader,
    options: SearcherOptions,
    profiler: Option<Rc<Profiler>>,
}

impl IndexSearcher {
    /// Searcher with default options.
    pub fn new(reader: IndexReader) -> Self {
        Self::with_options(reader, SearcherOptions::default())
    }

    /// Searcher with explicit options.
    pub fn with_options(reader: IndexReader, options: SearcherOptions) -> Self {
        Self {
            reader,
            options,
            profiler: None,
        }
    }

    /// The searched snapshot.
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Options in effect.
    pub fn options(&self) -> &SearcherOptions {
        &self.options
    }

    /// Attaches `profiler`; later searches record into it.
    pub fn set_profiler(&mut self, profiler: Rc<Profiler>) {
        self.profiler = Some(profiler);
    }

    /// Detaches and returns the profiler, if any.
    pub fn clear_profiler(&mut self) -> Option<Rc<Profiler>> {
        self.profiler.take()
    }

    /// The attached profiler.
    pub fn profiler(&self) -> Option<&Rc<Profiler>> {
        self.profiler.as_ref()
    }

    /// Rewrites `query` until it no longer changes.
    pub fn rewrite(&self, query: &Arc<dyn Query>) -> Result<Arc<dyn Query>> {
        let Some(profiler) = &self.profiler else {
            return self.rewrite_to_fixpoint(query);
        };
        let mut scope = profiler.scope(query);
        let rewritten = {
            let _timer = scope.breakdown().timer(TimingType::Rewrite)?;
            self.rewrite_to_fixpoint(query)?
        };
        scope.rebind(&rewritten);
        Ok(rewritten)
    }

    fn rewrite_to_fixpoint(&self, query: &Arc<dyn Query>) -> Result<Arc<dyn Query>> {
        let mut current = Arc::clone(query);
        for _ in 0..MAX_REWRITE_ROUNDS {
            match current.rewrite(&self.reader)? {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(SearchError::Invalid("query rewrite did not converge"))
    }

    /// Compiles `query` into a weight. Queries compile their sub-queries
    /// through this method.
    pub fn create_weight(
        &self,
        query: &Arc<dyn Query>,
        score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>> {
        let Some(profiler) = &self.profiler else {
            return query.create_weight(self, score_mode);
        };
        let scope = profiler.scope(query);
        let weight = {
            let _timer = scope.breakdown().timer(TimingType::Weight)?;
            query.create_weight(self, score_mode)?
        };
        Ok(Box::new(ProfileWeight::new(
            weight,
            Arc::clone(query),
            Rc::clone(profiler),
        )))
    }

    /// Best `n` hits by relevance.
    pub fn search(&self, query: &Arc<dyn Query>, n: usize) -> Result<TopDocs> {
        self.search_sorted(query, n, Sort::Relevance)
    }

    /// First `n` hits under `sort`.
    pub fn search_sorted(&self, query: &Arc<dyn Query>, n: usize, sort: Sort) -> Result<TopDocs> {
        let mut collector = TopDocsCollector::new(n, sort);
        self.search_with(query, &mut collector)?;
        Ok(collector.into_top_docs())
    }

    /// Number of live matches. Answered from index statistics when the query
    /// supports it and [`SearcherOptions::count_from_stats`] is set.
    pub fn count(&self, query: &Arc<dyn Query>) -> Result<u64> {
        let rewritten = self.rewrite(query)?;
        if self.options.count_from_stats {
            if let Some(count) = rewritten.count_from_stats(&self.reader) {
                debug!(query = %rewritten, count, "search.count.from_stats");
                return Ok(count);
            }
        }
        let mut collector = TotalHitCountCollector::new();
        self.search_rewritten(&rewritten, &mut collector)?;
        Ok(collector.total_hits())
    }

    /// Feeds every live match of `query` to `collector`.
    pub fn search_with<C: Collector>(&self, query: &Arc<dyn Query>, collector: &mut C) -> Result<()> {
        let rewritten = self.rewrite(query)?;
        self.search_rewritten(&rewritten, collector)
    }

    fn search_rewritten<C: Collector>(&self, query: &Arc<dyn Query>, collector: &mut C) -> Result<()> {
        let weight = self.create_weight(query, collector.score_mode())?;
        debug!(
            query = %query,
            segments = self.reader.segments().len(),
            profiled = self.profiler.is_some(),
            "search.start"
        );
        self.search_weight(weight.as_ref(), collector)
    }

    /// Runs a compiled weight over every segment.
    pub fn search_weight<C: Collector>(&self, weight: &dyn Weight, collector: &mut C) -> Result<()> {
        for segment in self.reader.segments() {
            let mut leaf = collector.leaf_collector(segment)?;
            let Some(mut scorer) = weight.scorer(segment)? else {
                trace!(segment = segment.ord(), "search.segment.no_scorer");
                collector.finish_leaf(leaf)?;
                continue;
            };
            leaf.set_scorer(scorer.as_ref())?;
            let collected = collect_segment(segment, scorer.as_mut(), &mut leaf)?;
            trace!(segment = segment.ord(), collected, "search.segment.done");
            collector.finish_leaf(leaf)?;
        }
        Ok(())
    }
}

/// Drains `scorer` into `leaf`, skipping deleted documents. Two-phase scorers
/// are driven through their approximation and only confirmed candidates are
/// collected.
fn collect_segment<L: LeafCollector>(
    segment: &SegmentReader,
    scorer: &mut dyn Scorer,
    leaf: &mut L,
) -> Result<u64> {
    let mut collected = 0u64;
    if scorer.two_phase().is_some() {
        loop {
            let doc = two_phase_of(scorer)?.approximation_next_doc()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if segment.is_deleted(doc) || !two_phase_of(scorer)?.matches()? {
                continue;
            }
            leaf.collect(doc, scorer)?;
            collected += 1;
        }
    } else {
        loop {
            let doc = scorer.next_doc()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if segment.is_deleted(doc) {
                continue;
            }
            leaf.collect(doc, scorer)?;
            collected += 1;
        }
    }
    Ok(collected)
}
