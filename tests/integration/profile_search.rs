#![allow(missing_docs)]

use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Once};

use sombra_search::index::{
    DocId, Document, IndexReader, IndexWriter, SegmentReader, Term, NO_MORE_DOCS,
};
use sombra_search::profile::{ProfileResult, Profiler, TimingType};
use sombra_search::search::{
    ApproximationQuery, BooleanQuery, IndexSearcher, Query, ScoreMode, Scorer, SearcherOptions,
    Sort, TermQuery, Weight,
};
use sombra_search::{Result, SearchError};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sombra_search=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// Three segments; every doc has `foo:bar`, every third doc also has
/// `kind:rare`.
fn build_reader() -> Result<IndexReader> {
    let mut writer = IndexWriter::new();
    for i in 0..30 {
        let mut doc = Document::new().with_field("foo", "bar");
        if i % 3 == 0 {
            doc.add_field("kind", "rare");
        }
        writer.add_document(doc)?;
        if i % 10 == 9 {
            writer.commit()?;
        }
    }
    Ok(writer.reader())
}

fn profiled(reader: IndexReader) -> (IndexSearcher, Rc<Profiler>) {
    let mut searcher = IndexSearcher::new(reader);
    let profiler = Rc::new(Profiler::new());
    searcher.set_profiler(Rc::clone(&profiler));
    (searcher, profiler)
}

fn term(field: &str, text: &str) -> Arc<dyn Query> {
    Arc::new(TermQuery::new(field, text))
}

fn single_root(profiler: &Profiler) -> Result<ProfileResult> {
    let mut tree = profiler.tree()?;
    assert_eq!(tree.len(), 1, "one root per top-level query");
    Ok(tree.remove(0))
}

#[test]
fn scored_term_search_records_iteration_phases() -> Result<()> {
    init_tracing();
    let (searcher, profiler) = profiled(build_reader()?);
    let top = searcher.search(&term("foo", "bar"), 3)?;
    assert_eq!(top.total_hits, 30);

    let root = single_root(&profiler)?;
    assert_eq!(root.query_type(), "TermQuery");
    assert_eq!(root.description(), "foo:bar");
    assert!(root.children().is_empty());
    for timing in [
        TimingType::Rewrite,
        TimingType::Weight,
        TimingType::BuildScorer,
        TimingType::NextDoc,
        TimingType::Score,
    ] {
        assert!(root.timing(timing) > 0, "{timing} should be recorded");
    }
    assert_eq!(root.timing(TimingType::Advance), 0);
    assert_eq!(root.timing(TimingType::Match), 0);
    assert_eq!(root.time_breakdown().len(), TimingType::COUNT);
    assert_eq!(
        root.total_time(),
        root.time_breakdown().values().sum::<u64>()
    );
    Ok(())
}

#[test]
fn unscored_search_records_no_score_time() -> Result<()> {
    init_tracing();
    let (searcher, profiler) = profiled(build_reader()?);
    let top = searcher.search_sorted(&term("kind", "rare"), 5, Sort::IndexOrder)?;
    assert_eq!(top.total_hits, 10);
    assert!(top.hits.iter().all(|hit| hit.score.is_none()));

    let root = single_root(&profiler)?;
    assert!(root.timing(TimingType::NextDoc) > 0);
    assert_eq!(root.timing(TimingType::Score), 0);
    assert_eq!(root.timing(TimingType::Match), 0);
    Ok(())
}

#[test]
fn count_from_stats_only_rewrites() -> Result<()> {
    init_tracing();
    let (searcher, profiler) = profiled(build_reader()?);
    assert_eq!(searcher.count(&term("foo", "bar"))?, 30);

    let root = single_root(&profiler)?;
    assert!(root.timing(TimingType::Rewrite) > 0);
    for timing in [
        TimingType::Weight,
        TimingType::BuildScorer,
        TimingType::NextDoc,
        TimingType::Advance,
        TimingType::Score,
        TimingType::Match,
    ] {
        assert_eq!(root.timing(timing), 0, "{timing} should be untouched");
    }
    Ok(())
}

#[test]
fn deletions_force_count_through_collection() -> Result<()> {
    init_tracing();
    let mut writer = IndexWriter::new();
    for i in 0..12 {
        let doc = Document::new()
            .with_field("foo", "bar")
            .with_field("id", i.to_string());
        writer.add_document(doc)?;
    }
    writer.commit()?;
    writer.delete_term(&Term::new("id", "4"));

    let (searcher, profiler) = profiled(writer.reader());
    assert_eq!(searcher.count(&term("foo", "bar"))?, 11);

    let root = single_root(&profiler)?;
    assert!(root.timing(TimingType::Weight) > 0);
    assert!(root.timing(TimingType::NextDoc) > 0);
    assert_eq!(root.timing(TimingType::Score), 0);
    Ok(())
}

#[test]
fn disabled_stats_shortcut_iterates() -> Result<()> {
    init_tracing();
    let options = SearcherOptions {
        count_from_stats: false,
        ..SearcherOptions::default()
    };
    let mut searcher = IndexSearcher::with_options(build_reader()?, options);
    let profiler = Rc::new(Profiler::new());
    searcher.set_profiler(Rc::clone(&profiler));

    assert_eq!(searcher.count(&term("kind", "rare"))?, 10);
    let root = single_root(&profiler)?;
    assert!(root.timing(TimingType::NextDoc) > 0);
    assert!(root.timing(TimingType::BuildScorer) > 0);
    Ok(())
}

#[test]
fn approximation_records_match_time() -> Result<()> {
    init_tracing();
    let (searcher, profiler) = profiled(build_reader()?);
    let query: Arc<dyn Query> = Arc::new(ApproximationQuery::new(term("kind", "rare")));
    assert_eq!(searcher.count(&query)?, 10);

    let root = single_root(&profiler)?;
    assert_eq!(root.query_type(), "ApproximationQuery");
    assert!(root.timing(TimingType::NextDoc) > 0);
    assert!(root.timing(TimingType::Match) > 0);
    assert_eq!(root.timing(TimingType::Score), 0);

    assert_eq!(root.children().len(), 1);
    let inner = &root.children()[0];
    assert_eq!(inner.description(), "kind:rare");
    assert!(inner.timing(TimingType::Weight) > 0);
    assert!(inner.timing(TimingType::Advance) > 0);
    assert_eq!(inner.timing(TimingType::NextDoc), 0);
    assert_eq!(inner.timing(TimingType::Rewrite), 0);
    Ok(())
}

#[test]
fn approximation_under_a_conjunction_records_match_time() -> Result<()> {
    init_tracing();
    let (searcher, profiler) = profiled(build_reader()?);
    let approx: Arc<dyn Query> = Arc::new(ApproximationQuery::new(term("kind", "rare")));
    let query: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .must(term("foo", "bar"))
            .must(Arc::clone(&approx))
            .build(),
    );
    let top = searcher.search(&query, 100)?;
    assert_eq!(top.total_hits, 10);

    let root = single_root(&profiler)?;
    assert_eq!(root.timing(TimingType::Match), 0);
    let children = root.children();
    assert_eq!(children.len(), 2);
    let nested = &children[1];
    assert_eq!(nested.description(), "approx(kind:rare)");
    assert!(nested.timing(TimingType::Match) > 0);
    assert!(nested.timing(TimingType::NextDoc) + nested.timing(TimingType::Advance) > 0);
    assert_eq!(children[0].timing(TimingType::Match), 0);
    Ok(())
}

#[test]
fn deleted_candidates_are_not_confirmed() -> Result<()> {
    init_tracing();
    let mut writer = IndexWriter::new();
    for _ in 0..6 {
        writer.add_document(Document::new().with_field("kind", "rare"))?;
    }
    writer.commit()?;
    writer.delete_term(&Term::new("kind", "rare"));
    let (searcher, profiler) = profiled(writer.reader());

    let query: Arc<dyn Query> = Arc::new(ApproximationQuery::new(term("kind", "rare")));
    assert_eq!(searcher.count(&query)?, 0);

    let root = single_root(&profiler)?;
    assert!(root.timing(TimingType::NextDoc) > 0);
    assert_eq!(root.timing(TimingType::Match), 0);
    Ok(())
}

#[test]
fn conjunction_follower_only_advances() -> Result<()> {
    init_tracing();
    let (searcher, profiler) = profiled(build_reader()?);
    let common = term("foo", "bar");
    let rare = term("kind", "rare");
    let query: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .must(Arc::clone(&common))
            .must(Arc::clone(&rare))
            .build(),
    );
    let top = searcher.search(&query, 100)?;
    assert_eq!(top.total_hits, 10);

    let root = single_root(&profiler)?;
    assert_eq!(root.query_type(), "BooleanQuery");
    assert_eq!(root.description(), "+foo:bar +kind:rare");
    assert!(root.timing(TimingType::Rewrite) > 0);
    assert!(root.timing(TimingType::NextDoc) > 0);
    assert!(root.timing(TimingType::Score) > 0);

    let children = root.children();
    assert_eq!(children.len(), 2);
    let (follower, lead) = (&children[0], &children[1]);
    assert_eq!(follower.description(), "foo:bar");
    assert_eq!(lead.description(), "kind:rare");

    assert!(lead.timing(TimingType::NextDoc) > 0);
    assert!(follower.timing(TimingType::Advance) > 0);
    assert_eq!(follower.timing(TimingType::NextDoc), 0);
    for child in children {
        assert_eq!(child.timing(TimingType::Rewrite), 0);
        assert!(child.timing(TimingType::Weight) > 0);
        assert!(child.timing(TimingType::BuildScorer) > 0);
        assert!(child.timing(TimingType::Score) > 0);
    }
    Ok(())
}

#[test]
fn profiling_does_not_change_results() -> Result<()> {
    init_tracing();
    let reader = build_reader()?;
    let query: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .should(term("foo", "bar"))
            .should(term("kind", "rare"))
            .must_not(Arc::new(ApproximationQuery::new(term("kind", "none"))))
            .build(),
    );

    let plain = IndexSearcher::new(reader.clone()).search(&query, 7)?;
    let (searcher, profiler) = profiled(reader);
    let traced = searcher.search(&query, 7)?;
    assert_eq!(plain, traced);
    assert!(!profiler.is_empty());
    Ok(())
}

#[test]
fn detached_profiler_stops_recording() -> Result<()> {
    init_tracing();
    let (mut searcher, profiler) = profiled(build_reader()?);
    searcher.search(&term("foo", "bar"), 1)?;
    let before = profiler.tree()?;

    let detached = searcher.clear_profiler().expect("profiler was attached");
    assert!(Rc::ptr_eq(&detached, &profiler));
    assert!(searcher.profiler().is_none());
    searcher.search(&term("foo", "bar"), 1)?;
    assert_eq!(profiler.tree()?, before);
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FailAt {
    Weight,
    Scorer,
    NextDoc,
}

#[derive(Debug)]
struct FailingQuery {
    at: FailAt,
}

impl fmt::Display for FailingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failing({:?})", self.at)
    }
}

impl Query for FailingQuery {
    fn name(&self) -> &'static str {
        "FailingQuery"
    }

    fn create_weight(
        &self,
        _searcher: &IndexSearcher,
        _score_mode: ScoreMode,
    ) -> Result<Box<dyn Weight>> {
        if self.at == FailAt::Weight {
            return Err(SearchError::engine("weight failed"));
        }
        Ok(Box::new(FailingWeight { at: self.at }))
    }
}

struct FailingWeight {
    at: FailAt,
}

impl Weight for FailingWeight {
    fn scorer(&self, _segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>> {
        if self.at == FailAt::Scorer {
            return Err(SearchError::engine("scorer failed"));
        }
        Ok(Some(Box::new(FailingScorer)))
    }
}

struct FailingScorer;

impl Scorer for FailingScorer {
    fn doc(&self) -> DocId {
        NO_MORE_DOCS
    }

    fn next_doc(&mut self) -> Result<DocId> {
        Err(SearchError::engine("iteration failed"))
    }

    fn advance(&mut self, _target: DocId) -> Result<DocId> {
        Err(SearchError::engine("iteration failed"))
    }

    fn score(&mut self) -> Result<f32> {
        Ok(0.0)
    }

    fn cost(&self) -> u64 {
        1
    }
}

#[test]
fn failures_inside_timed_phases_leave_profiler_balanced() -> Result<()> {
    init_tracing();
    let cases = [
        (FailAt::Weight, TimingType::Weight),
        (FailAt::Scorer, TimingType::BuildScorer),
        (FailAt::NextDoc, TimingType::NextDoc),
    ];
    for (at, phase) in cases {
        let (searcher, profiler) = profiled(build_reader()?);
        let query: Arc<dyn Query> = Arc::new(
            BooleanQuery::builder()
                .must(term("foo", "bar"))
                .must(Arc::new(FailingQuery { at }))
                .build(),
        );
        let err = searcher.search(&query, 10).expect_err("search must fail");
        assert!(matches!(err, SearchError::Engine(_)), "{at:?}: {err}");

        assert_eq!(profiler.depth(), 0, "{at:?}");
        let root = single_root(&profiler)?;
        let failing = root
            .children()
            .iter()
            .find(|child| child.query_type() == "FailingQuery")
            .expect("failing node recorded");
        assert!(failing.timing(phase) > 0, "{at:?} keeps partial time");

        // A second search on the same profiler starts from a clean stack.
        let ok = searcher.search(&term("kind", "rare"), 1)?;
        assert_eq!(ok.total_hits, 10);
        assert_eq!(profiler.tree()?.len(), 2);
    }
    Ok(())
}
