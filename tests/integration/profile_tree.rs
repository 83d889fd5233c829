#![allow(missing_docs)]

use std::rc::Rc;
use std::sync::Arc;

use sombra_search::index::{Document, IndexReader, IndexWriter};
use sombra_search::profile::{ProfileError, ProfileResult, Profiler, TimingType};
use sombra_search::search::{BooleanQuery, IndexSearcher, MatchAllQuery, Query, TermQuery};
use sombra_search::Result;

fn build_reader() -> Result<IndexReader> {
    let mut writer = IndexWriter::new();
    for word in ["a", "b", "c", "d", "a", "b", "a"] {
        let doc = Document::new()
            .with_field("f", word)
            .with_field("all", "yes");
        writer.add_document(doc)?;
    }
    writer.commit()?;
    Ok(writer.reader())
}

fn profiled() -> Result<(IndexSearcher, Rc<Profiler>)> {
    let mut searcher = IndexSearcher::new(build_reader()?);
    let profiler = Rc::new(Profiler::new());
    searcher.set_profiler(Rc::clone(&profiler));
    Ok((searcher, profiler))
}

fn term(text: &str) -> Arc<dyn Query> {
    Arc::new(TermQuery::new("f", text))
}

fn descriptions(node: &ProfileResult) -> Vec<&str> {
    node.children().iter().map(|c| c.description()).collect()
}

#[test]
fn nested_boolean_builds_a_matching_tree() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let inner: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .should(term("b"))
            .should(term("c"))
            .build(),
    );
    let query: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .must(Arc::new(TermQuery::new("all", "yes")))
            .must(inner)
            .must_not(term("d"))
            .build(),
    );
    let top = searcher.search(&query, 10)?;
    assert_eq!(top.total_hits, 3);

    let tree = profiler.tree()?;
    assert_eq!(tree.len(), 1);
    let root = &tree[0];
    assert_eq!(root.description(), "+all:yes +(f:b f:c) -f:d");
    assert_eq!(descriptions(root), vec!["all:yes", "f:b f:c", "f:d"]);

    let nested = &root.children()[1];
    assert_eq!(nested.query_type(), "BooleanQuery");
    assert_eq!(descriptions(nested), vec!["f:b", "f:c"]);
    for leaf in nested.children() {
        assert!(leaf.children().is_empty());
        assert!(leaf.timing(TimingType::Weight) > 0);
        assert!(leaf.timing(TimingType::BuildScorer) > 0);
    }
    Ok(())
}

#[test]
fn shared_instance_is_reported_under_each_parent() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let shared = term("a");
    let left: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .should(Arc::clone(&shared))
            .should(term("b"))
            .build(),
    );
    let right: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .should(Arc::clone(&shared))
            .should(term("c"))
            .build(),
    );
    let query: Arc<dyn Query> = Arc::new(BooleanQuery::builder().should(left).should(right).build());
    searcher.search(&query, 10)?;

    let tree = profiler.tree()?;
    let root = &tree[0];
    assert_eq!(root.children().len(), 2);
    assert_eq!(descriptions(&root.children()[0]), vec!["f:a", "f:b"]);
    assert_eq!(descriptions(&root.children()[1]), vec!["f:a", "f:c"]);
    Ok(())
}

#[test]
fn repeated_instance_under_one_parent_shares_a_node() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let shared = term("a");
    let query: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .must(Arc::clone(&shared))
            .must(Arc::clone(&shared))
            .build(),
    );
    let top = searcher.search(&query, 10)?;
    assert_eq!(top.total_hits, 3);

    let tree = profiler.tree()?;
    assert_eq!(descriptions(&tree[0]), vec!["f:a"]);
    Ok(())
}

#[test]
fn equal_but_distinct_instances_get_their_own_nodes() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let query: Arc<dyn Query> = Arc::new(
        BooleanQuery::builder()
            .should(Arc::new(MatchAllQuery::new()))
            .should(Arc::new(MatchAllQuery::new()))
            .build(),
    );
    searcher.search(&query, 1)?;

    let tree = profiler.tree()?;
    assert_eq!(descriptions(&tree[0]), vec!["*:*", "*:*"]);
    Ok(())
}

#[test]
fn rewritten_query_keeps_a_single_root() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let query: Arc<dyn Query> = Arc::new(BooleanQuery::builder().must(term("a")).build());
    searcher.search(&query, 10)?;

    let tree = profiler.tree()?;
    assert_eq!(tree.len(), 1);
    let root = &tree[0];
    assert_eq!(root.query_type(), "TermQuery");
    assert_eq!(root.description(), "f:a");
    assert!(root.timing(TimingType::Rewrite) > 0);
    assert!(root.timing(TimingType::Weight) > 0);
    assert!(root.timing(TimingType::NextDoc) > 0);
    Ok(())
}

#[test]
fn repeated_search_of_a_rewritten_query_keeps_a_single_root() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let query: Arc<dyn Query> = Arc::new(BooleanQuery::builder().must(term("a")).build());
    searcher.search(&query, 10)?;
    let first = profiler.tree()?;
    searcher.search(&query, 10)?;

    let tree = profiler.tree()?;
    assert_eq!(tree.len(), 1);
    let root = &tree[0];
    assert_eq!(root.description(), "f:a");
    for timing in [TimingType::Rewrite, TimingType::Weight, TimingType::NextDoc] {
        assert!(root.timing(timing) > first[0].timing(timing), "{timing}");
    }
    Ok(())
}

#[test]
fn queries_rewriting_to_one_instance_share_a_root() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    let shared = term("b");
    let left: Arc<dyn Query> = Arc::new(BooleanQuery::builder().must(Arc::clone(&shared)).build());
    let right: Arc<dyn Query> = Arc::new(BooleanQuery::builder().should(Arc::clone(&shared)).build());
    searcher.search(&left, 10)?;
    searcher.search(&right, 10)?;
    searcher.search(&shared, 10)?;

    let tree = profiler.tree()?;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].description(), "f:b");
    assert!(tree[0].timing(TimingType::Rewrite) > 0);
    assert!(tree[0].timing(TimingType::BuildScorer) > 0);
    Ok(())
}

#[test]
fn tree_reads_are_idempotent() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    searcher.search(&term("b"), 10)?;
    let first = profiler.tree()?;
    let second = profiler.tree()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn misuse_is_reported_through_the_public_api() -> Result<()> {
    let profiler = Profiler::new();
    assert!(profiler.is_empty());
    assert_eq!(profiler.poll_last_element(), Err(ProfileError::EmptyStack));

    let query = term("a");
    let breakdown = profiler.get_profile_breakdown(&query);
    breakdown.start(TimingType::Weight)?;
    assert_eq!(
        breakdown.start(TimingType::Weight),
        Err(ProfileError::AlreadyRunning(TimingType::Weight))
    );
    breakdown.stop(TimingType::Weight)?;
    assert_eq!(profiler.tree(), Err(ProfileError::Unbalanced { depth: 1 }));

    profiler.poll_last_element()?;
    let tree = profiler.tree()?;
    assert_eq!(tree.len(), 1);
    assert!(tree[0].timing(TimingType::Weight) > 0);
    Ok(())
}

#[test]
fn snapshot_serializes_with_every_phase() -> Result<()> {
    let (searcher, profiler) = profiled()?;
    searcher.search(&term("a"), 10)?;
    let tree = profiler.tree()?;

    let json = serde_json::to_value(&tree[0]).expect("profile serializes");
    assert_eq!(json["type"], "TermQuery");
    assert_eq!(json["description"], "f:a");
    assert!(json["time_in_nanos"].as_u64().unwrap_or(0) > 0);
    let breakdown = json["breakdown"].as_object().expect("breakdown object");
    assert_eq!(breakdown.len(), TimingType::COUNT);
    for timing in TimingType::ALL {
        assert!(breakdown.contains_key(timing.as_str()), "{timing}");
    }
    assert_eq!(json["children"].as_array().map(Vec::len), Some(0));
    Ok(())
}
