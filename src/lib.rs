//! Profiled query execution over an in-memory inverted index.
//!
//! The [`index`] module stores keyword documents in segments, [`search`] runs
//! queries over them, and [`profile`] records where a search spends its time,
//! per query node and per execution phase.
//!
//! ```
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! use sombra_search::index::{Document, IndexWriter};
//! use sombra_search::profile::{Profiler, TimingType};
//! use sombra_search::search::{IndexSearcher, Query, TermQuery};
//!
//! # fn main() -> sombra_search::Result<()> {
//! let mut writer = IndexWriter::new();
//! writer.add_document(Document::new().with_field("foo", "bar"))?;
//! writer.commit()?;
//!
//! let mut searcher = IndexSearcher::new(writer.reader());
//! let profiler = Rc::new(Profiler::new());
//! searcher.set_profiler(Rc::clone(&profiler));
//!
//! let query: Arc<dyn Query> = Arc::new(TermQuery::new("foo", "bar"));
//! let top = searcher.search(&query, 10)?;
//! assert_eq!(top.total_hits, 1);
//!
//! let tree = profiler.tree()?;
//! assert_eq!(tree[0].query_type(), "TermQuery");
//! assert!(tree[0].timing(TimingType::NextDoc) > 0);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types shared by every module.
pub mod error;

/// Segmented in-memory inverted index.
pub mod index;

/// Per-query timing breakdowns and the collector timer.
pub mod profile;

/// Queries, scorers, collectors and the searcher.
pub mod search;

pub use error::{Result, SearchError};
pub use profile::{ProfileCollector, ProfileError, ProfileResult, Profiler, TimingType};
pub use search::{IndexSearcher, Query};
