#![forbid(unsafe_code)]

//! In-memory segmented inverted index.
//!
//! Documents are sets of keyword terms. Each sealed segment keeps one sorted
//! postings list per term together with a deletion bitmap.

/// Terms and documents.
pub mod document;

/// Postings lists and cursors.
pub mod postings;

/// Read-only snapshots over sealed segments.
pub mod reader;

/// Per-segment storage.
pub mod segment;

/// Buffered writer that seals segments.
pub mod writer;

pub use document::{Document, Term};
pub use postings::{DocId, Posting, PostingCursor, NO_MORE_DOCS};
pub use reader::IndexReader;
pub use segment::SegmentReader;
pub use writer::IndexWriter;
