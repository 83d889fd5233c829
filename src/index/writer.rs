use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::index::document::{Document, Term};
use crate::index::postings::{DocId, NO_MORE_DOCS};
use crate::index::reader::IndexReader;
use crate::index::segment::SegmentReader;

/// In-memory index writer.
///
/// Documents are buffered until [`IndexWriter::commit`] seals them into a new
/// segment; readers only observe sealed segments.
#[derive(Debug, Default)]
pub struct IndexWriter {
    segments: Vec<Arc<SegmentReader>>,
    pending: Vec<Document>,
    pending_deleted: Vec<bool>,
    next_base: DocId,
}

impl IndexWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a document and returns the number of buffered documents.
    pub fn add_document(&mut self, doc: Document) -> Result<usize> {
        let total = u64::from(self.next_base) + self.pending.len() as u64 + 1;
        if total >= u64::from(NO_MORE_DOCS) {
            return Err(SearchError::Invalid("index exceeds the maximum document count"));
        }
        self.pending.push(doc);
        self.pending_deleted.push(false);
        Ok(self.pending.len())
    }

    /// Marks every document carrying `term` as deleted, buffered documents
    /// included. Returns how many documents were newly deleted.
    pub fn delete_term(&mut self, term: &Term) -> u64 {
        let mut deleted = 0u64;
        for segment in self.segments.iter_mut() {
            let (next, newly) = segment.with_deleted_term(term);
            if newly > 0 {
                *segment = Arc::new(next);
                deleted += u64::from(newly);
            }
        }
        for (doc, flag) in self.pending.iter().zip(self.pending_deleted.iter_mut()) {
            if !*flag && doc.contains(term) {
                *flag = true;
                deleted += 1;
            }
        }
        debug!(term = %term, deleted, "index.writer.delete_term");
        deleted
    }

    /// Seals buffered documents into a new segment. A commit with nothing
    /// buffered is a no-op.
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let ord = u32::try_from(self.segments.len())
            .map_err(|_| SearchError::Invalid("segment count overflow"))?;
        let segment = SegmentReader::build(ord, self.next_base, &self.pending, &self.pending_deleted);
        self.next_base += segment.max_doc();
        debug!(
            ord,
            docs = segment.max_doc(),
            live = segment.num_docs(),
            "index.writer.commit"
        );
        self.segments.push(Arc::new(segment));
        self.pending.clear();
        self.pending_deleted.clear();
        Ok(())
    }

    /// Snapshot of the committed segments.
    pub fn reader(&self) -> IndexReader {
        IndexReader::new(self.segments.clone())
    }
}
