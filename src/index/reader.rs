use std::sync::Arc;

use crate::error::{Result, SearchError};
use crate::index::document::Term;
use crate::index::segment::SegmentReader;

/// Point-in-time view over the sealed segments of an index.
#[derive(Clone, Debug, Default)]
pub struct IndexReader {
    segments: Vec<Arc<SegmentReader>>,
}

impl IndexReader {
    pub(crate) fn new(segments: Vec<Arc<SegmentReader>>) -> Self {
        Self { segments }
    }

    /// Segments in doc-base order.
    pub fn segments(&self) -> &[Arc<SegmentReader>] {
        &self.segments
    }

    /// Looks a segment up by ordinal.
    pub fn segment(&self, ord: u32) -> Result<&Arc<SegmentReader>> {
        self.segments
            .get(ord as usize)
            .ok_or(SearchError::UnknownSegment(ord))
    }

    /// Documents across all segments, deleted ones included.
    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.max_doc())).sum()
    }

    /// Live documents across all segments.
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.num_docs())).sum()
    }

    /// Whether any segment carries deletions.
    pub fn has_deletions(&self) -> bool {
        self.segments.iter().any(|s| s.has_deletions())
    }

    /// Index-wide document frequency of `term`, deleted documents included.
    pub fn doc_freq(&self, term: &Term) -> u64 {
        self.segments
            .iter()
            .map(|s| u64::from(s.doc_freq(term)))
            .sum()
    }
}
