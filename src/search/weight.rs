use crate::error::Result;
use crate::index::SegmentReader;
use crate::search::scorer::Scorer;

/// A query compiled against one searcher; builds per-segment scorers.
pub trait Weight {
    /// Builds a scorer for `segment`, `None` when nothing can match there.
    fn scorer(&self, segment: &SegmentReader) -> Result<Option<Box<dyn Scorer>>>;
}
