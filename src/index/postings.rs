use std::sync::Arc;

/// Segment-local document identifier.
pub type DocId = u32;

/// Sentinel returned by iterators once they are exhausted.
pub const NO_MORE_DOCS: DocId = DocId::MAX;

/// One entry of a term's postings list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Posting {
    /// Document containing the term.
    pub doc: DocId,
    /// Number of occurrences of the term in `doc`.
    pub term_freq: u32,
}

/// Forward-only cursor over a sorted, unique postings list.
///
/// The cursor starts unpositioned; `next` and `seek` move it forward and
/// return [`NO_MORE_DOCS`] once the list is exhausted.
#[derive(Clone, Debug)]
pub struct PostingCursor {
    postings: Arc<[Posting]>,
    pos: usize,
    started: bool,
}

impl PostingCursor {
    /// Wraps a shared postings list.
    pub fn new(postings: Arc<[Posting]>) -> Self {
        Self {
            postings,
            pos: 0,
            started: false,
        }
    }

    /// Number of postings in the list.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Whether the list holds no postings.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Current document, `NO_MORE_DOCS` when exhausted or unpositioned.
    pub fn doc(&self) -> DocId {
        if !self.started {
            return NO_MORE_DOCS;
        }
        self.postings.get(self.pos).map_or(NO_MORE_DOCS, |p| p.doc)
    }

    /// Term frequency at the current position, 0 when not on a posting.
    pub fn term_freq(&self) -> u32 {
        if !self.started {
            return 0;
        }
        self.postings.get(self.pos).map_or(0, |p| p.term_freq)
    }

    /// Moves to the next posting.
    pub fn next(&mut self) -> DocId {
        if self.started {
            self.pos = (self.pos + 1).min(self.postings.len());
        } else {
            self.started = true;
        }
        self.doc()
    }

    /// Moves to the first posting whose document is `>= target`.
    ///
    /// Gallops from the current position before binary searching, so runs of
    /// nearby targets stay cheap.
    pub fn seek(&mut self, target: DocId) -> DocId {
        if !self.started {
            self.started = true;
        }
        let len = self.postings.len();
        if self.pos >= len || self.postings[self.pos].doc >= target {
            return self.doc();
        }
        let mut lo = self.pos;
        let mut step = 1usize;
        let mut hi = lo + step;
        while hi < len && self.postings[hi].doc < target {
            lo = hi;
            step <<= 1;
            hi = lo + step;
        }
        let hi = hi.min(len);
        let offset = self.postings[lo..hi].partition_point(|p| p.doc < target);
        self.pos = lo + offset;
        self.doc()
    }
}
