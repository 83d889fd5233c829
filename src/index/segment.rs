use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::index::document::{Document, Term};
use crate::index::postings::{DocId, Posting};

type PostingsMap = FxHashMap<Term, Arc<[Posting]>>;

/// Immutable view over one sealed segment.
///
/// Postings are shared between snapshots; deleting documents produces a new
/// `SegmentReader` with a fresh deletion bitmap and the same postings.
#[derive(Clone, Debug)]
pub struct SegmentReader {
    ord: u32,
    doc_base: DocId,
    max_doc: u32,
    postings: Arc<PostingsMap>,
    deleted: Arc<[bool]>,
    num_deleted: u32,
}

impl SegmentReader {
    pub(crate) fn build(ord: u32, doc_base: DocId, docs: &[Document], deleted: &[bool]) -> Self {
        let mut staged: FxHashMap<Term, Vec<Posting>> = FxHashMap::default();
        for (doc, document) in docs.iter().enumerate() {
            let doc = doc as DocId;
            for term in document.terms() {
                let list = staged.entry(term.clone()).or_default();
                match list.last_mut() {
                    Some(last) if last.doc == doc => last.term_freq += 1,
                    _ => list.push(Posting { doc, term_freq: 1 }),
                }
            }
        }
        let postings: PostingsMap = staged
            .into_iter()
            .map(|(term, list)| (term, Arc::from(list)))
            .collect();
        let num_deleted = deleted.iter().filter(|d| **d).count() as u32;
        Self {
            ord,
            doc_base,
            max_doc: docs.len() as u32,
            postings: Arc::new(postings),
            deleted: Arc::from(deleted),
            num_deleted,
        }
    }

    /// Returns a copy of this segment with every document carrying `term`
    /// marked deleted, plus the number of newly deleted documents.
    pub(crate) fn with_deleted_term(&self, term: &Term) -> (Self, u32) {
        let Some(list) = self.postings.get(term) else {
            return (self.clone(), 0);
        };
        let mut deleted = self.deleted.to_vec();
        let mut newly = 0u32;
        for posting in list.iter() {
            let slot = &mut deleted[posting.doc as usize];
            if !*slot {
                *slot = true;
                newly += 1;
            }
        }
        let next = Self {
            deleted: Arc::from(deleted),
            num_deleted: self.num_deleted + newly,
            ..self.clone()
        };
        (next, newly)
    }

    /// Position of this segment within its reader.
    pub fn ord(&self) -> u32 {
        self.ord
    }

    /// Index-wide doc id of this segment's first document.
    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }

    /// Number of documents including deleted ones.
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Number of live documents.
    pub fn num_docs(&self) -> u32 {
        self.max_doc - self.num_deleted
    }

    /// Whether any document in this segment is deleted.
    pub fn has_deletions(&self) -> bool {
        self.num_deleted > 0
    }

    /// Whether `doc` has been deleted.
    pub fn is_deleted(&self, doc: DocId) -> bool {
        self.deleted.get(doc as usize).copied().unwrap_or(false)
    }

    /// Postings list for `term`, if the segment has one.
    pub fn postings(&self, term: &Term) -> Option<Arc<[Posting]>> {
        self.postings.get(term).cloned()
    }

    /// Number of documents containing `term`, deleted documents included.
    pub fn doc_freq(&self, term: &Term) -> u32 {
        self.postings.get(term).map_or(0, |list| list.len() as u32)
    }
}
