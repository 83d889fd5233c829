use std::fmt;

/// A `(field, text)` pair addressed by postings lists.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Term {
    field: String,
    text: String,
}

impl Term {
    /// Creates a term for `field` with the exact keyword `text`.
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Keyword text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// A document made of untokenized keyword fields.
///
/// Repeating the same `(field, text)` pair raises its term frequency.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<Term>,
}

impl Document {
    /// Creates an empty document. Empty documents still occupy a doc id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyword field, builder style.
    pub fn with_field(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.add_field(field, text);
        self
    }

    /// Adds a keyword field.
    pub fn add_field(&mut self, field: impl Into<String>, text: impl Into<String>) {
        self.fields.push(Term::new(field, text));
    }

    /// Terms carried by this document, in insertion order.
    pub fn terms(&self) -> &[Term] {
        &self.fields
    }

    /// Whether the document carries `term`.
    pub fn contains(&self, term: &Term) -> bool {
        self.fields.iter().any(|t| t == term)
    }
}
