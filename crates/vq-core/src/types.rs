//! Core types for vq-core.
//!
//! This module defines the data shapes shared by every component: the
//! [`Term`] detail returned by an info lookup, the [`TermSummary`] used in
//! parent/child/root listings, search [`Suggestion`]s, and the
//! [`Vocabulary`] a term belongs to.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::LookupError;
use crate::source::VocabularySource;

/// A term as it appears in a parent, child or root listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSummary {
    /// Stable identifier within the vocabulary (e.g. `HP:0001250`).
    pub id: String,
    /// Addressable resource location of the term.
    pub path: String,
    /// Display name.
    pub label: String,
    /// `None` until the server has said whether this term has children.
    pub has_children: Option<bool>,
}

impl TermSummary {
    pub fn new(id: impl Into<String>, path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            label: label.into(),
            has_children: None,
        }
    }

    pub fn with_has_children(mut self, has_children: bool) -> Self {
        self.has_children = Some(has_children);
        self
    }
}

/// Full detail for a single term, created fresh from each info response.
///
/// A term's `parents` are the only source of its ancestor chain; the
/// hierarchy tree never looks anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Term {
    pub id: String,
    pub path: String,
    pub label: String,
    pub definition: Option<String>,
    /// Alternative names, in server order. Empty when the term has none.
    pub synonyms: Vec<String>,
    pub parents: Vec<TermSummary>,
    /// Direct children when the response carried them.
    pub children: Option<Vec<TermSummary>>,
    pub has_children: Option<bool>,
}

impl Term {
    pub fn summary(&self) -> TermSummary {
        TermSummary {
            id: self.id.clone(),
            path: self.path.clone(),
            label: self.label.clone(),
            has_children: self.has_children,
        }
    }

    /// Names of the terms this one "is a type of", skipping blank labels.
    pub fn type_of(&self) -> Vec<&str> {
        self.parents
            .iter()
            .map(|p| p.label.as_str())
            .filter(|l| !l.trim().is_empty())
            .collect()
    }
}

/// One candidate row returned by a suggest query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub path: String,
    /// Display name, already resolved from `label`, `name` or `identifier`.
    pub name: String,
    /// Acronym of the vocabulary that produced this row.
    pub vocabulary: String,
}

/// Vocabulary metadata as served by the content repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyDocument {
    pub acronym: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub roots: Vec<TermSummary>,
}

/// A named, independently queryable source of terms.
///
/// Clones share the same roots cache, so the top-level terms of a vocabulary
/// are fetched at most once no matter how many trees are built over it.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub acronym: String,
    pub name: String,
    /// Repository path of the vocabulary node; also the metadata cache key.
    pub path: String,
    pub description: Option<String>,
    pub url: Option<String>,
    roots: Arc<OnceCell<Vec<TermSummary>>>,
}

impl Vocabulary {
    pub fn new(acronym: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            acronym: acronym.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Build a vocabulary from a fetched document. The document's roots
    /// pre-fill the roots cache.
    pub fn from_document(path: impl Into<String>, doc: VocabularyDocument) -> Self {
        Self {
            acronym: doc.acronym,
            name: doc.name,
            path: path.into(),
            description: doc.description,
            url: doc.url,
            roots: Arc::new(OnceCell::new_with(Some(doc.roots))),
        }
    }

    /// Supply pre-fetched roots, e.g. from the embedding question definition.
    pub fn with_roots(mut self, roots: Vec<TermSummary>) -> Self {
        self.roots = Arc::new(OnceCell::new_with(Some(roots)));
        self
    }

    /// Roots, if they have been fetched or supplied.
    pub fn roots(&self) -> Option<&[TermSummary]> {
        self.roots.get().map(Vec::as_slice)
    }

    /// Return the roots, fetching the vocabulary document the first time.
    ///
    /// Concurrent callers wait on the same fetch. A failed fetch leaves the
    /// cache empty so a later call can try again.
    pub async fn ensure_roots(
        &self,
        source: &dyn VocabularySource,
    ) -> Result<Vec<TermSummary>, LookupError> {
        let roots = self
            .roots
            .get_or_try_init(|| async {
                tracing::debug!(vocabulary = %self.acronym, "fetching vocabulary roots");
                source.vocabulary(&self.path).await.map(|doc| doc.roots)
            })
            .await?;
        Ok(roots.clone())
    }

    /// Title shown above the hierarchy dialog.
    pub fn title(&self) -> String {
        match (self.name.is_empty(), self.acronym.is_empty()) {
            (false, false) => format!("{} ({})", self.name, self.acronym),
            (true, false) => self.acronym.clone(),
            (false, true) => self.name.clone(),
            (true, true) => "Related terms".to_string(),
        }
    }
}

/// Path of the vocabulary that owns `term_path`: its parent node.
///
/// Returns `None` for paths with no parent segment.
pub fn vocabulary_path_of(term_path: &str) -> Option<&str> {
    let trimmed = term_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}
