//! The seam between the core components and the vocabulary REST API.
//!
//! Components hold a [`SharedSource`] and never build URLs themselves. The
//! production implementation lives in `vq-client`; tests plug in scripted
//! in-memory sources.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::LookupError;
use crate::types::{Suggestion, Term, VocabularyDocument};

/// One suggest request against a single vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestQuery {
    /// Acronym of the vocabulary to search.
    pub vocabulary: String,
    /// Already-normalised input text.
    pub text: String,
    /// Optional category filter expression scoped to this vocabulary.
    pub filter: Option<String>,
}

/// Anything that can answer suggest, term-info and vocabulary lookups.
pub trait VocabularySource: Send + Sync {
    /// Free-text search against one vocabulary.
    fn suggest<'a>(
        &'a self,
        query: &'a SuggestQuery,
    ) -> BoxFuture<'a, Result<Vec<Suggestion>, LookupError>>;

    /// Detail for the term at `path`, including parents and children.
    fn term_info<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Term, LookupError>>;

    /// Metadata and roots of the vocabulary at `path`.
    fn vocabulary<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<VocabularyDocument, LookupError>>;
}

pub type SharedSource = Arc<dyn VocabularySource>;
