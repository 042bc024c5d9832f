//! Term info resolver.
//!
//! Resolves the detail card for one term and, independently, the metadata
//! of the vocabulary it belongs to. Vocabulary metadata is cached by
//! vocabulary path for the life of the resolver, so each distinct
//! vocabulary is fetched at most once per session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::error::{BrowseError, LookupError};
use crate::source::SharedSource;
use crate::types::{vocabulary_path_of, Term, Vocabulary};

/// A resolved info card.
#[derive(Debug, Clone)]
pub struct TermDetail {
    pub term: Term,
    /// `None` when the vocabulary lookup failed; the card then shows the
    /// term with blank vocabulary metadata.
    pub vocabulary: Option<Vocabulary>,
}

#[derive(Clone)]
pub struct TermInfoResolver {
    source: SharedSource,
    /// One cell per vocabulary path. The map lock is only held to find or
    /// insert a cell; fetches run on the cell.
    vocabularies: Arc<Mutex<HashMap<String, Arc<OnceCell<Vocabulary>>>>>,
}

impl TermInfoResolver {
    pub fn new(source: SharedSource) -> Self {
        Self {
            source,
            vocabularies: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch the detail of the term at `path`. Failures are not retried.
    pub async fn fetch_term_info(&self, path: &str) -> Result<Term, BrowseError> {
        tracing::debug!(path, "info: fetching term");
        self.source
            .term_info(path)
            .await
            .map_err(BrowseError::TermLookupFailed)
    }

    /// Vocabulary metadata for `vocab_path`, fetched only on a cache miss.
    ///
    /// Concurrent requests for the same vocabulary share one network call;
    /// requests for different vocabularies do not wait on each other. A
    /// failed fetch leaves the cell empty so the next request tries again.
    pub async fn fetch_vocabulary_info(&self, vocab_path: &str) -> Result<Vocabulary, LookupError> {
        let cell = self.vocabulary_cell(vocab_path).await;
        cell.get_or_try_init(|| async {
            tracing::debug!(vocab_path, "info: fetching vocabulary metadata");
            let doc = self.source.vocabulary(vocab_path).await?;
            Ok(Vocabulary::from_document(vocab_path, doc))
        })
        .await
        .cloned()
    }

    /// Cached vocabulary metadata, without fetching.
    pub async fn cached_vocabulary(&self, vocab_path: &str) -> Option<Vocabulary> {
        let cell = self.vocabularies.lock().await.get(vocab_path).cloned()?;
        cell.get().cloned()
    }

    async fn vocabulary_cell(&self, vocab_path: &str) -> Arc<OnceCell<Vocabulary>> {
        self.vocabularies
            .lock()
            .await
            .entry(vocab_path.to_string())
            .or_default()
            .clone()
    }

    /// Fetch the term and its vocabulary concurrently.
    ///
    /// The term lookup decides success; a failed vocabulary lookup only
    /// blanks the metadata.
    pub async fn resolve(&self, path: &str) -> Result<TermDetail, BrowseError> {
        let vocabulary = async {
            let vocab_path = vocabulary_path_of(path)?;
            match self.fetch_vocabulary_info(vocab_path).await {
                Ok(vocabulary) => Some(vocabulary),
                Err(err) => {
                    tracing::warn!(vocab_path, error = %err, "info: vocabulary lookup failed");
                    None
                }
            }
        };
        let (term, vocabulary) = tokio::join!(self.fetch_term_info(path), vocabulary);
        Ok(TermDetail {
            term: term?,
            vocabulary,
        })
    }
}
