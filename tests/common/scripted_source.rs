//! In-memory [`VocabularySource`] with scripted answers, delays and failures.
//!
//! Every call is recorded in order so harnesses can assert on how many
//! requests were issued and to which vocabulary or path. Unscripted lookups
//! answer `404`. The answer is fixed when the call starts, so re-scripting a
//! lookup while a delayed call is pending does not change what it returns.
//!
//! # Example
//!
//! ```rust,no_run
//! let source = ScriptedSource::new()
//!     .suggest("HP", vec![suggestion("HP", "HP:0001250", "Seizure")])
//!     .delay_suggest("HP", Duration::from_millis(300))
//!     .fail_suggest("ORDO", LookupError::Status(500))
//!     .shared();
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use vq::core::{
    LookupError, SharedSource, Suggestion, SuggestQuery, Term, VocabularyDocument,
    VocabularySource,
};

/// One recorded call against the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Suggest(SuggestQuery),
    TermInfo(String),
    Vocabulary(String),
}

#[derive(Default)]
struct Script {
    suggestions: HashMap<String, Result<Vec<Suggestion>, LookupError>>,
    terms: HashMap<String, Result<Term, LookupError>>,
    vocabularies: HashMap<String, Result<VocabularyDocument, LookupError>>,
    /// Keyed by vocabulary acronym or by path.
    delays: HashMap<String, Duration>,
}

#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    // -----------------------------------------------------------------------
    // Scripting
    // -----------------------------------------------------------------------

    pub fn suggest(self, vocabulary: &str, rows: Vec<Suggestion>) -> Self {
        self.set_suggest(vocabulary, Ok(rows));
        self
    }

    pub fn fail_suggest(self, vocabulary: &str, err: LookupError) -> Self {
        self.set_suggest(vocabulary, Err(err));
        self
    }

    pub fn delay_suggest(self, vocabulary: &str, delay: Duration) -> Self {
        self.set_delay(vocabulary, delay);
        self
    }

    pub fn term(self, term: Term) -> Self {
        let path = term.path.clone();
        self.set_term(&path, Ok(term));
        self
    }

    pub fn fail_term(self, path: &str, err: LookupError) -> Self {
        self.set_term(path, Err(err));
        self
    }

    pub fn vocabulary(self, path: &str, doc: VocabularyDocument) -> Self {
        self.set_vocabulary(path, Ok(doc));
        self
    }

    pub fn fail_vocabulary(self, path: &str, err: LookupError) -> Self {
        self.set_vocabulary(path, Err(err));
        self
    }

    pub fn delay_path(self, path: &str, delay: Duration) -> Self {
        self.set_delay(path, delay);
        self
    }

    /// Re-script a lookup after the source has been shared.
    pub fn set_suggest(&self, vocabulary: &str, result: Result<Vec<Suggestion>, LookupError>) {
        self.script
            .lock()
            .unwrap()
            .suggestions
            .insert(vocabulary.to_string(), result);
    }

    pub fn set_term(&self, path: &str, result: Result<Term, LookupError>) {
        self.script
            .lock()
            .unwrap()
            .terms
            .insert(path.to_string(), result);
    }

    pub fn set_vocabulary(&self, path: &str, result: Result<VocabularyDocument, LookupError>) {
        self.script
            .lock()
            .unwrap()
            .vocabularies
            .insert(path.to_string(), result);
    }

    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(key.to_string(), delay);
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Vocabularies asked for suggestions, in request order.
    pub fn suggest_order(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Suggest(q) => Some(q.vocabulary),
                _ => None,
            })
            .collect()
    }

    pub fn suggest_queries(&self) -> Vec<SuggestQuery> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Suggest(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn term_info_calls(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::TermInfo(p) if p == path))
            .count()
    }

    pub fn vocabulary_calls(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Vocabulary(p) if p == path))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn delay_for(&self, key: &str) -> Option<Duration> {
        self.script.lock().unwrap().delays.get(key).copied()
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

impl VocabularySource for ScriptedSource {
    fn suggest<'a>(
        &'a self,
        query: &'a SuggestQuery,
    ) -> BoxFuture<'a, Result<Vec<Suggestion>, LookupError>> {
        async move {
            self.record(Call::Suggest(query.clone()));
            let result = self
                .script
                .lock()
                .unwrap()
                .suggestions
                .get(&query.vocabulary)
                .cloned()
                .unwrap_or(Err(LookupError::Status(404)));
            pause(self.delay_for(&query.vocabulary)).await;
            result
        }
        .boxed()
    }

    fn term_info<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Term, LookupError>> {
        async move {
            self.record(Call::TermInfo(path.to_string()));
            let result = self
                .script
                .lock()
                .unwrap()
                .terms
                .get(path)
                .cloned()
                .unwrap_or(Err(LookupError::Status(404)));
            pause(self.delay_for(path)).await;
            result
        }
        .boxed()
    }

    fn vocabulary<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<VocabularyDocument, LookupError>> {
        async move {
            self.record(Call::Vocabulary(path.to_string()));
            let result = self
                .script
                .lock()
                .unwrap()
                .vocabularies
                .get(path)
                .cloned()
                .unwrap_or(Err(LookupError::Status(404)));
            pause(self.delay_for(path)).await;
            result
        }
        .boxed()
    }
}

/// Erase the concrete type for components that take a [`SharedSource`].
pub fn as_shared(source: &Arc<ScriptedSource>) -> SharedSource {
    Arc::clone(source) as SharedSource
}
