//! Multi-source query fan-out.
//!
//! One input string is sent to every configured vocabulary in turn. The
//! source queue is consumed from the back, so the last-configured vocabulary
//! is queried first and its rows lead the merged list. Requests are strictly
//! sequential: the next source is only asked once the previous one answered.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::LookupError;
use crate::source::{SharedSource, SuggestQuery};
use crate::types::Suggestion;

/// Default cap on the merged result list.
pub const MAX_RESULTS: usize = 10;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static regex must compile"));

/// Replace every character that is neither a word character nor whitespace
/// with a space.
pub fn normalize_input(input: &str) -> String {
    NON_WORD.replace_all(input, " ").into_owned()
}

/// Build the category filter for one source: a disjunction of
/// `term_category:` clauses, or `None` when there are no categories.
pub fn filter_expression(categories: &[String]) -> Option<String> {
    if categories.is_empty() {
        return None;
    }
    let clauses: Vec<String> = categories
        .iter()
        .map(|c| format!("term_category:{c}"))
        .collect();
    Some(format!("({})", clauses.join(" OR ")))
}

/// Result of one fan-out run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutOutcome {
    /// Merged rows, capped.
    pub rows: Vec<Suggestion>,
    /// Sources that failed, in query order.
    pub failures: Vec<(String, LookupError)>,
    /// Number of requests issued.
    pub queried: usize,
}

impl FanOutOutcome {
    /// True when every queried source failed for lack of a transport.
    /// A source that answered with an error status does not count.
    pub fn is_unavailable(&self) -> bool {
        self.queried > 0
            && self.failures.len() == self.queried
            && self.failures.iter().all(|(_, e)| e.is_transport())
    }
}

/// Queries an ordered set of vocabularies and merges their rows.
pub struct FanOut {
    source: SharedSource,
    filters: HashMap<String, Vec<String>>,
    max_results: usize,
}

impl FanOut {
    pub fn new(source: SharedSource) -> Self {
        Self {
            source,
            filters: HashMap::new(),
            max_results: MAX_RESULTS,
        }
    }

    /// Per-vocabulary category filters, keyed by acronym (case-insensitive).
    pub fn with_filters(mut self, filters: HashMap<String, Vec<String>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn filter_for(&self, vocabulary: &str) -> Option<String> {
        self.filters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(vocabulary))
            .and_then(|(_, categories)| filter_expression(categories))
    }

    /// Pop sources off `queue` one at a time, concatenating their rows.
    ///
    /// A failing source contributes nothing; the remaining sources are still
    /// queried.
    pub async fn run(&self, mut queue: Vec<String>, input: &str) -> FanOutOutcome {
        let text = normalize_input(input);
        let mut outcome = FanOutOutcome::default();

        while let Some(vocabulary) = queue.pop() {
            let query = SuggestQuery {
                filter: self.filter_for(&vocabulary),
                vocabulary,
                text: text.clone(),
            };
            outcome.queried += 1;
            match self.source.suggest(&query).await {
                Ok(mut rows) => {
                    tracing::debug!(
                        vocabulary = %query.vocabulary,
                        rows = rows.len(),
                        "fan-out: source answered"
                    );
                    outcome.rows.append(&mut rows);
                }
                Err(err) => {
                    tracing::warn!(vocabulary = %query.vocabulary, error = %err, "fan-out: source failed");
                    outcome.failures.push((query.vocabulary, err));
                }
            }
        }

        outcome.rows.truncate(self.max_results);
        outcome
    }
}
