//! Test builders: ergonomic constructors for terms, summaries and
//! suggestions.
//!
//! These are for readability in assertions, not production use.

use vq::core::{Suggestion, Term, TermSummary, VocabularyDocument};

/// Repository path of `id` inside vocabulary `acronym`, the way the content
/// repository lays terms out: `HP:0001250` becomes `/Vocabularies/HP/HP0001250`.
pub fn term_path(acronym: &str, id: &str) -> String {
    format!("/Vocabularies/{acronym}/{}", id.replace(':', ""))
}

pub fn summary(acronym: &str, id: &str, label: &str) -> TermSummary {
    TermSummary::new(id, term_path(acronym, id), label)
}

pub fn suggestion(acronym: &str, id: &str, name: &str) -> Suggestion {
    Suggestion {
        id: id.to_string(),
        path: term_path(acronym, id),
        name: name.to_string(),
        vocabulary: acronym.to_string(),
    }
}

// ---------------------------------------------------------------------------
// TermBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Term`] fixtures.
///
/// ```rust,no_run
/// let term = TermBuilder::new("HP", "HP:0001250", "Seizure")
///     .definition("A sudden episode of abnormal neuronal activity.")
///     .parent("HP:0012638", "Abnormal nervous system physiology")
///     .children(&[("HP:0007359", "Focal-onset seizure")])
///     .build();
/// ```
pub struct TermBuilder {
    acronym: String,
    term: Term,
}

impl TermBuilder {
    pub fn new(acronym: &str, id: &str, label: &str) -> Self {
        Self {
            acronym: acronym.to_string(),
            term: Term {
                id: id.to_string(),
                path: term_path(acronym, id),
                label: label.to_string(),
                ..Term::default()
            },
        }
    }

    pub fn definition(mut self, definition: &str) -> Self {
        self.term.definition = Some(definition.to_string());
        self
    }

    pub fn synonym(mut self, synonym: &str) -> Self {
        self.term.synonyms.push(synonym.to_string());
        self
    }

    pub fn parent(mut self, id: &str, label: &str) -> Self {
        self.term.parents.push(summary(&self.acronym, id, label));
        self
    }

    /// Embed children in the info response. Each child is marked as having
    /// children of its own.
    pub fn children(mut self, children: &[(&str, &str)]) -> Self {
        let acronym = self.acronym.clone();
        self.term.children = Some(
            children
                .iter()
                .map(|(id, label)| summary(&acronym, id, label).with_has_children(true))
                .collect(),
        );
        self.term.has_children = Some(!children.is_empty());
        self
    }

    /// Mark the term as a leaf.
    pub fn leaf(mut self) -> Self {
        self.term.has_children = Some(false);
        self
    }

    pub fn has_children(mut self, has_children: bool) -> Self {
        self.term.has_children = Some(has_children);
        self
    }

    pub fn build(self) -> Term {
        self.term
    }
}

pub fn vocabulary_doc(acronym: &str, name: &str, roots: Vec<TermSummary>) -> VocabularyDocument {
    VocabularyDocument {
        acronym: acronym.to_string(),
        name: name.to_string(),
        description: Some(format!("{name} description")),
        url: Some(format!("https://example.org/{}", acronym.to_lowercase())),
        roots,
    }
}
