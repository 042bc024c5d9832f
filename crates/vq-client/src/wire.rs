//! JSON shapes served by the vocabulary REST API.
//!
//! Field names follow the content repository (`@path`, `identifier`,
//! `lfs:hasChildren`). Every field is optional on the wire; the display
//! fallbacks are resolved here so the core never sees raw payloads.

use serde::Deserialize;

use vq_core::{Suggestion, Term, TermSummary, VocabularyDocument};

/// A string or a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

fn first_non_empty(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub rows: Vec<WireRow>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireRow {
    #[serde(rename = "@path", default)]
    pub path: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "lfs:hasChildren", alias = "hasChildren", default)]
    pub has_children: Option<bool>,
}

impl WireRow {
    fn identifier(&self) -> String {
        first_non_empty(&[&self.identifier, &self.id]).unwrap_or_default()
    }

    /// `label`, then `name`, then `identifier`.
    fn display_name(&self) -> String {
        first_non_empty(&[&self.label, &self.name, &self.identifier]).unwrap_or_default()
    }

    /// Parent listings additionally fall back to `id`.
    fn parent_name(&self) -> String {
        first_non_empty(&[&self.label, &self.name, &self.identifier, &self.id])
            .unwrap_or_default()
    }

    pub fn into_suggestion(self, vocabulary: &str) -> Suggestion {
        Suggestion {
            id: self.identifier(),
            name: self.display_name(),
            path: self.path,
            vocabulary: vocabulary.to_string(),
        }
    }

    pub fn into_summary(self) -> TermSummary {
        TermSummary {
            id: self.identifier(),
            label: self.display_name(),
            path: self.path,
            has_children: self.has_children,
        }
    }

    fn into_parent(self) -> TermSummary {
        TermSummary {
            id: self.identifier(),
            label: self.parent_name(),
            path: self.path,
            has_children: self.has_children,
        }
    }
}

// ---------------------------------------------------------------------------
// Term info
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InfoResponse {
    #[serde(flatten)]
    pub row: WireRow,
    #[serde(default)]
    pub def: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub synonyms: Option<OneOrMany>,
    #[serde(default)]
    pub has_exact_synonym: Option<OneOrMany>,
    #[serde(default)]
    pub parents: Vec<WireRow>,
    #[serde(rename = "lfs:children", alias = "children", default)]
    pub children: Option<Vec<WireRow>>,
}

impl InfoResponse {
    pub fn into_term(self) -> Term {
        let definition = first_non_empty(&[&self.def, &self.description, &self.definition]);
        // `synonyms` wins whenever present, even if empty.
        let synonyms = self
            .synonyms
            .or(self.has_exact_synonym)
            .map(OneOrMany::into_vec)
            .unwrap_or_default();
        Term {
            id: self.row.identifier(),
            label: self.row.display_name(),
            has_children: self.row.has_children,
            path: self.row.path,
            definition,
            synonyms,
            parents: self.parents.into_iter().map(WireRow::into_parent).collect(),
            children: self
                .children
                .map(|rows| rows.into_iter().map(WireRow::into_summary).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VocabularyResponse {
    #[serde(alias = "acronym", default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "website", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub roots: Vec<WireRow>,
}

impl VocabularyResponse {
    pub fn into_document(self) -> VocabularyDocument {
        VocabularyDocument {
            acronym: self.identifier.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.filter(|d| !d.is_empty()),
            url: self.url.filter(|u| !u.is_empty()),
            roots: self.roots.into_iter().map(WireRow::into_summary).collect(),
        }
    }
}
