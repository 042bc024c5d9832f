//! vq-core — vocabulary search and hierarchy browsing core.
//!
//! This crate owns the domain types and the four cooperating components that
//! turn keystrokes into term suggestions and term selections into a navigable
//! hierarchy, plus the [`VocabularySource`] seam they all talk through.
//!
//! # Architecture
//!
//! ```text
//! keystrokes ──► SuggestClient ──► FanOut ──► VocabularySource
//!                     │
//!                     ▼
//!              TermInfoResolver ──► VocabularyTree ──► VocabularySource
//! ```
//!
//! Network calls are the only suspension points. Every component runs its
//! requests on spawned `tokio` tasks and receives the results back through a
//! channel, so stale responses can be dropped at apply time.

pub mod anchors;
pub mod config;
pub mod error;
pub mod fanout;
pub mod info;
pub mod selection;
pub mod source;
pub mod suggest;
pub mod tree;
pub mod types;

pub use anchors::AnchorRegistry;
pub use error::{BrowseError, LookupError};
pub use fanout::{FanOut, FanOutOutcome};
pub use info::{TermDetail, TermInfoResolver};
pub use selection::{SelectedTerm, SelectionDiff, SelectionMode, SelectionTracker};
pub use source::{SharedSource, SuggestQuery, VocabularySource};
pub use suggest::{SuggestClient, SuggestMessage, SuggestState, SuggestionRow};
pub use tree::{
    BranchNode, BranchRole, BranchState, NodeKey, TreeMessage, TreeOptions, VocabularyTree,
};
pub use types::{Suggestion, Term, TermSummary, Vocabulary, VocabularyDocument};
