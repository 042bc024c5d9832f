//! vq: controlled-vocabulary search and hierarchy browser.
//!
//! Terminal front end for picking terms out of ontology-style vocabularies
//! served over REST. This crate re-exports the three layers so integration
//! tests and benches can import them from one place.
//!
//! # Architecture
//!
//! ```text
//! vq-tui ──► vq-core ──► VocabularySource ◄── vq-client (REST)
//! ```
//!
//! All network results travel back to the UI over `tokio` channels; the UI
//! task owns every piece of state.

pub use vq_client as client;
pub use vq_core as core;
pub use vq_tui as tui;
