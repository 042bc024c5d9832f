//! Shared test utilities for vq integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The scripted source is deterministic under
//! `tokio::time::pause()`, so debounce and delay tests never sleep for real.

pub mod builders;
pub mod fake_vocab_api;
pub mod fixtures;
pub mod scripted_source;

pub use builders::*;
pub use fixtures::*;
pub use scripted_source::*;
