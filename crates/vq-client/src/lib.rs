//! vq-client — REST vocabulary source for vq.
//!
//! [`RestSource`] implements [`vq_core::VocabularySource`] against the
//! content repository's JSON endpoints using a pooled `hyper` client.

pub mod rest;
mod wire;

pub use rest::RestSource;

/// Errors raised while constructing a client. Request failures are reported
/// per lookup as [`vq_core::LookupError`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base url {0}")]
    InvalidBaseUrl(String),
    #[error("unsupported scheme {0:?}; only http is supported")]
    UnsupportedScheme(String),
}
