//! Error types shared by every component.
//!
//! [`LookupError`] describes why a single REST request produced no usable
//! data. [`BrowseError`] wraps it with the user-facing message the hierarchy
//! tree and info box report through their error callbacks.

use std::borrow::Cow;
use std::time::Duration;

/// Failure of one request against the vocabulary REST API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The request never produced a response (connection refused, reset, …).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("lookup failed with code {0}")]
    Status(u16),
    /// The body was not the JSON shape we expected.
    #[error("malformed response: {0}")]
    Decode(String),
    /// No response arrived within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The request URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl LookupError {
    /// True when no transport was available at all, as opposed to the
    /// server refusing or mangling a request.
    pub fn is_transport(&self) -> bool {
        matches!(self, LookupError::Transport(_) | LookupError::Timeout(_))
    }

    /// Short code used in user-facing messages: the HTTP status when there
    /// is one, otherwise a one-word reason.
    pub fn code(&self) -> Cow<'static, str> {
        match self {
            LookupError::Status(code) => Cow::Owned(code.to_string()),
            LookupError::Transport(_) => Cow::Borrowed("unreachable"),
            LookupError::Decode(_) => Cow::Borrowed("malformed"),
            LookupError::Timeout(_) => Cow::Borrowed("timeout"),
            LookupError::InvalidUrl(_) => Cow::Borrowed("invalid-url"),
        }
    }
}

/// A failed lookup made while browsing, carrying the message shown to the
/// user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowseError {
    #[error("Error: term lookup failed with code {}", .0.code())]
    TermLookupFailed(LookupError),
    #[error("Error: initial term lookup failed with code {}", .0.code())]
    InitialTermLookupFailed(LookupError),
    #[error("Error: children lookup failed with code {}", .0.code())]
    ChildrenLookupFailed(LookupError),
    #[error("Error: vocabulary lookup failed with code {}", .0.code())]
    RootsLookupFailed(LookupError),
}

impl BrowseError {
    pub fn lookup(&self) -> &LookupError {
        match self {
            BrowseError::TermLookupFailed(e)
            | BrowseError::InitialTermLookupFailed(e)
            | BrowseError::ChildrenLookupFailed(e)
            | BrowseError::RootsLookupFailed(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_embed_status_code() {
        let err = BrowseError::ChildrenLookupFailed(LookupError::Status(404));
        assert_eq!(err.to_string(), "Error: children lookup failed with code 404");
        let err = BrowseError::InitialTermLookupFailed(LookupError::Status(500));
        assert_eq!(err.to_string(), "Error: initial term lookup failed with code 500");
    }

    #[test]
    fn timeout_counts_as_transport() {
        assert!(LookupError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(LookupError::Transport("refused".into()).is_transport());
        assert!(!LookupError::Status(403).is_transport());
        assert!(!LookupError::Decode("eof".into()).is_transport());
    }
}
