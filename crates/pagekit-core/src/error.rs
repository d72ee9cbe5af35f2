//! Engine errors
//!
//! Errors stay at the smallest scope that can absorb them. A field commit
//! error leaves the field's prior value; an adapter error only marks the
//! field as failed; a persistence conflict rejects the whole save. None of
//! them abort unrelated edits.

use pagekit_document::{CodecError, InstanceId, TreeError};
use pagekit_persist::PersistenceError;
use pagekit_registry::RegistryError;
use pagekit_schema::SchemaError;

use crate::config::ConfigError;

/// External adapter failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Adapter missing or its service unreachable
    #[error("adapter unavailable: {0}")]
    Unavailable(String),

    /// Service refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// No response within the configured timeout
    #[error("adapter timed out after {0}ms")]
    Timeout(u64),

    /// Request was abandoned
    #[error("adapter request cancelled")]
    Cancelled,
}

impl AdapterError {
    /// Whether retrying the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Any engine failure
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Field value rejected
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Registry lookup or construction failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Tree mutation rejected
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Document could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Adapter call failed
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Storage failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration invalid
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Block instance is not in the document
    #[error("block instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// Save requested before a page id was attached
    #[error("session has no page id")]
    NoPage,
}

impl EngineError {
    /// Whether this is a save conflict the caller must resolve
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.is_conflict())
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_adapter_errors() {
        assert!(AdapterError::Timeout(10).is_retryable());
        assert!(AdapterError::Unavailable("down".into()).is_retryable());
        assert!(!AdapterError::Rejected("too large".into()).is_retryable());
        assert!(!AdapterError::Cancelled.is_retryable());
    }

    #[test]
    fn schema_errors_convert() {
        let err: EngineError = SchemaError::NotResponsive.into();
        assert!(matches!(err, EngineError::Schema(_)));
        assert!(!err.is_conflict());
    }
}
