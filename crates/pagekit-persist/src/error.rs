//! Persistence errors

use std::path::{Path, PathBuf};

use crate::page::PageId;
use crate::revision::Revision;

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Stored revision differs from the one the caller edited
    #[error("conflict saving '{page}': expected revision {expected}, found {}",
        .actual.map_or_else(|| "none".to_string(), |r| r.short()))]
    Conflict {
        /// Page being saved
        page: PageId,
        /// Revision the caller loaded
        expected: Revision,
        /// Revision in the store, if any
        actual: Option<Revision>,
    },

    /// No document stored under this page id
    #[error("page not found: '{0}'")]
    NotFound(PageId),

    /// Page id outside `[A-Za-z0-9_-]{1,128}`
    #[error("invalid page id: '{0}'")]
    InvalidPageId(String),

    /// Revision text is not a 64-digit hex hash
    #[error("invalid revision: '{0}'")]
    InvalidRevision(String),

    /// Stored bytes are not UTF-8 text
    #[error("stored document for '{0}' is not valid utf-8")]
    Encoding(PageId),

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },
}

impl PersistenceError {
    /// Wrap an io error with the path it concerns
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this is a revision conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, PersistenceError>;
