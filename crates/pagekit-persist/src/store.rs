//! Document store contract
//!
//! Stores hold opaque serialized documents keyed by [`PageId`]. Writes are
//! whole-document replacements. Passing the revision the caller loaded as
//! `expected` turns a save into a compare-and-swap; passing `None` is a
//! plain last-write-wins overwrite.

use async_trait::async_trait;

use crate::error::{PersistenceError, Result};
use crate::page::PageId;
use crate::revision::Revision;

/// A stored body with its revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Serialized document text
    pub body: String,
    /// Revision of `body`
    pub revision: Revision,
}

impl StoredDocument {
    /// Wrap a body, computing its revision
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        let body = body.into();
        let revision = Revision::of(body.as_bytes());
        Self { body, revision }
    }
}

/// Key-value storage of serialized documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a page, `None` if nothing is stored
    async fn load(&self, page: &PageId) -> Result<Option<StoredDocument>>;

    /// Replace a page's body, returning the new revision
    ///
    /// With `expected = Some(r)` the save fails with
    /// `PersistenceError::Conflict` unless the stored revision is `r`.
    async fn save(&self, page: &PageId, body: &str, expected: Option<Revision>) -> Result<Revision>;

    /// Delete a page, returning whether it existed
    async fn delete(&self, page: &PageId) -> Result<bool>;

    /// All stored page ids in order
    async fn list(&self) -> Result<Vec<PageId>>;

    /// Load a page that must exist
    async fn fetch(&self, page: &PageId) -> Result<StoredDocument> {
        self.load(page)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(page.clone()))
    }
}

/// Compare the stored revision with the one the caller expects
pub(crate) fn check_expected(
    page: &PageId,
    expected: Option<Revision>,
    actual: Option<Revision>,
) -> Result<()> {
    match expected {
        Some(expected) if actual != Some(expected) => {
            let found = actual.map_or_else(|| "none".to_string(), |r| r.short());
            tracing::warn!(
                page = %page,
                expected = %expected.short(),
                actual = %found,
                "persistence conflict"
            );
            Err(PersistenceError::Conflict {
                page: page.clone(),
                expected,
                actual,
            })
        }
        _ => Ok(()),
    }
}
