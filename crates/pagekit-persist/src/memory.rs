//! In-process document store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::page::PageId;
use crate::revision::Revision;
use crate::store::{check_expected, DocumentStore, StoredDocument};

/// Document store backed by a map in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: Mutex<HashMap<PageId, StoredDocument>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    /// Check if no pages are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, page: &PageId) -> Result<Option<StoredDocument>> {
        Ok(self.pages.lock().get(page).cloned())
    }

    async fn save(&self, page: &PageId, body: &str, expected: Option<Revision>) -> Result<Revision> {
        let mut pages = self.pages.lock();
        check_expected(page, expected, pages.get(page).map(|d| d.revision))?;
        let stored = StoredDocument::new(body);
        let revision = stored.revision;
        pages.insert(page.clone(), stored);
        tracing::debug!(page = %page, revision = %revision.short(), "saved page");
        Ok(revision)
    }

    async fn delete(&self, page: &PageId) -> Result<bool> {
        Ok(self.pages.lock().remove(page).is_some())
    }

    async fn list(&self) -> Result<Vec<PageId>> {
        let mut ids: Vec<PageId> = self.pages.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;

    fn page(id: &str) -> PageId {
        PageId::new(id).unwrap()
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let rev = store.save(&page("home"), "{}", None).await.unwrap();
        let loaded = store.load(&page("home")).await.unwrap().unwrap();
        assert_eq!(loaded.body, "{}");
        assert_eq!(loaded.revision, rev);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn stale_expected_revision_conflicts() {
        let store = MemoryStore::new();
        let home = page("home");
        let first = store.save(&home, "v1", None).await.unwrap();
        store.save(&home, "v2", Some(first)).await.unwrap();

        let err = store.save(&home, "v3", Some(first)).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.fetch(&home).await.unwrap().body, "v2");
    }

    #[tokio::test]
    async fn unconditional_save_is_last_write_wins() {
        let store = MemoryStore::new();
        let home = page("home");
        store.save(&home, "a", None).await.unwrap();
        store.save(&home, "b", None).await.unwrap();
        assert_eq!(store.fetch(&home).await.unwrap().body, "b");
    }

    #[tokio::test]
    async fn expected_revision_on_missing_page_conflicts() {
        let store = MemoryStore::new();
        let err = store
            .save(&page("new"), "x", Some(Revision::of(b"x")))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Conflict { actual: None, .. }));
    }

    #[tokio::test]
    async fn delete_and_list() {
        let store = MemoryStore::new();
        store.save(&page("b"), "1", None).await.unwrap();
        store.save(&page("a"), "2", None).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![page("a"), page("b")]);

        assert!(store.delete(&page("a")).await.unwrap());
        assert!(!store.delete(&page("a")).await.unwrap());
        assert!(matches!(
            store.fetch(&page("a")).await,
            Err(PersistenceError::NotFound(_))
        ));
    }
}
