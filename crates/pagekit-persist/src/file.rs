//! File-backed document store
//!
//! One `<page_id>.json` file per page under a directory. Saves write a
//! temporary sibling and rename it over the target, so readers never see a
//! half-written document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{PersistenceError, Result};
use crate::page::PageId;
use crate::revision::Revision;
use crate::store::{check_expected, DocumentStore, StoredDocument};

/// Extension of stored page files
pub const PAGE_EXTENSION: &str = "json";

/// Document store backed by a directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    // Serializes read-check-write sequences within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store, creating the directory if needed
    ///
    /// # Errors
    /// Returns `PersistenceError::Io` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PersistenceError::io(&dir, e))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Store directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a page
    #[must_use]
    pub fn path_for(&self, page: &PageId) -> PathBuf {
        self.dir.join(format!("{page}.{PAGE_EXTENSION}"))
    }

    async fn read(&self, page: &PageId) -> Result<Option<StoredDocument>> {
        let path = self.path_for(page);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let body =
                    String::from_utf8(bytes).map_err(|_| PersistenceError::Encoding(page.clone()))?;
                Ok(Some(StoredDocument::new(body)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::io(&path, e)),
        }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, page: &PageId) -> Result<Option<StoredDocument>> {
        self.read(page).await
    }

    async fn save(&self, page: &PageId, body: &str, expected: Option<Revision>) -> Result<Revision> {
        let _guard = self.write_lock.lock().await;
        let current = self.read(page).await?.map(|d| d.revision);
        check_expected(page, expected, current)?;

        let path = self.path_for(page);
        let tmp = self.dir.join(format!(".{page}.{PAGE_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| PersistenceError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PersistenceError::io(&path, e))?;

        let revision = Revision::of(body.as_bytes());
        tracing::debug!(page = %page, revision = %revision.short(), path = %path.display(), "saved page");
        Ok(revision)
    }

    async fn delete(&self, page: &PageId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(page);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PersistenceError::io(&path, e)),
        }
    }

    async fn list(&self) -> Result<Vec<PageId>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| PersistenceError::io(&self.dir, e))?;
        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PersistenceError::io(&self.dir, e))?
        {
            let name = entry.file_name();
            let Some(stem) = name
                .to_str()
                .and_then(|n| n.strip_suffix(&format!(".{PAGE_EXTENSION}")))
            else {
                continue;
            };
            if let Ok(id) = PageId::new(stem) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str) -> PageId {
        PageId::new(id).unwrap()
    }

    #[tokio::test]
    async fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let rev = store.save(&page("home"), "{\"version\":1}", None).await.unwrap();
        assert!(store.path_for(&page("home")).exists());

        let reopened = FileStore::open(dir.path()).await.unwrap();
        let loaded = reopened.fetch(&page("home")).await.unwrap();
        assert_eq!(loaded.body, "{\"version\":1}");
        assert_eq!(loaded.revision, rev);
    }

    #[tokio::test]
    async fn conflict_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let home = page("home");

        let first = store.save(&home, "one", None).await.unwrap();
        store.save(&home, "two", Some(first)).await.unwrap();
        let err = store.save(&home, "three", Some(first)).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.fetch(&home).await.unwrap().body, "two");
    }

    #[tokio::test]
    async fn list_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("bad name.json"), "x").unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.save(&page("b"), "1", None).await.unwrap();
        store.save(&page("a"), "2", None).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![page("a"), page("b")]);
    }

    #[tokio::test]
    async fn delete_missing_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(!store.delete(&page("ghost")).await.unwrap());
        assert!(store.load(&page("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_utf8_body_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin.json"), [0xff, 0xfe]).unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.load(&page("bin")).await,
            Err(PersistenceError::Encoding(_))
        ));
    }
}
