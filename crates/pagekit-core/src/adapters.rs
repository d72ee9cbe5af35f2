//! External adapter contracts
//!
//! The engine calls these services but does not implement them. Each call is
//! bounded by the configured timeout; an elapsed timeout becomes
//! [`AdapterError::Timeout`].

use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdapterError;

/// File handed to the upload adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name
    pub name: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create upload payload
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Result of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    /// Opaque reference persisted in props
    pub reference: String,
    /// Render-time preview location, never persisted
    pub preview_url: String,
}

/// One search result
///
/// Selected results are copied verbatim into instance props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOption {
    /// Catalog id
    pub id: String,
    /// Display label
    pub label: String,
    /// Extra data returned by the catalog
    #[serde(default)]
    pub metadata: Value,
}

impl SearchOption {
    /// Create search option
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, metadata: Value) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            metadata,
        }
    }
}

/// Catalog searched by an option-search adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    /// Tracks
    Tracks,
    /// Playlists
    Playlists,
    /// Products
    Products,
}

impl SearchKind {
    /// Custom editor id of fields backed by this catalog
    #[must_use]
    pub const fn editor(self) -> &'static str {
        match self {
            Self::Tracks => "track-search",
            Self::Playlists => "playlist-search",
            Self::Products => "product-search",
        }
    }

    /// Catalog behind a custom editor id
    #[must_use]
    pub fn from_editor(editor: &str) -> Option<Self> {
        [Self::Tracks, Self::Playlists, Self::Products]
            .into_iter()
            .find(|kind| kind.editor() == editor)
    }
}

/// Resolved embed metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedMetadata {
    /// Markup to place in the page
    pub markup: String,
    /// Title of the embedded resource
    pub title: String,
}

/// Image and file upload service
#[async_trait]
pub trait UploadAdapter: Send + Sync {
    /// Store a file, returning its reference
    async fn upload(&self, file: UploadFile) -> Result<Uploaded, AdapterError>;
}

/// Catalog search service
#[async_trait]
pub trait OptionSearch: Send + Sync {
    /// Search the catalog
    async fn search(&self, query: &str) -> Result<Vec<SearchOption>, AdapterError>;
}

/// oEmbed-style metadata service
#[async_trait]
pub trait EmbedResolver: Send + Sync {
    /// Resolve a URL into embeddable markup
    async fn resolve(&self, url: &str) -> Result<EmbedMetadata, AdapterError>;
}

/// The set of adapters available to a session
#[derive(Clone, Default)]
pub struct Adapters {
    upload: Option<Arc<dyn UploadAdapter>>,
    tracks: Option<Arc<dyn OptionSearch>>,
    playlists: Option<Arc<dyn OptionSearch>>,
    products: Option<Arc<dyn OptionSearch>>,
    embed: Option<Arc<dyn EmbedResolver>>,
}

impl Debug for Adapters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapters")
            .field("upload", &self.upload.is_some())
            .field("tracks", &self.tracks.is_some())
            .field("playlists", &self.playlists.is_some())
            .field("products", &self.products.is_some())
            .field("embed", &self.embed.is_some())
            .finish()
    }
}

impl Adapters {
    /// Create empty adapter set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set upload adapter
    #[must_use]
    pub fn with_upload(mut self, adapter: Arc<dyn UploadAdapter>) -> Self {
        self.upload = Some(adapter);
        self
    }

    /// Set search adapter for one catalog
    #[must_use]
    pub fn with_search(mut self, kind: SearchKind, adapter: Arc<dyn OptionSearch>) -> Self {
        let slot = match kind {
            SearchKind::Tracks => &mut self.tracks,
            SearchKind::Playlists => &mut self.playlists,
            SearchKind::Products => &mut self.products,
        };
        *slot = Some(adapter);
        self
    }

    /// Set embed resolver
    #[must_use]
    pub fn with_embed(mut self, adapter: Arc<dyn EmbedResolver>) -> Self {
        self.embed = Some(adapter);
        self
    }

    /// Upload adapter
    ///
    /// # Errors
    /// Returns `AdapterError::Unavailable` if none is configured.
    pub fn upload(&self) -> Result<Arc<dyn UploadAdapter>, AdapterError> {
        self.upload
            .clone()
            .ok_or_else(|| AdapterError::Unavailable("no upload adapter".into()))
    }

    /// Search adapter for a catalog
    ///
    /// # Errors
    /// Returns `AdapterError::Unavailable` if none is configured.
    pub fn search(&self, kind: SearchKind) -> Result<Arc<dyn OptionSearch>, AdapterError> {
        let adapter = match kind {
            SearchKind::Tracks => &self.tracks,
            SearchKind::Playlists => &self.playlists,
            SearchKind::Products => &self.products,
        };
        adapter
            .clone()
            .ok_or_else(|| AdapterError::Unavailable(format!("no {} adapter", kind.editor())))
    }

    /// Embed resolver
    ///
    /// # Errors
    /// Returns `AdapterError::Unavailable` if none is configured.
    pub fn embed(&self) -> Result<Arc<dyn EmbedResolver>, AdapterError> {
        self.embed
            .clone()
            .ok_or_else(|| AdapterError::Unavailable("no embed resolver".into()))
    }
}

/// Await an adapter call, failing with `AdapterError::Timeout` after `limit`
///
/// # Errors
/// The call's own error, or `AdapterError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(
            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}
