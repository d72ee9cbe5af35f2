//! Testing utilities for the pagekit workspace
//!
//! Shared fixtures (registry, documents, sessions) and fake adapters. The
//! gated upload holds its response until released, so tests can change the
//! document while a request is in flight.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pagekit_core::{
    AdapterError, Adapters, EditorSession, EmbedMetadata, EmbedResolver, EngineConfig, OptionSearch,
    SearchKind, SearchOption, SharedSession, UploadAdapter, UploadFile, Uploaded,
};
use pagekit_document::{Document, InstanceId, ZoneId};
use pagekit_registry::library::{self, ROOT_SLOT};
use pagekit_registry::Registry;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

pub fn standard_registry() -> Arc<Registry> {
    Arc::new(library::standard().unwrap())
}

pub fn root_zone() -> ZoneId {
    ZoneId::root(ROOT_SLOT)
}

pub fn setup_session() -> EditorSession {
    EditorSession::new(standard_registry(), EngineConfig::default())
}

pub fn setup_shared_session() -> SharedSession {
    setup_session().shared()
}

/// Document with a titled Section holding a Heading and an Image
pub struct SampleDocument {
    pub document: Document,
    pub section: InstanceId,
    pub heading: InstanceId,
    pub image: InstanceId,
}

pub fn create_sample_document(registry: &Registry) -> SampleDocument {
    let mut document = Document::new(registry);
    let section = document
        .insert_new(registry, &root_zone(), 0, "Section")
        .unwrap();
    document
        .set_prop(registry, section, "title", json!({"base": "Hello", "medium": "Hi"}))
        .unwrap();
    let content = ZoneId::of(section, "content");
    let heading = document.insert_new(registry, &content, 0, "Heading").unwrap();
    document
        .set_prop(registry, heading, "text", json!("Welcome"))
        .unwrap();
    let image = document.insert_new(registry, &content, 1, "Image").unwrap();
    SampleDocument {
        document,
        section,
        heading,
        image,
    }
}

pub fn create_option(id: &str, label: &str) -> SearchOption {
    SearchOption::new(id, label, json!({"source": "fake"}))
}

/// Upload that waits for [`GatedUpload::release`] before answering
#[derive(Default)]
pub struct GatedUpload {
    started: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedUpload {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until an upload call is in flight
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one waiting upload answer
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadAdapter for GatedUpload {
    async fn upload(&self, file: UploadFile) -> Result<Uploaded, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.gate.notified().await;
        Ok(Uploaded {
            reference: format!("ref-{}", file.name),
            preview_url: format!("https://cdn.test/{}", file.name),
        })
    }
}

/// Upload that answers immediately
pub struct InstantUpload;

#[async_trait]
impl UploadAdapter for InstantUpload {
    async fn upload(&self, file: UploadFile) -> Result<Uploaded, AdapterError> {
        Ok(Uploaded {
            reference: format!("ref-{}", file.name),
            preview_url: format!("https://cdn.test/{}", file.name),
        })
    }
}

/// Upload that always fails with the given error
pub struct FailingUpload(pub AdapterError);

#[async_trait]
impl UploadAdapter for FailingUpload {
    async fn upload(&self, _file: UploadFile) -> Result<Uploaded, AdapterError> {
        Err(self.0.clone())
    }
}

/// Catalog search over a fixed option list, recording every query
pub struct FakeSearch {
    options: Vec<SearchOption>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new(options: Vec<SearchOption>) -> Arc<Self> {
        Arc::new(Self {
            options,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl OptionSearch for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchOption>, AdapterError> {
        self.queries.lock().push(query.to_string());
        let needle = query.to_lowercase();
        Ok(self
            .options
            .iter()
            .filter(|option| option.label.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

/// Embed resolver answering after an optional delay
pub struct FakeEmbed {
    delay: Duration,
}

impl FakeEmbed {
    pub fn new() -> Arc<Self> {
        Self::slow(Duration::ZERO)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

#[async_trait]
impl EmbedResolver for FakeEmbed {
    async fn resolve(&self, url: &str) -> Result<EmbedMetadata, AdapterError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !url.starts_with("https://") {
            return Err(AdapterError::Rejected(format!("unsupported url {url}")));
        }
        Ok(EmbedMetadata {
            markup: format!("<iframe src=\"{url}\"></iframe>"),
            title: "Embedded".to_string(),
        })
    }
}

/// Adapters backed by the instant fakes
pub fn create_adapters() -> Adapters {
    let tracks = vec![create_option("t1", "Intro"), create_option("t2", "Outro")];
    Adapters::new()
        .with_upload(Arc::new(InstantUpload))
        .with_search(SearchKind::Tracks, FakeSearch::new(tracks))
        .with_embed(FakeEmbed::new())
}

/// Prop value of an instance in a shared session
pub fn prop_of(session: &SharedSession, id: InstanceId, field: &str) -> Option<Value> {
    session
        .lock()
        .document()
        .get(id)
        .and_then(|instance| instance.prop(field).cloned())
}
