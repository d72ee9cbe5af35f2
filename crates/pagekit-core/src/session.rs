//! Editing session
//!
//! An [`EditorSession`] owns one open document and applies every edit to it.
//! Adapter calls (upload, search, embed) are split in two halves around the
//! await point: [`EditorSession::begin_request`] hands out a ticket and
//! marks the field pending, and a `finish_*` call applies the response.
//! A response is applied only if its instance still exists and no later
//! request or direct edit has superseded it; otherwise it is discarded.
//!
//! The `*_into` helpers drive the whole round trip on a [`SharedSession`]
//! without holding the lock across the adapter call, so a pending upload on
//! one block never blocks edits to another.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use pagekit_document::{codec, DecodeReport, Document, InstanceId, Removal, ZoneId};
use pagekit_persist::{DocumentStore, PageId, Revision};
use pagekit_registry::{BlockDefinition, Registry};
use pagekit_schema::{resolve_editor, Breakpoint, FieldEditor, FieldKind, SchemaError};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::adapters::{with_timeout, Adapters, EmbedMetadata, SearchKind, SearchOption, UploadFile, Uploaded};
use crate::config::EngineConfig;
use crate::error::{AdapterError, EngineError, Result};
use crate::render::{self, RenderOptions, Rendered};

/// One field of one instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Owning instance
    pub instance: InstanceId,
    /// Field name
    pub field: String,
}

impl FieldKey {
    /// Create field key
    #[must_use]
    pub fn new(instance: InstanceId, field: impl Into<String>) -> Self {
        Self {
            instance,
            field: field.into(),
        }
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.instance, self.field)
    }
}

/// Editor-visible state of a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldState {
    /// No request outstanding
    #[default]
    Idle,
    /// Adapter request in flight
    Pending,
    /// Last request failed
    Failed {
        /// What went wrong
        message: String,
        /// Whether retrying may succeed
        retryable: bool,
    },
}

/// Handle for one in-flight adapter request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    key: FieldKey,
    seq: u64,
}

impl RequestTicket {
    /// Field the request writes to
    #[inline]
    #[must_use]
    pub fn key(&self) -> &FieldKey {
        &self.key
    }
}

/// How an adapter response was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Response stored in the field
    Applied,
    /// Field marked failed; see [`EditorSession::field_state`]
    Failed,
    /// Response arrived for a removed instance or a superseded request
    Discarded,
}

/// Result of an option search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Options to choose from
    Results(Vec<SearchOption>),
    /// Search failed; see [`EditorSession::field_state`]
    Failed,
    /// Response arrived for a removed instance or a superseded request
    Discarded,
}

/// Options the user picked for a selection field
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A single option, stored as an object
    One(SearchOption),
    /// Several options, stored as an array in pick order
    Many(Vec<SearchOption>),
}

impl Selection {
    fn into_value(self) -> Value {
        match self {
            Self::One(option) => option_value(option),
            Self::Many(options) => Value::Array(options.into_iter().map(option_value).collect()),
        }
    }
}

fn option_value(option: SearchOption) -> Value {
    json!({"id": option.id, "label": option.label, "metadata": option.metadata})
}

/// State captured for a save performed outside the session lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSnapshot {
    /// Target page
    pub page: PageId,
    /// Encoded document
    pub body: String,
    /// Revision the document was loaded or last saved at
    pub expected: Option<Revision>,
    edit: u64,
}

/// Session shared between the UI and in-flight adapter calls
pub type SharedSession = Arc<Mutex<EditorSession>>;

/// One open document and its editing state
#[derive(Debug)]
pub struct EditorSession {
    registry: Arc<Registry>,
    config: EngineConfig,
    document: Document,
    page: Option<PageId>,
    revision: Option<Revision>,
    field_states: HashMap<FieldKey, FieldState>,
    pending: HashMap<FieldKey, u64>,
    next_seq: u64,
    previews: HashMap<String, String>,
    edit: u64,
    saved_edit: u64,
}

impl EditorSession {
    /// Open a new empty document
    #[must_use]
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Self {
        let document = Document::new(&registry);
        Self::from_document(registry, config, document)
    }

    /// Edit an existing document
    #[must_use]
    pub fn from_document(registry: Arc<Registry>, config: EngineConfig, document: Document) -> Self {
        Self {
            registry,
            config,
            document,
            page: None,
            revision: None,
            field_states: HashMap::new(),
            pending: HashMap::new(),
            next_seq: 0,
            previews: HashMap::new(),
            edit: 0,
            saved_edit: 0,
        }
    }

    /// Attach the page the document is saved under
    #[must_use]
    pub fn with_page(mut self, page: PageId) -> Self {
        self.page = Some(page);
        self
    }

    /// Wrap for sharing with adapter tasks
    #[must_use]
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Block registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The document being edited
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Page id, if attached
    #[inline]
    #[must_use]
    pub fn page(&self) -> Option<&PageId> {
        self.page.as_ref()
    }

    /// Revision of the last load or save
    #[inline]
    #[must_use]
    pub fn revision(&self) -> Option<Revision> {
        self.revision
    }

    /// Whether there are edits since the last load or save
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.edit != self.saved_edit
    }

    fn touch(&mut self) {
        self.edit += 1;
    }

    fn definition_of(&self, id: InstanceId) -> Result<&BlockDefinition> {
        let instance = self
            .document
            .get(id)
            .ok_or(EngineError::InstanceNotFound(id))?;
        Ok(self.registry.get(instance.type_name())?.as_ref())
    }

    /// Instantiate a block type and insert it into a zone
    ///
    /// # Errors
    /// Any `TreeError` from the insert.
    pub fn add_block(&mut self, zone: &ZoneId, index: usize, type_name: &str) -> Result<InstanceId> {
        let id = self.document.insert_new(&self.registry, zone, index, type_name)?;
        self.touch();
        Ok(id)
    }

    /// Remove a block and everything nested in it
    ///
    /// Outstanding requests for removed instances are dropped, so their
    /// responses are discarded when they arrive.
    ///
    /// # Errors
    /// Returns `EngineError::InstanceNotFound` if the block is not in the document.
    pub fn remove_block(&mut self, id: InstanceId) -> Result<Removal> {
        let zone = self
            .document
            .locate(id)
            .map(|(zone, _)| zone.clone())
            .ok_or(EngineError::InstanceNotFound(id))?;
        let removal = self.document.remove(&zone, id)?;

        let before = self.pending.len();
        let removed = &removal.removed_instances;
        self.pending.retain(|key, _| !removed.contains(&key.instance));
        self.field_states.retain(|key, _| !removed.contains(&key.instance));
        let dropped = before - self.pending.len();
        if dropped > 0 {
            tracing::debug!(instance = %id, dropped, "dropped pending requests of removed blocks");
        }
        self.touch();
        Ok(removal)
    }

    /// Move a block to `index` of `to`
    ///
    /// # Errors
    /// - `EngineError::InstanceNotFound`
    /// - any `TreeError` from the move; the document is left unchanged
    pub fn move_block(&mut self, id: InstanceId, to: &ZoneId, index: usize) -> Result<()> {
        let from = self
            .document
            .locate(id)
            .map(|(zone, _)| zone.clone())
            .ok_or(EngineError::InstanceNotFound(id))?;
        self.document.move_block(&from, to, id, index)?;
        self.touch();
        Ok(())
    }

    /// Editor for one field of an instance, seeded with its effective value
    ///
    /// # Errors
    /// - `EngineError::InstanceNotFound`
    /// - `EngineError::Registry` for placeholders of unknown types
    /// - `EngineError::Schema` if the type has no such field
    pub fn field_editor(&self, id: InstanceId, field: &str) -> Result<FieldEditor<'_>> {
        let definition = self.definition_of(id)?;
        let descriptor = definition
            .field(field)
            .ok_or_else(|| SchemaError::UnknownField(field.to_string()))?;
        let current = self
            .document
            .get(id)
            .and_then(|instance| instance.prop(field))
            .or_else(|| definition.defaults().get(field));
        Ok(resolve_editor(descriptor, current))
    }

    /// Replace a field value
    ///
    /// A direct edit supersedes any request in flight for the same field.
    ///
    /// # Errors
    /// Returns the validation error; the prior value is kept.
    pub fn commit_field(&mut self, id: InstanceId, field: &str, value: Value) -> Result<()> {
        self.document.set_prop(&self.registry, id, field, value)?;
        self.settle(&FieldKey::new(id, field));
        self.touch();
        Ok(())
    }

    /// Set one breakpoint of a responsive field
    ///
    /// # Errors
    /// - `SchemaError::NotResponsive` for plain fields
    /// - validation errors; the prior value is kept
    pub fn commit_field_at(
        &mut self,
        id: InstanceId,
        field: &str,
        breakpoint: Breakpoint,
        value: Value,
    ) -> Result<()> {
        let mut editor = self.field_editor(id, field)?;
        editor.commit_at(breakpoint, value)?;
        let value = editor.into_value();
        self.commit_field(id, field, value)
    }

    /// Replace a root field value
    ///
    /// # Errors
    /// Returns the validation error; the prior value is kept.
    pub fn commit_root_field(&mut self, field: &str, value: Value) -> Result<()> {
        self.document.set_root_prop(&self.registry, field, value)?;
        self.touch();
        Ok(())
    }

    fn settle(&mut self, key: &FieldKey) {
        self.pending.remove(key);
        self.field_states.remove(key);
    }

    /// Start an adapter request for a field
    ///
    /// Any earlier request for the same field is superseded.
    ///
    /// # Errors
    /// - `EngineError::InstanceNotFound`
    /// - `EngineError::Schema` if the type has no such field
    pub fn begin_request(&mut self, id: InstanceId, field: &str) -> Result<RequestTicket> {
        let definition = self.definition_of(id)?;
        if definition.field(field).is_none() {
            return Err(SchemaError::UnknownField(field.to_string()).into());
        }
        self.next_seq += 1;
        let key = FieldKey::new(id, field);
        self.pending.insert(key.clone(), self.next_seq);
        self.field_states.insert(key.clone(), FieldState::Pending);
        Ok(RequestTicket {
            key,
            seq: self.next_seq,
        })
    }

    /// Abandon the request in flight for a field
    pub fn cancel(&mut self, id: InstanceId, field: &str) {
        self.settle(&FieldKey::new(id, field));
    }

    /// Whether a ticket's response would still be applied
    #[must_use]
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.document.contains(ticket.key.instance) && self.pending.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Claim a ticket for completion, or report it stale
    fn claim(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(field = %ticket.key, seq = ticket.seq, "discarding stale adapter response");
            return false;
        }
        self.pending.remove(&ticket.key);
        true
    }

    fn fail(&mut self, key: &FieldKey, message: String, retryable: bool) {
        self.field_states
            .insert(key.clone(), FieldState::Failed { message, retryable });
    }

    fn complete(&mut self, ticket: &RequestTicket, result: std::result::Result<Value, AdapterError>) -> Completion {
        if !self.claim(ticket) {
            return Completion::Discarded;
        }
        let key = &ticket.key;
        let value = match result {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(field = %key, %error, "adapter request failed");
                self.fail(key, error.to_string(), error.is_retryable());
                return Completion::Failed;
            }
        };
        match self.document.set_prop(&self.registry, key.instance, &key.field, value) {
            Ok(_) => {
                self.field_states.remove(key);
                self.touch();
                Completion::Applied
            }
            Err(error) => {
                self.fail(key, error.to_string(), false);
                Completion::Failed
            }
        }
    }

    /// Apply an upload response
    ///
    /// Only the reference is stored; the preview URL is kept in the session
    /// for rendering the editor canvas.
    pub fn finish_upload(
        &mut self,
        ticket: &RequestTicket,
        result: std::result::Result<Uploaded, AdapterError>,
    ) -> Completion {
        let preview = result
            .as_ref()
            .ok()
            .map(|uploaded| (uploaded.reference.clone(), uploaded.preview_url.clone()));
        let completion = self.complete(ticket, result.map(|uploaded| json!({"reference": uploaded.reference})));
        if let (Completion::Applied, Some((reference, url))) = (completion, preview) {
            self.previews.insert(reference, url);
        }
        completion
    }

    /// Apply an embed resolution for `url`
    pub fn finish_embed(
        &mut self,
        ticket: &RequestTicket,
        url: &str,
        result: std::result::Result<EmbedMetadata, AdapterError>,
    ) -> Completion {
        let value = result.map(|meta| json!({"url": url, "html": meta.markup, "title": meta.title}));
        self.complete(ticket, value)
    }

    /// Accept search results; the field value is not changed
    pub fn finish_search(
        &mut self,
        ticket: &RequestTicket,
        result: std::result::Result<Vec<SearchOption>, AdapterError>,
    ) -> SearchOutcome {
        if !self.claim(ticket) {
            return SearchOutcome::Discarded;
        }
        match result {
            Ok(options) => {
                self.field_states.remove(&ticket.key);
                SearchOutcome::Results(options)
            }
            Err(error) => {
                tracing::warn!(field = %ticket.key, %error, "option search failed");
                self.fail(&ticket.key, error.to_string(), error.is_retryable());
                SearchOutcome::Failed
            }
        }
    }

    /// Store the options the user picked, verbatim
    ///
    /// # Errors
    /// As [`EditorSession::commit_field`].
    pub fn finish_selection(&mut self, id: InstanceId, field: &str, selection: Selection) -> Result<()> {
        self.commit_field(id, field, selection.into_value())
    }

    /// Current state of a field
    #[must_use]
    pub fn field_state(&self, id: InstanceId, field: &str) -> FieldState {
        self.field_states
            .get(&FieldKey::new(id, field))
            .cloned()
            .unwrap_or_default()
    }

    /// Preview URL recorded for an upload reference
    #[must_use]
    pub fn preview_url(&self, reference: &str) -> Option<&str> {
        self.previews.get(reference).map(String::as_str)
    }

    /// Catalog behind a selection field
    ///
    /// # Errors
    /// `EngineError::Schema` if the field is missing or not a catalog search.
    pub fn search_kind(&self, id: InstanceId, field: &str) -> Result<SearchKind> {
        let definition = self.definition_of(id)?;
        let descriptor = definition
            .field(field)
            .ok_or_else(|| SchemaError::UnknownField(field.to_string()))?;
        match &descriptor.kind {
            FieldKind::Custom { editor } => SearchKind::from_editor(editor)
                .ok_or(EngineError::Schema(SchemaError::WrongKind { expected: "search" })),
            _ => Err(SchemaError::WrongKind { expected: "search" }.into()),
        }
    }

    /// Render at the base breakpoint
    #[must_use]
    pub fn render(&self) -> Rendered {
        self.render_at(Breakpoint::Base)
    }

    /// Render at a breakpoint
    #[must_use]
    pub fn render_at(&self, breakpoint: Breakpoint) -> Rendered {
        let options = RenderOptions::from_config(&self.config).at(breakpoint);
        render::render(&self.document, &self.registry, &options)
    }

    /// Capture what a save needs
    ///
    /// # Errors
    /// - `EngineError::NoPage`
    /// - `EngineError::Codec` if encoding fails
    pub fn snapshot_for_save(&self) -> Result<SaveSnapshot> {
        let page = self.page.clone().ok_or(EngineError::NoPage)?;
        Ok(SaveSnapshot {
            page,
            body: codec::to_string(&self.document)?,
            expected: self.revision,
            edit: self.edit,
        })
    }

    /// Record a completed save
    ///
    /// Edits made after the snapshot keep the session dirty.
    pub fn mark_saved(&mut self, snapshot: &SaveSnapshot, revision: Revision) {
        self.revision = Some(revision);
        self.saved_edit = snapshot.edit;
        tracing::info!(page = %snapshot.page, revision = %revision.short(), "page saved");
    }

    /// Save the whole document, conditional on the loaded revision
    ///
    /// # Errors
    /// - `EngineError::NoPage`
    /// - `EngineError::Persistence` with a conflict if the page changed since load
    pub async fn save(&mut self, store: &dyn DocumentStore) -> Result<Revision> {
        let snapshot = self.snapshot_for_save()?;
        let revision = store
            .save(&snapshot.page, &snapshot.body, snapshot.expected)
            .await?;
        self.mark_saved(&snapshot, revision);
        Ok(revision)
    }

    /// Load a stored page
    ///
    /// # Errors
    /// - `EngineError::Persistence` if the page is missing or unreadable
    /// - `EngineError::Codec` if the body cannot be decoded
    pub async fn open(
        registry: Arc<Registry>,
        config: EngineConfig,
        store: &dyn DocumentStore,
        page: PageId,
    ) -> Result<(Self, DecodeReport)> {
        let stored = store.fetch(&page).await?;
        let decoded = codec::deserialize(&stored.body, &registry)?;
        if !decoded.report.is_clean() {
            tracing::info!(
                page = %page,
                upgraded = decoded.report.upgraded_values,
                unknown = decoded.report.unknown_blocks.len(),
                repaired = decoded.report.repaired_zones.len(),
                "page decoded with changes"
            );
        }
        let mut session = Self::from_document(registry, config, decoded.document).with_page(page);
        session.revision = Some(stored.revision);
        Ok((session, decoded.report))
    }

    /// Load a stored page, or start an empty one if it does not exist
    ///
    /// # Errors
    /// As [`EditorSession::open`], except for a missing page.
    pub async fn open_or_create(
        registry: Arc<Registry>,
        config: EngineConfig,
        store: &dyn DocumentStore,
        page: PageId,
    ) -> Result<(Self, DecodeReport)> {
        if store.load(&page).await?.is_some() {
            return Self::open(registry, config, store, page).await;
        }
        let report = DecodeReport {
            version: codec::FORMAT_VERSION,
            ..DecodeReport::default()
        };
        Ok((Self::new(registry, config).with_page(page), report))
    }
}

/// Upload a file into a field of a shared session
///
/// # Errors
/// Fails only if the request cannot start; adapter failures are reported
/// as `Completion::Failed`.
pub async fn upload_into(
    session: &SharedSession,
    adapters: &Adapters,
    id: InstanceId,
    field: &str,
    file: UploadFile,
) -> Result<Completion> {
    let (ticket, timeout) = {
        let mut guard = session.lock();
        (guard.begin_request(id, field)?, guard.config().adapter_timeout())
    };
    let result = match adapters.upload() {
        Ok(adapter) => with_timeout(timeout, adapter.upload(file)).await,
        Err(error) => Err(error),
    };
    Ok(session.lock().finish_upload(&ticket, result))
}

/// Resolve an embed URL into a field of a shared session
///
/// # Errors
/// As [`upload_into`].
pub async fn resolve_embed_into(
    session: &SharedSession,
    adapters: &Adapters,
    id: InstanceId,
    field: &str,
    url: &str,
) -> Result<Completion> {
    let (ticket, timeout) = {
        let mut guard = session.lock();
        (guard.begin_request(id, field)?, guard.config().adapter_timeout())
    };
    let result = match adapters.embed() {
        Ok(adapter) => with_timeout(timeout, adapter.resolve(url)).await,
        Err(error) => Err(error),
    };
    Ok(session.lock().finish_embed(&ticket, url, result))
}

/// Search the catalog behind a selection field
///
/// # Errors
/// As [`upload_into`], plus `EngineError::Schema` if the field is not a
/// catalog search.
pub async fn search_options(
    session: &SharedSession,
    adapters: &Adapters,
    id: InstanceId,
    field: &str,
    query: &str,
) -> Result<SearchOutcome> {
    let (ticket, kind, timeout) = {
        let mut guard = session.lock();
        let kind = guard.search_kind(id, field)?;
        (guard.begin_request(id, field)?, kind, guard.config().adapter_timeout())
    };
    let result = match adapters.search(kind) {
        Ok(adapter) => with_timeout(timeout, adapter.search(query)).await,
        Err(error) => Err(error),
    };
    Ok(session.lock().finish_search(&ticket, result))
}

/// Save a shared session without holding its lock during the write
///
/// # Errors
/// As [`EditorSession::save`].
pub async fn save_shared(session: &SharedSession, store: &dyn DocumentStore) -> Result<Revision> {
    let snapshot = session.lock().snapshot_for_save()?;
    let revision = store
        .save(&snapshot.page, &snapshot.body, snapshot.expected)
        .await?;
    session.lock().mark_saved(&snapshot, revision);
    Ok(revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_persist::MemoryStore;
    use pagekit_registry::library::{self, ROOT_SLOT};
    use pretty_assertions::assert_eq;

    fn session() -> EditorSession {
        let registry = Arc::new(library::standard().unwrap());
        EditorSession::new(registry, EngineConfig::default())
    }

    fn root() -> ZoneId {
        ZoneId::root(ROOT_SLOT)
    }

    fn uploaded(reference: &str) -> Uploaded {
        Uploaded {
            reference: reference.into(),
            preview_url: format!("https://cdn.test/{reference}"),
        }
    }

    #[test]
    fn add_and_commit_marks_dirty() {
        let mut s = session();
        assert!(!s.is_dirty());
        let id = s.add_block(&root(), 0, "Heading").unwrap();
        s.commit_field(id, "text", json!("Hi")).unwrap();
        assert!(s.is_dirty());
        assert_eq!(s.document().get(id).unwrap().prop("text"), Some(&json!({"base": "Hi"})));
    }

    #[test]
    fn rejected_commit_keeps_prior_value() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Heading").unwrap();
        let before = s.document().get(id).unwrap().clone();
        assert!(matches!(
            s.commit_field(id, "level", json!("h9")),
            Err(EngineError::Tree(_))
        ));
        assert_eq!(s.document().get(id).unwrap(), &before);
    }

    #[test]
    fn commit_at_keeps_default_base() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "ProductList").unwrap();
        s.commit_field_at(id, "columns", Breakpoint::Medium, json!("2")).unwrap();
        assert_eq!(
            s.document().get(id).unwrap().prop("columns"),
            Some(&json!({"base": "1", "medium": "2", "large": "4"}))
        );
        assert!(matches!(
            s.commit_field_at(id, "products", Breakpoint::Medium, json!([])),
            Err(EngineError::Schema(SchemaError::NotResponsive))
        ));
    }

    #[test]
    fn upload_applies_reference_only() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Image").unwrap();
        let ticket = s.begin_request(id, "image").unwrap();
        assert_eq!(s.field_state(id, "image"), FieldState::Pending);

        let done = s.finish_upload(&ticket, Ok(uploaded("img-1")));
        assert_eq!(done, Completion::Applied);
        assert_eq!(s.field_state(id, "image"), FieldState::Idle);
        assert_eq!(s.document().get(id).unwrap().prop("image"), Some(&json!({"reference": "img-1"})));
        assert_eq!(s.preview_url("img-1"), Some("https://cdn.test/img-1"));
    }

    #[test]
    fn response_for_removed_block_is_discarded() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Image").unwrap();
        let ticket = s.begin_request(id, "image").unwrap();
        s.remove_block(id).unwrap();
        let before = codec::to_string(s.document()).unwrap();

        assert_eq!(s.finish_upload(&ticket, Ok(uploaded("late"))), Completion::Discarded);
        assert_eq!(codec::to_string(s.document()).unwrap(), before);
    }

    #[test]
    fn superseded_request_is_discarded() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Image").unwrap();
        let first = s.begin_request(id, "image").unwrap();
        let second = s.begin_request(id, "image").unwrap();

        assert_eq!(s.finish_upload(&second, Ok(uploaded("new"))), Completion::Applied);
        assert_eq!(s.finish_upload(&first, Ok(uploaded("old"))), Completion::Discarded);
        assert_eq!(s.document().get(id).unwrap().prop("image"), Some(&json!({"reference": "new"})));
    }

    #[test]
    fn direct_edit_supersedes_pending_request() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Embed").unwrap();
        let ticket = s.begin_request(id, "embed").unwrap();
        s.commit_field(id, "embed", json!({"url": "manual"})).unwrap();
        let meta = EmbedMetadata {
            markup: "<iframe></iframe>".into(),
            title: "Video".into(),
        };
        assert_eq!(s.finish_embed(&ticket, "https://v.test", Ok(meta)), Completion::Discarded);
        assert_eq!(s.document().get(id).unwrap().prop("embed"), Some(&json!({"url": "manual"})));
    }

    #[test]
    fn adapter_failure_is_field_scoped() {
        let mut s = session();
        let image = s.add_block(&root(), 0, "Image").unwrap();
        let heading = s.add_block(&root(), 1, "Heading").unwrap();
        let ticket = s.begin_request(image, "image").unwrap();

        let done = s.finish_upload(&ticket, Err(AdapterError::Timeout(50)));
        assert_eq!(done, Completion::Failed);
        assert_eq!(
            s.field_state(image, "image"),
            FieldState::Failed {
                message: "adapter timed out after 50ms".into(),
                retryable: true
            }
        );
        s.commit_field(heading, "text", json!("still editable")).unwrap();
        assert_eq!(s.field_state(heading, "text"), FieldState::Idle);
    }

    #[test]
    fn selection_is_stored_verbatim() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "TrackList").unwrap();
        let picked = Selection::Many(vec![
            SearchOption::new("t1", "Intro", json!({"duration": 61})),
            SearchOption::new("t2", "Outro", Value::Null),
        ]);
        s.finish_selection(id, "tracks", picked).unwrap();
        assert_eq!(
            s.document().get(id).unwrap().prop("tracks"),
            Some(&json!([
                {"id": "t1", "label": "Intro", "metadata": {"duration": 61}},
                {"id": "t2", "label": "Outro", "metadata": null}
            ]))
        );
    }

    #[test]
    fn search_kind_follows_field_editor() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Playlist").unwrap();
        assert_eq!(s.search_kind(id, "playlist").unwrap(), SearchKind::Playlists);
        assert!(s.search_kind(id, "show_artwork").is_err());
    }

    #[test]
    fn request_for_unknown_field_fails() {
        let mut s = session();
        let id = s.add_block(&root(), 0, "Image").unwrap();
        assert!(matches!(
            s.begin_request(id, "nope"),
            Err(EngineError::Schema(SchemaError::UnknownField(_)))
        ));
    }

    #[tokio::test]
    async fn save_then_open_restores_document() {
        let store = MemoryStore::new();
        let mut s = session().with_page(PageId::new("home").unwrap());
        let id = s.add_block(&root(), 0, "Heading").unwrap();
        s.commit_field(id, "text", json!("Saved")).unwrap();
        let revision = s.save(&store).await.unwrap();
        assert!(!s.is_dirty());

        let registry = Arc::clone(s.registry());
        let (opened, report) =
            EditorSession::open(registry, EngineConfig::default(), &store, PageId::new("home").unwrap())
                .await
                .unwrap();
        assert!(report.is_clean());
        assert_eq!(opened.revision(), Some(revision));
        assert_eq!(opened.document(), s.document());
    }

    #[tokio::test]
    async fn save_without_page_fails() {
        let store = MemoryStore::new();
        let mut s = session();
        assert!(matches!(s.save(&store).await, Err(EngineError::NoPage)));
    }
}
