//! pagekit Core
//!
//! The editing engine on top of the document model: an [`EditorSession`]
//! that applies edits and adapter responses with a stale-response guard,
//! the external adapter contracts, the page renderer, and engine
//! configuration.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pagekit_core::prelude::*;
//! use pagekit_registry::library::{self, ROOT_SLOT};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(library::standard()?);
//! let mut session = EditorSession::new(registry, EngineConfig::default());
//!
//! let heading = session.add_block(&ZoneId::root(ROOT_SLOT), 0, "Heading")?;
//! session.commit_field(heading, "text", json!("Welcome"))?;
//!
//! let page = session.render();
//! assert!(page.markup.contains("Welcome"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod render;
pub mod session;

// Re-exports
pub use adapters::{
    with_timeout, Adapters, EmbedMetadata, EmbedResolver, OptionSearch, SearchKind, SearchOption,
    UploadAdapter, UploadFile, Uploaded,
};
pub use config::{ConfigError, EngineConfig};
pub use error::{AdapterError, EngineError, Result};
pub use render::{render, RenderError, RenderOptions, Rendered};
pub use session::{
    resolve_embed_into, save_shared, search_options, upload_into, Completion, EditorSession,
    FieldKey, FieldState, RequestTicket, SaveSnapshot, SearchOutcome, Selection, SharedSession,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    //! Common imports for editing sessions
    pub use crate::{
        Adapters, AdapterError, Completion, EditorSession, EngineConfig, EngineError, FieldState,
        RenderOptions, Rendered, SearchKind, SharedSession,
    };
    pub use pagekit_document::{Document, InstanceId, ZoneId};
    pub use pagekit_schema::Breakpoint;
}
