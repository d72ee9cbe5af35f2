//! pagekit Document
//!
//! The composition tree (root props plus nested zones of block instances)
//! and its storage-neutral JSON codec.
//!
//! # Core Concepts
//!
//! - [`ZoneId`]: `<owner>.<slot>` address of an ordered list of blocks
//! - [`Document`]: the tree; every mutation is all-or-nothing
//! - [`codec`]: lossless JSON round-trip with legacy upgrade on decode
//!
//! # Example
//!
//! ```rust
//! use pagekit_document::{codec, Document, ZoneId};
//! use pagekit_registry::library;
//!
//! let registry = library::standard().unwrap();
//! let mut doc = Document::new(&registry);
//! doc.insert_new(&registry, &ZoneId::root("content"), 0, "Heading").unwrap();
//!
//! let json = codec::to_string(&doc).unwrap();
//! let decoded = codec::deserialize(&json, &registry).unwrap();
//! assert_eq!(decoded.document, doc);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod codec;
pub mod error;
pub mod tree;
pub mod validation;
pub mod zone;

// Re-exports
pub use codec::{DecodeReport, Decoded, UnknownBlock, FORMAT_VERSION};
pub use error::{CodecError, TreeError, ZoneIdError};
pub use pagekit_registry::{BlockInstance, InstanceId};
pub use tree::{Document, DocumentState, Removal};
pub use zone::{Zone, ZoneId, ZoneOwner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for document work
    pub use crate::{
        BlockInstance, CodecError, Document, DocumentState, InstanceId, TreeError, ZoneId,
        ZoneOwner,
    };
}
