//! pagekit Persist
//!
//! Storage for serialized page documents: the [`DocumentStore`] contract,
//! Blake3 [`Revision`]s for optimistic conflict detection, and two
//! implementations.
//!
//! # Example
//!
//! ```rust
//! use pagekit_persist::{DocumentStore, MemoryStore, PageId};
//!
//! # async fn example() -> Result<(), pagekit_persist::PersistenceError> {
//! let store = MemoryStore::new();
//! let home = PageId::new("home")?;
//! let rev = store.save(&home, "{}", None).await?;
//! assert_eq!(store.fetch(&home).await?.revision, rev);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod file;
pub mod memory;
pub mod page;
pub mod revision;
pub mod store;

// Re-exports
pub use error::PersistenceError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use page::PageId;
pub use revision::Revision;
pub use store::{DocumentStore, StoredDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
