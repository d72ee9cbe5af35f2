//! pagekit Registry
//!
//! Typed block definitions and the immutable [`Registry`] that maps block
//! type names to them.
//!
//! # Core Concepts
//!
//! - [`BlockDefinition`]: field schema, defaults, owned slots, render function
//! - [`Registry`]: built once, shared read-only, fails fast on duplicates
//! - [`BlockInstance`]: one placed block with exclusively owned props
//! - [`library`]: the standard block set and the page root
//!
//! # Example
//!
//! ```rust
//! use pagekit_registry::library;
//!
//! let registry = library::standard().unwrap();
//! let a = registry.instantiate("Section").unwrap();
//! let b = registry.instantiate("Section").unwrap();
//! assert_eq!(a.props(), b.props());
//! assert_ne!(a.id(), b.id());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod definition;
pub mod error;
pub mod instance;
pub mod library;
pub mod markup;
pub mod registry;

// Re-exports
pub use definition::{BlockDefinition, BlockDefinitionBuilder, Category, RenderArgs, RenderFn};
pub use error::RegistryError;
pub use instance::{BlockInstance, InstanceId};
pub use markup::Element;
pub use registry::{Registry, RegistryBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for registry work
    pub use crate::{
        BlockDefinition, BlockInstance, Category, InstanceId, Registry, RegistryError, RenderArgs,
    };
}
