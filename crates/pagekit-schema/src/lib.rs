//! pagekit Schema
//!
//! The leaf layer of the page-composition engine: typed field descriptors,
//! the editor interpretation of a single value, and the responsive variant
//! resolver.
//!
//! # Core Concepts
//!
//! - [`FieldDescriptor`] / [`FieldKind`]: closed union of editable field kinds
//! - [`FieldEditor`]: fail-closed commit interface for one value
//! - [`VariantValue`]: a value per [`Breakpoint`] with mobile-first cascade
//! - [`merge_variant`]: deterministic breakpoint → class-string merge
//!
//! # Example
//!
//! ```rust
//! use pagekit_schema::{merge_variant, VariantValue};
//!
//! let value = VariantValue::base("red".to_string()).with_medium("blue".to_string());
//! let classes = merge_variant(&value, |token| format!("bg-{token}"));
//! assert_eq!(classes, "bg-red md:bg-blue");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod editor;
pub mod error;
pub mod field;
pub mod variant;

use std::collections::BTreeMap;

use serde_json::Value;

// Re-exports
pub use editor::{resolve_editor, FieldEditor};
pub use error::SchemaError;
pub use field::{FieldDescriptor, FieldKind, SelectOption};
pub use variant::{
    merge_value, merge_value_with, merge_variant, merge_variant_with, upgrade_value, Breakpoint,
    BreakpointPrefixes, VariantValue,
};

/// Property map of a block instance or of the document root
///
/// Ordered by key so that serialized output is byte-stable.
pub type Props = BTreeMap<String, Value>;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for schema work
    pub use crate::{
        merge_variant, resolve_editor, Breakpoint, FieldDescriptor, FieldEditor, FieldKind, Props,
        SchemaError, SelectOption, VariantValue,
    };
}
