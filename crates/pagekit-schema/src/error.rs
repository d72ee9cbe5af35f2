//! Error types for field validation
//!
//! Schema errors are recovered at the field editor: the prior value is kept
//! and nothing outside the editor observes the failed commit.

use crate::variant::Breakpoint;

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Descriptor names a kind outside the closed union
    #[error("unknown field kind: '{0}'")]
    UnknownKind(String),

    /// Descriptor JSON could not be interpreted
    #[error("malformed field descriptor: {0}")]
    MalformedDescriptor(String),

    /// Block definition has no field with this name
    #[error("unknown field: '{0}'")]
    UnknownField(String),

    /// Value has the wrong JSON type for the field kind
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// JSON type the kind accepts
        expected: &'static str,
        /// JSON type that was given
        actual: &'static str,
    },

    /// Select value outside the option set
    #[error("value {value} is not one of the allowed options")]
    NotInOptions {
        /// Rejected value as JSON text
        value: String,
    },

    /// Number outside its declared bounds
    #[error("number {value} is outside the allowed range")]
    OutOfRange {
        /// Rejected number
        value: f64,
    },

    /// Array index past the end
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Array length
        len: usize,
    },

    /// Object value names a subfield the schema does not declare
    #[error("unknown subfield: '{0}'")]
    UnknownSubfield(String),

    /// Array item failed validation
    #[error("item {index}: {source}")]
    Item {
        /// Position of the failing item
        index: usize,
        /// Item failure
        source: Box<SchemaError>,
    },

    /// Object subfield failed validation
    #[error("subfield '{name}': {source}")]
    Subfield {
        /// Failing subfield
        name: String,
        /// Subfield failure
        source: Box<SchemaError>,
    },

    /// Breakpoint value of a responsive field failed validation
    #[error("breakpoint {breakpoint}: {source}")]
    Breakpoint {
        /// Breakpoint whose value failed
        breakpoint: Breakpoint,
        /// Value failure
        source: Box<SchemaError>,
    },

    /// Per-breakpoint operation on a field that is not responsive
    #[error("field is not responsive")]
    NotResponsive,

    /// Operation does not apply to this field kind
    #[error("operation requires a {expected} field")]
    WrongKind {
        /// Kind the operation needs
        expected: &'static str,
    },
}

impl SchemaError {
    /// Wrap as an array item failure
    #[inline]
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self::Item {
            index,
            source: Box::new(self),
        }
    }

    /// Wrap as a subfield failure
    #[inline]
    #[must_use]
    pub fn in_subfield(self, name: impl Into<String>) -> Self {
        Self::Subfield {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Wrap as a breakpoint failure
    #[inline]
    #[must_use]
    pub fn at_breakpoint(self, breakpoint: Breakpoint) -> Self {
        Self::Breakpoint {
            breakpoint,
            source: Box::new(self),
        }
    }
}

/// Human-readable JSON type name used in mismatch messages
#[must_use]
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
