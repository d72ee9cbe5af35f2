//! Registry errors

use pagekit_schema::SchemaError;

/// Block registry failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Two definitions share a type name
    #[error("block type '{0}' is already registered")]
    DuplicateType(String),

    /// No definition for a type name
    #[error("block type '{0}' is not registered")]
    NotFound(String),

    /// A default value fails its own field schema
    #[error("invalid default for {type_name}.{field}: {source}")]
    InvalidDefault {
        /// Block type declaring the default
        type_name: String,
        /// Field the default is for
        field: String,
        /// Validation failure
        source: SchemaError,
    },

    /// A slot name cannot form a zone id
    #[error("invalid slot name '{slot}' on block type '{type_name}'")]
    InvalidSlot {
        /// Block type declaring the slot
        type_name: String,
        /// Rejected slot name
        slot: String,
    },
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
