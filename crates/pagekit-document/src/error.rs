//! Error types for the composition tree and codec

use pagekit_registry::InstanceId;
use pagekit_schema::SchemaError;

use crate::zone::ZoneId;

/// Malformed zone id text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneIdError {
    /// No `.` between owner and slot
    #[error("zone id '{0}' has no owner separator")]
    MissingSeparator(String),

    /// Owner is neither `root` nor an instance id
    #[error("zone id '{0}' has an invalid owner")]
    InvalidOwner(String),

    /// Slot part is empty or contains `.`
    #[error("zone id '{0}' has an invalid slot")]
    InvalidSlot(String),
}

/// Rejected tree mutation or invariant violation
///
/// A mutation that returns one of these has left the document unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// Zone does not exist
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// Instance does not exist (in the given zone)
    #[error("block instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// Operation would make a zone contain itself
    #[error("structural cycle: block {instance} cannot be placed inside {zone}")]
    StructuralCycle {
        /// Instance being placed
        instance: InstanceId,
        /// Target zone inside its own subtree
        zone: ZoneId,
    },

    /// Instance id already present in the document
    #[error("duplicate block instance: {0}")]
    DuplicateInstance(InstanceId),

    /// Insertion index past the end of the zone
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Zone length
        len: usize,
    },

    /// Zone whose owner does not exist or does not declare its slot
    #[error("dangling zone: {0}")]
    DanglingZone(ZoneId),

    /// Declared slot with no zone entry
    #[error("missing zone: {0}")]
    MissingZone(ZoneId),

    /// Block type is not registered
    #[error("unknown block type: '{0}'")]
    UnknownBlockType(String),

    /// Prop value rejected by its field schema
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Document encode/decode failure
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Not valid JSON, or not the document shape
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by a newer format version
    #[error("unsupported document version {0}")]
    UnsupportedVersion(u32),

    /// Zone key cannot be parsed
    #[error("invalid zone key: {0}")]
    InvalidZoneId(#[from] ZoneIdError),

    /// Two zone keys name the same zone
    #[error("zone {0} appears under more than one key")]
    DuplicateZone(ZoneId),

    /// Decoded tree violates a structural invariant
    #[error("corrupt document: {0}")]
    Corrupt(#[from] TreeError),
}
