//! Zone identity and contents
//!
//! A zone is addressed by its owner plus a local slot name, written
//! `<owner>.<slot>`: `root.content` for the page body, `<uuid>.left` for the
//! left column of a `Columns` block. Ids are globally unique without any
//! central counter because instance ids already are.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use pagekit_registry::{BlockInstance, InstanceId};
use serde::{Deserialize, Serialize};

use crate::error::ZoneIdError;

/// Owner text of root zones
pub const ROOT_OWNER: &str = "root";

/// Who owns a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoneOwner {
    /// The document root
    Root,
    /// A slot of a block instance
    Instance(InstanceId),
}

impl Display for ZoneOwner {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_OWNER),
            Self::Instance(id) => Display::fmt(id, f),
        }
    }
}

/// Globally unique zone address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneId {
    owner: ZoneOwner,
    slot: String,
}

impl ZoneId {
    /// Create zone id
    ///
    /// Slot names come from block definitions, which reject `.` at
    /// registration.
    #[inline]
    #[must_use]
    pub fn new(owner: ZoneOwner, slot: impl Into<String>) -> Self {
        Self {
            owner,
            slot: slot.into(),
        }
    }

    /// Zone owned by the document root
    #[inline]
    #[must_use]
    pub fn root(slot: impl Into<String>) -> Self {
        Self::new(ZoneOwner::Root, slot)
    }

    /// Zone owned by an instance
    #[inline]
    #[must_use]
    pub fn of(instance: InstanceId, slot: impl Into<String>) -> Self {
        Self::new(ZoneOwner::Instance(instance), slot)
    }

    /// Owner
    #[inline]
    #[must_use]
    pub fn owner(&self) -> ZoneOwner {
        self.owner
    }

    /// Owning instance, `None` for root zones
    #[inline]
    #[must_use]
    pub fn owner_instance(&self) -> Option<InstanceId> {
        match self.owner {
            ZoneOwner::Root => None,
            ZoneOwner::Instance(id) => Some(id),
        }
    }

    /// Local slot name
    #[inline]
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.slot)
    }
}

impl FromStr for ZoneId {
    type Err = ZoneIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, slot) = s
            .split_once('.')
            .ok_or_else(|| ZoneIdError::MissingSeparator(s.to_string()))?;
        if slot.is_empty() || slot.contains('.') {
            return Err(ZoneIdError::InvalidSlot(s.to_string()));
        }
        let owner = if owner == ROOT_OWNER {
            ZoneOwner::Root
        } else {
            let id = owner
                .parse::<InstanceId>()
                .map_err(|_| ZoneIdError::InvalidOwner(s.to_string()))?;
            ZoneOwner::Instance(id)
        };
        Ok(Self::new(owner, slot))
    }
}

impl TryFrom<String> for ZoneId {
    type Error = ZoneIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ZoneId> for String {
    fn from(value: ZoneId) -> Self {
        value.to_string()
    }
}

/// Ordered list of block instances under one zone id
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: ZoneId,
    items: Vec<BlockInstance>,
}

impl Zone {
    /// Create empty zone
    #[inline]
    #[must_use]
    pub fn new(id: ZoneId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    /// Create zone with items
    #[inline]
    #[must_use]
    pub fn with_items(id: ZoneId, items: Vec<BlockInstance>) -> Self {
        Self { id, items }
    }

    /// Zone id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    /// Items in order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[BlockInstance] {
        &self.items
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if zone holds no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of an instance
    #[must_use]
    pub fn position(&self, id: InstanceId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<BlockInstance> {
        &mut self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_zone_text() {
        let zone = ZoneId::root("content");
        assert_eq!(zone.to_string(), "root.content");
        assert_eq!("root.content".parse::<ZoneId>().unwrap(), zone);
    }

    #[test]
    fn instance_zone_roundtrip() {
        let id = InstanceId::new();
        let zone = ZoneId::of(id, "cell-1");
        let parsed: ZoneId = zone.to_string().parse().unwrap();
        assert_eq!(parsed.owner_instance(), Some(id));
        assert_eq!(parsed.slot(), "cell-1");
    }

    #[test]
    fn malformed_zone_ids() {
        assert!(matches!(
            "content".parse::<ZoneId>(),
            Err(ZoneIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            "root.".parse::<ZoneId>(),
            Err(ZoneIdError::InvalidSlot(_))
        ));
        assert!(matches!(
            "root.a.b".parse::<ZoneId>(),
            Err(ZoneIdError::InvalidSlot(_))
        ));
        assert!(matches!(
            "nobody.left".parse::<ZoneId>(),
            Err(ZoneIdError::InvalidOwner(_))
        ));
    }

    #[test]
    fn serde_as_string() {
        let zone = ZoneId::root("content");
        assert_eq!(serde_json::to_value(&zone).unwrap(), serde_json::json!("root.content"));
    }
}
