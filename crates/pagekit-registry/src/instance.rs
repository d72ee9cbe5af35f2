//! Block instances
//!
//! An instance is one placed block: a stable id, the name of its definition
//! and its own property map. Props are exclusively owned; they never alias a
//! definition's defaults or another instance's props.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use pagekit_schema::Props;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identity of a block instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Mint a fresh random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One placed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInstance {
    id: InstanceId,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    props: Props,
}

impl BlockInstance {
    /// Create an instance with explicit id and props
    #[must_use]
    pub fn new(id: InstanceId, type_name: impl Into<String>, props: Props) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            props,
        }
    }

    /// Set one prop (builder form)
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Instance id
    #[inline]
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Block type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Own props
    #[inline]
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Mutable own props
    #[inline]
    pub fn props_mut(&mut self) -> &mut Props {
        &mut self.props
    }

    /// One prop
    #[inline]
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Replace one prop, returning the previous value
    ///
    /// Setting `null` removes the key.
    pub fn set_prop(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        if value.is_null() {
            self.props.remove(&name)
        } else {
            self.props.insert(name, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_display_parse() {
        let id = InstanceId::new();
        let parsed: InstanceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<InstanceId>().is_err());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(InstanceId::new(), InstanceId::new());
    }

    #[test]
    fn instance_wire_shape() {
        let id = InstanceId::new();
        let inst = BlockInstance::new(id, "Heading", Props::new()).with_prop("text", json!("Hi"));
        let value = serde_json::to_value(&inst).unwrap();
        assert_eq!(
            value,
            json!({"id": id.to_string(), "type": "Heading", "props": {"text": "Hi"}})
        );
    }

    #[test]
    fn set_null_removes() {
        let mut inst = BlockInstance::new(InstanceId::new(), "Text", Props::new());
        assert_eq!(inst.set_prop("body", json!("x")), None);
        assert_eq!(inst.set_prop("body", Value::Null), Some(json!("x")));
        assert!(inst.props().is_empty());
    }
}
