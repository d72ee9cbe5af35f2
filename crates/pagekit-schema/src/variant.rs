//! Responsive variant resolution
//!
//! A [`VariantValue`] carries one value per [`Breakpoint`]. Unset breakpoints
//! inherit the nearest smaller breakpoint at render time (mobile-first).
//!
//! [`merge_variant`] turns a variant of style tokens into one ordered class
//! string. It is pure: identical input always yields byte-identical output.
//!
//! Persisted documents may still hold legacy shapes: a bare value with no
//! breakpoint keys, or the `mobile`/`tablet`/`desktop` key names. Both are
//! upgraded to the canonical `base`/`medium`/`large` form by
//! [`upgrade_value`], which is the only place that upgrade happens.

use std::fmt::{self, Display, Formatter};

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Viewport width tier, ordered narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    /// Narrow viewports; applies at every width unless overridden
    Base,
    /// Medium viewports and wider
    Medium,
    /// Large viewports and wider
    Large,
}

impl Breakpoint {
    /// All breakpoints in ascending order
    pub const ALL: [Breakpoint; 3] = [Breakpoint::Base, Breakpoint::Medium, Breakpoint::Large];

    /// Canonical persisted key
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Legacy key some older documents use for this breakpoint
    #[inline]
    #[must_use]
    pub const fn legacy_key(self) -> &'static str {
        match self {
            Self::Base => "mobile",
            Self::Medium => "tablet",
            Self::Large => "desktop",
        }
    }

    /// Parse a canonical or legacy key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|bp| bp.key() == key || bp.legacy_key() == key)
    }
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Selector prefix per breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointPrefixes {
    /// Prefix for base classes (usually empty)
    pub base: String,
    /// Prefix for medium classes
    pub medium: String,
    /// Prefix for large classes
    pub large: String,
}

impl BreakpointPrefixes {
    /// Prefix for a breakpoint
    #[inline]
    #[must_use]
    pub fn get(&self, breakpoint: Breakpoint) -> &str {
        match breakpoint {
            Breakpoint::Base => &self.base,
            Breakpoint::Medium => &self.medium,
            Breakpoint::Large => &self.large,
        }
    }
}

impl Default for BreakpointPrefixes {
    fn default() -> Self {
        Self {
            base: String::new(),
            medium: "md:".to_string(),
            large: "lg:".to_string(),
        }
    }
}

/// Value of `T` per breakpoint
///
/// Serializes to the keyed object with absent breakpoints omitted.
/// Deserializes from the keyed form, the legacy key names, or a bare `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantValue<T> {
    /// Value for narrow viewports
    pub base: Option<T>,
    /// Value for medium viewports
    pub medium: Option<T>,
    /// Value for large viewports
    pub large: Option<T>,
}

impl<T> Default for VariantValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VariantValue<T> {
    /// Empty variant (no breakpoint set)
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base: None,
            medium: None,
            large: None,
        }
    }

    /// Variant with only the base breakpoint set
    #[inline]
    #[must_use]
    pub const fn base(value: T) -> Self {
        Self {
            base: Some(value),
            medium: None,
            large: None,
        }
    }

    /// With medium value
    #[inline]
    #[must_use]
    pub fn with_medium(mut self, value: T) -> Self {
        self.medium = Some(value);
        self
    }

    /// With large value
    #[inline]
    #[must_use]
    pub fn with_large(mut self, value: T) -> Self {
        self.large = Some(value);
        self
    }

    /// Value stored at exactly this breakpoint
    #[inline]
    #[must_use]
    pub fn get(&self, breakpoint: Breakpoint) -> Option<&T> {
        match breakpoint {
            Breakpoint::Base => self.base.as_ref(),
            Breakpoint::Medium => self.medium.as_ref(),
            Breakpoint::Large => self.large.as_ref(),
        }
    }

    /// Replace the value at a breakpoint, returning the previous one
    pub fn set(&mut self, breakpoint: Breakpoint, value: Option<T>) -> Option<T> {
        let slot = match breakpoint {
            Breakpoint::Base => &mut self.base,
            Breakpoint::Medium => &mut self.medium,
            Breakpoint::Large => &mut self.large,
        };
        std::mem::replace(slot, value)
    }

    /// Value in effect at `breakpoint`
    ///
    /// Walks down from `breakpoint` to the nearest set breakpoint. When
    /// nothing at or below it is set the result is `None`; no fallback is
    /// synthesized from wider breakpoints.
    #[must_use]
    pub fn resolve_at(&self, breakpoint: Breakpoint) -> Option<&T> {
        Breakpoint::ALL
            .into_iter()
            .rev()
            .filter(|bp| *bp <= breakpoint)
            .find_map(|bp| self.get(bp))
    }

    /// Set breakpoints in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (Breakpoint, &T)> {
        Breakpoint::ALL
            .into_iter()
            .filter_map(move |bp| self.get(bp).map(|v| (bp, v)))
    }

    /// True when no breakpoint is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.medium.is_none() && self.large.is_none()
    }

    /// Map every set value
    #[must_use]
    pub fn map<U, F>(&self, mut f: F) -> VariantValue<U>
    where
        F: FnMut(&T) -> U,
    {
        VariantValue {
            base: self.base.as_ref().map(&mut f),
            medium: self.medium.as_ref().map(&mut f),
            large: self.large.as_ref().map(&mut f),
        }
    }
}

impl VariantValue<Value> {
    /// Interpret a keyed object
    ///
    /// Returns `None` when `value` is not an object whose keys are all
    /// breakpoint names. Canonical keys win over legacy aliases; `null`
    /// entries count as unset.
    #[must_use]
    pub fn from_keyed(value: &Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        if !map.keys().all(|k| Breakpoint::from_key(k).is_some()) {
            return None;
        }

        let mut variant = Self::new();
        for bp in Breakpoint::ALL {
            let entry = map
                .get(bp.key())
                .filter(|v| !v.is_null())
                .or_else(|| map.get(bp.legacy_key()).filter(|v| !v.is_null()));
            variant.set(bp, entry.cloned());
        }
        Some(variant)
    }

    /// Interpret any stored value
    ///
    /// Keyed objects are read as such; `null` is the empty variant; any other
    /// value is a legacy bare value and becomes `{base: value}`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::new(),
            other => Self::from_keyed(other).unwrap_or_else(|| Self::base(other.clone())),
        }
    }

    /// Canonical keyed JSON form
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (bp, value) in self.iter() {
            map.insert(bp.key().to_string(), value.clone());
        }
        Value::Object(map)
    }
}

impl<T: Serialize> Serialize for VariantValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.iter().count();
        let mut map = serializer.serialize_map(Some(len))?;
        for (bp, value) in self.iter() {
            map.serialize_entry(bp.key(), value)?;
        }
        map.end()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for VariantValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let variant = VariantValue::from_json(&raw);
        let convert = |v: Option<Value>| -> Result<Option<T>, D::Error> {
            v.map(|v| serde_json::from_value(v).map_err(D::Error::custom))
                .transpose()
        };
        Ok(Self {
            base: convert(variant.base)?,
            medium: convert(variant.medium)?,
            large: convert(variant.large)?,
        })
    }
}

/// Upgrade a stored value to the canonical keyed form
///
/// Returns the canonical value and whether it differs from the input.
/// Re-rendering the upgraded value produces the same classes as the input.
#[must_use]
pub fn upgrade_value(value: &Value) -> (Value, bool) {
    if value.is_null() {
        return (Value::Null, false);
    }
    let canonical = VariantValue::from_json(value).to_json();
    let changed = canonical != *value;
    (canonical, changed)
}

/// Merge a variant of tokens into one class string using default prefixes
///
/// ```rust
/// use pagekit_schema::{merge_variant, VariantValue};
///
/// let v = VariantValue::base("4".to_string()).with_large("8".to_string());
/// assert_eq!(merge_variant(&v, |t| format!("p-{t}")), "p-4 lg:p-8");
/// ```
#[must_use]
pub fn merge_variant<F>(value: &VariantValue<String>, to_class: F) -> String
where
    F: Fn(&str) -> String,
{
    merge_variant_with(value, &BreakpointPrefixes::default(), to_class)
}

/// Merge a variant of tokens into one class string
///
/// Breakpoints are visited in ascending order. Empty tokens and empty
/// `to_class` results are skipped. When `to_class` yields several classes,
/// each receives the breakpoint prefix.
#[must_use]
pub fn merge_variant_with<F>(
    value: &VariantValue<String>,
    prefixes: &BreakpointPrefixes,
    to_class: F,
) -> String
where
    F: Fn(&str) -> String,
{
    let mut classes: Vec<String> = Vec::new();
    for (bp, token) in value.iter() {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let prefix = prefixes.get(bp);
        for class in to_class(token).split_whitespace() {
            classes.push(format!("{prefix}{class}"));
        }
    }
    classes.join(" ")
}

/// Merge a stored JSON value (keyed or legacy bare) using default prefixes
#[must_use]
pub fn merge_value<F>(value: &Value, to_class: F) -> String
where
    F: Fn(&str) -> String,
{
    merge_value_with(value, &BreakpointPrefixes::default(), to_class)
}

/// Merge a stored JSON value (keyed or legacy bare)
///
/// String tokens are used as-is, numbers and booleans through their JSON
/// text; other shapes are skipped.
#[must_use]
pub fn merge_value_with<F>(value: &Value, prefixes: &BreakpointPrefixes, to_class: F) -> String
where
    F: Fn(&str) -> String,
{
    let tokens = VariantValue::from_json(value).map(token_text);
    let tokens = VariantValue {
        base: tokens.base.flatten(),
        medium: tokens.medium.flatten(),
        large: tokens.large.flatten(),
    };
    merge_variant_with(&tokens, prefixes, to_class)
}

fn token_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn bg(token: &str) -> String {
        format!("bg-{token}")
    }

    #[test]
    fn merge_orders_breakpoints_ascending() {
        let v = VariantValue {
            base: Some("red".to_string()),
            medium: Some("green".to_string()),
            large: Some("blue".to_string()),
        };
        assert_eq!(merge_variant(&v, bg), "bg-red md:bg-green lg:bg-blue");
    }

    #[test]
    fn merge_skips_empty_tokens_and_empty_classes() {
        let v = VariantValue::base(String::new()).with_medium("x".to_string());
        assert_eq!(merge_variant(&v, bg), "md:bg-x");

        let v = VariantValue::base("keep".to_string()).with_large("drop".to_string());
        let classes = merge_variant(&v, |t| if t == "drop" { String::new() } else { t.to_string() });
        assert_eq!(classes, "keep");
    }

    #[test]
    fn merge_prefixes_every_class() {
        let v = VariantValue::new().with_medium("stack".to_string());
        let classes = merge_variant(&v, |_| "flex flex-col".to_string());
        assert_eq!(classes, "md:flex md:flex-col");
    }

    #[test]
    fn merge_uses_configured_prefixes() {
        let prefixes = BreakpointPrefixes {
            base: String::new(),
            medium: "tablet:".to_string(),
            large: "desktop:".to_string(),
        };
        let v = VariantValue::base("a".to_string()).with_large("b".to_string());
        assert_eq!(merge_variant_with(&v, &prefixes, bg), "bg-a desktop:bg-b");
    }

    #[test]
    fn missing_base_is_unstyled_at_narrow_widths() {
        let v = VariantValue::new().with_medium("y".to_string());
        assert_eq!(v.resolve_at(Breakpoint::Base), None);
        assert_eq!(merge_variant(&v, bg), "md:bg-y");
    }

    #[test]
    fn resolve_inherits_nearest_smaller() {
        let v = VariantValue::base("x").with_medium("y");
        assert_eq!(v.resolve_at(Breakpoint::Base), Some(&"x"));
        assert_eq!(v.resolve_at(Breakpoint::Medium), Some(&"y"));
        assert_eq!(v.resolve_at(Breakpoint::Large), Some(&"y"));
    }

    #[test]
    fn bare_value_reads_as_base() {
        let v = VariantValue::from_json(&json!("red"));
        assert_eq!(v, VariantValue::base(json!("red")));
    }

    #[test]
    fn legacy_keys_migrate() {
        let v = VariantValue::from_keyed(&json!({"mobile": "a", "tablet": "b", "desktop": "c"}))
            .unwrap();
        assert_eq!(v.to_json(), json!({"base": "a", "medium": "b", "large": "c"}));
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let v = VariantValue::from_keyed(&json!({"medium": "new", "tablet": "old"})).unwrap();
        assert_eq!(v.medium, Some(json!("new")));
    }

    #[test]
    fn object_with_foreign_keys_is_not_keyed() {
        assert!(VariantValue::from_keyed(&json!({"base": 1, "color": 2})).is_none());
        let v = VariantValue::from_json(&json!({"color": 2}));
        assert_eq!(v.base, Some(json!({"color": 2})));
    }

    #[test]
    fn empty_object_is_empty_variant() {
        let (value, changed) = upgrade_value(&json!({}));
        assert_eq!(value, json!({}));
        assert!(!changed);
    }

    #[test]
    fn upgrade_is_idempotent_on_canonical_values() {
        let canonical = json!({"base": "x", "large": "z"});
        let (value, changed) = upgrade_value(&canonical);
        assert_eq!(value, canonical);
        assert!(!changed);
    }

    #[test]
    fn serde_round_trip_keyed_form() {
        let v = VariantValue::base(3_u32).with_large(5);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, json!({"base": 3, "large": 5}));
        let back: VariantValue<u32> = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn serde_accepts_bare_legacy_value() {
        let v: VariantValue<String> = serde_json::from_value(json!("plain")).unwrap();
        assert_eq!(v, VariantValue::base("plain".to_string()));
    }

    #[test]
    fn merge_value_handles_numbers() {
        assert_eq!(merge_value(&json!({"base": 2, "medium": 4}), |t| format!("gap-{t}")), "gap-2 md:gap-4");
    }

    fn token() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-z0-9]{0,6}")
    }

    proptest! {
        #[test]
        fn prop_merge_is_deterministic(base in token(), medium in token(), large in token()) {
            let v = VariantValue { base, medium, large };
            let first = merge_variant(&v, bg);
            let second = merge_variant(&v, bg);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_medium_changes_output(x in "[a-z]{1,6}", y in "[a-z]{1,6}") {
            let only_base = VariantValue::base(x.clone());
            let with_medium = VariantValue::base(x).with_medium(y);
            prop_assert_ne!(merge_variant(&only_base, bg), merge_variant(&with_medium, bg));
        }

        #[test]
        fn prop_legacy_upgrade_preserves_classes(token in "[a-z]{1,8}") {
            let legacy = json!(token);
            let (upgraded, changed) = upgrade_value(&legacy);
            prop_assert!(changed);
            prop_assert_eq!(&upgraded, &json!({"base": token}));
            prop_assert_eq!(merge_value(&legacy, bg), merge_value(&upgraded, bg));
            let (again, changed_again) = upgrade_value(&upgraded);
            prop_assert!(!changed_again);
            prop_assert_eq!(again, upgraded);
        }
    }
}
