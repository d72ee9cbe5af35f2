//! Field editor interpretation
//!
//! [`resolve_editor`] pairs a descriptor with the current value and exposes
//! the commit operations an editor UI needs. Every commit validates first and
//! leaves the held value untouched on failure.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::field::{FieldDescriptor, FieldKind};
use crate::variant::{upgrade_value, Breakpoint, VariantValue};

/// Editor for one field value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEditor<'d> {
    descriptor: &'d FieldDescriptor,
    value: Value,
}

/// Resolve the editor for a descriptor and its current value
///
/// A missing value is treated as `null` (unset).
#[must_use]
pub fn resolve_editor<'d>(descriptor: &'d FieldDescriptor, current: Option<&Value>) -> FieldEditor<'d> {
    FieldEditor {
        descriptor,
        value: current.cloned().unwrap_or(Value::Null),
    }
}

impl<'d> FieldEditor<'d> {
    /// Descriptor being edited
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &'d FieldDescriptor {
        self.descriptor
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the editor, yielding the value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Human-readable rendering of the current value
    #[must_use]
    pub fn display_value(&self) -> String {
        if self.descriptor.responsive && !self.value.is_null() {
            let variant = VariantValue::from_json(&self.value);
            return variant
                .iter()
                .map(|(bp, v)| format!("{bp}: {}", display(&self.descriptor.kind, v)))
                .collect::<Vec<_>>()
                .join(", ");
        }
        display(&self.descriptor.kind, &self.value)
    }

    /// Replace the whole value
    ///
    /// Responsive fields store the canonical keyed form; a bare value is
    /// committed as the base breakpoint.
    ///
    /// # Errors
    /// Returns the validation error and keeps the prior value.
    pub fn commit(&mut self, new_value: Value) -> Result<&Value, SchemaError> {
        self.descriptor.validate(&new_value)?;
        self.value = if self.descriptor.responsive {
            upgrade_value(&new_value).0
        } else {
            new_value
        };
        Ok(&self.value)
    }

    /// Set the value for one breakpoint of a responsive field
    ///
    /// # Errors
    /// - `SchemaError::NotResponsive` for plain fields
    /// - validation errors from the field kind
    pub fn commit_at(&mut self, breakpoint: Breakpoint, new_value: Value) -> Result<&Value, SchemaError> {
        if !self.descriptor.responsive {
            return Err(SchemaError::NotResponsive);
        }
        self.descriptor
            .kind
            .validate(&new_value)
            .map_err(|e| e.at_breakpoint(breakpoint))?;

        let mut variant = VariantValue::from_json(&self.value);
        let entry = if new_value.is_null() { None } else { Some(new_value) };
        variant.set(breakpoint, entry);
        self.value = variant.to_json();
        Ok(&self.value)
    }

    /// Unset one breakpoint of a responsive field
    ///
    /// # Errors
    /// Returns `SchemaError::NotResponsive` for plain fields.
    pub fn clear_at(&mut self, breakpoint: Breakpoint) -> Result<&Value, SchemaError> {
        self.commit_at(breakpoint, Value::Null)
    }

    /// Append an item to an array field
    ///
    /// # Errors
    /// - `SchemaError::WrongKind` unless the field is a plain array
    /// - validation errors from the item schema
    pub fn push(&mut self, item: Value) -> Result<&Value, SchemaError> {
        let schema = self.array_item()?;
        let len = self.items_len()?;
        schema.validate(&item).map_err(|e| e.at_index(len))?;
        self.items_mut()?.push(item);
        Ok(&self.value)
    }

    /// Remove the item at `index`, returning it
    ///
    /// # Errors
    /// - `SchemaError::WrongKind` unless the field is a plain array
    /// - `SchemaError::IndexOutOfBounds`
    pub fn remove_at(&mut self, index: usize) -> Result<Value, SchemaError> {
        self.array_item()?;
        let len = self.items_len()?;
        if index >= len {
            return Err(SchemaError::IndexOutOfBounds { index, len });
        }
        Ok(self.items_mut()?.remove(index))
    }

    /// Replace the item at `index`
    ///
    /// # Errors
    /// - `SchemaError::WrongKind` unless the field is a plain array
    /// - `SchemaError::IndexOutOfBounds`
    /// - validation errors from the item schema
    pub fn replace_at(&mut self, index: usize, item: Value) -> Result<&Value, SchemaError> {
        let schema = self.array_item()?;
        let len = self.items_len()?;
        if index >= len {
            return Err(SchemaError::IndexOutOfBounds { index, len });
        }
        schema.validate(&item).map_err(|e| e.at_index(index))?;
        self.items_mut()?[index] = item;
        Ok(&self.value)
    }

    /// Number of items in an array field (`0` when unset)
    ///
    /// # Errors
    /// Returns `SchemaError::TypeMismatch` if the held value is not an array.
    pub fn items_len(&self) -> Result<usize, SchemaError> {
        match &self.value {
            Value::Null => Ok(0),
            Value::Array(items) => Ok(items.len()),
            other => Err(SchemaError::TypeMismatch {
                expected: "array",
                actual: crate::error::json_type_name(other),
            }),
        }
    }

    /// Editor for one subfield of an object field
    ///
    /// # Errors
    /// - `SchemaError::WrongKind` unless the field is a plain object
    /// - `SchemaError::UnknownSubfield`
    pub fn subfield(&self, name: &str) -> Result<FieldEditor<'d>, SchemaError> {
        let descriptor = self.object_field(name)?;
        Ok(resolve_editor(descriptor, self.value.get(name)))
    }

    /// Set one subfield of an object field, leaving the others untouched
    ///
    /// Committing `null` removes the key.
    ///
    /// # Errors
    /// - `SchemaError::WrongKind` unless the field is a plain object
    /// - `SchemaError::UnknownSubfield`
    /// - validation errors from the subfield
    pub fn commit_subfield(&mut self, name: &str, new_value: Value) -> Result<&Value, SchemaError> {
        let descriptor = self.object_field(name)?;
        let mut sub = resolve_editor(descriptor, self.value.get(name));
        sub.commit(new_value).map_err(|e| e.in_subfield(name))?;
        let committed = sub.into_value();

        if self.value.is_null() {
            self.value = Value::Object(Map::new());
        }
        let actual = crate::error::json_type_name(&self.value);
        let Value::Object(map) = &mut self.value else {
            return Err(SchemaError::TypeMismatch {
                expected: "object",
                actual,
            });
        };
        if committed.is_null() {
            map.remove(name);
        } else {
            map.insert(name.to_string(), committed);
        }
        Ok(&self.value)
    }

    fn array_item(&self) -> Result<&'d FieldDescriptor, SchemaError> {
        match &self.descriptor.kind {
            FieldKind::Array { item } if !self.descriptor.responsive => Ok(item),
            _ => Err(SchemaError::WrongKind { expected: "array" }),
        }
    }

    fn object_field(&self, name: &str) -> Result<&'d FieldDescriptor, SchemaError> {
        match &self.descriptor.kind {
            FieldKind::Object { fields } if !self.descriptor.responsive => fields
                .get(name)
                .ok_or_else(|| SchemaError::UnknownSubfield(name.to_string())),
            _ => Err(SchemaError::WrongKind { expected: "object" }),
        }
    }

    fn items_mut(&mut self) -> Result<&mut Vec<Value>, SchemaError> {
        if self.value.is_null() {
            self.value = Value::Array(Vec::new());
        }
        match &mut self.value {
            Value::Array(items) => Ok(items),
            other => Err(SchemaError::TypeMismatch {
                expected: "array",
                actual: crate::error::json_type_name(other),
            }),
        }
    }
}

fn display(kind: &FieldKind, value: &Value) -> String {
    if value.is_null() {
        return String::new();
    }
    match kind {
        FieldKind::Text | FieldKind::Textarea => value.as_str().unwrap_or_default().to_string(),
        FieldKind::Number { .. } | FieldKind::Boolean => value.to_string(),
        FieldKind::Select { options } => options
            .iter()
            .find(|o| o.value == *value)
            .map_or_else(|| value.to_string(), |o| o.label.clone()),
        FieldKind::Array { .. } => match value.as_array().map_or(0, Vec::len) {
            0 => "no items".to_string(),
            1 => "1 item".to_string(),
            n => format!("{n} items"),
        },
        FieldKind::Object { fields } => fields
            .iter()
            .filter_map(|(name, descriptor)| {
                let entry = value.get(name)?;
                let editor = resolve_editor(descriptor, Some(entry));
                Some(format!("{name}: {}", editor.display_value()))
            })
            .collect::<Vec<_>>()
            .join(", "),
        FieldKind::Custom { .. } => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SelectOption;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn alignment() -> FieldDescriptor {
        FieldDescriptor::select(vec![
            SelectOption::new("Left", "left"),
            SelectOption::new("Center", "center"),
        ])
    }

    #[test]
    fn select_commit_rejects_and_keeps_prior_value() {
        let d = alignment();
        let current = json!("left");
        let mut editor = resolve_editor(&d, Some(&current));

        assert!(editor.commit(json!("upside-down")).is_err());
        assert_eq!(editor.value(), &json!("left"));

        editor.commit(json!("center")).unwrap();
        assert_eq!(editor.value(), &json!("center"));
        assert_eq!(editor.display_value(), "Center");
    }

    #[test]
    fn array_operations() {
        let d = FieldDescriptor::array(FieldDescriptor::text());
        let mut editor = resolve_editor(&d, None);
        assert_eq!(editor.display_value(), "");

        editor.push(json!("a")).unwrap();
        editor.push(json!("b")).unwrap();
        editor.push(json!("c")).unwrap();
        assert_eq!(editor.display_value(), "3 items");

        editor.replace_at(1, json!("B")).unwrap();
        assert_eq!(editor.remove_at(0).unwrap(), json!("a"));
        assert_eq!(editor.value(), &json!(["B", "c"]));

        assert!(matches!(
            editor.remove_at(5),
            Err(SchemaError::IndexOutOfBounds { index: 5, len: 2 })
        ));
        assert!(editor.push(json!(7)).is_err());
        assert_eq!(editor.value(), &json!(["B", "c"]));
    }

    #[test]
    fn empty_array_is_valid_and_displays_no_items() {
        let d = FieldDescriptor::array(FieldDescriptor::text());
        let mut editor = resolve_editor(&d, None);
        editor.commit(json!([])).unwrap();
        assert_eq!(editor.display_value(), "no items");
    }

    #[test]
    fn object_partial_update_touches_one_key() {
        let d = FieldDescriptor::object([
            ("label", FieldDescriptor::text()),
            ("href", FieldDescriptor::text()),
        ]);
        let current = json!({"label": "Home", "href": "/"});
        let mut editor = resolve_editor(&d, Some(&current));

        editor.commit_subfield("href", json!("/start")).unwrap();
        assert_eq!(editor.value(), &json!({"label": "Home", "href": "/start"}));

        assert!(editor.commit_subfield("href", json!(1)).is_err());
        assert!(editor.commit_subfield("target", json!("x")).is_err());
        assert_eq!(editor.value(), &json!({"label": "Home", "href": "/start"}));

        editor.commit_subfield("label", Value::Null).unwrap();
        assert_eq!(editor.value(), &json!({"href": "/start"}));
        assert_eq!(editor.subfield("href").unwrap().value(), &json!("/start"));
    }

    #[test]
    fn custom_values_pass_through_untouched() {
        let d = FieldDescriptor::custom("embed");
        let blob = json!({"html": "<iframe></iframe>", "nested": [1, {"x": null}]});
        let mut editor = resolve_editor(&d, None);
        editor.commit(blob.clone()).unwrap();
        assert_eq!(editor.into_value(), blob);
    }

    #[test]
    fn responsive_commit_upgrades_bare_values() {
        let d = FieldDescriptor::text().responsive();
        let mut editor = resolve_editor(&d, None);
        editor.commit(json!("Hello")).unwrap();
        assert_eq!(editor.value(), &json!({"base": "Hello"}));

        editor.commit_at(Breakpoint::Medium, json!("Hi")).unwrap();
        assert_eq!(editor.value(), &json!({"base": "Hello", "medium": "Hi"}));
        assert_eq!(editor.display_value(), "base: Hello, medium: Hi");

        editor.clear_at(Breakpoint::Base).unwrap();
        assert_eq!(editor.value(), &json!({"medium": "Hi"}));
    }

    #[test]
    fn per_breakpoint_ops_require_responsive_fields() {
        let d = FieldDescriptor::text();
        let mut editor = resolve_editor(&d, None);
        assert_eq!(
            editor.commit_at(Breakpoint::Large, json!("x")),
            Err(SchemaError::NotResponsive)
        );
    }

    #[test]
    fn array_ops_on_wrong_kind() {
        let d = FieldDescriptor::text();
        let mut editor = resolve_editor(&d, None);
        assert_eq!(
            editor.push(json!("x")),
            Err(SchemaError::WrongKind { expected: "array" })
        );
    }
}
