//! Field descriptors
//!
//! A [`FieldDescriptor`] describes one editable value of a block. The value's
//! shape is determined entirely by its [`FieldKind`]; the kinds form a closed
//! union that is matched exhaustively wherever values are interpreted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{json_type_name, SchemaError};
use crate::variant::VariantValue;

/// Field kind names accepted in serialized descriptors
const KNOWN_KINDS: [&str; 8] = [
    "text", "textarea", "number", "boolean", "select", "array", "object", "custom",
];

/// One `{label, value}` entry of a select field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Label shown to the editor
    pub label: String,
    /// Stored value
    pub value: Value,
}

impl SelectOption {
    /// Create option
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Closed union of field kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line string
    Text,
    /// Multi-line string
    Textarea,
    /// Number with optional bounds
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// True/false toggle
    Boolean,
    /// One value out of a fixed option set
    Select { options: Vec<SelectOption> },
    /// Ordered list of items sharing one schema
    Array { item: Box<FieldDescriptor> },
    /// Nested record of independently edited subfields
    Object { fields: IndexMap<String, FieldDescriptor> },
    /// Value shape owned by an externally registered editor
    Custom { editor: String },
}

impl FieldKind {
    /// Kind tag as it appears in serialized descriptors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::Select { .. } => "select",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Custom { .. } => "custom",
        }
    }

    /// Validate a single (non-responsive) value against this kind
    ///
    /// `null` is accepted by every kind and means "unset".
    ///
    /// # Errors
    /// Returns the first mismatch found, with its path inside the value.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Text | Self::Textarea => expect(value.is_string(), "string", value),
            Self::Boolean => expect(value.is_boolean(), "boolean", value),
            Self::Number { min, max } => {
                let n = value.as_f64().ok_or(SchemaError::TypeMismatch {
                    expected: "number",
                    actual: json_type_name(value),
                })?;
                let below = min.is_some_and(|min| n < min);
                let above = max.is_some_and(|max| n > max);
                if below || above {
                    return Err(SchemaError::OutOfRange { value: n });
                }
                Ok(())
            }
            Self::Select { options } => {
                if options.iter().any(|o| o.value == *value) {
                    Ok(())
                } else {
                    Err(SchemaError::NotInOptions {
                        value: value.to_string(),
                    })
                }
            }
            Self::Array { item } => {
                let items = value.as_array().ok_or(SchemaError::TypeMismatch {
                    expected: "array",
                    actual: json_type_name(value),
                })?;
                for (index, entry) in items.iter().enumerate() {
                    item.validate(entry).map_err(|e| e.at_index(index))?;
                }
                Ok(())
            }
            Self::Object { fields } => {
                let map = value.as_object().ok_or(SchemaError::TypeMismatch {
                    expected: "object",
                    actual: json_type_name(value),
                })?;
                for (name, entry) in map {
                    let descriptor = fields
                        .get(name)
                        .ok_or_else(|| SchemaError::UnknownSubfield(name.clone()))?;
                    descriptor
                        .validate(entry)
                        .map_err(|e| e.in_subfield(name.clone()))?;
                }
                Ok(())
            }
            // Delegated editors own the shape
            Self::Custom { .. } => Ok(()),
        }
    }
}

fn expect(ok: bool, expected: &'static str, value: &Value) -> Result<(), SchemaError> {
    if ok {
        Ok(())
    } else {
        Err(SchemaError::TypeMismatch {
            expected,
            actual: json_type_name(value),
        })
    }
}

/// Descriptor for one editable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Label shown to the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Kind (and kind-specific options)
    #[serde(flatten)]
    pub kind: FieldKind,

    /// Whether the value is stored per breakpoint
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub responsive: bool,
}

impl FieldDescriptor {
    /// Create descriptor for a kind
    #[inline]
    #[must_use]
    pub fn new(kind: FieldKind) -> Self {
        Self {
            label: None,
            kind,
            responsive: false,
        }
    }

    /// Text field
    #[inline]
    #[must_use]
    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    /// Textarea field
    #[inline]
    #[must_use]
    pub fn textarea() -> Self {
        Self::new(FieldKind::Textarea)
    }

    /// Unbounded number field
    #[inline]
    #[must_use]
    pub fn number() -> Self {
        Self::new(FieldKind::Number {
            min: None,
            max: None,
        })
    }

    /// Bounded number field
    #[inline]
    #[must_use]
    pub fn number_between(min: f64, max: f64) -> Self {
        Self::new(FieldKind::Number {
            min: Some(min),
            max: Some(max),
        })
    }

    /// Boolean field
    #[inline]
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// Select field over the given options
    #[inline]
    #[must_use]
    pub fn select(options: Vec<SelectOption>) -> Self {
        Self::new(FieldKind::Select { options })
    }

    /// Select field where each option's label equals its string value
    #[must_use]
    pub fn select_strings(values: &[&str]) -> Self {
        Self::select(values.iter().map(|v| SelectOption::new(*v, *v)).collect())
    }

    /// Array field
    #[inline]
    #[must_use]
    pub fn array(item: FieldDescriptor) -> Self {
        Self::new(FieldKind::Array {
            item: Box::new(item),
        })
    }

    /// Object field
    #[must_use]
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldDescriptor)>,
        S: Into<String>,
    {
        Self::new(FieldKind::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Custom field delegated to an external editor
    #[inline]
    #[must_use]
    pub fn custom(editor: impl Into<String>) -> Self {
        Self::new(FieldKind::Custom {
            editor: editor.into(),
        })
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Store the value per breakpoint
    #[inline]
    #[must_use]
    pub fn responsive(mut self) -> Self {
        self.responsive = true;
        self
    }

    /// Parse a descriptor from JSON
    ///
    /// # Errors
    /// - `SchemaError::UnknownKind` if the `kind` tag is outside the union
    /// - `SchemaError::MalformedDescriptor` for any other shape problem
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        check_kinds(value)?;
        serde_json::from_value(value.clone())
            .map_err(|e| SchemaError::MalformedDescriptor(e.to_string()))
    }

    /// Validate a stored value
    ///
    /// Responsive fields accept the keyed per-breakpoint form (every present
    /// breakpoint is validated) as well as a bare legacy value.
    ///
    /// # Errors
    /// Returns the first mismatch found.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        if self.responsive {
            if let Some(variant) = VariantValue::from_keyed(value) {
                for (bp, entry) in variant.iter() {
                    self.kind.validate(entry).map_err(|e| e.at_breakpoint(bp))?;
                }
                return Ok(());
            }
        }
        self.kind.validate(value)
    }
}

/// Reject unknown `kind` tags anywhere in a descriptor tree
fn check_kinds(value: &Value) -> Result<(), SchemaError> {
    let Some(map) = value.as_object() else {
        return Err(SchemaError::MalformedDescriptor(
            "descriptor must be an object".to_string(),
        ));
    };
    match map.get("kind").and_then(Value::as_str) {
        Some(kind) if KNOWN_KINDS.contains(&kind) => {}
        Some(kind) => return Err(SchemaError::UnknownKind(kind.to_string())),
        None => {
            return Err(SchemaError::MalformedDescriptor(
                "missing 'kind'".to_string(),
            ))
        }
    }
    if let Some(item) = map.get("item") {
        check_kinds(item)?;
    }
    if let Some(Value::Object(fields)) = map.get("fields") {
        for field in fields.values() {
            check_kinds(field)?;
        }
    }
    Ok(())
}
