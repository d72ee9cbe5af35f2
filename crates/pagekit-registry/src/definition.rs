//! Block definitions
//!
//! A [`BlockDefinition`] is the immutable description of one block type: its
//! ordered field schema, default props, owned zone slots and render function.
//! Definitions are built once with [`BlockDefinition::builder`] and shared
//! read-only by every instance of the type.

use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use pagekit_schema::{
    merge_value_with, upgrade_value, Breakpoint, BreakpointPrefixes, FieldDescriptor, Props,
    SchemaError, VariantValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RegistryError, Result};
use crate::instance::InstanceId;
use crate::markup::{self, Element};

/// Grouping shown in the block picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Containers that own zones
    Layout,
    /// Headings and body text
    Typography,
    /// Images and spacing
    Media,
    /// Tracks and playlists
    Music,
    /// Products
    Commerce,
    /// Events and tickets
    Events,
    /// Third-party embeds
    Embed,
}

impl Category {
    /// All categories in picker order
    pub const ALL: [Category; 7] = [
        Category::Layout,
        Category::Typography,
        Category::Media,
        Category::Music,
        Category::Commerce,
        Category::Events,
        Category::Embed,
    ];

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Typography => "typography",
            Self::Media => "media",
            Self::Music => "music",
            Self::Commerce => "commerce",
            Self::Events => "events",
            Self::Embed => "embed",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render function of a block type
pub type RenderFn = Arc<dyn Fn(&RenderArgs<'_>) -> String + Send + Sync>;

/// Everything a render function may read
pub struct RenderArgs<'a> {
    id: Option<InstanceId>,
    definition: &'a BlockDefinition,
    props: &'a Props,
    prefixes: &'a BreakpointPrefixes,
    breakpoint: Breakpoint,
    slots: &'a dyn Fn(&str) -> String,
}

impl<'a> RenderArgs<'a> {
    /// Create render arguments
    ///
    /// `props` must already be the effective props (defaults overlaid by
    /// instance props). `slots` renders the zone owned under a slot name.
    #[must_use]
    pub fn new(
        definition: &'a BlockDefinition,
        props: &'a Props,
        prefixes: &'a BreakpointPrefixes,
        breakpoint: Breakpoint,
        slots: &'a dyn Fn(&str) -> String,
    ) -> Self {
        Self {
            id: None,
            definition,
            props,
            prefixes,
            breakpoint,
            slots,
        }
    }

    /// Attach the rendered instance id (absent for the root)
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: InstanceId) -> Self {
        self.id = Some(id);
        self
    }

    /// Instance id, `None` when rendering the root
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<InstanceId> {
        self.id
    }

    /// Definition being rendered
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &BlockDefinition {
        self.definition
    }

    /// Target breakpoint for text resolution
    #[inline]
    #[must_use]
    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// Raw effective prop
    #[inline]
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name).filter(|v| !v.is_null())
    }

    /// Prop value at the target breakpoint
    #[must_use]
    pub fn resolved(&self, name: &str) -> Option<Value> {
        self.definition.resolve_value(self.props.get(name)?, name, self.breakpoint)
    }

    /// Prop as escaped text at the target breakpoint
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.resolved(name)
            .and_then(|v| plain_text(&v))
            .map(|s| markup::escape_text(&s))
            .unwrap_or_default()
    }

    /// Prop as unescaped plain text at the target breakpoint
    #[must_use]
    pub fn raw_text(&self, name: &str) -> Option<String> {
        self.resolved(name).and_then(|v| plain_text(&v))
    }

    /// Class string for a style prop across all breakpoints
    #[must_use]
    pub fn classes<F>(&self, name: &str, to_class: F) -> String
    where
        F: Fn(&str) -> String,
    {
        self.prop(name)
            .map(|v| merge_value_with(v, self.prefixes, to_class))
            .unwrap_or_default()
    }

    /// Rendered markup of an owned zone
    #[must_use]
    pub fn slot(&self, name: &str) -> String {
        (self.slots)(name)
    }

    /// Element pre-tagged with this block's type and id
    #[must_use]
    pub fn element(&self, tag: &'static str) -> Element {
        let el = Element::new(tag).attr("data-block-type", self.definition.type_name());
        match self.id {
            Some(id) => el.attr("data-block-id", id.to_string()),
            None => el,
        }
    }
}

fn plain_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Immutable description of one block type
#[derive(Clone)]
pub struct BlockDefinition {
    type_name: String,
    label: String,
    category: Category,
    fields: IndexMap<String, FieldDescriptor>,
    defaults: Props,
    slots: Vec<String>,
    render: Option<RenderFn>,
}

impl Debug for BlockDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("type_name", &self.type_name)
            .field("category", &self.category)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl BlockDefinition {
    /// Start building a definition
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> BlockDefinitionBuilder {
        BlockDefinitionBuilder::new(type_name)
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Picker category
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Field schema in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    /// One field's descriptor
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Default props
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &Props {
        &self.defaults
    }

    /// Names of the zones each instance owns
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Whether instances own a zone under `slot`
    #[must_use]
    pub fn has_slot(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s == slot)
    }

    /// Whether a field is stored per breakpoint
    #[must_use]
    pub fn is_responsive(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|d| d.responsive)
    }

    /// Overlay instance props on the defaults, key by key
    #[must_use]
    pub fn effective_props(&self, props: &Props) -> Props {
        let mut merged = self.defaults.clone();
        for (name, value) in props {
            if value.is_null() {
                continue;
            }
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Value of one field at a breakpoint, given an instance's own props
    ///
    /// Responsive fields cascade to the nearest smaller set breakpoint.
    #[must_use]
    pub fn resolve(&self, props: &Props, name: &str, breakpoint: Breakpoint) -> Option<Value> {
        let value = props
            .get(name)
            .filter(|v| !v.is_null())
            .or_else(|| self.defaults.get(name))?;
        self.resolve_value(value, name, breakpoint)
    }

    fn resolve_value(&self, value: &Value, name: &str, breakpoint: Breakpoint) -> Option<Value> {
        if value.is_null() {
            return None;
        }
        if self.is_responsive(name) {
            VariantValue::from_json(value).resolve_at(breakpoint).cloned()
        } else {
            Some(value.clone())
        }
    }

    /// Validate a value for one field
    ///
    /// # Errors
    /// - `SchemaError::UnknownField` if the definition has no such field
    /// - the field's validation error
    pub fn validate_prop(&self, name: &str, value: &Value) -> std::result::Result<(), SchemaError> {
        let descriptor = self
            .fields
            .get(name)
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()))?;
        descriptor.validate(value)
    }

    /// Render one instance
    ///
    /// Definitions without a render function emit a plain container holding
    /// their slots in order.
    #[must_use]
    pub fn render(&self, args: &RenderArgs<'_>) -> String {
        match &self.render {
            Some(render) => render(args),
            None => {
                let mut el = args.element("div");
                for slot in &self.slots {
                    el = el.html(args.slot(slot));
                }
                el.to_string()
            }
        }
    }

    /// Check defaults and slots, canonicalising responsive defaults
    pub(crate) fn canonicalise(&mut self) -> Result<()> {
        for slot in &self.slots {
            if slot.is_empty() || slot.contains('.') {
                return Err(RegistryError::InvalidSlot {
                    type_name: self.type_name.clone(),
                    slot: slot.clone(),
                });
            }
        }
        for (name, value) in &mut self.defaults {
            let invalid = |source| RegistryError::InvalidDefault {
                type_name: self.type_name.clone(),
                field: name.clone(),
                source,
            };
            let descriptor = self
                .fields
                .get(name)
                .ok_or_else(|| invalid(SchemaError::UnknownField(name.clone())))?;
            descriptor.validate(value).map_err(invalid)?;
            if descriptor.responsive {
                *value = upgrade_value(value).0;
            }
        }
        Ok(())
    }
}

/// Builder for [`BlockDefinition`]
pub struct BlockDefinitionBuilder {
    definition: BlockDefinition,
}

impl BlockDefinitionBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            definition: BlockDefinition {
                label: type_name.clone(),
                type_name,
                category: Category::Layout,
                fields: IndexMap::new(),
                defaults: Props::new(),
                slots: Vec::new(),
                render: None,
            },
        }
    }

    /// Set display label
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.definition.label = label.into();
        self
    }

    /// Set picker category
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.definition.category = category;
        self
    }

    /// Declare a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.definition.fields.insert(name.into(), descriptor);
        self
    }

    /// Set a default prop
    #[must_use]
    pub fn default(mut self, name: impl Into<String>, value: Value) -> Self {
        self.definition.defaults.insert(name.into(), value);
        self
    }

    /// Declare an owned zone slot
    #[must_use]
    pub fn slot(mut self, name: impl Into<String>) -> Self {
        self.definition.slots.push(name.into());
        self
    }

    /// Set the render function
    #[must_use]
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&RenderArgs<'_>) -> String + Send + Sync + 'static,
    {
        self.definition.render = Some(Arc::new(render));
        self
    }

    /// Finish the definition
    ///
    /// Defaults are checked when the definition is registered.
    #[must_use]
    pub fn build(self) -> BlockDefinition {
        self.definition
    }
}
