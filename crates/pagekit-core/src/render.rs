//! Document renderer
//!
//! Walks the composition tree from the root zones down, handing each block
//! its effective props and a callback that renders its owned zones. Problems
//! never abort the walk: an unknown block becomes an inert placeholder and a
//! zone nested past the depth limit becomes an empty marker. Both are
//! collected in [`Rendered::errors`].

use std::cell::RefCell;

use pagekit_document::{BlockInstance, Document, InstanceId, ZoneId};
use pagekit_registry::{Element, RenderArgs, Registry};
use pagekit_schema::{Breakpoint, BreakpointPrefixes};

use crate::config::EngineConfig;

/// Class of the element standing in for an unknown block
pub const UNKNOWN_CLASS: &str = "pagekit-unknown";

/// Class of the element standing in for a zone past the depth limit
pub const DEPTH_LIMIT_CLASS: &str = "pagekit-depth-limit";

/// Render settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Breakpoint used to resolve responsive text props
    pub breakpoint: Breakpoint,
    /// Selector prefix per breakpoint
    pub prefixes: BreakpointPrefixes,
    /// Deepest zone nesting rendered
    pub max_depth: usize,
}

impl RenderOptions {
    /// Options from engine configuration, at the base breakpoint
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            breakpoint: Breakpoint::Base,
            prefixes: config.breakpoints.clone(),
            max_depth: config.max_render_depth,
        }
    }

    /// Set target breakpoint
    #[inline]
    #[must_use]
    pub fn at(mut self, breakpoint: Breakpoint) -> Self {
        self.breakpoint = breakpoint;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Non-fatal render problem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Block type not in the registry
    #[error("unknown block type {type_name} ({id})")]
    UnknownBlock {
        /// Placeholder instance
        id: InstanceId,
        /// Unregistered type name
        type_name: String,
    },

    /// Zone nested deeper than the configured limit
    #[error("render depth exceeded at zone {zone}")]
    DepthExceeded {
        /// First zone not rendered
        zone: ZoneId,
    },

    /// A declared slot has no zone in the document
    #[error("zone not found: {0}")]
    MissingZone(ZoneId),
}

/// Render output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Page markup
    pub markup: String,
    /// Problems met while rendering
    pub errors: Vec<RenderError>,
}

impl Rendered {
    /// Whether the page rendered without problems
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Render a document
#[must_use]
pub fn render(document: &Document, registry: &Registry, options: &RenderOptions) -> Rendered {
    let renderer = Renderer {
        document,
        registry,
        options,
        errors: RefCell::new(Vec::new()),
    };
    let root = registry.root();
    let props = root.effective_props(document.root_props());
    let slots = |slot: &str| renderer.zone(&ZoneId::root(slot), 1);
    let args = RenderArgs::new(root, &props, &options.prefixes, options.breakpoint, &slots);
    let markup = root.render(&args);

    Rendered {
        markup,
        errors: renderer.errors.into_inner(),
    }
}

struct Renderer<'a> {
    document: &'a Document,
    registry: &'a Registry,
    options: &'a RenderOptions,
    errors: RefCell<Vec<RenderError>>,
}

impl Renderer<'_> {
    fn zone(&self, id: &ZoneId, depth: usize) -> String {
        if depth > self.options.max_depth {
            self.errors
                .borrow_mut()
                .push(RenderError::DepthExceeded { zone: id.clone() });
            return Element::new("div")
                .class(DEPTH_LIMIT_CLASS)
                .attr("data-zone", id.to_string())
                .to_string();
        }
        let Some(zone) = self.document.zone(id) else {
            self.errors.borrow_mut().push(RenderError::MissingZone(id.clone()));
            return String::new();
        };
        zone.items()
            .iter()
            .map(|instance| self.block(instance, depth))
            .collect()
    }

    fn block(&self, instance: &BlockInstance, depth: usize) -> String {
        let id = instance.id();
        let Some(definition) = self.registry.lookup(instance.type_name()) else {
            tracing::warn!(instance = %id, block_type = instance.type_name(), "rendering placeholder for unknown block");
            self.errors.borrow_mut().push(RenderError::UnknownBlock {
                id,
                type_name: instance.type_name().to_string(),
            });
            return Element::new("div")
                .class(UNKNOWN_CLASS)
                .attr("data-block-type", instance.type_name())
                .attr("data-block-id", id.to_string())
                .to_string();
        };
        let props = definition.effective_props(instance.props());
        let slots = |slot: &str| self.zone(&ZoneId::of(id, slot), depth + 1);
        let args = RenderArgs::new(
            definition,
            &props,
            &self.options.prefixes,
            self.options.breakpoint,
            &slots,
        )
        .with_id(id);
        definition.render(&args)
    }
}
