//! Block registry
//!
//! Provides [`Registry`], the immutable lookup table from type name to
//! [`BlockDefinition`]. It is built once at startup with
//! [`Registry::builder`] and passed by reference (or `Arc`) to everything
//! that needs lookups.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::{BlockDefinition, Category};
use crate::error::{RegistryError, Result};
use crate::instance::{BlockInstance, InstanceId};
use crate::library;

/// Immutable registry of block definitions
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: IndexMap<String, Arc<BlockDefinition>>,
    root: Arc<BlockDefinition>,
}

impl Registry {
    /// Start building a registry
    #[inline]
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up a definition
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` for unregistered type names.
    pub fn get(&self, type_name: &str) -> Result<&Arc<BlockDefinition>> {
        self.definitions
            .get(type_name)
            .ok_or_else(|| RegistryError::NotFound(type_name.to_string()))
    }

    /// Look up a definition, `None` when unregistered
    #[inline]
    #[must_use]
    pub fn lookup(&self, type_name: &str) -> Option<&Arc<BlockDefinition>> {
        self.definitions.get(type_name)
    }

    /// Check if a type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.definitions.contains_key(type_name)
    }

    /// Definition of the document root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Arc<BlockDefinition> {
        &self.root
    }

    /// Create an instance with a fresh id and a private copy of the defaults
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` for unregistered type names.
    pub fn instantiate(&self, type_name: &str) -> Result<BlockInstance> {
        let definition = self.get(type_name)?;
        Ok(BlockInstance::new(
            InstanceId::new(),
            definition.type_name(),
            definition.defaults().clone(),
        ))
    }

    /// Registered type names in registration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<BlockDefinition>> {
        self.definitions.values()
    }

    /// Definitions of one picker category
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Arc<BlockDefinition>> {
        self.definitions
            .values()
            .filter(move |d| d.category() == category)
    }

    /// Number of block types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if no block types are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Builder for [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    definitions: IndexMap<String, Arc<BlockDefinition>>,
    root: Option<BlockDefinition>,
}

impl RegistryBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type
    ///
    /// # Errors
    /// - `RegistryError::DuplicateType` if the name is already taken
    /// - `RegistryError::InvalidDefault` / `InvalidSlot` for a bad definition
    pub fn register(mut self, mut definition: BlockDefinition) -> Result<Self> {
        if self.definitions.contains_key(definition.type_name()) {
            return Err(RegistryError::DuplicateType(
                definition.type_name().to_string(),
            ));
        }
        definition.canonicalise()?;
        tracing::debug!(block_type = definition.type_name(), "registered block type");
        self.definitions
            .insert(definition.type_name().to_string(), Arc::new(definition));
        Ok(self)
    }

    /// Register several block types
    ///
    /// # Errors
    /// Stops at the first failing definition.
    pub fn register_all<I>(self, definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = BlockDefinition>,
    {
        definitions
            .into_iter()
            .try_fold(self, RegistryBuilder::register)
    }

    /// Replace the root definition
    ///
    /// # Errors
    /// Returns `RegistryError::InvalidDefault` / `InvalidSlot` for a bad definition.
    pub fn with_root(mut self, mut root: BlockDefinition) -> Result<Self> {
        root.canonicalise()?;
        self.root = Some(root);
        Ok(self)
    }

    /// Finish the registry
    ///
    /// # Errors
    /// Fails only if the built-in root definition is rejected.
    pub fn build(self) -> Result<Registry> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let mut root = library::root();
                root.canonicalise()?;
                root
            }
        };
        Ok(Registry {
            definitions: self.definitions,
            root: Arc::new(root),
        })
    }
}
