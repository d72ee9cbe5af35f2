//! Composition tree
//!
//! A [`Document`] is the root props plus every zone in the page. Zones nest
//! through instance-owned slots, so the zone map is a tree rooted at the
//! root's slots. Every mutation validates completely before touching
//! anything: an `Err` means the document is exactly as it was.

use std::collections::{BTreeMap, HashSet, VecDeque};

use pagekit_registry::{BlockDefinition, BlockInstance, InstanceId, Registry};
use pagekit_schema::{upgrade_value, Props};
use serde_json::Value;

use crate::error::TreeError;
use crate::zone::{Zone, ZoneId, ZoneOwner};

/// Whether the document holds any block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// No block instances in any zone
    Empty,
    /// At least one block instance
    Populated,
}

/// Everything a cascade delete took out of the document
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// The instance that was asked to be removed
    pub instance: BlockInstance,
    /// Ids of every removed instance, the requested one first
    pub removed_instances: Vec<InstanceId>,
    /// Ids of every removed zone
    pub removed_zones: Vec<ZoneId>,
}

/// A page: root props and all zones
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root_props: Props,
    zones: BTreeMap<ZoneId, Zone>,
}

impl Document {
    /// Create an empty document with the root's default props and zones
    #[must_use]
    pub fn new(registry: &Registry) -> Self {
        let root = registry.root();
        let zones = root
            .slots()
            .iter()
            .map(|slot| {
                let id = ZoneId::root(slot.as_str());
                (id.clone(), Zone::new(id))
            })
            .collect();
        Self {
            root_props: root.defaults().clone(),
            zones,
        }
    }

    /// Assemble a document without checking invariants
    pub(crate) fn from_parts(root_props: Props, zones: BTreeMap<ZoneId, Zone>) -> Self {
        Self { root_props, zones }
    }

    pub(crate) fn zones_mut(&mut self) -> &mut BTreeMap<ZoneId, Zone> {
        &mut self.zones
    }

    /// Root props
    #[inline]
    #[must_use]
    pub fn root_props(&self) -> &Props {
        &self.root_props
    }

    /// Look up a zone
    #[inline]
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    /// All zones in id order
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Number of zones
    #[inline]
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// All instances, zone by zone
    pub fn instances(&self) -> impl Iterator<Item = &BlockInstance> {
        self.zones.values().flat_map(Zone::items)
    }

    /// Number of instances across all zones
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.zones.values().map(Zone::len).sum()
    }

    /// Empty or populated
    #[must_use]
    pub fn state(&self) -> DocumentState {
        if self.zones.values().all(Zone::is_empty) {
            DocumentState::Empty
        } else {
            DocumentState::Populated
        }
    }

    /// Zone and index of an instance
    #[must_use]
    pub fn locate(&self, id: InstanceId) -> Option<(&ZoneId, usize)> {
        self.zones
            .iter()
            .find_map(|(zone_id, zone)| zone.position(id).map(|index| (zone_id, index)))
    }

    /// Check if an instance is in the document
    #[inline]
    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.locate(id).is_some()
    }

    /// Look up an instance
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&BlockInstance> {
        self.instances().find(|item| item.id() == id)
    }

    /// Look up an instance mutably
    ///
    /// Prop writes through this handle bypass schema validation; prefer
    /// [`Document::set_prop`].
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut BlockInstance> {
        self.zones
            .values_mut()
            .flat_map(|zone| zone.items_mut().iter_mut())
            .find(|item| item.id() == id)
    }

    /// Zones owned by an instance, in slot order of the map
    #[must_use]
    pub fn owned_zones(&self, id: InstanceId) -> Vec<ZoneId> {
        self.zones
            .keys()
            .filter(|zone| zone.owner() == ZoneOwner::Instance(id))
            .cloned()
            .collect()
    }

    /// Whether `id` is the owner of `zone` or of any zone above it
    ///
    /// A loop in the owner chain counts as containment.
    #[must_use]
    pub fn is_ancestor(&self, id: InstanceId, zone: &ZoneId) -> bool {
        let mut visited = HashSet::new();
        let mut owner = zone.owner();
        loop {
            let ZoneOwner::Instance(current) = owner else {
                return false;
            };
            if current == id || !visited.insert(current) {
                return true;
            }
            match self.locate(current) {
                Some((parent, _)) => owner = parent.owner(),
                None => return false,
            }
        }
    }

    /// Insert an instance into a zone at `index` (`index <= len`)
    ///
    /// Every prop must pass its field schema. Responsive props are stored in
    /// canonical keyed form and an empty zone is created for each slot the
    /// block's definition declares.
    ///
    /// # Errors
    /// - `TreeError::ZoneNotFound`
    /// - `TreeError::StructuralCycle` if the zone is owned by the instance itself
    /// - `TreeError::DuplicateInstance`
    /// - `TreeError::IndexOutOfBounds`
    /// - `TreeError::UnknownBlockType`
    /// - `TreeError::Schema` for an unknown field or a rejected value
    pub fn insert(
        &mut self,
        registry: &Registry,
        zone: &ZoneId,
        index: usize,
        mut instance: BlockInstance,
    ) -> Result<(), TreeError> {
        let len = self
            .zones
            .get(zone)
            .ok_or_else(|| TreeError::ZoneNotFound(zone.clone()))?
            .len();
        let id = instance.id();
        if self.is_ancestor(id, zone) {
            tracing::warn!(instance = %id, zone = %zone, "rejected insert: structural cycle");
            return Err(TreeError::StructuralCycle {
                instance: id,
                zone: zone.clone(),
            });
        }
        if self.contains(id) {
            return Err(TreeError::DuplicateInstance(id));
        }
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        let definition = registry
            .lookup(instance.type_name())
            .ok_or_else(|| TreeError::UnknownBlockType(instance.type_name().to_string()))?;
        for (name, value) in instance.props() {
            if let Err(err) = definition.validate_prop(name, value) {
                tracing::debug!(instance = %id, field = %name, error = %err, "rejected insert: invalid prop");
                return Err(err.into());
            }
        }

        canonicalise_props(definition, instance.props_mut());
        for slot in definition.slots() {
            let owned = ZoneId::of(id, slot.as_str());
            self.zones
                .entry(owned.clone())
                .or_insert_with(|| Zone::new(owned));
        }
        if let Some(target) = self.zones.get_mut(zone) {
            target.items_mut().insert(index, instance);
        }
        Ok(())
    }

    /// Instantiate a registered type and insert it
    ///
    /// # Errors
    /// As [`Document::insert`].
    pub fn insert_new(
        &mut self,
        registry: &Registry,
        zone: &ZoneId,
        index: usize,
        type_name: &str,
    ) -> Result<InstanceId, TreeError> {
        let instance = registry
            .instantiate(type_name)
            .map_err(|_| TreeError::UnknownBlockType(type_name.to_string()))?;
        let id = instance.id();
        self.insert(registry, zone, index, instance)?;
        Ok(id)
    }

    /// Remove an instance and, recursively, every zone it owns
    ///
    /// # Errors
    /// - `TreeError::ZoneNotFound`
    /// - `TreeError::InstanceNotFound` if the instance is not in that zone
    pub fn remove(&mut self, zone: &ZoneId, id: InstanceId) -> Result<Removal, TreeError> {
        let target = self
            .zones
            .get_mut(zone)
            .ok_or_else(|| TreeError::ZoneNotFound(zone.clone()))?;
        let index = target.position(id).ok_or(TreeError::InstanceNotFound(id))?;
        let instance = target.items_mut().remove(index);

        let mut removed_instances = vec![id];
        let mut removed_zones = Vec::new();
        let mut queue: VecDeque<InstanceId> = VecDeque::from([id]);
        while let Some(owner) = queue.pop_front() {
            for zone_id in self.owned_zones(owner) {
                if let Some(owned) = self.zones.remove(&zone_id) {
                    for item in owned.items() {
                        removed_instances.push(item.id());
                        queue.push_back(item.id());
                    }
                    removed_zones.push(zone_id);
                }
            }
        }

        tracing::debug!(
            instance = %id,
            zone = %zone,
            removed_instances = removed_instances.len(),
            removed_zones = removed_zones.len(),
            "cascade delete"
        );
        Ok(Removal {
            instance,
            removed_instances,
            removed_zones,
        })
    }

    /// Move an instance to `index` of another (or the same) zone
    ///
    /// `index` counts positions in the target zone after the moving
    /// instance has been taken out. Validation happens before any change,
    /// so a failed move leaves the document untouched.
    ///
    /// # Errors
    /// - `TreeError::ZoneNotFound` for either zone
    /// - `TreeError::InstanceNotFound` if the instance is not in `from`
    /// - `TreeError::StructuralCycle` if `to` lies inside the instance
    /// - `TreeError::IndexOutOfBounds`
    pub fn move_block(
        &mut self,
        from: &ZoneId,
        to: &ZoneId,
        id: InstanceId,
        index: usize,
    ) -> Result<(), TreeError> {
        let source = self
            .zones
            .get(from)
            .ok_or_else(|| TreeError::ZoneNotFound(from.clone()))?;
        let target_len = self
            .zones
            .get(to)
            .ok_or_else(|| TreeError::ZoneNotFound(to.clone()))?
            .len();
        let position = source.position(id).ok_or(TreeError::InstanceNotFound(id))?;
        if self.is_ancestor(id, to) {
            tracing::warn!(instance = %id, zone = %to, "rejected move: structural cycle");
            return Err(TreeError::StructuralCycle {
                instance: id,
                zone: to.clone(),
            });
        }
        let len = if from == to { target_len - 1 } else { target_len };
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        let instance = match self.zones.get_mut(from) {
            Some(source) => source.items_mut().remove(position),
            None => return Err(TreeError::ZoneNotFound(from.clone())),
        };
        if let Some(target) = self.zones.get_mut(to) {
            target.items_mut().insert(index, instance);
        }
        Ok(())
    }

    /// Move an instance within its zone
    ///
    /// # Errors
    /// As [`Document::move_block`].
    pub fn reorder(&mut self, zone: &ZoneId, id: InstanceId, index: usize) -> Result<(), TreeError> {
        self.move_block(zone, zone, id, index)
    }

    /// Validate and store one prop of an instance
    ///
    /// `null` removes the prop, falling back to the default. Returns the
    /// previous own value.
    ///
    /// # Errors
    /// - `TreeError::InstanceNotFound`
    /// - `TreeError::UnknownBlockType` (placeholders are read-only)
    /// - `TreeError::Schema` if the value fails the field schema
    pub fn set_prop(
        &mut self,
        registry: &Registry,
        id: InstanceId,
        name: &str,
        value: Value,
    ) -> Result<Option<Value>, TreeError> {
        let type_name = self
            .get(id)
            .ok_or(TreeError::InstanceNotFound(id))?
            .type_name()
            .to_string();
        let definition = registry
            .lookup(&type_name)
            .ok_or(TreeError::UnknownBlockType(type_name))?;
        let value = checked_value(definition, name, value)?;
        let instance = self.get_mut(id).ok_or(TreeError::InstanceNotFound(id))?;
        Ok(instance.set_prop(name, value))
    }

    /// Validate and store one root prop
    ///
    /// # Errors
    /// Returns `TreeError::Schema` if the value fails the root field schema.
    pub fn set_root_prop(
        &mut self,
        registry: &Registry,
        name: &str,
        value: Value,
    ) -> Result<Option<Value>, TreeError> {
        let value = checked_value(registry.root(), name, value)?;
        if value.is_null() {
            Ok(self.root_props.remove(name))
        } else {
            Ok(self.root_props.insert(name.to_string(), value))
        }
    }

    /// Check every structural invariant
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self, registry: &Registry) -> Result<(), TreeError> {
        crate::validation::validate(self, registry)
    }
}

fn checked_value(definition: &BlockDefinition, name: &str, value: Value) -> Result<Value, TreeError> {
    definition.validate_prop(name, &value)?;
    if definition.is_responsive(name) {
        Ok(upgrade_value(&value).0)
    } else {
        Ok(value)
    }
}

/// Store responsive props of a known block in canonical keyed form
///
/// Returns how many values changed.
pub(crate) fn canonicalise_props(definition: &BlockDefinition, props: &mut Props) -> usize {
    let mut upgraded = 0;
    for (name, value) in props.iter_mut() {
        if !definition.is_responsive(name) {
            continue;
        }
        let (canonical, changed) = upgrade_value(value);
        if changed {
            *value = canonical;
            upgraded += 1;
        }
    }
    upgraded
}
