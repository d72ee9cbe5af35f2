//! Structural invariant checks
//!
//! Run after decoding and available to callers that build documents by
//! hand. Mutations through [`Document`] keep these invariants on their own.

use std::collections::{HashMap, HashSet};

use pagekit_registry::{InstanceId, Registry};

use crate::error::TreeError;
use crate::tree::Document;
use crate::zone::{ZoneId, ZoneOwner};

/// Check every structural invariant of a document
///
/// - every root slot has a zone
/// - instance ids are unique
/// - every zone's owner exists and (for known types) declares the slot
/// - every slot of a known instance has a zone
/// - zone containment is acyclic
///
/// Instances of unregistered types are placeholders: any zones they own
/// are kept as-is.
///
/// # Errors
/// Returns the first violation found.
pub fn validate(document: &Document, registry: &Registry) -> Result<(), TreeError> {
    let root = registry.root();
    for slot in root.slots() {
        let zone = ZoneId::root(slot.as_str());
        if document.zone(&zone).is_none() {
            return Err(TreeError::MissingZone(zone));
        }
    }

    // instance id -> zone holding it
    let mut parents: HashMap<InstanceId, &ZoneId> = HashMap::new();
    for zone in document.zones() {
        for item in zone.items() {
            if parents.insert(item.id(), zone.id()).is_some() {
                return Err(TreeError::DuplicateInstance(item.id()));
            }
        }
    }

    for zone in document.zones() {
        let id = zone.id();
        match id.owner() {
            ZoneOwner::Root => {
                if !root.has_slot(id.slot()) {
                    return Err(TreeError::DanglingZone(id.clone()));
                }
            }
            ZoneOwner::Instance(owner) => {
                let instance = document
                    .get(owner)
                    .ok_or_else(|| TreeError::DanglingZone(id.clone()))?;
                let declared = registry
                    .lookup(instance.type_name())
                    .map_or(true, |def| def.has_slot(id.slot()));
                if !declared {
                    return Err(TreeError::DanglingZone(id.clone()));
                }
            }
        }
    }

    for instance in document.instances() {
        let Some(definition) = registry.lookup(instance.type_name()) else {
            continue;
        };
        for slot in definition.slots() {
            let zone = ZoneId::of(instance.id(), slot.as_str());
            if document.zone(&zone).is_none() {
                return Err(TreeError::MissingZone(zone));
            }
        }
    }

    // Every owner chain must reach the root
    for (&instance, &zone) in &parents {
        let mut visited = HashSet::from([instance]);
        let mut owner = zone.owner();
        while let ZoneOwner::Instance(current) = owner {
            if !visited.insert(current) {
                return Err(TreeError::StructuralCycle {
                    instance: current,
                    zone: zone.clone(),
                });
            }
            owner = match parents.get(&current) {
                Some(parent) => parent.owner(),
                None => break,
            };
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::zone::Zone;
    use pagekit_registry::{library, BlockInstance};
    use pagekit_schema::Props;

    fn registry() -> Registry {
        library::standard().unwrap()
    }

    fn build(zones: Vec<Zone>) -> Document {
        let map: BTreeMap<ZoneId, Zone> = zones.into_iter().map(|z| (z.id().clone(), z)).collect();
        Document::from_parts(Props::new(), map)
    }

    fn text() -> BlockInstance {
        BlockInstance::new(InstanceId::new(), "Text", Props::new())
    }

    #[test]
    fn fresh_document_is_valid() {
        let registry = registry();
        validate(&Document::new(&registry), &registry).unwrap();
    }

    #[test]
    fn missing_root_zone() {
        let registry = registry();
        assert_eq!(
            validate(&build(vec![]), &registry),
            Err(TreeError::MissingZone(ZoneId::root("content")))
        );
    }

    #[test]
    fn duplicate_ids() {
        let registry = registry();
        let item = text();
        let doc = build(vec![Zone::with_items(
            ZoneId::root("content"),
            vec![item.clone(), item.clone()],
        )]);
        assert_eq!(
            validate(&doc, &registry),
            Err(TreeError::DuplicateInstance(item.id()))
        );
    }

    #[test]
    fn orphan_zone() {
        let registry = registry();
        let orphan = ZoneId::of(InstanceId::new(), "left");
        let doc = build(vec![Zone::new(ZoneId::root("content")), Zone::new(orphan.clone())]);
        assert_eq!(validate(&doc, &registry), Err(TreeError::DanglingZone(orphan)));
    }

    #[test]
    fn undeclared_slot_on_known_block() {
        let registry = registry();
        let item = text();
        let extra = ZoneId::of(item.id(), "left");
        let doc = build(vec![
            Zone::with_items(ZoneId::root("content"), vec![item]),
            Zone::new(extra.clone()),
        ]);
        assert_eq!(validate(&doc, &registry), Err(TreeError::DanglingZone(extra)));
    }

    #[test]
    fn unknown_block_may_own_zones() {
        let registry = registry();
        let legacy = BlockInstance::new(InstanceId::new(), "Carousel", Props::new());
        let doc = build(vec![
            Zone::with_items(ZoneId::root("content"), vec![legacy.clone()]),
            Zone::with_items(ZoneId::of(legacy.id(), "slides"), vec![text()]),
        ]);
        validate(&doc, &registry).unwrap();
    }

    #[test]
    fn missing_slot_zone() {
        let registry = registry();
        let columns = BlockInstance::new(InstanceId::new(), "Columns", Props::new());
        let id = columns.id();
        let doc = build(vec![
            Zone::with_items(ZoneId::root("content"), vec![columns]),
            Zone::new(ZoneId::of(id, "left")),
        ]);
        assert_eq!(
            validate(&doc, &registry),
            Err(TreeError::MissingZone(ZoneId::of(id, "right")))
        );
    }

    #[test]
    fn detached_cycle() {
        let registry = registry();
        let a = BlockInstance::new(InstanceId::new(), "Carousel", Props::new());
        let b = BlockInstance::new(InstanceId::new(), "Carousel", Props::new());
        let (a_id, b_id) = (a.id(), b.id());
        // a lives in b's zone and b lives in a's zone
        let doc = build(vec![
            Zone::new(ZoneId::root("content")),
            Zone::with_items(ZoneId::of(b_id, "slides"), vec![a]),
            Zone::with_items(ZoneId::of(a_id, "slides"), vec![b]),
        ]);
        assert!(matches!(
            validate(&doc, &registry),
            Err(TreeError::StructuralCycle { .. })
        ));
    }
}
