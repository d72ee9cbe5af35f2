//! Property tests for the composition tree and codec

use pagekit_document::{codec, Document, TreeError, ZoneId};
use pagekit_registry::{library, Registry};
use pagekit_schema::Breakpoint;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

const TYPES: [&str; 6] = ["Section", "Columns", "Grid", "Heading", "Text", "Spacer"];

type Op = (usize, usize, usize, String);

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec((0usize..TYPES.len(), 0usize..64, 0usize..64, "[a-z]{0,6}"), 0..24)
}

/// Apply random inserts; every one is valid by construction
fn build(ops: &[Op]) -> (Registry, Document) {
    let registry = library::standard().unwrap();
    let mut doc = Document::new(&registry);
    for (type_index, zone_pick, index_pick, text) in ops {
        let zones: Vec<ZoneId> = doc.zones().map(|z| z.id().clone()).collect();
        let zone = zones[zone_pick % zones.len()].clone();
        let len = doc.zone(&zone).unwrap().len();
        let type_name = TYPES[*type_index];
        let id = doc
            .insert_new(&registry, &zone, index_pick % (len + 1), type_name)
            .unwrap();
        if type_name == "Heading" {
            doc.set_prop(&registry, id, "text", json!({"base": text, "medium": "m"}))
                .unwrap();
        }
    }
    (registry, doc)
}

proptest! {
    #[test]
    fn prop_roundtrip_is_lossless(ops in ops()) {
        let (registry, doc) = build(&ops);
        let encoded = codec::to_string(&doc).unwrap();
        let decoded = codec::deserialize(&encoded, &registry).unwrap();

        prop_assert_eq!(&decoded.document, &doc);
        prop_assert!(decoded.report.is_clean());
        prop_assert_eq!(codec::to_string(&decoded.document).unwrap(), encoded);
    }

    #[test]
    fn prop_cascade_delete_leaves_no_orphans(ops in ops(), pick in 0usize..64) {
        let (registry, mut doc) = build(&ops);
        let ids: Vec<_> = doc.instances().map(|i| i.id()).collect();
        prop_assume!(!ids.is_empty());

        let target = ids[pick % ids.len()];
        let zone = doc.locate(target).unwrap().0.clone();
        let before = doc.instance_count();
        let removal = doc.remove(&zone, target).unwrap();

        prop_assert_eq!(before - doc.instance_count(), removal.removed_instances.len());
        for removed in &removal.removed_instances {
            prop_assert!(!doc.contains(*removed));
            prop_assert!(doc.owned_zones(*removed).is_empty());
        }
        for zone in &removal.removed_zones {
            prop_assert!(doc.zone(zone).is_none());
        }
        prop_assert!(doc.validate(&registry).is_ok());
    }

    #[test]
    fn prop_cycle_rejection_leaves_bytes_identical(ops in ops(), pick in 0usize..64, zone_pick in 0usize..64) {
        let (_registry, mut doc) = build(&ops);
        let containers: Vec<_> = doc
            .instances()
            .map(|i| i.id())
            .filter(|id| !doc.owned_zones(*id).is_empty())
            .collect();
        prop_assume!(!containers.is_empty());

        let container = containers[pick % containers.len()];
        let inside: Vec<ZoneId> = doc
            .zones()
            .map(|z| z.id().clone())
            .filter(|z| doc.is_ancestor(container, z))
            .collect();
        let target = inside[zone_pick % inside.len()].clone();
        let from = doc.locate(container).unwrap().0.clone();

        let before = codec::to_string(&doc).unwrap();
        let result = doc.move_block(&from, &target, container, 0);
        let is_cycle = matches!(result, Err(TreeError::StructuralCycle { .. }));
        prop_assert!(is_cycle);
        prop_assert_eq!(codec::to_string(&doc).unwrap(), before);
    }
}

#[test]
fn section_title_cascades_after_roundtrip() {
    let registry = library::standard().unwrap();
    let mut doc = Document::new(&registry);
    let content = ZoneId::root("content");

    let section = registry.instantiate("Section").unwrap();
    assert_eq!(section.prop("variant"), Some(&json!("left")));
    let id = section.id();
    doc.insert(&registry, &content, 0, section).unwrap();
    doc.set_prop(&registry, id, "title", json!({"base": "Hello", "medium": "Hi"}))
        .unwrap();

    let encoded = codec::serialize(&doc).unwrap();
    let decoded = codec::deserialize_value(encoded, &registry).unwrap().document;
    assert_eq!(decoded, doc);

    let definition = registry.get("Section").unwrap();
    let props = decoded.get(id).unwrap().props();
    let medium = definition.resolve(props, "title", Breakpoint::Medium);
    let large = definition.resolve(props, "title", Breakpoint::Large);
    assert_eq!(medium, Some(json!("Hi")));
    assert_eq!(large, medium);
    assert_eq!(
        definition.resolve(props, "title", Breakpoint::Base),
        Some(json!("Hello"))
    );
}

#[test]
fn unknown_placeholder_is_reencoded_verbatim() {
    let registry = library::standard().unwrap();
    let raw = r#"{"version":1,"root":{"props":{}},"zones":{"root.content":[{"id":"5a0c6f4e-8a5e-4f8b-9a39-3d2f1c9e7b10","props":{"frames":[1,2]},"type":"Marquee"}]}}"#;
    let decoded = codec::deserialize(raw, &registry).unwrap();
    assert_eq!(decoded.report.unknown_blocks.len(), 1);
    assert_eq!(
        codec::to_string(&decoded.document).unwrap(),
        r#"{"version":1,"root":{"props":{}},"zones":{"root.content":[{"id":"5a0c6f4e-8a5e-4f8b-9a39-3d2f1c9e7b10","type":"Marquee","props":{"frames":[1,2]}}]}}"#
    );
}
