//! Instantiation properties across the standard library

use pagekit_registry::library;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn prop_instances_never_alias(index in 0usize..13, key in "[a-z]{1,8}", text in "[a-z ]{0,16}") {
        let registry = library::standard().unwrap();
        let type_name = registry.type_names().nth(index).unwrap().to_string();

        let mut a = registry.instantiate(&type_name).unwrap();
        let b = registry.instantiate(&type_name).unwrap();
        prop_assert_eq!(a.props(), b.props());

        a.set_prop(key.clone(), json!(text));
        for value in a.props_mut().values_mut() {
            *value = json!("mutated");
        }

        let definition = registry.get(&type_name).unwrap();
        prop_assert_eq!(b.props(), definition.defaults());
    }
}

#[test]
fn every_default_validates_against_its_field() {
    let registry = library::standard().unwrap();
    for definition in registry.definitions() {
        for (name, value) in definition.defaults() {
            assert!(
                definition.validate_prop(name, value).is_ok(),
                "{}.{name}",
                definition.type_name()
            );
        }
    }
}
