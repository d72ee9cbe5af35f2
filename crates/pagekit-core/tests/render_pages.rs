//! Rendering decoded documents

use pagekit_core::render::UNKNOWN_CLASS;
use pagekit_core::{render, RenderError, RenderOptions};
use pagekit_document::codec;
use pagekit_schema::Breakpoint;
use pagekit_test_utils::{create_sample_document, standard_registry};
use pretty_assertions::assert_eq;

#[test]
fn sample_page_renders_at_each_breakpoint() {
    let registry = standard_registry();
    let sample = create_sample_document(&registry);

    let titles: Vec<String> = Breakpoint::ALL
        .into_iter()
        .map(|bp| render(&sample.document, &registry, &RenderOptions::default().at(bp)).markup)
        .map(|markup| {
            let start = markup.find("<h2>").unwrap() + 4;
            let end = markup[start..].find("</h2>").unwrap() + start;
            markup[start..end].to_string()
        })
        .collect();
    assert_eq!(titles, vec!["Hello", "Hi", "Hi"]);
}

#[test]
fn render_survives_a_round_trip() {
    let registry = standard_registry();
    let sample = create_sample_document(&registry);
    let options = RenderOptions::default().at(Breakpoint::Medium);

    let before = render(&sample.document, &registry, &options);
    let decoded = codec::deserialize(&codec::to_string(&sample.document).unwrap(), &registry).unwrap();
    let after = render(&decoded.document, &registry, &options);
    assert_eq!(before, after);
}

#[test]
fn unknown_block_renders_placeholder_and_siblings() {
    let registry = standard_registry();
    let json = r#"{
        "version": 1,
        "root": {"props": {}},
        "zones": {
            "root.content": [
                {"id": "0b5c1d2e-3f40-4a51-8b62-7c83d94ea5f6", "type": "Countdown", "props": {"until": "2025-01-01"}},
                {"id": "1c6d2e3f-4051-4b62-9c73-8d94ea5fb607", "type": "Spacer", "props": {}}
            ]
        }
    }"#;
    let decoded = codec::deserialize(json, &registry).unwrap();
    let rendered = render(&decoded.document, &registry, &RenderOptions::default());

    assert_eq!(rendered.errors.len(), 1);
    assert!(matches!(
        &rendered.errors[0],
        RenderError::UnknownBlock { type_name, .. } if type_name == "Countdown"
    ));
    assert!(rendered.markup.contains(UNKNOWN_CLASS));
    assert!(rendered.markup.contains("data-block-type=\"Spacer\""));
    assert!(!rendered.markup.contains("2025-01-01"));
}
