//! Standard block library
//!
//! The block types the page editor ships with, plus the root definition
//! every document starts from. Style props are stored per breakpoint and
//! rendered as utility classes through the variant resolver.

use pagekit_schema::{FieldDescriptor, SelectOption};
use serde_json::{json, Value};

use crate::definition::{BlockDefinition, Category, RenderArgs};
use crate::error::Result;
use crate::markup::{embed_frame, Element};
use crate::registry::Registry;

/// Type name of the document root
pub const ROOT_TYPE: &str = "Root";

/// Slot of the root that holds top-level blocks
pub const ROOT_SLOT: &str = "content";

/// Number of cells a `Grid` owns
pub const GRID_CELLS: usize = 3;

fn prefixed(prefix: &'static str) -> impl Fn(&str) -> String {
    move |token| format!("{prefix}-{token}")
}

fn align() -> FieldDescriptor {
    FieldDescriptor::select(vec![
        SelectOption::new("Left", "left"),
        SelectOption::new("Center", "center"),
        SelectOption::new("Right", "right"),
    ])
}

fn selection(editor: &str) -> FieldDescriptor {
    FieldDescriptor::custom(editor)
}

/// Labels of selected `{id, label, metadata}` entries (one or many)
fn selection_labels(value: Option<&Value>) -> Vec<String> {
    let label = |v: &Value| v.get("label").and_then(Value::as_str).map(str::to_string);
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(label).collect(),
        Some(single @ Value::Object(_)) => label(single).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn list_of(labels: &[String]) -> Element {
    labels
        .iter()
        .fold(Element::new("ol"), |ol, label| ol.child(&Element::new("li").text(label)))
}

/// The root definition: page-level styling and the top-level zone
#[must_use]
pub fn root() -> BlockDefinition {
    BlockDefinition::builder(ROOT_TYPE)
        .label("Page")
        .field("background", FieldDescriptor::text().with_label("Background").responsive())
        .field("text_color", FieldDescriptor::text().with_label("Text color").responsive())
        .field("custom_classes", FieldDescriptor::text().with_label("Custom classes"))
        .field("padding", FieldDescriptor::text().with_label("Padding").responsive())
        .default("background", json!("white"))
        .default("text_color", json!("gray-900"))
        .slot(ROOT_SLOT)
        .render(|args| {
            let custom = args.raw_text("custom_classes").unwrap_or_default();
            args.element("main")
                .class(args.classes("background", prefixed("bg")))
                .class(args.classes("text_color", prefixed("text")))
                .class(args.classes("padding", prefixed("p")))
                .class(custom)
                .html(args.slot(ROOT_SLOT))
                .to_string()
        })
        .build()
}

fn section() -> BlockDefinition {
    BlockDefinition::builder("Section")
        .category(Category::Layout)
        .field("title", FieldDescriptor::text().with_label("Title").responsive())
        .field("variant", align().with_label("Variant"))
        .field("background", FieldDescriptor::text().with_label("Background").responsive())
        .field("padding", FieldDescriptor::text().with_label("Padding").responsive())
        .default("variant", json!("left"))
        .default("padding", json!("8"))
        .slot("content")
        .render(|args| {
            let variant = args.raw_text("variant").unwrap_or_default();
            let mut el = args
                .element("section")
                .class(format!("section section-{variant}"))
                .class(args.classes("background", prefixed("bg")))
                .class(args.classes("padding", prefixed("p")));
            let title = args.text("title");
            if !title.is_empty() {
                el = el.html(format!("<h2>{title}</h2>"));
            }
            el.html(args.slot("content")).to_string()
        })
        .build()
}

fn heading() -> BlockDefinition {
    BlockDefinition::builder("Heading")
        .category(Category::Typography)
        .field("text", FieldDescriptor::text().with_label("Text").responsive())
        .field(
            "level",
            FieldDescriptor::select_strings(&["h1", "h2", "h3", "h4"]).with_label("Level"),
        )
        .field("align", align().with_label("Alignment").responsive())
        .default("text", json!("Heading"))
        .default("level", json!("h2"))
        .render(|args| {
            let tag = match args.raw_text("level").as_deref() {
                Some("h1") => "h1",
                Some("h3") => "h3",
                Some("h4") => "h4",
                _ => "h2",
            };
            args.element(tag)
                .class(args.classes("align", prefixed("text")))
                .html(args.text("text"))
                .to_string()
        })
        .build()
}

fn text() -> BlockDefinition {
    BlockDefinition::builder("Text")
        .category(Category::Typography)
        .field("body", FieldDescriptor::textarea().with_label("Body"))
        .field(
            "size",
            FieldDescriptor::select_strings(&["sm", "base", "lg", "xl"])
                .with_label("Size")
                .responsive(),
        )
        .field("align", align().with_label("Alignment").responsive())
        .default("body", json!(""))
        .default("size", json!("base"))
        .render(|args| {
            args.element("p")
                .class(args.classes("size", prefixed("text")))
                .class(args.classes("align", prefixed("text")))
                .html(args.text("body"))
                .to_string()
        })
        .build()
}

fn image() -> BlockDefinition {
    BlockDefinition::builder("Image")
        .category(Category::Media)
        .field("image", FieldDescriptor::custom("upload").with_label("Image"))
        .field("alt", FieldDescriptor::text().with_label("Alt text"))
        .field("width", FieldDescriptor::text().with_label("Width").responsive())
        .default("width", json!("full"))
        .render(|args| {
            let reference = args
                .prop("image")
                .and_then(|v| v.get("reference"))
                .and_then(Value::as_str)
                .map(str::to_string);
            args.element("img")
                .class(args.classes("width", prefixed("w")))
                .attr_opt("data-upload-ref", reference)
                .attr("alt", args.raw_text("alt").unwrap_or_default())
                .to_string()
        })
        .build()
}

fn button() -> BlockDefinition {
    BlockDefinition::builder("Button")
        .category(Category::Typography)
        .field("label", FieldDescriptor::text().with_label("Label"))
        .field("href", FieldDescriptor::text().with_label("Link"))
        .field(
            "style",
            FieldDescriptor::select_strings(&["primary", "secondary", "ghost"]).with_label("Style"),
        )
        .field(
            "size",
            FieldDescriptor::select_strings(&["sm", "md", "lg"])
                .with_label("Size")
                .responsive(),
        )
        .default("label", json!("Learn more"))
        .default("href", json!("#"))
        .default("style", json!("primary"))
        .render(|args| {
            let style = args.raw_text("style").unwrap_or_default();
            args.element("a")
                .class(format!("btn btn-{style}"))
                .class(args.classes("size", prefixed("btn")))
                .attr("href", args.raw_text("href").unwrap_or_default())
                .html(args.text("label"))
                .to_string()
        })
        .build()
}

fn columns() -> BlockDefinition {
    BlockDefinition::builder("Columns")
        .category(Category::Layout)
        .field("gap", FieldDescriptor::text().with_label("Gap").responsive())
        .default("gap", json!("4"))
        .slot("left")
        .slot("right")
        .render(|args| {
            args.element("div")
                .class("grid md:grid-cols-2")
                .class(args.classes("gap", prefixed("gap")))
                .child(&Element::new("div").html(args.slot("left")))
                .child(&Element::new("div").html(args.slot("right")))
                .to_string()
        })
        .build()
}

fn grid() -> BlockDefinition {
    let mut builder = BlockDefinition::builder("Grid")
        .category(Category::Layout)
        .field(
            "columns",
            FieldDescriptor::select_strings(&["1", "2", "3"])
                .with_label("Columns")
                .responsive(),
        )
        .default("columns", json!({"base": "1", "medium": "3"}));
    for cell in 0..GRID_CELLS {
        builder = builder.slot(format!("cell-{cell}"));
    }
    builder
        .render(|args| {
            let mut el = args
                .element("div")
                .class("grid")
                .class(args.classes("columns", prefixed("grid-cols")));
            for cell in 0..GRID_CELLS {
                el = el.child(&Element::new("div").html(args.slot(&format!("cell-{cell}"))));
            }
            el.to_string()
        })
        .build()
}

fn spacer() -> BlockDefinition {
    BlockDefinition::builder("Spacer")
        .category(Category::Media)
        .field("height", FieldDescriptor::text().with_label("Height").responsive())
        .default("height", json!("8"))
        .render(|args| {
            args.element("div")
                .class(args.classes("height", prefixed("h")))
                .attr("aria-hidden", "true")
                .to_string()
        })
        .build()
}

fn embed() -> BlockDefinition {
    BlockDefinition::builder("Embed")
        .category(Category::Embed)
        .field("embed", FieldDescriptor::custom("embed").with_label("URL"))
        .render(|args| {
            let embed = args.prop("embed");
            let field = |name: &str| {
                embed
                    .and_then(|v| v.get(name))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let html = field("html");
            let mut el = args.element("figure");
            el = match embed_frame(&html) {
                Some(frame) => el.child(&frame),
                None => el.text(&html),
            };
            let title = field("title");
            if !title.is_empty() {
                el = el.child(&Element::new("figcaption").text(&title));
            }
            el.to_string()
        })
        .build()
}

fn track_list() -> BlockDefinition {
    BlockDefinition::builder("TrackList")
        .category(Category::Music)
        .field("title", FieldDescriptor::text().with_label("Title"))
        .field("tracks", selection("track-search").with_label("Tracks"))
        .render(|args| {
            let labels = selection_labels(args.prop("tracks"));
            args.element("div")
                .class("track-list")
                .html(args.text("title"))
                .child(&list_of(&labels))
                .to_string()
        })
        .build()
}

fn playlist() -> BlockDefinition {
    BlockDefinition::builder("Playlist")
        .category(Category::Music)
        .field("playlist", selection("playlist-search").with_label("Playlist"))
        .field("show_artwork", FieldDescriptor::boolean().with_label("Show artwork"))
        .default("show_artwork", json!(true))
        .render(|args| {
            let name = selection_labels(args.prop("playlist")).join(", ");
            args.element("div")
                .class("playlist")
                .attr("data-artwork", args.raw_text("show_artwork").unwrap_or_default())
                .text(&name)
                .to_string()
        })
        .build()
}

fn product_list() -> BlockDefinition {
    BlockDefinition::builder("ProductList")
        .category(Category::Commerce)
        .field("products", selection("product-search").with_label("Products"))
        .field(
            "columns",
            FieldDescriptor::select_strings(&["1", "2", "3", "4"])
                .with_label("Columns")
                .responsive(),
        )
        .default("columns", json!({"base": "1", "large": "4"}))
        .render(|args| {
            let labels = selection_labels(args.prop("products"));
            let mut el = args
                .element("ul")
                .class("grid")
                .class(args.classes("columns", prefixed("grid-cols")));
            for label in &labels {
                el = el.child(&Element::new("li").text(label));
            }
            el.to_string()
        })
        .build()
}

fn event_card() -> BlockDefinition {
    BlockDefinition::builder("EventCard")
        .category(Category::Events)
        .field("title", FieldDescriptor::text().with_label("Title"))
        .field("date", FieldDescriptor::text().with_label("Date"))
        .field("venue", FieldDescriptor::text().with_label("Venue"))
        .field("ticket_url", FieldDescriptor::text().with_label("Ticket link"))
        .field("capacity", FieldDescriptor::number_between(0.0, 1_000_000.0).with_label("Capacity"))
        .render(|args| {
            let mut el = args
                .element("article")
                .class("event-card")
                .child(&Element::new("h3").html(args.text("title")))
                .child(&Element::new("time").html(args.text("date")))
                .child(&Element::new("p").html(args.text("venue")));
            if let Some(url) = args.raw_text("ticket_url").filter(|u| !u.is_empty()) {
                el = el.child(&Element::new("a").class("btn").attr("href", url).text("Tickets"));
            }
            el.to_string()
        })
        .build()
}

/// Definitions of the standard library in picker order
#[must_use]
pub fn standard_definitions() -> Vec<BlockDefinition> {
    vec![
        section(),
        columns(),
        grid(),
        heading(),
        text(),
        button(),
        image(),
        spacer(),
        track_list(),
        playlist(),
        product_list(),
        event_card(),
        embed(),
    ]
}

/// Registry holding the standard library and the default root
///
/// # Errors
/// Fails only if a built-in definition is rejected.
pub fn standard() -> Result<Registry> {
    Registry::builder()
        .register_all(standard_definitions())?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_schema::{Breakpoint, BreakpointPrefixes, Props};
    use pretty_assertions::assert_eq;

    fn render_with(registry: &Registry, type_name: &str, own: &Props, slot: &str) -> String {
        let def = registry.get(type_name).unwrap();
        let props = def.effective_props(own);
        let prefixes = BreakpointPrefixes::default();
        let slots = |name: &str| format!("<!--{name}:{slot}-->");
        let args = RenderArgs::new(def, &props, &prefixes, Breakpoint::Base, &slots);
        def.render(&args)
    }

    #[test]
    fn standard_registers_every_block() {
        let registry = standard().unwrap();
        assert_eq!(registry.len(), 13);
        for name in ["Section", "Columns", "Grid", "Embed", "TrackList", "EventCard"] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert_eq!(registry.get("Grid").unwrap().slots().len(), GRID_CELLS);
    }

    #[test]
    fn responsive_defaults_are_canonical() {
        let registry = standard().unwrap();
        let section = registry.get("Section").unwrap();
        assert_eq!(section.defaults().get("padding"), Some(&json!({"base": "8"})));
        assert_eq!(section.defaults().get("variant"), Some(&json!("left")));
    }

    #[test]
    fn section_renders_classes_title_and_slot() {
        let registry = standard().unwrap();
        let mut own = Props::new();
        own.insert("title".into(), json!({"base": "Hello", "medium": "Hi"}));
        own.insert("background".into(), json!({"base": "red", "large": "blue"}));

        let html = render_with(&registry, "Section", &own, "x");
        assert_eq!(
            html,
            "<section class=\"section section-left bg-red lg:bg-blue p-8\" \
             data-block-type=\"Section\"><h2>Hello</h2><!--content:x--></section>"
        );
    }

    #[test]
    fn track_list_lists_selected_labels() {
        let registry = standard().unwrap();
        let mut own = Props::new();
        own.insert(
            "tracks".into(),
            json!([{"id": "t1", "label": "Intro", "metadata": {}}, {"id": "t2", "label": "Outro"}]),
        );
        let html = render_with(&registry, "TrackList", &own, "");
        assert!(html.contains("<li>Intro</li><li>Outro</li>"));
    }

    #[test]
    fn embed_renders_frame_or_escaped_text() {
        let registry = standard().unwrap();
        let mut own = Props::new();
        own.insert(
            "embed".into(),
            json!({"url": "https://v.test/1", "html": "<iframe src=\"https://v.test/1\"></iframe>", "title": "Clip"}),
        );
        let html = render_with(&registry, "Embed", &own, "");
        assert!(html.contains("<iframe src=\"https://v.test/1\"></iframe><figcaption>Clip</figcaption>"));

        own.insert(
            "embed".into(),
            json!({"html": "<img src=x onerror=\"alert(1)\">"}),
        );
        let html = render_with(&registry, "Embed", &own, "");
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x onerror=\"alert(1)\"&gt;"));
    }

    #[test]
    fn root_renders_page_classes() {
        let registry = standard().unwrap();
        let root = registry.root();
        let props = root.effective_props(&Props::new());
        let prefixes = BreakpointPrefixes::default();
        let slots = |_: &str| "body".to_string();
        let args = RenderArgs::new(root, &props, &prefixes, Breakpoint::Base, &slots);
        assert_eq!(
            root.render(&args),
            "<main class=\"bg-white text-gray-900\" data-block-type=\"Root\">body</main>"
        );
    }
}
