//! Markup helpers for render functions
//!
//! All text and attribute values pass through `html-escape`; only children
//! added with [`Element::html`] are emitted verbatim. Third-party embed
//! markup is never emitted as-is: [`embed_frame`] rebuilds it as a single
//! `iframe` or rejects it.

use std::fmt::{self, Display, Formatter, Write};

/// Escape text content
#[must_use]
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape a double-quoted attribute value
#[must_use]
pub fn escape_attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Tags emitted without a closing tag
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "source"];

/// A single HTML element under construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    children: String,
}

impl Element {
    /// Start an element
    #[must_use]
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    /// Add classes (empty strings are skipped)
    #[must_use]
    pub fn class(mut self, classes: impl AsRef<str>) -> Self {
        self.classes
            .extend(classes.as_ref().split_whitespace().map(str::to_string));
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set an attribute when a value is present
    #[must_use]
    pub fn attr_opt(self, name: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Append escaped text
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.children.push_str(&escape_text(text));
        self
    }

    /// Append markup verbatim
    #[must_use]
    pub fn html(mut self, html: impl AsRef<str>) -> Self {
        self.children.push_str(html.as_ref());
        self
    }

    /// Append a child element
    #[must_use]
    pub fn child(mut self, child: &Element) -> Self {
        // Writing to a String cannot fail
        let _ = write!(self.children, "{child}");
        self
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        if !self.classes.is_empty() {
            write!(f, " class=\"{}\"", escape_attr(&self.classes.join(" ")))?;
        }
        for (name, value) in &self.attrs {
            write!(f, " {name}=\"{}\"", escape_attr(value))?;
        }
        if VOID_TAGS.contains(&self.tag) {
            return f.write_str(">");
        }
        write!(f, ">{}</{}>", self.children, self.tag)
    }
}

/// Attributes an embedded frame may carry
const FRAME_ATTRS: &[&str] = &[
    "src",
    "width",
    "height",
    "title",
    "allow",
    "allowfullscreen",
    "frameborder",
    "loading",
    "referrerpolicy",
];

/// Rebuild resolved embed markup as a single `iframe`
///
/// Accepts exactly one `<iframe ...></iframe>` with quoted, allow-listed
/// attributes and an `https://` source. Anything else (scripts, event
/// handlers, extra elements) yields `None`.
#[must_use]
pub fn embed_frame(markup: &str) -> Option<Element> {
    let markup = markup.trim();
    let open = markup.get(..7).filter(|p| p.eq_ignore_ascii_case("<iframe"))?;
    let (attrs, tail) = markup[open.len()..].split_once('>')?;
    if !tail.trim_start().eq_ignore_ascii_case("</iframe>") {
        return None;
    }
    let mut frame = Element::new("iframe");
    let mut has_src = false;
    for (name, value) in parse_attrs(attrs)? {
        if !FRAME_ATTRS.contains(&name.as_str()) {
            return None;
        }
        if name == "src" {
            if has_src || !value.starts_with("https://") {
                return None;
            }
            has_src = true;
        }
        frame = frame.attr(name, value);
    }
    has_src.then_some(frame)
}

/// Whitespace-separated `name`, `name="v"` or `name='v'` pairs
fn parse_attrs(mut rest: &str) -> Option<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return Some(attrs);
        }
        if trimmed.len() == rest.len() {
            return None;
        }
        let end = trimmed
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(trimmed.len());
        if end == 0 {
            return None;
        }
        let name = trimmed[..end].to_ascii_lowercase();
        let after = &trimmed[end..];
        match after.strip_prefix('=') {
            Some(quoted) => {
                let quote = quoted.chars().next().filter(|c| *c == '"' || *c == '\'')?;
                let body = &quoted[1..];
                let close = body.find(quote)?;
                let value = html_escape::decode_html_entities(&body[..close]).into_owned();
                attrs.push((name, value));
                rest = &body[close + 1..];
            }
            None => {
                attrs.push((name, String::new()));
                rest = after;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_with_classes_and_attrs() {
        let el = Element::new("a")
            .class("btn  md:btn-lg")
            .class("")
            .attr("href", "/x?a=1&b=\"2\"")
            .text("Go <now>");
        assert_eq!(
            el.to_string(),
            "<a class=\"btn md:btn-lg\" href=\"/x?a=1&amp;b=&quot;2&quot;\">Go &lt;now&gt;</a>"
        );
    }

    #[test]
    fn void_element() {
        let el = Element::new("img").attr("src", "a.png").attr_opt("alt", None);
        assert_eq!(el.to_string(), "<img src=\"a.png\">");
    }

    #[test]
    fn nested_children() {
        let inner = Element::new("span").text("x");
        let outer = Element::new("p").child(&inner).html("<br>");
        assert_eq!(outer.to_string(), "<p><span>x</span><br></p>");
    }

    #[test]
    fn embed_frame_is_rebuilt_escaped() {
        let frame = embed_frame(
            "<IFRAME src=\"https://v.test/e?a=1&amp;b=2\" width='560' allowfullscreen></iframe>\n",
        )
        .unwrap();
        assert_eq!(
            frame.to_string(),
            "<iframe src=\"https://v.test/e?a=1&amp;b=2\" width=\"560\" allowfullscreen=\"\"></iframe>"
        );
    }

    #[test]
    fn embed_frame_rejects_anything_else() {
        for markup in [
            "<script>alert(1)</script>",
            "<iframe src=\"https://v.test\" onload=\"alert(1)\"></iframe>",
            "<iframe src=\"javascript:alert(1)\"></iframe>",
            "<iframe src=\"http://v.test\"></iframe>",
            "<iframe src=\"https://v.test\"></iframe><script></script>",
            "<iframe src=\"https://v.test\">fallback</iframe>",
            "<iframe src=https://v.test></iframe>",
            "<iframe title=\"no source\"></iframe>",
            "<iframex src=\"https://v.test\"></iframe>",
            "",
        ] {
            assert_eq!(embed_frame(markup), None, "{markup}");
        }
    }
}
