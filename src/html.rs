//! Thin layer over `scraper`: built-in selectors, text helpers, and a
//! serializer that renders a subtree while applying attribute rewrites.
//!
//! Parsed documents are never mutated. Rewrites are decided per attribute
//! while the new markup is written out.

use scraper::node::Node;
use scraper::{ElementRef, Selector};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Parses a selector that ships with the crate.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("built-in selector {css:?} is invalid: {err}"))
}

/// Text content with runs of whitespace collapsed and the ends trimmed.
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// What to do with one attribute of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrEdit {
    Keep,
    Drop,
    Replace(String),
}

/// Renders the children of `root` (its inner markup).
///
/// `edit` is consulted for every attribute of every descendant element.
/// `skip`, when set, is omitted from the output together with its subtree.
pub fn render_inner<F>(root: ElementRef<'_>, skip: Option<ElementRef<'_>>, edit: &F) -> String
where
    F: Fn(ElementRef<'_>, &str, &str) -> AttrEdit,
{
    let mut out = String::new();
    render_children(root, skip, edit, &mut out);
    out
}

fn render_children<F>(parent: ElementRef<'_>, skip: Option<ElementRef<'_>>, edit: &F, out: &mut String)
where
    F: Fn(ElementRef<'_>, &str, &str) -> AttrEdit,
{
    let raw_text = RAW_TEXT_ELEMENTS.contains(&parent.value().name());

    for child in parent.children() {
        if skip.is_some_and(|skip| skip.id() == child.id()) {
            continue;
        }

        match child.value() {
            Node::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    render_element(element, skip, edit, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element<F>(element: ElementRef<'_>, skip: Option<ElementRef<'_>>, edit: &F, out: &mut String)
where
    F: Fn(ElementRef<'_>, &str, &str) -> AttrEdit,
{
    let name = element.value().name();
    out.push('<');
    out.push_str(name);

    for (attr, value) in element.value().attrs() {
        let value = match edit(element, attr, value) {
            AttrEdit::Keep => value.to_owned(),
            AttrEdit::Drop => continue,
            AttrEdit::Replace(new_value) => new_value,
        };
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(&value, true, out);
        out.push('"');
    }

    if VOID_ELEMENTS.contains(&name) {
        out.push_str(" />");
        return;
    }

    out.push('>');
    render_children(element, skip, edit, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Escapes a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_into(value, true, &mut out);
    out
}

fn escape_into(input: &str, attribute: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
