use super::{Document, NodeData, NodeId};
use scraper::{ElementRef, Html, Node};

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parse `markup` as body content and create detached nodes for it.
pub(super) fn parse_fragment(doc: &mut Document, markup: &str) -> Vec<NodeId> {
    let fragment = Html::parse_fragment(markup);
    import_children(doc, fragment.root_element())
}

fn import_children(doc: &mut Document, parent: ElementRef<'_>) -> Vec<NodeId> {
    let mut imported = Vec::new();
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => imported.push(doc.create_text(text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    imported.push(import_element(doc, element));
                }
            }
            _ => {}
        }
    }
    imported
}

fn import_element(doc: &mut Document, element: ElementRef<'_>) -> NodeId {
    let value = element.value();
    let id = doc.create_element(value.name());
    for (name, attr) in value.attrs() {
        doc.set_attribute(id, name, attr);
    }
    for child in import_children(doc, element) {
        doc.link(id, child);
    }
    id
}

pub(super) fn serialize_children(doc: &Document, id: NodeId, out: &mut String) {
    for child in doc.children(id) {
        serialize_node(doc, *child, out);
    }
}

fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        Some(NodeData::Text(text)) => out.push_str(&escape_text(text)),
        Some(NodeData::Element(element)) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                return;
            }
            serialize_children(doc, id, out);
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        None => {}
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Decode HTML character references (`&amp;`, `&#39;`, `&eacute;` ...) in
/// plain text, the way a browser would when the text is parsed as markup.
pub fn decode_entities(encoded: &str) -> String {
    Html::parse_fragment(encoded)
        .root_element()
        .text()
        .collect()
}
