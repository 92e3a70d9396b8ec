//! Converts response bodies into a comparable structural form.
//!
//! Markup bodies become a normalized tree so tag soup noise (attribute
//! reordering, indentation) does not register as a difference. Anything
//! else falls back to an ordered line sequence. Both variants feed the same
//! distance metric, so the fallback is a plain value, never an error path.

use std::collections::BTreeMap;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Comparable form of a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralForm {
    /// Normalized markup tree rooted at the document element.
    Tree(BodyNode),
    /// Ordered lines of a body that did not parse as markup.
    Lines(Vec<String>),
}

/// One node of a normalized markup tree. Attributes are kept sorted and
/// whitespace-only text nodes are dropped during conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyNode {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<BodyNode>,
    },
    Text(String),
}

/// Parses a raw body into its comparable form.
///
/// Deterministic: identical input always yields an equivalent form. A body
/// whose trimmed text does not open with a tag, or that yields no element
/// node at all, takes the line-sequence fallback.
pub fn parse_body(raw: &str) -> StructuralForm {
    if looks_like_markup(raw) {
        if let Some(root) = parse_markup(raw) {
            return StructuralForm::Tree(root);
        }
    }
    StructuralForm::Lines(split_lines(raw))
}

fn looks_like_markup(raw: &str) -> bool {
    raw.trim_start().starts_with('<')
}

fn split_lines(raw: &str) -> Vec<String> {
    raw.split('\n').map(|line| line.to_string()).collect()
}

fn parse_markup(raw: &str) -> Option<BodyNode> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut raw.as_bytes())
        .ok()?;
    let root = dom
        .document
        .children
        .borrow()
        .iter()
        .filter_map(convert)
        .find(|node| matches!(node, BodyNode::Element { .. }));
    root
}

fn convert(handle: &Handle) -> Option<BodyNode> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string().to_lowercase();
            let attrs: BTreeMap<String, String> = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string().to_lowercase(), a.value.to_string()))
                .collect();
            let children = handle
                .children
                .borrow()
                .iter()
                .filter_map(convert)
                .collect();
            Some(BodyNode::Element {
                tag,
                attrs,
                children,
            })
        }
        NodeData::Text { contents } => {
            let text = normalize_text(&contents.borrow());
            if text.is_empty() {
                None
            } else {
                Some(BodyNode::Text(text))
            }
        }
        // Comments, doctypes and processing instructions carry no
        // comparable structure.
        _ => None,
    }
}

fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str =
        "<!DOCTYPE html><html><body><div id=\"main\"><p>hello world</p></div></body></html>";

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_body(PAGE), parse_body(PAGE));
        let plain = "just\nsome\ntext";
        assert_eq!(parse_body(plain), parse_body(plain));
    }

    #[test]
    fn markup_body_parses_into_a_tree() {
        match parse_body(PAGE) {
            StructuralForm::Tree(BodyNode::Element { tag, .. }) => assert_eq!(tag, "html"),
            other => panic!("expected tree, got {:?}", other),
        }
    }

    #[test]
    fn non_markup_body_falls_back_to_lines() {
        let json = "{\"status\": \"ok\",\n \"count\": 3}";
        match parse_body(json) {
            StructuralForm::Lines(lines) => assert_eq!(lines.len(), 2),
            other => panic!("expected lines, got {:?}", other),
        }
    }

    #[test]
    fn empty_body_is_accepted() {
        assert_eq!(parse_body(""), StructuralForm::Lines(vec![String::new()]));
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let a = "<!DOCTYPE html><html><body><div id=\"x\" class=\"y\"></div></body></html>";
        let b = "<!DOCTYPE html><html><body><div class=\"y\" id=\"x\"></div></body></html>";
        assert_eq!(parse_body(a), parse_body(b));
    }

    #[test]
    fn whitespace_runs_collapse() {
        let a = "<!DOCTYPE html><html><body><p>hello   world</p></body></html>";
        let b = "<!DOCTYPE html><html><body><p>hello world</p></body></html>";
        assert_eq!(parse_body(a), parse_body(b));
    }
}
