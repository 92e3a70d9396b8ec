//! Normalized structural distance between two parsed bodies.

use std::collections::{BTreeMap, BTreeSet};

use strsim::normalized_levenshtein;

use super::structural::{BodyNode, StructuralForm};

/// Distance between two structural forms.
///
/// Exactly `0.0` when the forms are structurally identical, otherwise a
/// score in `(0.0, 1.0]` reflecting the proportion of structure that
/// differs. Collection elements are paired greedily by best match, so
/// reordering is cheap and partial overlap scores partially. Never fails:
/// empty and mismatched-shape inputs all produce a defined score.
pub fn distance(a: &StructuralForm, b: &StructuralForm) -> f64 {
    if a == b {
        return 0.0;
    }
    match (a, b) {
        (StructuralForm::Tree(x), StructuralForm::Tree(y)) => node_distance(x, y),
        (StructuralForm::Lines(x), StructuralForm::Lines(y)) => line_distance(x, y),
        // One side parsed as markup and the other did not; degrade both to
        // line sequences so mismatched shapes still yield a score.
        _ => line_distance(&flatten(a), &flatten(b)),
    }
}

fn node_distance(a: &BodyNode, b: &BodyNode) -> f64 {
    match (a, b) {
        (BodyNode::Text(x), BodyNode::Text(y)) => text_distance(x, y),
        (
            BodyNode::Element {
                tag: tag_a,
                attrs: attrs_a,
                children: children_a,
            },
            BodyNode::Element {
                tag: tag_b,
                attrs: attrs_b,
                children: children_b,
            },
        ) => {
            if tag_a != tag_b {
                return 1.0;
            }
            let attr_weight = attr_union_size(attrs_a, attrs_b);
            let child_weight = children_a.len().max(children_b.len());
            if attr_weight + child_weight == 0 {
                return 0.0;
            }
            let attr_score = attr_distance(attrs_a, attrs_b) * attr_weight as f64;
            let child_score =
                pair_distance(children_a, children_b, node_distance) * child_weight as f64;
            (attr_score + child_score) / (attr_weight + child_weight) as f64
        }
        _ => 1.0,
    }
}

fn attr_union_size(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> usize {
    a.keys().chain(b.keys()).collect::<BTreeSet<_>>().len()
}

fn attr_distance(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> f64 {
    let union: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    if union.is_empty() {
        return 0.0;
    }
    let differing = union
        .iter()
        .filter(|key| a.get(**key) != b.get(**key))
        .count();
    differing as f64 / union.len() as f64
}

fn line_distance(a: &[String], b: &[String]) -> f64 {
    pair_distance(a, b, |x, y| text_distance(x, y))
}

fn text_distance(a: &str, b: &str) -> f64 {
    1.0 - normalized_levenshtein(a, b)
}

/// Greedy best-match pairing: cheapest pairs are consumed first, every
/// element left unpaired costs a full unit, and the total is normalized by
/// the longer side.
fn pair_distance<T, F>(a: &[T], b: &[T], metric: F) -> f64
where
    F: Fn(&T, &T) -> f64,
{
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let max_len = a.len().max(b.len());

    let mut costs = Vec::with_capacity(a.len() * b.len());
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            costs.push((metric(x, y), i, j));
        }
    }
    costs.sort_by(|p, q| {
        p.0.partial_cmp(&q.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(p.1.cmp(&q.1))
            .then(p.2.cmp(&q.2))
    });

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];
    let mut total = 0.0;
    let mut paired = 0;
    for (cost, i, j) in costs {
        if used_a[i] || used_b[j] {
            continue;
        }
        used_a[i] = true;
        used_b[j] = true;
        total += cost;
        paired += 1;
        if paired == a.len().min(b.len()) {
            break;
        }
    }
    total += (max_len - paired) as f64;
    total / max_len as f64
}

fn flatten(form: &StructuralForm) -> Vec<String> {
    match form {
        StructuralForm::Lines(lines) => lines.clone(),
        StructuralForm::Tree(root) => {
            let mut out = Vec::new();
            flatten_node(root, &mut out);
            out
        }
    }
}

fn flatten_node(node: &BodyNode, out: &mut Vec<String>) {
    match node {
        BodyNode::Text(text) => out.push(text.clone()),
        BodyNode::Element {
            tag,
            attrs,
            children,
        } => {
            let mut line = format!("<{}", tag);
            for (name, value) in attrs {
                line.push_str(&format!(" {}={}", name, value));
            }
            line.push('>');
            out.push(line);
            for child in children {
                flatten_node(child, out);
            }
        }
    }
}
