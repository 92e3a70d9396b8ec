//! Set-difference over header collections.

use std::collections::{BTreeSet, HashSet};

use rquest::header::HeaderMap;

/// Names of headers that differ between two collections, excluding the
/// ignore set.
///
/// A name is reported when it is present on exactly one side, or present on
/// both with different values (all values of repeated headers are compared,
/// in order). Matching is case-insensitive: `HeaderMap` keys are already
/// lowercase and the ignore set is expected in lowercase.
pub fn diff_headers(a: &HeaderMap, b: &HeaderMap, ignore: &HashSet<String>) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for name in a.keys().chain(b.keys()) {
        names.insert(name.as_str().to_string());
    }

    let mut differing = BTreeSet::new();
    for name in names {
        if ignore.contains(&name) {
            continue;
        }
        let values_a: Vec<&[u8]> = a.get_all(name.as_str()).iter().map(|v| v.as_bytes()).collect();
        let values_b: Vec<&[u8]> = b.get_all(name.as_str()).iter().map(|v| v.as_bytes()).collect();
        if values_a != values_b {
            differing.insert(name);
        }
    }
    differing
}
