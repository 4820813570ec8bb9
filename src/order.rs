//! Canonical ordering for unordered containers.
//!
//! Object keys are plain strings and sort by code point. Set elements and Map
//! keys can be anything, so each one is reduced to a [`SortKey`] first:
//!
//! 1. back-references to an enclosing object, compared by marker number;
//! 2. numbers, compared numerically;
//! 3. strings, compared by code point;
//! 4. everything else, compared by its serialized text.
//!
//! A back-reference writes as `#<n>`, which sorts before any digit, so
//! markers lead the container. Keys are
//! computed once per element and the sort is stable, so elements that
//! serialize identically stay adjacent and the result never depends on
//! insertion order.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub(crate) enum SortKey {
    /// An object that is still being written.
    Marker(usize),
    /// Numeric value plus its text; the text breaks ties between integers
    /// that round to the same `f64`.
    Number(f64, String),
    String(String),
    Text(String),
}

impl SortKey {
    const fn rank(&self) -> u8 {
        match self {
            SortKey::Marker(_) => 0,
            SortKey::Number(..) => 1,
            SortKey::String(_) => 2,
            SortKey::Text(_) => 3,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Marker(a), SortKey::Marker(b)) => a.cmp(b),
            (SortKey::Number(a, a_text), SortKey::Number(b, b_text)) => {
                a.total_cmp(b).then_with(|| a_text.cmp(b_text))
            }
            (SortKey::String(a), SortKey::String(b)) | (SortKey::Text(a), SortKey::Text(b)) => {
                a.cmp(b)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Stable-sorts `items` by their precomputed keys.
pub(crate) fn sort_by_keys<T>(mut keyed: Vec<(SortKey, T)>) -> Vec<T> {
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Sorts object properties by key, comparing code points.
pub(crate) fn sort_properties<V>(properties: &mut [(&String, V)]) {
    properties.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
}
