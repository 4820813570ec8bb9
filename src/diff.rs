//! Structural comparison on top of canonical strings.
//!
//! [`diff`] walks plain objects and arrays field by field and compares the
//! digests of everything else, so it reports *where* two values differ rather
//! than only *whether* they do. [`is_equal`] is the whole-value check.
//!
//! ```rust
//! use canonize::{diff, Options, Value};
//!
//! let before = Value::object([("name", Value::from("a")), ("size", Value::from(1))]);
//! let after = Value::object([("name", Value::from("b")), ("tags", Value::array(vec![]))]);
//!
//! let changes: Vec<String> = diff(&before, &after, &Options::default())
//!     .unwrap()
//!     .iter()
//!     .map(ToString::to_string)
//!     .collect();
//!
//! assert_eq!(
//!     changes,
//!     vec![
//!         "Changed `name` from `'a'` to `'b'`",
//!         "Removed `size`",
//!         "Added   `tags`",
//!     ]
//! );
//! ```

use crate::hash::sha256_base64;
use crate::value::ObjectId;
use crate::{serialize_with_options, Object, Options, Result, Value};
use indexmap::IndexMap;
use std::fmt;
use std::mem;

/// The kind of a single difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    Changed,
}

/// One difference between two values, located by its dotted path.
///
/// `old` and `new` hold a short rendering of each side: the canonical text of
/// a leaf, or the key list of a container. The side that does not exist is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: String,
    pub kind: DiffKind,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiffKind::Added => write!(f, "Added   `{}`", self.path),
            DiffKind::Removed => write!(f, "Removed `{}`", self.path),
            DiffKind::Changed => write!(
                f,
                "Changed `{}` from `{}` to `{}`",
                self.path,
                self.old.as_deref().unwrap_or("-"),
                self.new.as_deref().unwrap_or("-"),
            ),
        }
    }
}

/// A value reduced to digests, with containers kept open.
struct Node {
    path: String,
    hash: String,
    summary: String,
    container: Option<Container>,
}

struct Container {
    shape: Shape,
    fields: IndexMap<String, Node>,
}

/// Containers of different shapes are compared as leaves.
#[derive(PartialEq, Eq)]
enum Shape {
    Array,
    Plain(String),
}

impl Shape {
    fn render(&self, parts: &[&str], separator: &str) -> String {
        match self {
            Shape::Array => format!("[{}]", parts.join(separator)),
            Shape::Plain(class) => format!("{}{{{}}}", class, parts.join(separator)),
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Fields of a plain object or array, unless it is already on the walk stack.
fn open_fields(
    value: &Value,
    options: &Options,
    stack: &[ObjectId],
) -> Option<(ObjectId, Shape, Vec<(String, Value)>)> {
    let object = value.as_object()?;
    let id = object.id();
    if stack.contains(&id) {
        return None;
    }
    let borrowed = object.borrow();
    match &*borrowed {
        Object::Plain(plain) => {
            let fields = plain
                .properties
                .iter()
                .filter(|(key, _)| !options.is_key_excluded(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Some((id, Shape::Plain(plain.display_class().to_string()), fields))
        }
        Object::Array(items) => {
            let fields = items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect();
            Some((id, Shape::Array, fields))
        }
        _ => None,
    }
}

fn build(value: &Value, path: String, options: &Options, stack: &mut Vec<ObjectId>) -> Result<Node> {
    let Some((id, shape, fields)) = open_fields(value, options, stack) else {
        let text = serialize_with_options(value, options)?;
        return Ok(Node {
            path,
            hash: sha256_base64(&text),
            summary: text,
            container: None,
        });
    };

    stack.push(id);
    let mut children = IndexMap::with_capacity(fields.len());
    for (key, field) in fields {
        let node = build(&field, child_path(&path, &key), options, stack)?;
        children.insert(key, node);
    }
    stack.pop();

    let hashes: Vec<&str> = children.values().map(|node: &Node| node.hash.as_str()).collect();
    let keys: Vec<&str> = children.keys().map(String::as_str).collect();
    Ok(Node {
        path,
        hash: shape.render(&hashes, ":"),
        summary: shape.render(&keys, ","),
        container: Some(Container {
            shape,
            fields: children,
        }),
    })
}

fn compare(old: &Node, new: &Node, out: &mut Vec<DiffEntry>) {
    match (&old.container, &new.container) {
        (Some(left), Some(right)) if left.shape == right.shape => {
            for (key, old_field) in &left.fields {
                match right.fields.get(key) {
                    Some(new_field) => compare(old_field, new_field, out),
                    None => out.push(DiffEntry {
                        path: old_field.path.clone(),
                        kind: DiffKind::Removed,
                        old: Some(old_field.summary.clone()),
                        new: None,
                    }),
                }
            }
            for (key, new_field) in &right.fields {
                if !left.fields.contains_key(key) {
                    out.push(DiffEntry {
                        path: new_field.path.clone(),
                        kind: DiffKind::Added,
                        old: None,
                        new: Some(new_field.summary.clone()),
                    });
                }
            }
        }
        _ if old.hash != new.hash => out.push(DiffEntry {
            path: new.path.clone(),
            kind: DiffKind::Changed,
            old: Some(old.summary.clone()),
            new: Some(new.summary.clone()),
        }),
        _ => {}
    }
}

/// Lists the differences between `old` and `new`.
///
/// Plain objects and arrays are compared field by field; everything else is
/// compared by the digest of its canonical form. A container reached again
/// through a cycle is compared as a whole. Entries come in key order of `old`,
/// followed by keys that only `new` has.
///
/// # Errors
///
/// Returns an error if a leaf cannot be serialized.
pub fn diff(old: &Value, new: &Value, options: &Options) -> Result<Vec<DiffEntry>> {
    let old = build(old, String::new(), options, &mut Vec::new())?;
    let new = build(new, String::new(), options, &mut Vec::new())?;
    let mut entries = Vec::new();
    compare(&old, &new, &mut entries);
    Ok(entries)
}

/// Returns `true` if both values are the same object or serialize identically.
///
/// Values of different primitive kinds (a number and a bigint, say) are never
/// equal.
///
/// # Examples
///
/// ```rust
/// use canonize::{is_equal, Options, Value};
///
/// let options = Options::default();
/// let a = Value::set(vec![Value::from(1), Value::from(2)]);
/// let b = Value::set(vec![Value::from(2), Value::from(1)]);
///
/// assert!(is_equal(&a, &b, &options).unwrap());
/// assert!(!is_equal(&Value::from(1), &Value::from("1"), &options).unwrap());
/// ```
///
/// # Errors
///
/// Returns an error if either value cannot be serialized.
pub fn is_equal(a: &Value, b: &Value, options: &Options) -> Result<bool> {
    if let (Value::Object(x), Value::Object(y)) = (a, b) {
        if x.ptr_eq(y) {
            return Ok(true);
        }
    }
    if mem::discriminant(a) != mem::discriminant(b) {
        return Ok(false);
    }
    Ok(serialize_with_options(a, options)? == serialize_with_options(b, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(old: &Value, new: &Value) -> Vec<String> {
        diff(old, new, &Options::default())
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_identical_values_have_no_diff() {
        let a = Value::object([("x", Value::from(1)), ("y", Value::array(vec![Value::from(2)]))]);
        let b = Value::object([("y", Value::array(vec![Value::from(2)])), ("x", Value::from(1))]);
        assert!(changes(&a, &b).is_empty());
    }

    #[test]
    fn test_nested_paths() {
        let a = Value::object([("outer", Value::object([("inner", Value::from(1))]))]);
        let b = Value::object([("outer", Value::object([("inner", Value::from(2))]))]);
        assert_eq!(changes(&a, &b), vec!["Changed `outer.inner` from `1` to `2`"]);
    }

    #[test]
    fn test_array_elements() {
        let a = Value::array(vec![Value::from(1), Value::from(2)]);
        let b = Value::array(vec![Value::from(1), Value::from(3), Value::from(4)]);
        assert_eq!(
            changes(&a, &b),
            vec!["Changed `1` from `2` to `3`", "Added   `2`"]
        );
    }

    #[test]
    fn test_shape_change_is_reported_once() {
        let a = Value::object([("v", Value::array(vec![Value::from(1)]))]);
        let b = Value::object([("v", Value::object([("0", Value::from(1))]))]);
        assert_eq!(changes(&a, &b), vec!["Changed `v` from `[0]` to `{0}`"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let a = Value::empty_object();
        a.as_object().unwrap().set("self", a.clone());
        a.as_object().unwrap().set("n", Value::from(1));
        let b = Value::empty_object();
        b.as_object().unwrap().set("self", b.clone());
        b.as_object().unwrap().set("n", Value::from(2));

        let entries = diff(&a, &b, &Options::default()).unwrap();
        assert!(entries.iter().any(|entry| entry.path == "n"));
        assert!(entries.iter().all(|entry| entry.kind == DiffKind::Changed));
    }

    #[test]
    fn test_is_equal() {
        let options = Options::default();
        let a = Value::object([("x", Value::from(1))]);
        assert!(is_equal(&a, &a, &options).unwrap());
        assert!(is_equal(&a, &Value::object([("x", Value::from(1.0))]), &options).unwrap());
        assert!(!is_equal(&Value::from(1), &Value::from(num_bigint::BigInt::from(1)), &options).unwrap());
        assert!(!is_equal(&a, &Value::object([("x", Value::from(2))]), &options).unwrap());
    }
}
