//! # canonize
//!
//! Deterministic, canonical string serialization for arbitrary value graphs,
//! cycles included.
//!
//! ## What is a canonical form?
//!
//! Two values that mean the same thing serialize to the same string, no matter
//! how they were built. Object keys, `Set` elements and `Map` entries are put in
//! a fixed order, shared sub-objects are written out in full wherever they
//! appear, and cycles become numbered back-references. The output is meant to
//! be hashed, compared or diffed, never parsed back.
//!
//! ## Key Features
//!
//! - **Order-Independent**: insertion order of keys, set elements and map
//!   entries never shows in the output
//! - **Cycle-Safe**: self-referencing graphs terminate with `#<n>` markers
//! - **Open-Ended**: unknown object kinds plug in through [`HostObject`] or a
//!   handler registered in [`Options`]
//! - **Serde Compatible**: any `T: Serialize` can be canonicalized through
//!   [`to_canonical_string`]
//!
//! ## Quick Start
//!
//! ```rust
//! use canonize::{serialize, Value};
//!
//! let a = Value::object([("b", Value::from(2)), ("a", Value::from(1))]);
//! let b = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
//!
//! assert_eq!(serialize(&a).unwrap(), "{a:1,b:2}");
//! assert_eq!(serialize(&a).unwrap(), serialize(&b).unwrap());
//! ```
//!
//! ### Cycles and Shared References
//!
//! ```rust
//! use canonize::{serialize, Value};
//!
//! let parent = Value::object([("name", Value::from("root"))]);
//! let child = Value::object([("parent", parent.clone())]);
//! parent.as_object().unwrap().set("child", child);
//!
//! assert_eq!(serialize(&parent).unwrap(), "{child:{parent:#0},name:'root'}");
//! ```
//!
//! ### Rust Types
//!
//! ```rust
//! use canonize::to_canonical_string;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { y: i32, x: i32 }
//!
//! assert_eq!(to_canonical_string(&Point { y: 2, x: 1 }).unwrap(), "Point{x:1,y:2}");
//! ```
//!
//! ### Hashing and Diffing
//!
//! ```rust
//! use canonize::{diff, hash, Options, Value};
//!
//! let before = Value::object([("v", Value::from(1))]);
//! let after = Value::object([("v", Value::from(2))]);
//!
//! assert_ne!(hash(&before).unwrap(), hash(&after).unwrap());
//! let changes = diff(&before, &after, &Options::default()).unwrap();
//! assert_eq!(changes[0].to_string(), "Changed `v` from `1` to `2`");
//! ```
//!
//! ## Output Format
//!
//! | value | output |
//! |---|---|
//! | string | `'text'` |
//! | number, bigint | `1.5`, `NaN`, `10n` |
//! | object | `{a:1,b:2}`, `Point{x:1}` |
//! | array, set | `[1,2]`, `Set[1,2]` |
//! | map | `Map{2:'b',a:1}` |
//! | date, regexp | `Date(2020-01-01T00:00:00.000Z)`, `RegExp(/a+/g)` |
//! | function | `sum(2)function sum(a, b) {return a + b;}`, `max()[native]` |
//! | cycle | `#0` |
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (back-references at `TRACE`, unknown
//! object kinds and handler use at `DEBUG`) and never installs a subscriber.

pub mod diff;
pub mod error;
pub mod hash;
pub mod macros;
pub mod map;
pub mod object;
pub mod options;
mod order;
mod refs;
pub mod ser;
pub mod value;

pub use diff::{diff, is_equal, DiffEntry, DiffKind};
pub use error::{Error, Result};
pub use hash::{hash, hash_with_options, murmur_hash, sha256, sha256_base64, HASH_LENGTH};
pub use map::PropertyMap;
pub use object::{
    ErrorObject, Function, HostObject, Object, Opaque, PlainObject, RegExp, TypedArray,
};
pub use options::{Handler, KeyFilter, Options, Replacer};
pub use ser::{Serializer, ValueSerializer};
pub use value::{Number, ObjectId, ObjectRef, Symbol, Value};

use serde::Serialize;

/// Serialize a value graph to its canonical string with default options.
///
/// # Examples
///
/// ```rust
/// use canonize::{serialize, Value};
///
/// let set = Value::set(vec![Value::from("b"), Value::from(1), Value::from("a")]);
/// assert_eq!(serialize(&set).unwrap(), "Set[1,'a','b']");
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] if the graph contains an object kind
/// that cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize(value: &Value) -> Result<String> {
    serialize_with_options(value, &Options::default())
}

/// Serialize a value graph to its canonical string with custom options.
///
/// # Examples
///
/// ```rust
/// use canonize::{serialize_with_options, Options, Value};
///
/// let value = Value::array(vec![Value::from(2), Value::from(1)]);
/// let options = Options::new().with_unordered_arrays(true);
/// assert_eq!(serialize_with_options(&value, &options).unwrap(), "[1,2]");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or a registered handler
/// fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize_with_options(value: &Value, options: &Options) -> Result<String> {
    let mut serializer = Serializer::new(options);
    serializer.serialize(value)?;
    Ok(serializer.into_inner())
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use canonize::to_value;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_object());
/// ```
///
/// # Errors
///
/// Returns an error if the `Serialize` implementation fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Canonical string of any `T: Serialize`.
///
/// # Errors
///
/// Returns an error if the `Serialize` implementation fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_canonical_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    serialize(&to_value(value)?)
}

/// Canonical string of any `T: Serialize` with custom options.
///
/// # Errors
///
/// Returns an error if the `Serialize` implementation fails or the converted
/// value cannot be serialized with `options`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_canonical_string_with_options<T>(value: &T, options: &Options) -> Result<String>
where
    T: ?Sized + Serialize,
{
    serialize_with_options(&to_value(value)?, options)
}
