//! Object kinds recognized by the serializer.
//!
//! Every composite value is one [`Object`] variant behind an
//! [`ObjectRef`](crate::ObjectRef). The closed variants cover the built-in
//! kinds with a fixed textual form; [`Object::Host`] carries anything else
//! through the [`HostObject`] capability trait, which the serializer probes
//! for a conversion (`to_json`) or an iteration (`entries`) protocol.

use crate::value::write_f64;
use crate::{PropertyMap, Value};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use url::Url;

/// A composite value with identity.
#[derive(Debug)]
pub enum Object {
    Plain(PlainObject),
    Array(Vec<Value>),
    Function(Function),
    /// `None` is a date whose time value is NaN.
    Date(Option<DateTime<Utc>>),
    RegExp(RegExp),
    Url(Url),
    Error(ErrorObject),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    ArrayBuffer(Vec<u8>),
    TypedArray(TypedArray),
    Host(Box<dyn HostObject>),
}

impl Object {
    /// The class tag, as it would appear in `[object <Tag>]`.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Object::Plain(_) => "Object",
            Object::Array(_) => "Array",
            Object::Function(f) if f.is_async => "AsyncFunction",
            Object::Function(_) => "Function",
            Object::Date(_) => "Date",
            Object::RegExp(_) => "RegExp",
            Object::Url(_) => "URL",
            Object::Error(_) => "Error",
            Object::Map(_) => "Map",
            Object::Set(_) => "Set",
            Object::ArrayBuffer(_) => "ArrayBuffer",
            Object::TypedArray(array) => array.tag(),
            Object::Host(host) => host.tag(),
        }
    }
}

/// An ordinary object or class instance.
///
/// `class` is the constructor name written in front of the body; `None` (or
/// `Some("Object")`) means a plain object literal.
#[derive(Debug, Clone, Default)]
pub struct PlainObject {
    pub class: Option<String>,
    pub properties: PropertyMap,
}

impl PlainObject {
    /// The constructor name to print, empty for plain `Object`.
    #[must_use]
    pub fn display_class(&self) -> &str {
        match self.class.as_deref() {
            Some("Object") | None => "",
            Some(class) => class,
        }
    }
}

/// A callable value.
///
/// Functions without source text are native (built-in) callables; their body
/// is not observable and they serialize by name only.
#[derive(Debug, Clone, Default)]
pub struct Function {
    pub name: String,
    pub arity: usize,
    pub source: Option<String>,
    pub is_async: bool,
    pub properties: PropertyMap,
}

impl Function {
    /// A user function with its declared parameter count and source text.
    pub fn new(name: impl Into<String>, arity: usize, source: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            arity,
            source: Some(source.into()),
            ..Default::default()
        }
    }

    /// A built-in callable with no observable source.
    pub fn native(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key, value);
        self
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.source.is_none()
    }
}

/// Drops every whitespace run that spans a line break, keeping the rest intact.
///
/// ```text
/// "function f(a, b) {\n  return a + b;\n}"  ->  "function f(a, b) {return a + b;}"
/// ```
pub(crate) fn collapse_line_breaks(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut run = String::new();
    let mut run_has_newline = false;

    for ch in source.chars() {
        if ch.is_whitespace() {
            run.push(ch);
            run_has_newline |= ch == '\n';
            continue;
        }
        if !run_has_newline {
            out.push_str(&run);
        }
        run.clear();
        run_has_newline = false;
        out.push(ch);
    }
    if !run_has_newline {
        out.push_str(&run);
    }
    out
}

/// A regular expression literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExp {
    pub source: String,
    pub flags: String,
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// An error instance; subclasses differ only by `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.message.is_empty()) {
            (_, true) => f.write_str(&self.name),
            (true, false) => f.write_str(&self.message),
            (false, false) => write!(f, "{}: {}", self.name, self.message),
        }
    }
}

/// The concrete typed-array kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Uint8Clamped(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    BigInt64(Vec<i64>),
    BigUint64(Vec<u64>),
}

impl TypedArray {
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            TypedArray::Int8(_) => "Int8Array",
            TypedArray::Uint8(_) => "Uint8Array",
            TypedArray::Uint8Clamped(_) => "Uint8ClampedArray",
            TypedArray::Int16(_) => "Int16Array",
            TypedArray::Uint16(_) => "Uint16Array",
            TypedArray::Int32(_) => "Int32Array",
            TypedArray::Uint32(_) => "Uint32Array",
            TypedArray::Float32(_) => "Float32Array",
            TypedArray::Float64(_) => "Float64Array",
            TypedArray::BigInt64(_) => "BigInt64Array",
            TypedArray::BigUint64(_) => "BigUint64Array",
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            TypedArray::Int8(v) => v.len(),
            TypedArray::Uint8(v) | TypedArray::Uint8Clamped(v) => v.len(),
            TypedArray::Int16(v) => v.len(),
            TypedArray::Uint16(v) => v.len(),
            TypedArray::Int32(v) => v.len(),
            TypedArray::Uint32(v) => v.len(),
            TypedArray::Float32(v) => v.len(),
            TypedArray::Float64(v) => v.len(),
            TypedArray::BigInt64(v) => v.len(),
            TypedArray::BigUint64(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the comma-separated elements, without brackets.
    pub(crate) fn write_elements(&self, out: &mut String) -> fmt::Result {
        fn join<T>(
            out: &mut String,
            items: &[T],
            mut each: impl FnMut(&mut String, &T) -> fmt::Result,
        ) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                each(out, item)?;
            }
            Ok(())
        }

        match self {
            TypedArray::Int8(v) => join(out, v, |o, x| write!(o, "{}", x)),
            TypedArray::Uint8(v) | TypedArray::Uint8Clamped(v) => {
                join(out, v, |o, x| write!(o, "{}", x))
            }
            TypedArray::Int16(v) => join(out, v, |o, x| write!(o, "{}", x)),
            TypedArray::Uint16(v) => join(out, v, |o, x| write!(o, "{}", x)),
            TypedArray::Int32(v) => join(out, v, |o, x| write!(o, "{}", x)),
            TypedArray::Uint32(v) => join(out, v, |o, x| write!(o, "{}", x)),
            // Elements widen to f64 before printing, as reads from the array do
            TypedArray::Float32(v) => join(out, v, |o, x| write_f64(o, f64::from(*x))),
            TypedArray::Float64(v) => join(out, v, |o, x| write_f64(o, *x)),
            TypedArray::BigInt64(v) => join(out, v, |o, x| write!(o, "{}n", x)),
            TypedArray::BigUint64(v) => join(out, v, |o, x| write!(o, "{}n", x)),
        }
    }
}

/// Capability interface for object kinds the serializer does not know.
///
/// The serializer tries, in order: a handler registered for [`tag`](Self::tag)
/// in [`Options`](crate::Options), the [`to_json`](Self::to_json) conversion,
/// the [`entries`](Self::entries) iteration, and otherwise fails with
/// [`Error::UnsupportedType`](crate::Error::UnsupportedType).
///
/// # Examples
///
/// ```rust
/// use canonize::{serialize, HostObject, Value};
///
/// #[derive(Debug)]
/// struct FormData(Vec<(String, String)>);
///
/// impl HostObject for FormData {
///     fn tag(&self) -> &str {
///         "FormData"
///     }
///
///     fn entries(&self) -> Option<Vec<(Value, Value)>> {
///         Some(
///             self.0
///                 .iter()
///                 .map(|(k, v)| (Value::from(k.as_str()), Value::from(v.as_str())))
///                 .collect(),
///         )
///     }
/// }
///
/// let form = Value::host(FormData(vec![
///     ("foo".into(), "bar".into()),
///     ("bar".into(), "baz".into()),
/// ]));
/// assert_eq!(serialize(&form).unwrap(), "FormData{bar:'baz',foo:'bar'}");
/// ```
pub trait HostObject: fmt::Debug {
    /// The class tag of the object, e.g. `FormData` or `Promise`.
    fn tag(&self) -> &str;

    /// The constructor name written before a converted value.
    fn class_name(&self) -> &str {
        self.tag()
    }

    /// Conversion protocol: a replacement value to serialize instead.
    fn to_json(&self) -> Option<Value> {
        None
    }

    /// Iteration protocol: key-value entries to serialize as a container.
    fn entries(&self) -> Option<Vec<(Value, Value)>> {
        None
    }
}

/// A foreign object with no representable form (promises, weak collections,
/// blobs, generators).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    tag: String,
}

impl Opaque {
    pub fn new(tag: impl Into<String>) -> Self {
        Opaque { tag: tag.into() }
    }
}

impl HostObject for Opaque {
    fn tag(&self) -> &str {
        &self.tag
    }
}
