//! Dynamic value graph accepted by the canonical serializer.
//!
//! This module provides the [`Value`] enum for the primitive kinds and the
//! [`ObjectRef`] handle for everything that carries identity. Handles are
//! reference counted, so the same object can be reachable from several places
//! in a graph, including from itself.
//!
//! ## Core Types
//!
//! - [`Value`]: undefined, null, bool, number, bigint, string, symbol or object
//! - [`Number`]: integers, floats and the special values (Infinity, -Infinity, NaN)
//! - [`ObjectRef`]: shared handle to an [`Object`](crate::Object); identity is the handle's allocation
//!
//! ## Building Graphs
//!
//! ```rust
//! use canonize::{serialize, Value};
//!
//! // Acyclic values from primitives
//! let point = Value::object([("x", Value::from(1)), ("y", Value::from(2))]);
//! assert_eq!(serialize(&point).unwrap(), "{x:1,y:2}");
//!
//! // Cycles go through the handle
//! let node = Value::empty_object();
//! let handle = node.as_object().unwrap();
//! handle.set("self", node.clone());
//! assert_eq!(serialize(&node).unwrap(), "{self:#0}");
//! ```

use crate::object::{ErrorObject, Function, HostObject, Object, PlainObject, RegExp, TypedArray};
use crate::PropertyMap;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use url::Url;

/// A dynamically-typed value in a possibly cyclic graph.
///
/// Primitives are held inline; every composite lives behind an [`ObjectRef`].
/// Equality on `Value` compares primitives by value and objects by identity.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    BigInt(BigInt),
    String(String),
    Symbol(Symbol),
    Object(ObjectRef),
}

/// A numeric value that can be an integer, float, or special value.
///
/// Display follows the ECMAScript number-to-string rules, so integral floats
/// print without a fractional part and very large or very small magnitudes
/// switch to exponent form.
///
/// # Examples
///
/// ```rust
/// use canonize::Number;
///
/// assert_eq!(Number::Integer(42).to_string(), "42");
/// assert_eq!(Number::Float(1.0).to_string(), "1");
/// assert_eq!(Number::Float(f64::EPSILON).to_string(), "2.220446049250313e-16");
/// assert_eq!(Number::Float(1e21).to_string(), "1e+21");
/// assert_eq!(Number::NegativeInfinity.to_string(), "-Infinity");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    /// Normalizes a float, mapping non-finite values onto the special variants.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(
            self,
            Number::Infinity | Number::NegativeInfinity | Number::NaN
        )
    }

    /// Converts this number to an `i64` if it is integral and in range.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }
}

/// Writes a float the way ECMAScript `Number.prototype.toString()` does.
pub(crate) fn write_f64(f: &mut impl fmt::Write, value: f64) -> fmt::Result {
    if value.is_nan() {
        return f.write_str("NaN");
    }
    if value.is_infinite() {
        return f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if value == 0.0 {
        // -0 prints as 0
        return f.write_str("0");
    }
    if value < 0.0 {
        f.write_char('-')?;
    }

    // Shortest round-trip digits, e.g. "2.220446049250313e-16"
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').ok_or(fmt::Error)?;
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        f.write_str(&digits)?;
        for _ in 0..(n - k) {
            f.write_char('0')?;
        }
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        write!(f, "{}.{}", int_part, frac_part)?;
    } else if -6 < n && n <= 0 {
        f.write_str("0.")?;
        for _ in 0..(-n) {
            f.write_char('0')?;
        }
        f.write_str(&digits)?;
    } else {
        let (first, rest) = digits.split_at(1);
        f.write_str(first)?;
        if !rest.is_empty() {
            write!(f, ".{}", rest)?;
        }
        let sign = if n - 1 < 0 { '-' } else { '+' };
        write!(f, "e{}{}", sign, (n - 1).abs())?;
    }
    Ok(())
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write_f64(f, *fl),
            Number::Infinity => write!(f, "Infinity"),
            Number::NegativeInfinity => write!(f, "-Infinity"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

/// A symbol primitive, identified only by its optional description.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Symbol {
    pub description: Option<String>,
}

impl Symbol {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Symbol {
            description: Some(description.into()),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

/// Stable identity of an object for the duration of one serialization call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Shared handle to an [`Object`].
///
/// Cloning the handle aliases the object; it never copies it. Two handles are
/// the same object exactly when [`ObjectRef::ptr_eq`] holds, regardless of
/// their contents.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    #[must_use]
    pub fn new(object: Object) -> Self {
        ObjectRef(Rc::new(RefCell::new(object)))
    }

    /// Immutably borrows the object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Mutably borrows the object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Defines an own property on a plain object or function.
    ///
    /// Returns the previous value. Other object kinds have no own properties
    /// and are left untouched.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        match &mut *self.borrow_mut() {
            Object::Plain(plain) => plain.properties.insert(key, value.into()),
            Object::Function(function) => function.properties.insert(key, value.into()),
            _ => None,
        }
    }

    /// Appends to an array or adds to a set. Other kinds are left untouched.
    pub fn push(&self, value: impl Into<Value>) {
        match &mut *self.borrow_mut() {
            Object::Array(items) | Object::Set(items) => items.push(value.into()),
            _ => {}
        }
    }

    /// Adds an entry to a map. Other kinds are left untouched.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
        if let Object::Map(entries) = &mut *self.borrow_mut() {
            entries.push((key.into(), value.into()));
        }
    }

    /// Returns the class tag of the object (`Object`, `Array`, `Map`, ...).
    #[must_use]
    pub fn tag(&self) -> String {
        self.borrow().tag().to_string()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the tag: contents may lead back to this object.
        match self.0.try_borrow() {
            Ok(object) => write!(f, "ObjectRef({}@{:#x})", object.tag(), self.id().0),
            Err(_) => write!(f, "ObjectRef(<borrowed>@{:#x})", self.id().0),
        }
    }
}

impl Value {
    /// Creates a plain object from key-value pairs, preserving their order.
    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::from(Object::Plain(PlainObject {
            class: None,
            properties: properties.into_iter().collect(),
        }))
    }

    /// Creates a plain object with no properties.
    #[must_use]
    pub fn empty_object() -> Self {
        Value::from(PropertyMap::new())
    }

    /// Creates a class instance: a plain object carrying a constructor name.
    pub fn instance<K, I>(class: impl Into<String>, properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::from(Object::Plain(PlainObject {
            class: Some(class.into()),
            properties: properties.into_iter().collect(),
        }))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::from(Object::Array(items.into_iter().collect()))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::from(Object::Set(items.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::from(Object::Map(entries.into_iter().collect()))
    }

    #[must_use]
    pub fn date(date: DateTime<Utc>) -> Self {
        Value::from(Object::Date(Some(date)))
    }

    /// A date whose time value is NaN.
    #[must_use]
    pub fn invalid_date() -> Self {
        Value::from(Object::Date(None))
    }

    pub fn regexp(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::from(Object::RegExp(RegExp {
            source: source.into(),
            flags: flags.into(),
        }))
    }

    #[must_use]
    pub fn url(url: Url) -> Self {
        Value::from(Object::Url(url))
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Value::from(Object::Error(ErrorObject {
            name: name.into(),
            message: message.into(),
        }))
    }

    #[must_use]
    pub fn array_buffer(bytes: Vec<u8>) -> Self {
        Value::from(Object::ArrayBuffer(bytes))
    }

    #[must_use]
    pub fn typed_array(array: TypedArray) -> Self {
        Value::from(Object::TypedArray(array))
    }

    #[must_use]
    pub fn function(function: Function) -> Self {
        Value::from(Object::Function(function))
    }

    pub fn host(host: impl HostObject + 'static) -> Self {
        Value::from(Object::Host(Box::new(host)))
    }

    pub fn symbol(description: impl Into<String>) -> Self {
        Value::Symbol(Symbol::new(description))
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same primitive or the same object.
    #[must_use]
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(Number::NaN), Value::Number(Number::NaN)) => true,
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            _ => self == other,
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any self-describing value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E> {
                Ok(Value::typed_array(TypedArray::Uint8(value.to_vec())))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut properties = PropertyMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    properties.insert(key, value);
                }
                Ok(Value::from(properties))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Integer(value as i64)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::Integer(value as i64))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::from(value as u64)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(Number::from_f64(f64::from(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from_f64(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<PropertyMap> for Value {
    fn from(value: PropertyMap) -> Self {
        Value::from(Object::Plain(PlainObject {
            class: None,
            properties: value,
        }))
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(ObjectRef::new(value))
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
