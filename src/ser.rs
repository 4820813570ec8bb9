//! Canonical serialization.
//!
//! This module provides the [`Serializer`] that turns a [`Value`] graph into
//! its canonical string, and the [`ValueSerializer`] that converts Rust data
//! structures implementing `Serialize` into a [`Value`] first.
//!
//! ## Overview
//!
//! The serializer walks the graph depth first and makes three guarantees:
//!
//! - **Canonical order**: object keys, `Set` elements and `Map` entries are
//!   sorted, so insertion order never shows in the output
//! - **Cycle safety**: an object reached again while it is still being written
//!   becomes a back-reference `#<n>`
//! - **Aliasing is invisible**: an object reached again after it was written
//!   repeats its text, so shared and copied subgraphs serialize the same
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use canonize::{serialize, Value};
//!
//! let a = Value::set(vec![Value::from(2), Value::from(1)]);
//! let b = Value::set(vec![Value::from(1), Value::from(2)]);
//! assert_eq!(serialize(&a).unwrap(), serialize(&b).unwrap());
//! ```
//!
//! ## Direct Serializer Usage
//!
//! Several values written by one serializer share one reference table, so
//! markers keep counting across them:
//!
//! ```rust
//! use canonize::{Options, Serializer, Value};
//!
//! let node = Value::empty_object();
//! node.as_object().unwrap().set("next", node.clone());
//!
//! let options = Options::new();
//! let mut serializer = Serializer::new(&options);
//! serializer.serialize(&node).unwrap();
//! serializer.serialize(&node).unwrap();
//!
//! assert_eq!(serializer.into_inner(), "{next:#0}{next:#0}");
//! ```

use crate::object::{collapse_line_breaks, Function, HostObject, Object, PlainObject};
use crate::order::{self, SortKey};
use crate::refs::{RefScope, Visit};
use crate::{Error, ObjectRef, Options, PropertyMap, Result, TypedArray, Value};
use chrono::SecondsFormat;
use serde::{ser, Serialize};
use std::borrow::Cow;
use std::fmt::Write;

/// The canonical serializer.
///
/// Writes any number of values into one output buffer, sharing a single
/// reference table between them. Created via [`Serializer::new`].
pub struct Serializer<'a> {
    scope: RefScope<'a>,
    options: &'a Options,
}

impl<'a> Serializer<'a> {
    pub fn new(options: &'a Options) -> Self {
        Serializer {
            scope: RefScope::root(),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.scope.into_output()
    }

    /// Appends the canonical form of `value` to the output.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedType`] when the graph contains an object
    /// kind with no writer, and with [`Error::Handler`] when a registered
    /// handler fails. The output is unspecified after an error.
    pub fn serialize(&mut self, value: &Value) -> Result<()> {
        let value = self.replace(value);
        self.write_value(&value)
    }

    /// A serializer over a throwaway child scope.
    fn child(&self) -> Serializer<'_> {
        Serializer {
            scope: self.scope.child(),
            options: self.options,
        }
    }

    fn replace<'v>(&self, value: &'v Value) -> Cow<'v, Value> {
        match &self.options.replacer {
            Some(replacer) => Cow::Owned(replacer(value)),
            None => Cow::Borrowed(value),
        }
    }

    /// Writes a value that has already been through the replacer.
    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Undefined => self.scope.write("undefined"),
            Value::Null => self.scope.write("null"),
            Value::Bool(b) => self.scope.write(if *b { "true" } else { "false" }),
            Value::Number(n) => write!(self.scope.output_mut(), "{}", n).map_err(Error::custom)?,
            Value::BigInt(n) => {
                write!(self.scope.output_mut(), "{}n", n).map_err(Error::custom)?
            }
            Value::String(s) => self.write_string(s),
            Value::Symbol(symbol) => {
                write!(self.scope.output_mut(), "{}", symbol).map_err(Error::custom)?
            }
            Value::Object(object) => self.write_object(object)?,
        }
        Ok(())
    }

    #[inline]
    fn write_string(&mut self, s: &str) {
        self.scope.write_char('\'');
        self.scope.write(s);
        self.scope.write_char('\'');
    }

    fn write_object(&mut self, object: &ObjectRef) -> Result<()> {
        match self.scope.enter(object) {
            Visit::Cycle(marker) => {
                tracing::trace!(marker, tag = %object.tag(), "writing back-reference");
                write!(self.scope.output_mut(), "#{}", marker).map_err(Error::custom)
            }
            Visit::Repeat(text) => {
                self.scope.write(&text);
                Ok(())
            }
            Visit::Entered => {
                let start = self.scope.position();
                self.write_contents(object)?;
                self.scope.complete(object, start);
                Ok(())
            }
        }
    }

    fn write_contents(&mut self, object: &ObjectRef) -> Result<()> {
        let borrowed = object.borrow();
        match &*borrowed {
            Object::Plain(plain) => self.write_plain(plain),
            Object::Array(items) => self.write_sequence(items, self.options.unordered_arrays),
            Object::Function(function) => self.write_function(function),
            Object::Date(Some(date)) => {
                let iso = date.to_rfc3339_opts(SecondsFormat::Millis, true);
                write!(self.scope.output_mut(), "Date({})", iso).map_err(Error::custom)
            }
            Object::Date(None) => {
                self.scope.write("Date(null)");
                Ok(())
            }
            Object::RegExp(regexp) => {
                write!(self.scope.output_mut(), "RegExp({})", regexp).map_err(Error::custom)
            }
            Object::Url(url) => {
                write!(self.scope.output_mut(), "URL({})", url.as_str()).map_err(Error::custom)
            }
            Object::Error(error) => {
                write!(self.scope.output_mut(), "Error({})", error).map_err(Error::custom)
            }
            Object::Map(entries) => self.write_entries("Map", entries),
            Object::Set(items) => {
                self.scope.write("Set");
                self.write_sequence(items, self.options.unordered_sets)
            }
            Object::ArrayBuffer(bytes) => {
                self.scope.write("ArrayBuffer[");
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        self.scope.write_char(',');
                    }
                    write!(self.scope.output_mut(), "{}", byte).map_err(Error::custom)?;
                }
                self.scope.write_char(']');
                Ok(())
            }
            Object::TypedArray(array) => {
                self.scope.write(array.tag());
                self.write_typed_elements(array)
            }
            Object::Host(host) => self.write_host(host.as_ref()),
        }
    }

    fn write_plain(&mut self, plain: &PlainObject) -> Result<()> {
        self.scope.write(plain.display_class());
        self.write_properties(&plain.properties)
    }

    fn write_properties(&mut self, properties: &PropertyMap) -> Result<()> {
        let mut properties: Vec<(&String, &Value)> = properties
            .iter()
            .filter(|(key, _)| !self.options.is_key_excluded(key))
            .collect();
        if self.options.unordered_objects {
            order::sort_properties(&mut properties);
        }

        self.scope.write_char('{');
        for (i, (key, value)) in properties.into_iter().enumerate() {
            if i > 0 {
                self.scope.write_char(',');
            }
            self.scope.write(key);
            if !self.options.exclude_values {
                self.scope.write_char(':');
                self.serialize(value)?;
            }
        }
        self.scope.write_char('}');
        Ok(())
    }

    fn write_sequence(&mut self, items: &[Value], unordered: bool) -> Result<()> {
        let mut items: Vec<Cow<'_, Value>> = items.iter().map(|item| self.replace(item)).collect();
        if unordered && items.len() > 1 {
            let keyed = items
                .into_iter()
                .map(|item| Ok((self.sort_key(&item)?, item)))
                .collect::<Result<Vec<_>>>()?;
            items = order::sort_by_keys(keyed);
        }

        self.scope.write_char('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.scope.write_char(',');
            }
            self.write_value(item)?;
        }
        self.scope.write_char(']');
        Ok(())
    }

    /// Writes `<tag>{k:v,...}`: string keys bare, any other key serialized.
    fn write_entries(&mut self, tag: &str, entries: &[(Value, Value)]) -> Result<()> {
        let mut entries: Vec<(Cow<'_, Value>, &Value)> = entries
            .iter()
            .map(|(key, value)| (self.replace(key), value))
            .collect();
        if self.options.unordered_sets && entries.len() > 1 {
            let keyed = entries
                .into_iter()
                .map(|entry| Ok((self.sort_key(&entry.0)?, entry)))
                .collect::<Result<Vec<_>>>()?;
            entries = order::sort_by_keys(keyed);
        }

        self.scope.write(tag);
        self.scope.write_char('{');
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                self.scope.write_char(',');
            }
            match key.as_ref() {
                Value::String(s) => self.scope.write(s),
                other => self.write_value(other)?,
            }
            self.scope.write_char(':');
            self.serialize(value)?;
        }
        self.scope.write_char('}');
        Ok(())
    }

    fn write_typed_elements(&mut self, array: &TypedArray) -> Result<()> {
        self.scope.write_char('[');
        array
            .write_elements(self.scope.output_mut())
            .map_err(Error::custom)?;
        self.scope.write_char(']');
        Ok(())
    }

    fn write_function(&mut self, function: &Function) -> Result<()> {
        if self.options.respect_function_names {
            self.scope.write(&function.name);
        }
        match &function.source {
            None => self.scope.write("()[native]"),
            Some(source) => {
                write!(self.scope.output_mut(), "({})", function.arity).map_err(Error::custom)?;
                self.scope.write(&collapse_line_breaks(source));
            }
        }
        if self.options.respect_function_properties {
            self.write_properties(&function.properties)?;
        }
        Ok(())
    }

    /// Host objects: registered handler, then `to_json`, then `entries`.
    fn write_host(&mut self, host: &dyn HostObject) -> Result<()> {
        let tag = host.tag();
        let options = self.options;

        if let Some(handler) = options.handlers.get(tag) {
            tracing::debug!(tag, "using registered handler");
            let converted = handler(host).map_err(|err| match err {
                Error::Handler { .. } => err,
                other => Error::handler(tag, other),
            })?;
            return self.write_converted(tag, &converted);
        }

        if let Some(converted) = host.to_json() {
            let class = match host.class_name() {
                "Object" => "",
                class => class,
            };
            return self.write_converted(class, &converted);
        }

        if let Some(entries) = host.entries() {
            return self.write_entries(tag, &entries);
        }

        if options.ignore_unknown {
            tracing::debug!(tag, "no writer for object kind, writing bare tag");
            self.scope.write(tag);
            return Ok(());
        }

        tracing::debug!(tag, "no writer for object kind");
        Err(Error::unsupported_type(tag))
    }

    /// Writes `prefix` followed by a substitute value; primitives go in parentheses.
    fn write_converted(&mut self, prefix: &str, value: &Value) -> Result<()> {
        self.scope.write(prefix);
        let value = self.replace(value);
        if value.is_object() {
            self.write_value(&value)
        } else {
            self.scope.write_char('(');
            self.write_value(&value)?;
            self.scope.write_char(')');
            Ok(())
        }
    }

    /// Ordering key of an element that has already been through the replacer.
    fn sort_key(&self, value: &Value) -> Result<SortKey> {
        Ok(match value {
            Value::Number(n) => SortKey::Number(n.as_f64(), n.to_string()),
            Value::String(s) => SortKey::String(s.clone()),
            Value::Object(object) => match self.scope.open_marker(object.id()) {
                Some(marker) => SortKey::Marker(marker),
                None => {
                    let mut child = self.child();
                    child.write_value(value)?;
                    SortKey::Text(child.into_inner())
                }
            },
            other => {
                let mut child = self.child();
                child.write_value(other)?;
                SortKey::Text(child.into_inner())
            }
        })
    }
}

/// Converts Rust data structures into a [`Value`].
///
/// Structs become plain objects carrying the struct name as their class,
/// maps with string keys become plain objects and other maps become `Map`s.
/// Byte buffers become `Uint8Array`s and integers beyond the `i64` range
/// become bigints.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    vec: Vec<Value>,
}

pub struct SerializeMap {
    entries: Vec<(Value, Value)>,
    current_key: Option<Value>,
}

pub struct SerializeStruct {
    class: &'static str,
    properties: PropertyMap,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStruct;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::typed_array(TypedArray::Uint8(v.to_vec())))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(Value::object([(variant, to_value(value)?)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            current_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeStruct> {
        Ok(SerializeStruct::new(name, len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStruct> {
        Ok(SerializeStruct::new(variant, len))
    }
}

impl SerializeVec {
    fn with_capacity(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeStruct {
    fn new(class: &'static str, len: usize) -> Self {
        SerializeStruct {
            class,
            properties: PropertyMap::with_capacity(len),
        }
    }

    fn finish(self) -> Value {
        Value::from(Object::Plain(PlainObject {
            class: Some(self.class.to_string()),
            properties: self.properties,
        }))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::object([(self.variant, Value::array(self.vec))]))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.entries.push((key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        if !self.entries.iter().all(|(key, _)| matches!(key, Value::String(_))) {
            return Ok(Value::map(self.entries));
        }
        let properties: PropertyMap = self
            .entries
            .into_iter()
            .filter_map(|(key, value)| match key {
                Value::String(key) => Some((key, value)),
                _ => None,
            })
            .collect();
        Ok(Value::from(properties))
    }
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.properties.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.properties.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}
