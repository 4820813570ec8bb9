//! Configuration options for canonical serialization.
//!
//! [`Options`] controls which parts of a value contribute to the output and
//! which containers are put in canonical order before they are written.
//!
//! ## Examples
//!
//! ```rust
//! use canonize::{serialize_with_options, Options, Value};
//!
//! let value = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
//!
//! // Leave `b` out entirely
//! let options = Options::new().with_exclude_keys(|key| key == "b");
//! assert_eq!(serialize_with_options(&value, &options).unwrap(), "{a:1}");
//!
//! // Keys only
//! let options = Options::new().with_exclude_values(true);
//! assert_eq!(serialize_with_options(&value, &options).unwrap(), "{a,b}");
//! ```

use crate::{HostObject, Result, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether an object key is left out.
pub type KeyFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Substitutes a value before it is classified.
pub type Replacer = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Converts a host object into a value serialized in its place.
pub type Handler = Arc<dyn Fn(&dyn HostObject) -> Result<Value> + Send + Sync>;

/// Configuration options for canonical serialization.
///
/// Defaults: object keys and Set/Map entries are sorted, arrays keep their
/// positions, function names are included and function properties are not.
///
/// # Examples
///
/// ```rust
/// use canonize::Options;
///
/// let options = Options::new();
/// assert!(options.unordered_objects);
/// assert!(options.unordered_sets);
/// assert!(!options.unordered_arrays);
///
/// let options = Options::new()
///     .with_unordered_arrays(true)
///     .with_respect_function_names(false);
/// assert!(options.unordered_arrays);
/// ```
#[derive(Clone)]
pub struct Options {
    pub exclude_keys: Option<KeyFilter>,
    /// Write object keys only, never their values.
    pub exclude_values: bool,
    /// Write the bare tag for unsupported kinds instead of failing.
    pub ignore_unknown: bool,
    pub replacer: Option<Replacer>,
    /// Extension writers for host objects, keyed by class tag.
    pub handlers: IndexMap<String, Handler>,
    pub respect_function_names: bool,
    pub respect_function_properties: bool,
    pub unordered_arrays: bool,
    /// Applies to `Set` elements, `Map` entries and host `entries()`.
    pub unordered_sets: bool,
    pub unordered_objects: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            exclude_keys: None,
            exclude_values: false,
            ignore_unknown: false,
            replacer: None,
            handlers: IndexMap::new(),
            respect_function_names: true,
            respect_function_properties: false,
            unordered_arrays: false,
            unordered_sets: true,
            unordered_objects: true,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("exclude_keys", &self.exclude_keys.is_some())
            .field("exclude_values", &self.exclude_values)
            .field("ignore_unknown", &self.ignore_unknown)
            .field("replacer", &self.replacer.is_some())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("respect_function_names", &self.respect_function_names)
            .field(
                "respect_function_properties",
                &self.respect_function_properties,
            )
            .field("unordered_arrays", &self.unordered_arrays)
            .field("unordered_sets", &self.unordered_sets)
            .field("unordered_objects", &self.unordered_objects)
            .finish()
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips object keys for which `filter` returns `true`, key and value alike.
    #[must_use]
    pub fn with_exclude_keys<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.exclude_keys = Some(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn with_exclude_values(mut self, exclude_values: bool) -> Self {
        self.exclude_values = exclude_values;
        self
    }

    #[must_use]
    pub fn with_ignore_unknown(mut self, ignore_unknown: bool) -> Self {
        self.ignore_unknown = ignore_unknown;
        self
    }

    /// Substitutes every value (the root included) before it is classified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonize::{serialize_with_options, Options, Value};
    ///
    /// let options = Options::new().with_replacer(|value| match value.as_str() {
    ///     Some(s) => Value::from(s.to_uppercase()),
    ///     None => value.clone(),
    /// });
    /// let value = Value::array(vec![Value::from("a"), Value::from(1)]);
    /// assert_eq!(serialize_with_options(&value, &options).unwrap(), "['A',1]");
    /// ```
    #[must_use]
    pub fn with_replacer<F>(mut self, replacer: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.replacer = Some(Arc::new(replacer));
        self
    }

    /// Registers an extension writer for host objects tagged `tag`.
    ///
    /// The handler is consulted before the host's own protocols; its result is
    /// written after the tag.
    #[must_use]
    pub fn with_handler<F>(mut self, tag: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&dyn HostObject) -> Result<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(tag.into(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_respect_function_names(mut self, respect: bool) -> Self {
        self.respect_function_names = respect;
        self
    }

    #[must_use]
    pub fn with_respect_function_properties(mut self, respect: bool) -> Self {
        self.respect_function_properties = respect;
        self
    }

    #[must_use]
    pub fn with_unordered_arrays(mut self, unordered: bool) -> Self {
        self.unordered_arrays = unordered;
        self
    }

    #[must_use]
    pub fn with_unordered_sets(mut self, unordered: bool) -> Self {
        self.unordered_sets = unordered;
        self
    }

    #[must_use]
    pub fn with_unordered_objects(mut self, unordered: bool) -> Self {
        self.unordered_objects = unordered;
        self
    }

    #[inline]
    pub(crate) fn is_key_excluded(&self, key: &str) -> bool {
        self.exclude_keys.as_ref().is_some_and(|filter| filter(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.respect_function_names);
        assert!(!options.respect_function_properties);
        assert!(!options.exclude_values);
        assert!(!options.ignore_unknown);
        assert!(!options.is_key_excluded("anything"));
    }

    #[test]
    fn test_key_filter() {
        let options = Options::new().with_exclude_keys(|key| key.starts_with('_'));
        assert!(options.is_key_excluded("_private"));
        assert!(!options.is_key_excluded("public"));
    }

    #[test]
    fn test_debug_lists_handlers() {
        let options = Options::new().with_handler("Decimal", |_| Ok(Value::Null));
        let debug = format!("{:?}", options);
        assert!(debug.contains("Decimal"));
    }
}
