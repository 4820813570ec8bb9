//! Error types for canonical serialization.
//!
//! Serialization is pure and deterministic, so every error is final: retrying
//! with the same input and [`Options`](crate::Options) fails the same way. The
//! caller either adjusts the options (for example registers a replacer or a
//! handler that converts the offending kind) or expects the call to fail.
//!
//! ## Error Categories
//!
//! - **Unsupported types**: an object kind with no writer and no fallback protocol
//! - **Handler failures**: a registered extension writer rejected its input
//! - **Bridge errors**: messages raised by `serde` while converting Rust types
//!
//! ## Examples
//!
//! ```rust
//! use canonize::{serialize, Error, Opaque, Value};
//!
//! let promise = Value::host(Opaque::new("Promise"));
//! let err = serialize(&promise).unwrap_err();
//!
//! assert!(matches!(err, Error::UnsupportedType { .. }));
//! assert_eq!(err.to_string(), "Cannot serialize Promise");
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while canonicalizing a value.
///
/// A failed serialization never yields a usable prefix of the output.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The value's kind has no writer and exposes neither a conversion
    /// (`to_json`) nor an iteration (`entries`) protocol.
    #[error("Cannot serialize {tag}")]
    UnsupportedType { tag: String },

    /// A handler registered through [`Options::with_handler`](crate::Options::with_handler) failed.
    #[error("Handler for {tag} failed: {msg}")]
    Handler { tag: String, msg: String },

    /// Raised by a `Serialize` implementation during conversion to a value.
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an unsupported type error naming the offending class tag.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonize::Error;
    ///
    /// let err = Error::unsupported_type("WeakMap");
    /// assert_eq!(err.to_string(), "Cannot serialize WeakMap");
    /// ```
    pub fn unsupported_type(tag: &str) -> Self {
        Error::UnsupportedType {
            tag: tag.to_string(),
        }
    }

    /// Creates a handler error for a failed extension writer.
    pub fn handler<T: fmt::Display>(tag: &str, msg: T) -> Self {
        Error::Handler {
            tag: tag.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonize::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns the class tag carried by an [`Error::UnsupportedType`].
    #[must_use]
    pub fn unsupported_tag(&self) -> Option<&str> {
        match self {
            Error::UnsupportedType { tag } => Some(tag),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
