//! Digests over canonical strings.
//!
//! [`hash`] fingerprints a value: the first ten characters of the base64url
//! SHA-256 digest of its canonical form. [`murmur_hash`] is a fast,
//! non-cryptographic alternative for hash tables and bucketing.

use crate::{serialize_with_options, Options, Result, Value};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Number of characters kept by [`hash`].
pub const HASH_LENGTH: usize = 10;

/// SHA-256 digest of the UTF-8 bytes of `input`.
#[must_use]
pub fn sha256(input: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// SHA-256 digest of `input`, base64url encoded without padding.
///
/// # Examples
///
/// ```rust
/// use canonize::sha256_base64;
///
/// assert_eq!(sha256_base64(""), "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU");
/// ```
#[must_use]
pub fn sha256_base64(input: &str) -> String {
    URL_SAFE_NO_PAD.encode(sha256(input))
}

/// Short fingerprint of a value's canonical form.
///
/// Values that serialize identically hash identically; strings are hashed
/// through their serialized form like every other value.
///
/// That makes string digests incompatible with the JavaScript `ohash`
/// package, whose `hash("x")` digests the raw string `x`. Fingerprints of
/// string roots stored by `ohash` do not match; compare them with
/// `sha256_base64(s)[..HASH_LENGTH]` instead. Non-string roots are unaffected.
///
/// # Examples
///
/// ```rust
/// use canonize::{hash, Value};
///
/// let a = Value::object([("x", Value::from(1)), ("y", Value::from(2))]);
/// let b = Value::object([("y", Value::from(2)), ("x", Value::from(1))]);
///
/// assert_eq!(hash(&a).unwrap(), hash(&b).unwrap());
/// assert_eq!(hash(&a).unwrap().len(), 10);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn hash(value: &Value) -> Result<String> {
    hash_with_options(value, &Options::default())
}

/// [`hash`] with custom serialization options.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn hash_with_options(value: &Value, options: &Options) -> Result<String> {
    let serialized = serialize_with_options(value, options)?;
    let mut digest = sha256_base64(&serialized);
    digest.truncate(HASH_LENGTH);
    Ok(digest)
}

/// MurmurHash3, x86 32-bit variant.
///
/// # Examples
///
/// ```rust
/// use canonize::murmur_hash;
///
/// assert_eq!(murmur_hash(b"", 0), 0);
/// assert_eq!(murmur_hash(b"Hello, world!", 0x9747_b28c), 0x2488_4cba);
/// ```
#[must_use]
pub fn murmur_hash(key: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    #[inline]
    fn scramble(k: u32) -> u32 {
        k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
    }

    let mut h = seed;
    let mut blocks = key.chunks_exact(4);
    for block in blocks.by_ref() {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= scramble(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let k = tail
            .iter()
            .rev()
            .fold(0u32, |k, byte| (k << 8) | u32::from(*byte));
        h ^= scramble(k);
    }

    // Length is mixed in modulo 2^32
    h ^= key.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
