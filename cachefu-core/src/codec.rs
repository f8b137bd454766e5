//! Value codecs for the disk tier.
//!
//! A [`Codec`] turns a value into the exact bytes stored in its cache file and
//! back. Files carry no header, so the codec alone defines the on-disk format.

use crate::CodecError;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Converts values to bytes and back.
///
/// Decoding must report malformed or truncated input as
/// [`CodecError::Decode`] rather than producing a default value, so the cache
/// can tell a corrupt file apart from a legitimately empty one.
pub trait Codec<V>: Send + Sync {
    /// Encode a value into bytes.
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError>;

    /// Decode a value from bytes previously produced by [`Codec::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError>;
}

/// JSON codec for any serde type.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode {
            reason: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            reason: e.to_string(),
        })
    }
}

/// Identity codec for raw byte values.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }
}

/// Codec built from a pair of closures.
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D> {
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<E, D> fmt::Debug for FnCodec<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCodec")
    }
}

impl<V, E, D> Codec<V> for FnCodec<E, D>
where
    E: Fn(&V) -> Result<Vec<u8>, CodecError> + Send + Sync,
    D: Fn(&[u8]) -> Result<V, CodecError> + Send + Sync,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V, CodecError> {
        (self.decode)(bytes)
    }
}
