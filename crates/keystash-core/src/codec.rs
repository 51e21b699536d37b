//! Value encoding
//!
//! A [`Codec`] turns a value into the string a medium persists and back.
//! Decoding is the only place a read can fail, and the format's own
//! validity check is what detects the failure.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Persisted text could not be decoded as the requested type
#[derive(Error, Debug)]
#[error("Failed to decode stored value: {0}")]
pub struct DecodeError(#[source] pub serde_json::Error);

/// A value could not be encoded
///
/// Serde can reject some values (e.g. maps with non-string keys) even if
/// they implement `Serialize`.
#[derive(Error, Debug)]
#[error("Failed to encode value: {0}")]
pub struct EncodeError(#[source] pub serde_json::Error);

/// Serialization boundary between logical values and persisted text
pub trait Codec {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<String, EncodeError>;

    fn decode<V: DeserializeOwned>(&self, text: &str) -> Result<V, DecodeError>;
}

/// Compact JSON, with no envelope or type tag
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<String, EncodeError> {
        serde_json::to_string(value).map_err(EncodeError)
    }

    fn decode<V: DeserializeOwned>(&self, text: &str) -> Result<V, DecodeError> {
        serde_json::from_str(text).map_err(DecodeError)
    }
}
