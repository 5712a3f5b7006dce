//! Body encoding and decoding.
//!
//! [`Codec`] is the seam between twofold and a serialization format. The
//! executor only ever talks to a codec, so a different wire format can be
//! plugged in without touching the request lifecycle. [`JsonCodec`] is the
//! default.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Content type of encoded request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encodes request bodies and decodes response bodies.
pub trait Codec: Send + Sync + 'static {
    /// Media type set as `Content-Type` on encoded bodies.
    fn content_type(&self) -> ContentType;

    /// Encode a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the value cannot be represented.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes>;

    /// Decode bytes into a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] if the bytes do not match `T`'s structure.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> ContentType {
        ContentType::Json
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        to_json(value)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        from_json(bytes)
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if JSON serialization fails, e.g. a map with
/// non-string keys.
///
/// # Example
///
/// ```
/// use twofold_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Ana".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Ana"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| Error::encoding(e.to_string()))
}

/// Deserialize JSON bytes, reporting the path of the first mismatch.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the bytes are not valid JSON for `T`.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::decoding(e.path().to_string(), e.inner().to_string()))?;
    // Trailing garbage after a valid value is a mismatch too.
    deserializer
        .end()
        .map_err(|e| Error::decoding(".", e.to_string()))?;
    Ok(value)
}
