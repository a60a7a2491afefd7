//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Request bodies sent to the homeserver, its responses, and the GeoJSON
//! track file all pass through a [`Codec`]. Matrix speaks JSON, so
//! [`JsonCodec`] is the only implementation; the trait keeps the HTTP client
//! and the track loader from calling `serde_json` directly.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside every session's
/// client, and every session runs on its own Tokio task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use geobeacon_protocol::{Codec, EventId, JsonCodec};
///
/// let codec = JsonCodec;
/// let id = EventId::parse("$beacon").unwrap();
///
/// let bytes = codec.encode(&id).unwrap();
/// assert_eq!(bytes, b"\"$beacon\"");
///
/// let decoded: EventId = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, id);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_malformed_returns_decode_error() {
        let result: Result<serde_json::Value, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape_returns_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        struct NeedsField {
            #[allow(dead_code)]
            event_id: String,
        }
        let result: Result<NeedsField, _> = JsonCodec.decode(b"{}");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
