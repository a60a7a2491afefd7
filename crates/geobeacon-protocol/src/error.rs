//! Error types for the protocol layer.
//!
//! Each crate in geobeacon defines its own error enum. When you see a
//! `ProtocolError`, the problem is in how data is shaped (JSON, ids,
//! GeoJSON), not in networking or session sequencing.

use std::path::PathBuf;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// homeserver response that doesn't match the expected shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A Matrix identifier is missing its sigil or server part.
    #[error("invalid {kind}: {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        reason: String,
    },

    /// A track feature is not something we can play back.
    #[error("track feature {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    /// The track file could not be read.
    #[error("failed to read track file {path}: {source}")]
    TrackIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
