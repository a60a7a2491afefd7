//! Core protocol types for geobeacon's wire format.
//!
//! This module defines every type that travels "on the wire" to a Matrix
//! homeserver: the identifiers that address rooms, users, and events, and
//! the two event contents that make up a live-location broadcast.
//!
//! ```text
//! beacon_info (state event, once per session)
//!     ▲
//!     │ m.reference
//!     │
//! beacon (message event, once per track point)
//! ```

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// State event type that announces a live-location beacon (MSC3672).
pub const BEACON_INFO_EVENT_TYPE: &str = "org.matrix.msc3672.beacon_info";

/// Message event type that carries one location of a live beacon (MSC3672).
pub const BEACON_EVENT_TYPE: &str = "org.matrix.msc3672.beacon";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Checks the Matrix sigil and, for server-scoped ids, the `:server` part.
fn validate_id(
    kind: &'static str,
    raw: &str,
    sigil: char,
    needs_server: bool,
) -> Result<(), ProtocolError> {
    let Some(rest) = raw.strip_prefix(sigil) else {
        return Err(ProtocolError::InvalidIdentifier {
            kind,
            reason: format!("must start with '{sigil}'"),
        });
    };
    if rest.is_empty() {
        return Err(ProtocolError::InvalidIdentifier {
            kind,
            reason: "empty identifier".into(),
        });
    }
    if needs_server {
        match rest.split_once(':') {
            Some((local, server)) if !local.is_empty() && !server.is_empty() => {}
            _ => {
                return Err(ProtocolError::InvalidIdentifier {
                    kind,
                    reason: "expected '<local>:<server>'".into(),
                });
            }
        }
    }
    Ok(())
}

/// A fully-qualified Matrix user id, e.g. `@gpsbot1:matrix.org`.
///
/// Newtype wrapper so a user id can never be passed where a room id is
/// expected. Serialized as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parses and validates a user id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ProtocolError> {
        let raw = raw.into();
        validate_id("user id", &raw, '@', true)?;
        Ok(Self(raw))
    }

    /// The id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the `:` separator.
    pub fn server_name(&self) -> &str {
        self.0.split_once(':').map(|(_, s)| s).unwrap_or_default()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Matrix room id, e.g. `!YUsODcJXHpRWYkvRPA:matrix.org`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Parses and validates a room id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ProtocolError> {
        let raw = raw.into();
        validate_id("room id", &raw, '!', true)?;
        Ok(Self(raw))
    }

    /// The id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An event id returned by the homeserver, e.g. `$143273582443PhrSn`.
///
/// Room versions 3+ drop the `:server` suffix, so only the sigil is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Parses and validates an event id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ProtocolError> {
        let raw = raw.into();
        validate_id("event id", &raw, '$', false)?;
        Ok(Self(raw))
    }

    /// The id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Shared content pieces
// ---------------------------------------------------------------------------

/// What the beacon is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AssetType {
    /// The sender's own location.
    #[default]
    #[serde(rename = "m.self")]
    SelfLocation,
}

/// `{"type": "m.self"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Asset {
    #[serde(rename = "type")]
    pub kind: AssetType,
}

/// How a location update is tied to its beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RelationType {
    #[default]
    #[serde(rename = "m.reference")]
    Reference,
}

/// The `m.relates_to` block of a location update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatesTo {
    pub event_id: EventId,
    pub rel_type: RelationType,
}

/// The `org.matrix.msc3488.location` block of a location update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationUri {
    pub uri: String,
}

// ---------------------------------------------------------------------------
// Event contents
// ---------------------------------------------------------------------------

/// Content of the `beacon_info` state event: "this account is about to
/// broadcast a live location".
///
/// Sent exactly once per session. `timeout` is informational for clients;
/// nothing in geobeacon enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveBeaconAnnouncement {
    pub description: String,
    pub live: bool,
    #[serde(rename = "org.matrix.msc3488.asset")]
    pub asset: Asset,
    /// Unix milliseconds at which the broadcast started.
    #[serde(rename = "org.matrix.msc3488.ts")]
    pub timestamp: u64,
    /// Milliseconds the beacon claims to stay live.
    pub timeout: u64,
}

/// Content of a `beacon` message event: one point of the live track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationUpdate {
    #[serde(rename = "m.relates_to")]
    pub relates_to: RelatesTo,
    #[serde(rename = "org.matrix.msc3488.location")]
    pub location: LocationUri,
    /// Unix milliseconds at which the point was emitted.
    #[serde(rename = "org.matrix.msc3488.ts")]
    pub timestamp: u64,
}

impl LocationUpdate {
    /// The beacon this update belongs to.
    pub fn beacon_event_id(&self) -> &EventId {
        &self.relates_to.event_id
    }

    /// The `geo:` URI carried by this update.
    pub fn uri(&self) -> &str {
        &self.location.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_parse_valid() {
        let id = UserId::parse("@gpsbot1:matrix.org").unwrap();
        assert_eq!(id.as_str(), "@gpsbot1:matrix.org");
        assert_eq!(id.server_name(), "matrix.org");
        assert_eq!(id.to_string(), "@gpsbot1:matrix.org");
    }

    #[test]
    fn test_user_id_parse_rejects_missing_sigil_or_server() {
        assert!(UserId::parse("gpsbot1:matrix.org").is_err());
        assert!(UserId::parse("@gpsbot1").is_err());
        assert!(UserId::parse("@:matrix.org").is_err());
        assert!(UserId::parse("@").is_err());
    }

    #[test]
    fn test_room_id_parse() {
        assert!(RoomId::parse("!YUsODcJXHpRWYkvRPA:matrix.org").is_ok());
        let err = RoomId::parse("#alias:matrix.org").unwrap_err();
        assert!(err.to_string().contains("room id"));
    }

    #[test]
    fn test_event_id_does_not_require_server() {
        assert!(EventId::parse("$abc123").is_ok());
        assert!(EventId::parse("$abc:example.org").is_ok());
        assert!(EventId::parse("abc").is_err());
        assert!(EventId::parse("$").is_err());
    }

    #[test]
    fn test_announcement_wire_field_names() {
        let content = LiveBeaconAnnouncement {
            description: "Live location".into(),
            live: true,
            asset: Asset::default(),
            timestamp: 1_650_000_000_000,
            timeout: 9_000_000,
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["description"], "Live location");
        assert_eq!(json["live"], true);
        assert_eq!(json["org.matrix.msc3488.asset"]["type"], "m.self");
        assert_eq!(json["org.matrix.msc3488.ts"], 1_650_000_000_000u64);
        assert_eq!(json["timeout"], 9_000_000);
    }

    #[test]
    fn test_location_update_wire_field_names() {
        let content = LocationUpdate {
            relates_to: RelatesTo {
                event_id: EventId::parse("$beacon").unwrap(),
                rel_type: RelationType::Reference,
            },
            location: LocationUri {
                uri: "geo:1.000000,2.000000;u=10".into(),
            },
            timestamp: 42,
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["m.relates_to"]["event_id"], "$beacon");
        assert_eq!(json["m.relates_to"]["rel_type"], "m.reference");
        assert_eq!(
            json["org.matrix.msc3488.location"]["uri"],
            "geo:1.000000,2.000000;u=10"
        );
        assert_eq!(json["org.matrix.msc3488.ts"], 42);
    }
}
