//! Unified error type for geobeacon.

use geobeacon_protocol::ProtocolError;
use geobeacon_session::SessionError;
use geobeacon_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `geobeacon` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum GeobeaconError {
    /// Talking to the homeserver failed (bad URL, HTTP, status).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Bad identifier, malformed event body, or unreadable track.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Roster problem or a session-local failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// [`SimulatorBuilder::build`](crate::SimulatorBuilder::build) was
    /// called without a room.
    #[error("no room configured for the simulation")]
    MissingRoom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: GeobeaconError = TransportError::NotLoggedIn.into();
        assert!(matches!(err, GeobeaconError::Transport(_)));
        assert_eq!(err.to_string(), "client is not logged in");
    }

    #[test]
    fn test_from_protocol_error() {
        let err = geobeacon_protocol::RoomId::parse("no-sigil").unwrap_err();
        let err: GeobeaconError = err.into();
        assert!(matches!(err, GeobeaconError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: GeobeaconError = SessionError::InvalidRoster { line: 2 }.into();
        assert!(matches!(err, GeobeaconError::Session(_)));
        assert!(err.to_string().contains("line 2"));
    }
}
