//! Event builder: turns track points into Matrix event contents.
//!
//! Everything here is pure. The caller supplies the timestamp, so the same
//! inputs always produce the same event.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{
    Asset, EventId, LiveBeaconAnnouncement, LocationUpdate, LocationUri,
    RelatesTo, RelationType, TrackPoint,
};

/// Uncertainty radius, in metres, appended to every geo URI.
pub const GEO_URI_UNCERTAINTY_M: u32 = 10;

/// Formats a point as an RFC 5870 geo URI: latitude first, six decimals.
///
/// ```rust
/// use geobeacon_protocol::{geo_uri, TrackPoint};
///
/// let point = TrackPoint::new(53.654321, 10.123456);
/// assert_eq!(geo_uri(&point), "geo:53.654321,10.123456;u=10");
/// ```
pub fn geo_uri(point: &TrackPoint) -> String {
    format!(
        "geo:{:.6},{:.6};u={}",
        point.latitude, point.longitude, GEO_URI_UNCERTAINTY_M
    )
}

/// Builds the location update for one point of a beacon's track.
pub fn build_location_update(
    point: &TrackPoint,
    beacon: &EventId,
    timestamp: u64,
) -> LocationUpdate {
    LocationUpdate {
        relates_to: RelatesTo {
            event_id: beacon.clone(),
            rel_type: RelationType::Reference,
        },
        location: LocationUri {
            uri: geo_uri(point),
        },
        timestamp,
    }
}

/// Builds the one-per-session beacon announcement.
pub fn build_announcement(
    description: &str,
    timeout: Duration,
    timestamp: u64,
) -> LiveBeaconAnnouncement {
    LiveBeaconAnnouncement {
        description: description.to_owned(),
        live: true,
        asset: Asset::default(),
        timestamp,
        timeout: timeout.as_millis().try_into().unwrap_or(u64::MAX),
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().try_into().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beacon() -> EventId {
        EventId::parse("$beacon-a").unwrap()
    }

    #[test]
    fn test_geo_uri_latitude_first_six_decimals() {
        let point = TrackPoint {
            latitude: 53.654321,
            longitude: 10.123456,
        };
        assert_eq!(geo_uri(&point), "geo:53.654321,10.123456;u=10");
    }

    #[test]
    fn test_geo_uri_pads_and_rounds_to_six_decimals() {
        assert_eq!(
            geo_uri(&TrackPoint::new(1.5, -2.0)),
            "geo:1.500000,-2.000000;u=10"
        );
        assert_eq!(
            geo_uri(&TrackPoint::new(0.12345678, 0.0)),
            "geo:0.123457,0.000000;u=10"
        );
    }

    #[test]
    fn test_build_location_update_references_beacon() {
        let update =
            build_location_update(&TrackPoint::new(53.654321, 10.123456), &beacon(), 7);

        assert_eq!(update.beacon_event_id(), &beacon());
        assert_eq!(update.relates_to.rel_type, RelationType::Reference);
        assert_eq!(update.uri(), "geo:53.654321,10.123456;u=10");
        assert_eq!(update.timestamp, 7);
    }

    #[test]
    fn test_build_announcement_is_live_with_timeout_millis() {
        let content = build_announcement(
            "Live location",
            Duration::from_secs(2 * 3600 + 30 * 60),
            1_000,
        );

        assert!(content.live);
        assert_eq!(content.description, "Live location");
        assert_eq!(content.timeout, 9_000_000);
        assert_eq!(content.timestamp, 1_000);
        assert_eq!(content.asset, Asset::default());
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
