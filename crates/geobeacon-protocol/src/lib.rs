//! Wire protocol for geobeacon.
//!
//! This crate defines what a live-location broadcast looks like on the wire:
//!
//! - **Types** ([`RoomId`], [`EventId`], [`LiveBeaconAnnouncement`],
//!   [`LocationUpdate`], etc.): the identifiers and event contents sent to a
//!   Matrix homeserver.
//! - **Event builder** ([`build_location_update`], [`geo_uri`]): pure
//!   mapping from a track point to the event that carries it.
//! - **Track** ([`TrackCatalog`], [`TrackPoint`]): the shared, read-only
//!   point sequence decoded from GeoJSON.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how all of the above are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Track (points) → Protocol (event content) → Transport (HTTP) → Homeserver
//! ```

mod codec;
mod error;
mod event;
mod track;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::{
    GEO_URI_UNCERTAINTY_M, build_announcement, build_location_update, geo_uri,
    now_millis,
};
pub use track::{TrackCatalog, TrackPoint};
pub use types::{
    Asset, AssetType, BEACON_EVENT_TYPE, BEACON_INFO_EVENT_TYPE, EventId,
    LiveBeaconAnnouncement, LocationUpdate, LocationUri, RelatesTo,
    RelationType, RoomId, UserId,
};
