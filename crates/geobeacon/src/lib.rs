//! # Geobeacon
//!
//! Simulates many Matrix accounts sharing a live location in one room.
//!
//! Every account in the roster logs in, announces a live beacon, and then
//! walks the same GPS track starting from its own offset, one location
//! update per second. Once it reaches the end of the track it stays online,
//! syncing, until the simulation is shut down.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geobeacon::prelude::*;
//!
//! # async fn run() -> Result<(), GeobeaconError> {
//! let catalog = TrackCatalog::load("points.geojson")?;
//! let roster = Roster::load("accounts.txt")?;
//!
//! let handle = Simulator::builder()
//!     .room(RoomId::parse("!abc:example.org")?)
//!     .build(HttpHomeserver::new("https://matrix.example.org")?, catalog, roster)?
//!     .spawn();
//!
//! tokio::signal::ctrl_c().await.ok();
//! handle.shutdown();
//! let report = handle.wait().await;
//! println!("{} updates delivered", report.total_sent());
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod simulator;

pub use engine::{EngineSettings, SessionEngine, SessionReport};
pub use error::GeobeaconError;
pub use simulator::{SimulationHandle, SimulationReport, Simulator, SimulatorBuilder};

pub mod prelude {
    //! Everything needed to configure and run a simulation.

    pub use crate::{
        EngineSettings, GeobeaconError, SessionEngine, SessionReport, SimulationHandle,
        SimulationReport, Simulator, SimulatorBuilder,
    };
    pub use geobeacon_protocol::{
        BEACON_EVENT_TYPE, BEACON_INFO_EVENT_TYPE, EventId, LiveBeaconAnnouncement,
        LocationUpdate, RoomId, TrackCatalog, TrackPoint, UserId,
    };
    pub use geobeacon_session::{
        AccountCredential, FailureKind, Roster, SessionConfig, SessionError, SessionId,
        SessionRegistry, SessionSnapshot, SessionState,
    };
    pub use geobeacon_tick::{PlaybackConfig, PlaybackMetrics};
    pub use geobeacon_transport::{
        Homeserver, HttpConfig, HttpHomeserver, MatrixClient, TransportError,
    };
}
