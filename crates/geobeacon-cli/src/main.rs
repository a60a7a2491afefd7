//! `geobeacon` command-line runner.
//!
//! Loads the roster and track, spawns one session per account against the
//! configured homeserver, and runs until Ctrl-C (or until every session
//! has failed).
//!
//! ```text
//! geobeacon --room '!abc:matrix.org' --accounts accounts.txt --track points.geojson
//! ```
//!
//! Set `RUST_LOG` to change verbosity, e.g. `RUST_LOG=geobeacon=debug`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use geobeacon::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geobeacon", version, about = "Broadcast live-location beacons from many Matrix accounts")]
struct Cli {
    /// Homeserver base URL.
    #[arg(long, default_value = "https://matrix.org")]
    homeserver: String,

    /// Room id every account broadcasts into, e.g. `!abc:matrix.org`.
    #[arg(long)]
    room: String,

    /// Roster file: one `identity password` pair per line.
    #[arg(long, default_value = "./accounts.txt")]
    accounts: PathBuf,

    /// GeoJSON FeatureCollection of Point features.
    #[arg(long, default_value = "./points.geojson")]
    track: PathBuf,

    /// Pause between consecutive location updates of one account.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Track points between consecutive accounts' starting positions.
    #[arg(long, default_value_t = 25)]
    offset_stride: usize,

    /// Beacon description shown to other room members.
    #[arg(long, default_value = "Live location")]
    description: String,

    /// Advertised beacon lifetime.
    #[arg(long, default_value_t = 9000)]
    beacon_timeout_secs: u64,

    /// How long the homeserver may hold each sync request.
    #[arg(long, default_value_t = 30)]
    sync_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let room = RoomId::parse(cli.room.as_str())?;
    let catalog = TrackCatalog::load(&cli.track)?;
    let roster = Roster::load(&cli.accounts)?;
    let homeserver = HttpHomeserver::with_config(
        &cli.homeserver,
        HttpConfig {
            sync_timeout: Duration::from_secs(cli.sync_timeout_secs),
            ..HttpConfig::default()
        },
    )?;

    let handle = Simulator::builder()
        .room(room)
        .session_config(SessionConfig {
            description: cli.description,
            beacon_timeout: Duration::from_secs(cli.beacon_timeout_secs),
        })
        .playback(PlaybackConfig {
            interval: Duration::from_millis(cli.interval_ms),
            offset_stride: cli.offset_stride,
        })
        .build(homeserver, catalog, roster)?
        .spawn();

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "can't listen for ctrl-c, sessions run until killed");
            return;
        }
        tracing::info!("interrupt received, stopping sessions");
        cancel.cancel();
    });

    let report = handle.wait().await;

    for session in &report.sessions {
        match &session.error {
            Some(e) => tracing::warn!(
                session = %session.id,
                identity = %session.identity,
                state = %session.state,
                error = %e,
                "session summary"
            ),
            None => tracing::info!(
                session = %session.id,
                identity = %session.identity,
                state = %session.state,
                sent = session.sent(),
                failed = session.failed(),
                "session summary"
            ),
        }
    }
    tracing::info!(
        sessions = report.sessions.len(),
        sent = report.total_sent(),
        failed = report.total_failed(),
        "done"
    );
    Ok(())
}
