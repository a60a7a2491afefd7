//! Paced beacon playback for geobeacon.
//!
//! A [`BeaconPlayback`] walks one session's slice of the shared track and
//! hands out one [`LocationUpdate`] at a time, sleeping a fixed interval
//! between them. It is finite (it ends at the last catalog point) and it
//! can't be rewound.
//!
//! # Offsets
//!
//! Every session starts at a different point of the same track so that the
//! simulated accounts aren't all standing on top of each other. The account
//! at roster index `i` starts at `i * offset_stride` (25 by default).
//!
//! # Integration
//!
//! The playback sits inside a session's streaming loop:
//!
//! ```ignore
//! while let Some(tick) = playback.next_update().await {
//!     let delivered = client.send_message_event(&room, BEACON_EVENT_TYPE, &tick.update).await.is_ok();
//!     playback.record_delivery(delivered);
//! }
//! ```

use std::time::Duration;

use geobeacon_protocol::{EventId, LocationUpdate, TrackCatalog, build_location_update, now_millis};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pacing and offset settings shared by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Pause between one update's delivery and the next update.
    /// Default: 1 second.
    pub interval: Duration,
    /// How many track points apart consecutive roster accounts start.
    /// Default: 25.
    pub offset_stride: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            offset_stride: 25,
        }
    }
}

impl PlaybackConfig {
    /// Starting catalog index for the account at `account_index`.
    pub fn offset_for(&self, account_index: usize) -> usize {
        account_index.saturating_mul(self.offset_stride)
    }
}

// ---------------------------------------------------------------------------
// Tick (returned to caller per update)
// ---------------------------------------------------------------------------

/// One update ready to send, returned by [`BeaconPlayback::next_update`].
#[derive(Debug, Clone)]
pub struct PlaybackTick {
    /// Index of the point in the track catalog.
    pub index: usize,
    /// Position within this session's playback (starts at 0).
    pub sequence: u64,
    pub update: LocationUpdate,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Delivery counters for one playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackMetrics {
    /// Updates handed out by `next_update`.
    pub emitted: u64,
    /// Updates the caller reported as accepted by the homeserver.
    pub delivered: u64,
    /// Updates the caller reported as not delivered.
    pub failed: u64,
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Lazy, paced sequence of location updates for one session.
pub struct BeaconPlayback {
    catalog: TrackCatalog,
    beacon: EventId,
    config: PlaybackConfig,
    offset: usize,
    /// Catalog index of the next point to emit.
    cursor: usize,
    /// When the next update may be emitted. `None` before the first one,
    /// which goes out immediately.
    next_due: Option<Instant>,
    metrics: PlaybackMetrics,
}

impl BeaconPlayback {
    /// Creates a playback over `catalog[offset..]` whose updates all
    /// reference `beacon`.
    ///
    /// An `offset` at or past the end of the catalog yields nothing.
    pub fn new(
        catalog: TrackCatalog,
        offset: usize,
        beacon: EventId,
        config: PlaybackConfig,
    ) -> Self {
        if offset >= catalog.len() {
            debug!(
                offset,
                points = catalog.len(),
                "playback offset past end of track, nothing to stream"
            );
        } else {
            debug!(
                offset,
                points = catalog.len() - offset,
                interval_ms = config.interval.as_millis() as u64,
                "beacon playback created"
            );
        }

        Self {
            catalog,
            beacon,
            config,
            offset,
            cursor: offset,
            next_due: None,
            metrics: PlaybackMetrics::default(),
        }
    }

    /// Waits until the next update is due and returns it, or `None` once
    /// the slice is exhausted.
    ///
    /// The first call returns immediately. Later calls wait until
    /// `interval` has passed since the previous update was delivered (or
    /// emitted, if the caller never reported a delivery). There is no wait
    /// after the last update.
    pub async fn next_update(&mut self) -> Option<PlaybackTick> {
        let point = *self.catalog.get(self.cursor)?;

        if let Some(due) = self.next_due {
            time::sleep_until(due).await;
        }

        let index = self.cursor;
        let sequence = self.metrics.emitted;
        self.cursor += 1;
        self.metrics.emitted += 1;
        self.next_due = Some(Instant::now() + self.config.interval);

        trace!(index, sequence, "location update due");

        Some(PlaybackTick {
            index,
            sequence,
            update: build_location_update(&point, &self.beacon, now_millis()),
        })
    }

    /// Records whether the last emitted update reached the homeserver and
    /// restarts the pause from now.
    pub fn record_delivery(&mut self, delivered: bool) {
        if delivered {
            self.metrics.delivered += 1;
        } else {
            self.metrics.failed += 1;
        }
        let reported = self.metrics.delivered + self.metrics.failed;
        if reported > self.metrics.emitted {
            warn!(
                reported,
                emitted = self.metrics.emitted,
                "more deliveries recorded than updates emitted"
            );
        }
        if !self.is_exhausted() {
            self.next_due = Some(Instant::now() + self.config.interval);
        }
    }

    /// Points not yet emitted.
    pub fn remaining(&self) -> usize {
        self.catalog.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// The catalog index this playback started at.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The beacon every update references.
    pub fn beacon(&self) -> &EventId {
        &self.beacon
    }

    pub fn metrics(&self) -> &PlaybackMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
}
