//! Per-account session engine: login, announce, stream, sync.
//!
//! Each roster account gets its own Tokio task running one
//! [`SessionEngine`]. The flow is:
//!   1. Log in with the account's credential → get the full user id
//!   2. Send the live beacon announcement as a state event keyed by that id
//!   3. Stream the account's slice of the track, one update per interval,
//!      best-effort
//!   4. Sync until the simulation is shut down
//!
//! Steps 1, 2 and 4 are fatal to the session when they fail. A failed
//! update in step 3 is logged and playback moves on to the next point.

use std::sync::Arc;

use geobeacon_protocol::{
    BEACON_EVENT_TYPE, BEACON_INFO_EVENT_TYPE, EventId, RoomId, TrackCatalog, UserId,
    build_announcement, now_millis,
};
use geobeacon_session::{
    AccountCredential, SessionConfig, SessionError, SessionId, SessionReporter, SessionState,
};
use geobeacon_tick::{BeaconPlayback, PlaybackConfig, PlaybackMetrics};
use geobeacon_transport::MatrixClient;
use tokio_util::sync::CancellationToken;

/// Everything every session in one simulation has in common.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub room: RoomId,
    pub catalog: TrackCatalog,
    pub session: SessionConfig,
    pub playback: PlaybackConfig,
}

/// How one session ended.
#[derive(Debug)]
pub struct SessionReport {
    pub id: SessionId,
    pub identity: String,
    /// Set once login succeeded.
    pub user_id: Option<UserId>,
    /// Set once the beacon announcement was accepted.
    pub beacon: Option<EventId>,
    /// Updates handed to the homeserver, accepted or not.
    pub metrics: PlaybackMetrics,
    /// The terminal state: `Stopped` or `Failed(_)`.
    pub state: SessionState,
    /// The fatal error, if the session failed.
    pub error: Option<SessionError>,
}

impl SessionReport {
    pub fn sent(&self) -> u64 {
        self.metrics.delivered
    }

    pub fn failed(&self) -> u64 {
        self.metrics.failed
    }
}

/// Drives one account through its session.
pub struct SessionEngine<C: MatrixClient> {
    client: C,
    credential: AccountCredential,
    reporter: SessionReporter,
    settings: Arc<EngineSettings>,
    offset: usize,
    user_id: Option<UserId>,
    beacon: Option<EventId>,
    metrics: PlaybackMetrics,
}

impl<C: MatrixClient> SessionEngine<C> {
    /// Creates an engine for the account the reporter was registered for.
    ///
    /// The track offset comes from the reporter's id, which is the
    /// account's roster index.
    pub fn new(
        client: C,
        credential: AccountCredential,
        reporter: SessionReporter,
        settings: Arc<EngineSettings>,
    ) -> Self {
        let offset = settings.playback.offset_for(reporter.id().index());
        Self {
            client,
            credential,
            reporter,
            settings,
            offset,
            user_id: None,
            beacon: None,
            metrics: PlaybackMetrics::default(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.reporter.id()
    }

    /// Track index this session starts streaming from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Runs the session until it fails or `cancel` fires.
    ///
    /// Never returns while the session is healthy and not cancelled: after
    /// streaming it stays in sync indefinitely.
    pub async fn run(mut self, cancel: CancellationToken) -> SessionReport {
        let id = self.id();
        tracing::debug!(
            session = %id,
            identity = self.credential.identity(),
            offset = self.offset,
            "session starting"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(()),
            result = self.drive(cancel.clone()) => result,
        };

        let error = match outcome {
            Ok(()) => {
                self.reporter.stop();
                tracing::info!(
                    session = %id,
                    sent = self.metrics.delivered,
                    failed = self.metrics.failed,
                    "session stopped"
                );
                None
            }
            Err(e) => {
                if let Some(kind) = e.failure_kind() {
                    self.reporter.fail(kind);
                }
                tracing::error!(session = %id, error = %e, "session failed");
                Some(e)
            }
        };

        SessionReport {
            id,
            identity: self.credential.identity().to_owned(),
            user_id: self.user_id,
            beacon: self.beacon,
            metrics: self.metrics,
            state: self.reporter.state(),
            error,
        }
    }

    async fn drive(&mut self, cancel: CancellationToken) -> Result<(), SessionError> {
        let id = self.id();

        // --- Step 1: Login ---
        let user_id = self
            .client
            .login(self.credential.identity(), self.credential.secret().expose())
            .await
            .map_err(|e| SessionError::Authentication {
                identity: self.credential.identity().to_owned(),
                source: Box::new(e),
            })?;
        tracing::info!(session = %id, user = %user_id, "logged in");
        self.reporter.advance(SessionState::Authenticated);
        self.user_id = Some(user_id.clone());

        // --- Step 2: Announce the beacon ---
        let announcement = build_announcement(
            &self.settings.session.description,
            self.settings.session.beacon_timeout,
            now_millis(),
        );
        let beacon = self
            .client
            .send_state_event(
                &self.settings.room,
                BEACON_INFO_EVENT_TYPE,
                user_id.as_str(),
                &announcement,
            )
            .await
            .map_err(|e| SessionError::Announcement {
                source: Box::new(e),
            })?;
        tracing::info!(session = %id, user = %user_id, %beacon, "beacon announced");
        self.reporter.advance(SessionState::BeaconAnnounced);
        self.beacon = Some(beacon.clone());

        // --- Step 3: Stream the track slice ---
        let mut playback = BeaconPlayback::new(
            self.settings.catalog.clone(),
            self.offset,
            beacon,
            self.settings.playback.clone(),
        );
        if !playback.is_exhausted() {
            self.reporter.advance(SessionState::Streaming);
        }

        while let Some(tick) = playback.next_update().await {
            let delivered = match self
                .client
                .send_message_event(&self.settings.room, BEACON_EVENT_TYPE, &tick.update)
                .await
            {
                Ok(event_id) => {
                    tracing::trace!(session = %id, index = tick.index, %event_id, "location update sent");
                    true
                }
                Err(e) => {
                    let err = SessionError::Delivery {
                        index: tick.index,
                        source: Box::new(e),
                    };
                    tracing::warn!(session = %id, error = %err, "continuing playback");
                    false
                }
            };
            playback.record_delivery(delivered);
            self.metrics = *playback.metrics();
        }

        tracing::info!(
            session = %id,
            sent = self.metrics.delivered,
            failed = self.metrics.failed,
            "track slice finished, syncing"
        );
        self.reporter.advance(SessionState::Syncing);

        // --- Step 4: Sync until cancelled ---
        self.client
            .sync(cancel)
            .await
            .map_err(|e| SessionError::Sync {
                source: Box::new(e),
            })
    }
}
