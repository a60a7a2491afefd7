//! `Simulator` builder and session supervisor.
//!
//! This is the entry point for running a simulation. It ties together all
//! the layers: roster → session engines → playback → homeserver client.

use std::sync::Arc;

use futures_util::future::join_all;
use geobeacon_protocol::{RoomId, TrackCatalog};
use geobeacon_session::{
    Roster, SessionConfig, SessionId, SessionRegistry, SessionState,
};
use geobeacon_tick::PlaybackConfig;
use geobeacon_transport::Homeserver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{EngineSettings, GeobeaconError, SessionEngine, SessionReport};

/// Builder for configuring a simulation.
///
/// # Example
///
/// ```rust,ignore
/// use geobeacon::prelude::*;
///
/// let simulator = Simulator::builder()
///     .room(RoomId::parse("!abc:example.org")?)
///     .build(HttpHomeserver::new("https://matrix.example.org")?, catalog, roster)?;
/// let handle = simulator.spawn();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimulatorBuilder {
    room: Option<RoomId>,
    session_config: SessionConfig,
    playback: PlaybackConfig,
}

impl SimulatorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the room every session broadcasts into. Required.
    pub fn room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    /// Sets what goes into each beacon announcement.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the pacing interval and offset stride.
    pub fn playback(mut self, config: PlaybackConfig) -> Self {
        self.playback = config;
        self
    }

    /// Builds a simulator with one session per roster account.
    ///
    /// # Errors
    /// [`GeobeaconError::MissingRoom`] if no room was set.
    pub fn build<H: Homeserver>(
        self,
        homeserver: H,
        catalog: TrackCatalog,
        roster: Roster,
    ) -> Result<Simulator<H>, GeobeaconError> {
        let room = self.room.ok_or(GeobeaconError::MissingRoom)?;

        if roster.is_empty() {
            tracing::warn!("roster is empty, the simulation will have no sessions");
        }
        if catalog.is_empty() {
            tracing::warn!("track is empty, sessions will go straight to sync");
        }

        Ok(Simulator {
            homeserver,
            roster,
            settings: Arc::new(EngineSettings {
                room,
                catalog,
                session: self.session_config,
                playback: self.playback,
            }),
        })
    }
}

/// A configured simulation, ready to spawn.
pub struct Simulator<H> {
    homeserver: H,
    roster: Roster,
    settings: Arc<EngineSettings>,
}

impl Simulator<()> {
    /// Creates a new builder.
    pub fn builder() -> SimulatorBuilder {
        SimulatorBuilder::new()
    }
}

impl<H: Homeserver> Simulator<H> {
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Number of sessions [`spawn`](Self::spawn) will start.
    pub fn session_count(&self) -> usize {
        self.roster.len()
    }

    /// Spawns one task per roster account and returns immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(self) -> SimulationHandle {
        let cancel = CancellationToken::new();
        let mut registry = SessionRegistry::new();
        let mut tasks = Vec::with_capacity(self.roster.len());

        for (index, credential) in self.roster.iter() {
            let id = SessionId(index);
            let reporter = registry.register(id, credential.identity());
            let engine = SessionEngine::new(
                self.homeserver.connect(),
                credential.clone(),
                reporter,
                Arc::clone(&self.settings),
            );
            tasks.push((id, tokio::spawn(engine.run(cancel.child_token()))));
        }

        tracing::info!(
            sessions = tasks.len(),
            room = %self.settings.room,
            points = self.settings.catalog.len(),
            "simulation started"
        );

        SimulationHandle {
            registry,
            cancel,
            tasks,
        }
    }
}

impl<H: Homeserver> std::fmt::Debug for Simulator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("sessions", &self.roster.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// A running simulation.
///
/// Sessions that reach sync stay there until [`shutdown`](Self::shutdown),
/// so [`wait`](Self::wait) only returns on its own if every session failed.
pub struct SimulationHandle {
    registry: SessionRegistry,
    cancel: CancellationToken,
    tasks: Vec<(SessionId, JoinHandle<SessionReport>)>,
}

impl SimulationHandle {
    /// Live view of every session's state.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// A token that shuts the whole simulation down when cancelled, for
    /// wiring up signal handlers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Asks every session to stop. Returns immediately; use
    /// [`wait`](Self::wait) to block until they have.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("simulation shutting down");
        }
        self.cancel.cancel();
    }

    /// Waits for every session to end and collects their reports.
    pub async fn wait(self) -> SimulationReport {
        let (ids, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;

        let mut report = SimulationReport::default();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(session) => report.sessions.push(session),
                Err(e) => {
                    tracing::error!(session = %id, error = %e, "session task panicked");
                    report.panicked.push(id);
                }
            }
        }

        tracing::info!(
            sessions = report.sessions.len(),
            sent = report.total_sent(),
            failed = report.total_failed(),
            "simulation finished"
        );
        report
    }
}

/// Every session's outcome, in roster order.
#[derive(Debug, Default)]
pub struct SimulationReport {
    pub sessions: Vec<SessionReport>,
    /// Sessions whose task panicked and left no report.
    pub panicked: Vec<SessionId>,
}

impl SimulationReport {
    /// Updates delivered across all sessions.
    pub fn total_sent(&self) -> u64 {
        self.sessions.iter().map(SessionReport::sent).sum()
    }

    /// Updates that failed to deliver across all sessions.
    pub fn total_failed(&self) -> u64 {
        self.sessions.iter().map(SessionReport::failed).sum()
    }

    /// Number of sessions that ended in a state matching `pred`.
    pub fn count_in(&self, pred: impl Fn(&SessionState) -> bool) -> usize {
        self.sessions.iter().filter(|s| pred(&s.state)).count()
    }

    pub fn get(&self, id: SessionId) -> Option<&SessionReport> {
        self.sessions.iter().find(|s| s.id == id)
    }
}
