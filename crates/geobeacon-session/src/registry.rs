//! The session registry: a read-only window onto every running session.
//!
//! Each session owns a [`SessionReporter`], the sending half of a
//! `tokio::sync::watch` channel. The registry keeps only the receiving
//! halves, so sessions never contend on a shared lock to report progress,
//! and anyone holding the registry can read the latest state or wait for
//! a particular one.
//!
//! # Concurrency note
//!
//! Registration takes `&mut self`. The simulator registers every session
//! before it spawns them, and after that the registry is only read.

use std::collections::BTreeMap;

use tokio::sync::watch;

use crate::{FailureKind, SessionId, SessionState};

/// Point-in-time view of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub identity: String,
    pub state: SessionState,
}

struct Entry {
    identity: String,
    state: watch::Receiver<SessionState>,
}

/// Tracks the current state of every registered session.
#[derive(Default)]
pub struct SessionRegistry {
    /// Ordered by id so snapshots come out in roster order.
    sessions: BTreeMap<SessionId, Entry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session in [`SessionState::Unauthenticated`] and returns
    /// the reporter its engine publishes through.
    ///
    /// Registering an id twice replaces the earlier entry. The earlier
    /// reporter keeps working but nobody is listening to it anymore.
    pub fn register(&mut self, id: SessionId, identity: impl Into<String>) -> SessionReporter {
        let identity = identity.into();
        let (tx, rx) = watch::channel(SessionState::Unauthenticated);

        if self
            .sessions
            .insert(
                id,
                Entry {
                    identity: identity.clone(),
                    state: rx,
                },
            )
            .is_some()
        {
            tracing::warn!(session = %id, "session registered twice, replacing");
        }
        tracing::debug!(session = %id, %identity, "session registered");

        SessionReporter { id, state: tx }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Latest state of one session, or `None` if it was never registered.
    pub fn state(&self, id: SessionId) -> Option<SessionState> {
        self.sessions.get(&id).map(|entry| *entry.state.borrow())
    }

    pub fn identity(&self, id: SessionId) -> Option<&str> {
        self.sessions.get(&id).map(|entry| entry.identity.as_str())
    }

    /// Every session's latest state, in roster order.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .iter()
            .map(|(id, entry)| SessionSnapshot {
                id: *id,
                identity: entry.identity.clone(),
                state: *entry.state.borrow(),
            })
            .collect()
    }

    /// How many sessions are currently in a state matching `pred`.
    pub fn count_in(&self, pred: impl Fn(&SessionState) -> bool) -> usize {
        self.sessions
            .values()
            .filter(|entry| pred(&*entry.state.borrow()))
            .count()
    }

    /// Waits until session `id` reaches a state matching `pred` and returns
    /// that state. Returns immediately if the current state already matches.
    ///
    /// Returns `None` if the id is unknown, or if the session's reporter is
    /// dropped before the predicate is ever satisfied.
    pub async fn wait_for(
        &self,
        id: SessionId,
        pred: impl FnMut(&SessionState) -> bool,
    ) -> Option<SessionState> {
        let mut rx = self.sessions.get(&id)?.state.clone();
        let state = *rx.wait_for(pred).await.ok()?;
        Some(state)
    }
}

/// The publishing half of a session's state, owned by its engine.
#[derive(Debug)]
pub struct SessionReporter {
    id: SessionId,
    state: watch::Sender<SessionState>,
}

impl SessionReporter {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Moves the session to `next`.
    ///
    /// Returns `false` (and logs) if the state machine doesn't allow the
    /// move; the published state is left unchanged.
    pub fn advance(&self, next: SessionState) -> bool {
        let current = self.state();
        if !current.can_transition_to(&next) {
            tracing::warn!(
                session = %self.id,
                from = %current,
                to = %next,
                "refused invalid session transition"
            );
            return false;
        }
        self.state.send_replace(next);
        tracing::debug!(session = %self.id, from = %current, to = %next, "session state changed");
        true
    }

    pub fn fail(&self, kind: FailureKind) -> bool {
        self.advance(SessionState::Failed(kind))
    }

    pub fn stop(&self) -> bool {
        self.advance(SessionState::Stopped)
    }
}
