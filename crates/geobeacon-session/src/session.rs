//! Session types: the per-account state machine and its configuration.
//!
//! A "session" is one roster account's whole run: log in, announce a
//! beacon, stream its slice of the track, then sit in sync.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// What each session puts in its beacon announcement.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Human-readable label shown next to the live location.
    ///
    /// Default: `"Live location"`.
    pub description: String,

    /// How long clients should treat the beacon as live.
    ///
    /// Default: 2h30m. Informational only: nothing stops the session when
    /// it elapses.
    pub beacon_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            description: "Live location".to_string(),
            beacon_timeout: Duration::from_secs(2 * 60 * 60 + 30 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A session's position in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub usize);

impl SessionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Which fatal step ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    Announcement,
    Sync,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::Announcement => "announcement",
            Self::Sync => "sync",
        };
        f.write_str(name)
    }
}

/// The lifecycle of one session.
///
/// ```text
///   Unauthenticated ──→ Authenticated ──→ BeaconAnnounced ──→ Streaming ──→ Syncing
///                                                │                            ↑
///                                                └──────(empty slice)─────────┘
///
///   any live state ──→ Failed(kind) | Stopped
/// ```
///
/// `Failed` and `Stopped` are terminal. Nothing leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    BeaconAnnounced,
    Streaming,
    Syncing,
    Failed(FailureKind),
    Stopped,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Stopped)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;

        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Unauthenticated, Authenticated)
                | (Authenticated, BeaconAnnounced)
                | (BeaconAnnounced, Streaming | Syncing)
                | (Streaming, Syncing)
                | (_, Failed(_) | Stopped)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::BeaconAnnounced => f.write_str("beacon-announced"),
            Self::Streaming => f.write_str("streaming"),
            Self::Syncing => f.write_str("syncing"),
            Self::Failed(kind) => write!(f, "failed ({kind})"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}
