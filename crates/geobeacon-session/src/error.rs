//! Error types for the session layer.

use std::path::PathBuf;

use crate::FailureKind;

/// Boxed source error from whichever homeserver client the session runs on.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur over one account's session, plus the roster
/// errors that happen before any session exists.
///
/// Every session error is local to its session. Use [`is_fatal`] to tell
/// the ones that end the session from the ones that are only logged.
///
/// [`is_fatal`]: SessionError::is_fatal
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The homeserver refused the account's credentials, or the login
    /// request never completed.
    #[error("authentication failed for {identity}: {source}")]
    Authentication {
        identity: String,
        #[source]
        source: BoxError,
    },

    /// The beacon announcement state event was not accepted.
    #[error("beacon announcement failed: {source}")]
    Announcement {
        #[source]
        source: BoxError,
    },

    /// One location update was not delivered. Playback carries on.
    #[error("location update {index} not delivered: {source}")]
    Delivery {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The long-poll sync loop ended with an error.
    #[error("sync failed: {source}")]
    Sync {
        #[source]
        source: BoxError,
    },

    /// A roster line doesn't have exactly two fields. Carries only the
    /// line number, since the line itself may hold a password.
    #[error("roster line {line} must be `identity secret`")]
    InvalidRoster { line: usize },

    /// The roster file couldn't be read.
    #[error("failed to read roster {}: {source}", path.display())]
    RosterIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Whether this error ends the session it happened in.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Delivery { .. })
    }

    /// The terminal state a session records for this error, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Authentication { .. } => Some(FailureKind::Authentication),
            Self::Announcement { .. } => Some(FailureKind::Announcement),
            Self::Sync { .. } => Some(FailureKind::Sync),
            Self::Delivery { .. } | Self::InvalidRoster { .. } | Self::RosterIo { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(msg: &str) -> BoxError {
        msg.to_string().into()
    }

    #[test]
    fn test_delivery_is_the_only_non_fatal_error() {
        let delivery = SessionError::Delivery {
            index: 3,
            source: boxed("timeout"),
        };
        assert!(!delivery.is_fatal());
        assert_eq!(delivery.failure_kind(), None);

        let auth = SessionError::Authentication {
            identity: "alice".into(),
            source: boxed("M_FORBIDDEN"),
        };
        assert!(auth.is_fatal());
        assert_eq!(auth.failure_kind(), Some(FailureKind::Authentication));

        let sync = SessionError::Sync { source: boxed("reset") };
        assert_eq!(sync.failure_kind(), Some(FailureKind::Sync));
    }

    #[test]
    fn test_invalid_roster_names_line_only() {
        let err = SessionError::InvalidRoster { line: 4 };
        assert_eq!(err.to_string(), "roster line 4 must be `identity secret`");
    }
}
