use geobeacon_protocol::ProtocolError;

/// Errors that can occur talking to a homeserver.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[cfg(feature = "http")]
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The homeserver answered with a non-success status.
    #[error("homeserver returned {status} {errcode}: {message}")]
    Status {
        status: u16,
        errcode: String,
        message: String,
    },

    /// An authenticated call was made before `login`.
    #[error("client is not logged in")]
    NotLoggedIn,

    /// The configured homeserver address can't be used as a base URL.
    #[error("invalid homeserver url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request or response body didn't match the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// The Matrix `errcode` when the homeserver supplied one.
    pub fn errcode(&self) -> Option<&str> {
        match self {
            Self::Status { errcode, .. } => Some(errcode),
            _ => None,
        }
    }
}
