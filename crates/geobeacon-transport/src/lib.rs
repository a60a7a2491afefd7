//! Homeserver client abstraction for geobeacon.
//!
//! Provides the [`Homeserver`] and [`MatrixClient`] traits that the session
//! engine talks to. The engine never sees HTTP; it sees four operations:
//! log in, send a state event, send a message event, and sync.
//!
//! # Feature Flags
//!
//! - `http` (default): Matrix client-server API over HTTPS via `reqwest`

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig, HttpHomeserver};

use std::future::Future;

use geobeacon_protocol::{EventId, RoomId, UserId};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Hands out fresh, unauthenticated clients, one per account.
pub trait Homeserver: Send + Sync + 'static {
    /// The client type produced by this homeserver.
    type Client: MatrixClient;

    /// Opens a new client. No network traffic happens until
    /// [`MatrixClient::login`].
    fn connect(&self) -> Self::Client;
}

/// One account's view of the homeserver.
///
/// Methods return `impl Future + Send` (rather than being `async fn`) so
/// that a session generic over the client can still be handed to
/// `tokio::spawn`. Implementations may write plain `async fn`.
pub trait MatrixClient: Send + Sync + 'static {
    /// The error type for client operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Authenticates with a password and keeps the resulting access token
    /// for every later call. Returns the fully-qualified user id.
    fn login(
        &mut self,
        identity: &str,
        secret: &str,
    ) -> impl Future<Output = Result<UserId, Self::Error>> + Send;

    /// Sends a state event and returns the id the homeserver assigned.
    fn send_state_event<T>(
        &self,
        room: &RoomId,
        event_type: &str,
        state_key: &str,
        content: &T,
    ) -> impl Future<Output = Result<EventId, Self::Error>> + Send
    where
        T: Serialize + Sync;

    /// Sends a message event and returns the id the homeserver assigned.
    fn send_message_event<T>(
        &self,
        room: &RoomId,
        event_type: &str,
        content: &T,
    ) -> impl Future<Output = Result<EventId, Self::Error>> + Send
    where
        T: Serialize + Sync;

    /// Long-polls the homeserver for as long as the connection lives.
    ///
    /// Only returns `Ok(())` once `cancel` fires; any other return is an
    /// error that ended the connection.
    fn sync(
        &mut self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
