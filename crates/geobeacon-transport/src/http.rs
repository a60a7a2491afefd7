//! Matrix client-server API (v3) over HTTPS using `reqwest`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use geobeacon_protocol::{Codec, EventId, JsonCodec, RoomId, UserId};
use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{Homeserver, MatrixClient, TransportError};

const JSON: &str = "application/json";

/// Extra time on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const SYNC_SLACK: Duration = Duration::from_secs(10);

/// Keeps each sync response small: one timeline event per room, no presence.
const SYNC_FILTER: &str =
    r#"{"room":{"timeline":{"limit":1}},"presence":{"not_types":["*"]}}"#;

/// Tunables for [`HttpHomeserver`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Timeout for login and event sends.
    pub request_timeout: Duration,
    /// How long the homeserver may hold each sync request open.
    pub sync_timeout: Duration,
    /// Device name shown in the account's session list.
    pub device_display_name: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            sync_timeout: Duration::from_secs(30),
            device_display_name: "geobeacon".to_string(),
        }
    }
}

/// A homeserver reachable over HTTP(S).
///
/// All clients it hands out share one `reqwest` connection pool.
#[derive(Debug)]
pub struct HttpHomeserver {
    base_url: Url,
    http: reqwest::Client,
    config: HttpConfig,
}

impl HttpHomeserver {
    /// Creates a homeserver handle with default settings.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_config(base_url, HttpConfig::default())
    }

    /// Creates a homeserver handle with explicit settings.
    pub fn with_config(
        base_url: &str,
        config: HttpConfig,
    ) -> Result<Self, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("not a base url".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        tracing::info!(homeserver = %url, "homeserver configured");
        Ok(Self {
            base_url: url,
            http,
            config,
        })
    }

    /// The homeserver's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Homeserver for HttpHomeserver {
    type Client = HttpClient;

    fn connect(&self) -> HttpClient {
        HttpClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            config: self.config.clone(),
            codec: JsonCodec,
            login: None,
            txn_prefix: generate_txn_prefix(),
            next_txn: AtomicU64::new(1),
        }
    }
}

/// Credentials obtained from `/login`.
struct LoginState {
    user_id: UserId,
    access_token: String,
}

/// One account's HTTP connection to the homeserver.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    config: HttpConfig,
    codec: JsonCodec,
    login: Option<LoginState>,
    /// Random per-client prefix so transaction ids never collide across
    /// clients of the same account.
    txn_prefix: String,
    next_txn: AtomicU64,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("user_id", &self.user_id())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// The logged-in user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.login.as_ref().map(|l| &l.user_id)
    }

    fn access_token(&self) -> Result<&str, TransportError> {
        self.login
            .as_ref()
            .map(|l| l.access_token.as_str())
            .ok_or(TransportError::NotLoggedIn)
    }

    /// `{base}/_matrix/client/v3/{segments...}` with each segment
    /// percent-encoded.
    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "not a base url".into(),
            })?
            .pop_if_empty()
            .extend(["_matrix", "client", "v3"])
            .extend(segments);
        Ok(url)
    }

    fn next_txn_id(&self) -> String {
        let n = self.next_txn.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.txn_prefix)
    }

    /// Sends the request and decodes a success body, or maps the Matrix
    /// error body into [`TransportError::Status`].
    async fn execute<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<R, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let (errcode, message) = match self.codec.decode::<MatrixErrorBody>(&body) {
                Ok(err) => (err.errcode, err.error),
                Err(_) => (
                    "M_UNKNOWN".to_string(),
                    String::from_utf8_lossy(&body).chars().take(200).collect(),
                ),
            };
            return Err(TransportError::Status {
                status: status.as_u16(),
                errcode,
                message,
            });
        }

        Ok(self.codec.decode(&body)?)
    }

    async fn put_event<T: Serialize + Sync>(
        &self,
        url: Url,
        content: &T,
    ) -> Result<EventId, TransportError> {
        let token = self.access_token()?;
        let body = self.codec.encode(content)?;
        let response: EventIdResponse = self
            .execute(
                self.http
                    .put(url)
                    .bearer_auth(token)
                    .header(CONTENT_TYPE, JSON)
                    .body(body),
            )
            .await?;
        Ok(response.event_id)
    }
}

impl MatrixClient for HttpClient {
    type Error = TransportError;

    async fn login(
        &mut self,
        identity: &str,
        secret: &str,
    ) -> Result<UserId, TransportError> {
        let url = self.endpoint(["login"])?;
        let body = self.codec.encode(&LoginRequest {
            kind: "m.login.password",
            identifier: LoginIdentifier {
                kind: "m.id.user",
                user: identity,
            },
            password: secret,
            initial_device_display_name: &self.config.device_display_name,
        })?;

        let response: LoginResponse = self
            .execute(self.http.post(url).header(CONTENT_TYPE, JSON).body(body))
            .await?;

        tracing::debug!(
            user_id = %response.user_id,
            device_id = response.device_id.as_deref().unwrap_or("-"),
            "logged in"
        );
        let user_id = response.user_id.clone();
        self.login = Some(LoginState {
            user_id: response.user_id,
            access_token: response.access_token,
        });
        Ok(user_id)
    }

    async fn send_state_event<T>(
        &self,
        room: &RoomId,
        event_type: &str,
        state_key: &str,
        content: &T,
    ) -> Result<EventId, TransportError>
    where
        T: Serialize + Sync,
    {
        let url =
            self.endpoint(["rooms", room.as_str(), "state", event_type, state_key])?;
        self.put_event(url, content).await
    }

    async fn send_message_event<T>(
        &self,
        room: &RoomId,
        event_type: &str,
        content: &T,
    ) -> Result<EventId, TransportError>
    where
        T: Serialize + Sync,
    {
        let txn_id = self.next_txn_id();
        let url = self.endpoint([
            "rooms",
            room.as_str(),
            "send",
            event_type,
            txn_id.as_str(),
        ])?;
        self.put_event(url, content).await
    }

    async fn sync(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<(), TransportError> {
        let token = self.access_token()?.to_owned();
        let url = self.endpoint(["sync"])?;
        let timeout_ms = self.config.sync_timeout.as_millis().to_string();
        let mut since: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(&token)
                .timeout(self.config.sync_timeout + SYNC_SLACK)
                .query(&[("timeout", timeout_ms.as_str()), ("filter", SYNC_FILTER)]);
            if let Some(since) = &since {
                request = request.query(&[("since", since.as_str())]);
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                result = self.execute::<SyncResponse>(request) => Some(result),
            };
            let Some(result) = outcome else {
                tracing::debug!("sync cancelled");
                return Ok(());
            };

            let batch = result?;
            tracing::trace!(next_batch = %batch.next_batch, "sync batch received");
            since = Some(batch.next_batch);
        }
    }
}

/// Generates a random 16-character hex string (64 bits of entropy).
fn generate_txn_prefix() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    identifier: LoginIdentifier<'a>,
    password: &'a str,
    initial_device_display_name: &'a str,
}

#[derive(Serialize)]
struct LoginIdentifier<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    user: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user_id: UserId,
    access_token: String,
    #[serde(default)]
    device_id: Option<String>,
}

#[derive(Deserialize)]
struct EventIdResponse {
    event_id: EventId,
}

#[derive(Deserialize)]
struct SyncResponse {
    next_batch: String,
}

#[derive(Deserialize)]
struct MatrixErrorBody {
    errcode: String,
    #[serde(default)]
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        HttpHomeserver::new(base).unwrap().connect()
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let err = HttpHomeserver::new("ftp://matrix.org").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }

    #[test]
    fn test_new_rejects_garbage() {
        assert!(HttpHomeserver::new("not a url").is_err());
    }

    #[test]
    fn test_endpoint_percent_encodes_segments() {
        let c = client("https://matrix.example.org");
        let url = c
            .endpoint(["rooms", "!room:example.org", "send", "a/b", "t 1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://matrix.example.org/_matrix/client/v3/rooms/!room:example.org/send/a%2Fb/t%201"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let c = client("https://example.org/matrix/");
        let url = c.endpoint(["login"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/matrix/_matrix/client/v3/login");
    }

    #[test]
    fn test_txn_ids_are_unique_per_client() {
        let a = client("https://example.org");
        let b = client("https://example.org");
        let a1 = a.next_txn_id();
        let a2 = a.next_txn_id();
        assert_ne!(a1, a2);
        assert_ne!(a1, b.next_txn_id());
        assert_eq!(a.txn_prefix.len(), 16);
    }

    #[test]
    fn test_access_token_requires_login() {
        let c = client("https://example.org");
        assert!(matches!(c.access_token(), Err(TransportError::NotLoggedIn)));
        assert!(c.user_id().is_none());
    }

    #[test]
    fn test_debug_never_prints_token() {
        let mut c = client("https://example.org");
        c.login = Some(LoginState {
            user_id: UserId::parse("@a:example.org").unwrap(),
            access_token: "syt_super_secret".into(),
        });
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("syt_super_secret"));
        assert!(dbg.contains("@a:example.org"));
    }
}
