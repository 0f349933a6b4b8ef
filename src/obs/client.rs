//! obs-websocket client.
//!
//! One short-lived connection per call: connect, identify, issue the
//! request, read the matching response, drop the socket. OBS restarts
//! freely between prayers and a persistent socket would just be a stale
//! handle to reconnect; dialing fresh each time keeps every call
//! self-contained.

use crate::config::ObsConfig;
use crate::error::{Result, SwitcherError};
use crate::obs::protocol::{self, opcode};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_request_id(kind: &str) -> String {
    format!("{kind}-{}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Client for a single obs-websocket server.
#[derive(Debug, Clone)]
pub struct ObsClient {
    config: ObsConfig,
}

impl ObsClient {
    pub fn new(config: ObsConfig) -> Self {
        Self { config }
    }

    /// Switch the program output to `scene`.
    ///
    /// Idempotent on the OBS side: switching to the current scene
    /// succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an OBS error when the server is unreachable, rejects the
    /// handshake, refuses the request, or the call exceeds the
    /// configured timeout.
    pub async fn set_scene(&self, scene: &str) -> Result<()> {
        self.bounded(self.set_scene_inner(scene), &format!("switch to {scene:?}"))
            .await
    }

    /// Connect, identify, and ask the server for its version string.
    pub async fn check_connection(&self) -> Result<String> {
        self.bounded(self.check_inner(), "version probe").await
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T>>,
        what: &str,
    ) -> Result<T> {
        let limit = std::time::Duration::from_secs(self.config.timeout_seconds);
        tokio::time::timeout(limit, call).await.map_err(|_| {
            SwitcherError::Obs(format!(
                "{what} timed out after {}s",
                self.config.timeout_seconds
            ))
        })?
    }

    async fn set_scene_inner(&self, scene: &str) -> Result<()> {
        let mut session = Session::open(&self.config).await?;
        let request_id = next_request_id("set-scene");
        session
            .call(
                &protocol::set_scene_request(&request_id, scene),
                &request_id,
            )
            .await?;
        info!(scene, "scene switched");
        Ok(())
    }

    async fn check_inner(&self) -> Result<String> {
        let mut session = Session::open(&self.config).await?;
        let request_id = next_request_id("get-version");
        let data = session
            .call(&protocol::get_version_request(&request_id), &request_id)
            .await?;
        Ok(data
            .get("responseData")
            .and_then(|d| d.get("obsVersion"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }
}

/// An identified obs-websocket session.
struct Session {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Session {
    async fn open(config: &ObsConfig) -> Result<Self> {
        let url = config.ws_url();
        let (stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| SwitcherError::Obs(format!("connect {url}: {e}")))?;
        let mut session = Self { stream };

        let hello = session.expect_op(opcode::HELLO).await?;
        session
            .send_json(&protocol::identify_for(&hello, &config.password))
            .await?;
        session.expect_op(opcode::IDENTIFIED).await?;
        debug!(%url, "obs session identified");
        Ok(session)
    }

    /// Send `request` and wait for its RequestResponse, skipping any
    /// unrelated frames. Protocol errors from the server become OBS
    /// errors with the server's comment attached.
    async fn call(&mut self, request: &Value, request_id: &str) -> Result<Value> {
        self.send_json(request).await?;
        loop {
            let message = self.read_json().await?;
            let Some(data) = protocol::response_for(&message, request_id) else {
                continue;
            };
            let status = protocol::RequestStatus::from_data(data);
            if !status.result {
                return Err(SwitcherError::Obs(format!(
                    "request refused (code {}): {}",
                    status.code,
                    status.comment.unwrap_or_default()
                )));
            }
            return Ok(data.clone());
        }
    }

    async fn send_json(&mut self, payload: &Value) -> Result<()> {
        self.stream
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|e| SwitcherError::Obs(format!("send: {e}")))
    }

    async fn read_json(&mut self) -> Result<Value> {
        loop {
            let frame = self
                .stream
                .next()
                .await
                .ok_or_else(|| SwitcherError::Obs("connection closed".into()))?
                .map_err(|e| SwitcherError::Obs(format!("read: {e}")))?;
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| SwitcherError::Obs(format!("malformed frame: {e}")));
                }
                Message::Close(_) => {
                    return Err(SwitcherError::Obs("connection closed".into()));
                }
                _ => continue,
            }
        }
    }

    async fn expect_op(&mut self, want: u64) -> Result<Value> {
        let message = self.read_json().await?;
        match protocol::op_of(&message) {
            Some(op) if op == want => Ok(message),
            other => Err(SwitcherError::Obs(format!(
                "expected op {want}, got {other:?}"
            ))),
        }
    }
}
