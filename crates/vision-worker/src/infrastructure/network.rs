//! ZeroMQ REP adapter for [`RequestChannel`].
//!
//! A REP socket strips the routing envelope the broker's DEALER attaches,
//! hands us only the payload frames, and re-attaches the envelope to
//! whatever we send next.  The worker therefore never sees client
//! identities.
//!
//! # Noticing a broker restart (for beginners)
//!
//! The REP socket does not tell anyone when the broker goes away: its
//! receive simply never completes again.  Next to the REP socket the
//! channel therefore keeps a plain TCP connection to the same endpoint, the
//! *watch*, that carries no traffic.  When the broker process dies the
//! operating system closes the watch, a read on it returns end-of-file, and
//! the channel throws the REP socket away and connects a fresh one.
//!
//! ```text
//! Connected ──watch closed──▶ Reconnecting ──watch + REP up──▶ Connected
//!                                 │    ▲
//!                                 └────┘ broker unreachable: wait, retry
//! ```
//!
//! This only ever happens between requests, when a REP socket holds no state
//! worth keeping.  Endpoints other than TCP get no watch.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use zeromq::{Endpoint, RepSocket, Socket, SocketRecv, SocketSend, ZmqError, ZmqMessage};

use crate::application::serve_requests::{RequestChannel, TransportError};

/// Pause between attempts to reach a broker that is down.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(500);

/// Errors raised while setting up the worker's socket.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: ZmqError,
    },
}

// ── Watch connection ──────────────────────────────────────────────────────────

/// A bare TCP connection to the broker that only waits to be closed.
struct BrokerWatch {
    stream: TcpStream,
}

impl BrokerWatch {
    async fn open(host: &str, port: u16) -> std::io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self { stream })
    }

    /// Completes once the broker side closes the connection.
    ///
    /// Whatever the broker writes (its handshake greeting) is discarded.
    async fn closed(&mut self) {
        let mut scratch = [0u8; 64];
        loop {
            match self.stream.read(&mut scratch).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
        }
    }
}

/// Host and port of a `tcp://` endpoint; `None` for any other transport.
fn tcp_address(endpoint: &str) -> Option<(String, u16)> {
    match endpoint.parse::<Endpoint>().ok()? {
        Endpoint::Tcp(host, port) => Some((host.to_string(), port)),
        _ => None,
    }
}

// ── REP channel ───────────────────────────────────────────────────────────────

/// A REP socket connected to the broker, reconnected when the broker
/// restarts.
pub struct RepChannel {
    socket: RepSocket,
    endpoint: String,
    address: Option<(String, u16)>,
    watch: Option<BrokerWatch>,
    reconnect_interval: Duration,
}

impl RepChannel {
    /// Connects a new REP socket to `endpoint` (e.g. `tcp://127.0.0.1:5556`).
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Connect`] if the endpoint is malformed or
    /// unreachable.
    pub async fn connect(endpoint: &str) -> Result<Self, NetworkError> {
        let socket = connect_socket(endpoint)
            .await
            .map_err(|source| NetworkError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let address = tcp_address(endpoint);
        let watch = match &address {
            Some((host, port)) => BrokerWatch::open(host, *port).await.ok(),
            None => None,
        };

        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
            address,
            watch,
            reconnect_interval: RECONNECT_INTERVAL,
        })
    }

    /// Overrides [`RECONNECT_INTERVAL`].
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Replaces the REP socket once the broker accepts connections again.
    async fn reconnect(&mut self) -> Result<(), TransportError> {
        let Some((host, port)) = self.address.clone() else {
            return Ok(());
        };

        let watch = loop {
            match BrokerWatch::open(&host, port).await {
                Ok(watch) => break watch,
                Err(e) => {
                    debug!(
                        "broker at {} unreachable ({e}); retrying in {:?}",
                        self.endpoint, self.reconnect_interval
                    );
                    tokio::time::sleep(self.reconnect_interval).await;
                }
            }
        };

        let socket = connect_socket(&self.endpoint)
            .await
            .map_err(|e| TransportError::Receive(format!("reconnect to {}: {e}", self.endpoint)))?;
        // The old socket goes with its dead connection.
        self.socket = socket;
        self.watch = Some(watch);
        info!("reconnected to broker at {}", self.endpoint);
        Ok(())
    }
}

async fn connect_socket(endpoint: &str) -> Result<RepSocket, ZmqError> {
    let mut socket = RepSocket::new();
    socket.connect(endpoint).await?;
    Ok(socket)
}

#[async_trait]
impl RequestChannel for RepChannel {
    async fn recv_request(&mut self) -> Result<Vec<Bytes>, TransportError> {
        loop {
            if self.address.is_some() && self.watch.is_none() {
                self.reconnect().await?;
            }

            let received = match self.watch.as_mut() {
                Some(watch) => tokio::select! {
                    received = self.socket.recv() => received,
                    () = watch.closed() => {
                        warn!("lost broker at {}; reconnecting", self.endpoint);
                        self.watch = None;
                        continue;
                    }
                },
                None => self.socket.recv().await,
            };

            let message = received.map_err(|e| TransportError::Receive(e.to_string()))?;
            debug!(frames = message.len(), "request received");
            return Ok(message.iter().cloned().collect());
        }
    }

    async fn send_reply(&mut self, reply: Bytes) -> Result<(), TransportError> {
        self.socket
            .send(ZmqMessage::from(reply))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
