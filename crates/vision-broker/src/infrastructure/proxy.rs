//! The ROUTER/DEALER forwarder.
//!
//! # How a request finds its way back (for beginners)
//!
//! ```text
//! client REQ sends          ["", img, shape]
//! ROUTER receives   [id-42, "", img, shape]   ← identity frame prepended
//! DEALER sends      [id-42, "", img, shape]   → next worker in turn
//! worker REP sees           [img, shape]      (envelope kept aside)
//! worker REP sends          [table]
//! DEALER receives   [id-42, "", table]        ← envelope restored
//! ROUTER sends      [id-42, "", table]        → routes on id-42, strips it
//! client REQ sees           [table]
//! ```
//!
//! The broker never looks past the first frame; it does not even know which
//! frame is the identity.  It moves whole messages.
//!
//! # Requests before any worker
//!
//! A request that arrives while no worker is connected is held, not
//! dropped.  The forwarder watches the DEALER's monitor for the next
//! accepted connection and then hands the request over.  Nothing else is
//! relayed while it waits, which is what a blocking DEALER would do too.
//!
//! Replies are different: a reply whose client has gone, or one that lacks
//! the routing envelope altogether, has nowhere to go and is dropped.
//!
//! # No shutdown path
//!
//! [`Broker::run`] only returns on a receive error.  Stopping the broker
//! means stopping the process; in-flight requests are lost and clients must
//! retry.  A supervisor (systemd, Kubernetes, …) restarts it.

use std::convert::Infallible;
use std::time::Duration;

use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};
use zeromq::{
    DealerSocket, Endpoint, RouterSocket, Socket, SocketEvent, SocketRecv, SocketSend, ZmqError,
    ZmqMessage,
};

use crate::application::forward::{Direction, ForwardStats};
use crate::infrastructure::config::BrokerConfig;

/// Errors raised by the broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A socket could not bind its endpoint (port taken, bad host, …).
    #[error("bind failed on {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: ZmqError,
    },

    /// A socket failed while receiving.  The broker cannot recover from this.
    #[error("receive failed on {side} socket: {source}")]
    Receive {
        side: &'static str,
        #[source]
        source: ZmqError,
    },
}

/// How long a held request waits for a monitor event before the send is
/// simply tried again.
const WORKER_RECHECK: Duration = Duration::from_millis(500);

/// A bound broker: owns both sockets for the rest of the process lifetime.
pub struct Broker {
    frontend: RouterSocket,
    backend: DealerSocket,
    /// Connection events of the DEALER, read only while a request is held.
    backend_events: BoxStream<'static, SocketEvent>,
    frontend_endpoint: Endpoint,
    backend_endpoint: Endpoint,
    stats: ForwardStats,
}

impl Broker {
    /// Binds the client-facing ROUTER and the worker-facing DEALER.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Bind`] if either endpoint cannot be bound.
    pub async fn bind(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let mut frontend = RouterSocket::new();
        let frontend_endpoint = bind_socket(&mut frontend, config.frontend_endpoint()).await?;

        let mut backend = DealerSocket::new();
        let backend_events = backend.monitor().boxed();
        let backend_endpoint = bind_socket(&mut backend, config.backend_endpoint()).await?;

        Ok(Self {
            frontend,
            backend,
            backend_events,
            frontend_endpoint,
            backend_endpoint,
            stats: ForwardStats::default(),
        })
    }

    /// Actual client-facing port (resolves a configured port of `0`).
    pub fn frontend_port(&self) -> Option<u16> {
        tcp_port(&self.frontend_endpoint)
    }

    /// Actual worker-facing port (resolves a configured port of `0`).
    pub fn backend_port(&self) -> Option<u16> {
        tcp_port(&self.backend_endpoint)
    }

    pub fn stats(&self) -> &ForwardStats {
        &self.stats
    }

    /// Relays messages in both directions until a socket fails.
    ///
    /// Whichever socket has a message ready is served first; there is no
    /// fixed polling order.  Requests wait for a worker when none is
    /// connected.  A reply the ROUTER cannot route is dropped with a
    /// warning and forwarding carries on.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Receive`] when either socket fails to
    /// receive.  It never returns `Ok`.
    pub async fn run(mut self) -> Result<Infallible, BrokerError> {
        info!(
            "broker forwarding: frontend {} ⇄ backend {}",
            self.frontend_endpoint, self.backend_endpoint
        );

        loop {
            tokio::select! {
                received = self.frontend.recv() => {
                    let message = received.map_err(|source| BrokerError::Receive {
                        side: Direction::ClientToWorker.source(),
                        source,
                    })?;
                    let frames = message.len();
                    let outcome = self.dispatch(message).await;
                    self.settle(Direction::ClientToWorker, frames, outcome);
                }
                received = self.backend.recv() => {
                    let message = received.map_err(|source| BrokerError::Receive {
                        side: Direction::WorkerToClient.source(),
                        source,
                    })?;
                    let frames = message.len();
                    if frames < 2 {
                        // The ROUTER needs an identity frame plus a body.
                        self.stats.record_dropped();
                        warn!(
                            "{}: {frames}-frame message carries no routing envelope, dropped",
                            Direction::WorkerToClient
                        );
                    } else {
                        let outcome = self.frontend.send(message).await;
                        self.settle(Direction::WorkerToClient, frames, outcome);
                    }
                }
            }
        }
    }

    /// Hands a request to the next worker in turn, holding it until one is
    /// connected.
    async fn dispatch(&mut self, mut message: ZmqMessage) -> Result<(), ZmqError> {
        let mut held = false;
        loop {
            // Stale events would wake the wait below for nothing.
            while let Some(Some(_)) = self.backend_events.next().now_or_never() {}

            match self.backend.send(message).await {
                Err(ZmqError::ReturnToSender { message: returned, .. }) => {
                    if !held {
                        held = true;
                        self.stats.record_held();
                        info!("no worker connected, holding request until one connects");
                    }
                    message = returned;
                    self.wait_for_worker().await;
                }
                Ok(()) if held => {
                    info!("held request handed to a worker");
                    return Ok(());
                }
                outcome => return outcome,
            }
        }
    }

    /// Returns once a worker connection is accepted, or after
    /// [`WORKER_RECHECK`] at the latest.
    async fn wait_for_worker(&mut self) {
        let deadline = tokio::time::sleep(WORKER_RECHECK);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                event = self.backend_events.next() => match event {
                    Some(SocketEvent::Accepted(endpoint, _)) => {
                        debug!("worker connected from {endpoint}");
                        return;
                    }
                    Some(_) => {}
                    None => {
                        // Monitor gone; fall back to the timer.
                        (&mut deadline).await;
                        return;
                    }
                },
                () = &mut deadline => return,
            }
        }
    }

    fn settle(&mut self, direction: Direction, frames: usize, outcome: Result<(), ZmqError>) {
        match outcome {
            Ok(()) => {
                debug!("{direction}: forwarded {frames} frame(s)");
                if self.stats.record_forwarded(direction) {
                    info!(
                        "broker heartbeat: {} forwarded ({} requests, {} replies), {} in flight, {} held, {} dropped",
                        self.stats.forwarded(),
                        self.stats.client_to_worker,
                        self.stats.worker_to_client,
                        self.stats.in_flight(),
                        self.stats.held,
                        self.stats.dropped
                    );
                }
            }
            Err(e) => {
                self.stats.record_dropped();
                warn!("{direction}: {} socket refused message, dropped: {e}", direction.sink());
            }
        }
    }
}

async fn bind_socket<S: Socket>(socket: &mut S, endpoint: String) -> Result<Endpoint, BrokerError> {
    match socket.bind(&endpoint).await {
        Ok(bound) => Ok(bound),
        Err(source) => Err(BrokerError::Bind { endpoint, source }),
    }
}

fn tcp_port(endpoint: &Endpoint) -> Option<u16> {
    match endpoint {
        Endpoint::Tcp(_, port) => Some(*port),
        _ => None,
    }
}
