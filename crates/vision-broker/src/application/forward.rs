//! Forwarding bookkeeping: which way a message travelled and how many went
//! each way.

use std::fmt;

/// Number of forwarded messages between two `info!` heartbeat lines.
pub const HEARTBEAT_EVERY: u64 = 1000;

/// The way a message crosses the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Received on the ROUTER, sent on the DEALER.
    ClientToWorker,
    /// Received on the DEALER, sent on the ROUTER.
    WorkerToClient,
}

impl Direction {
    /// Name of the socket the message arrived on.
    pub fn source(self) -> &'static str {
        match self {
            Self::ClientToWorker => "frontend",
            Self::WorkerToClient => "backend",
        }
    }

    /// Name of the socket the message leaves through.
    pub fn sink(self) -> &'static str {
        match self {
            Self::ClientToWorker => "backend",
            Self::WorkerToClient => "frontend",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientToWorker => f.write_str("client→worker"),
            Self::WorkerToClient => f.write_str("worker→client"),
        }
    }
}

/// Running totals kept by the forwarder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub client_to_worker: u64,
    pub worker_to_client: u64,
    /// Replies that could not be routed (client gone, no envelope).
    pub dropped: u64,
    /// Requests that arrived while no worker was connected and had to wait.
    pub held: u64,
}

impl ForwardStats {
    /// Records a successfully relayed message.
    ///
    /// Returns `true` when the total has just reached a multiple of
    /// [`HEARTBEAT_EVERY`], signalling the caller to emit a heartbeat log.
    pub fn record_forwarded(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::ClientToWorker => self.client_to_worker += 1,
            Direction::WorkerToClient => self.worker_to_client += 1,
        }
        self.forwarded() % HEARTBEAT_EVERY == 0
    }

    pub fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    pub fn record_held(&mut self) {
        self.held += 1;
    }

    /// Total messages relayed in both directions.
    pub fn forwarded(&self) -> u64 {
        self.client_to_worker + self.worker_to_client
    }

    /// Requests that have been handed to a worker but not yet answered.
    ///
    /// Approximate: a dropped reply keeps its request counted here.
    pub fn in_flight(&self) -> u64 {
        self.client_to_worker.saturating_sub(self.worker_to_client)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
