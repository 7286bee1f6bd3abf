//! Client configuration.
//!
//! [`ClientConfig`] is plain data.  `main.rs` fills it from command-line
//! flags; tests build it directly with whatever port the broker bound.

use std::time::Duration;

/// All runtime settings for one [`ClassifyClient`](crate::infrastructure::ClassifyClient).
///
/// # Example
///
/// ```rust
/// use vision_client::domain::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert_eq!(cfg.endpoint(), "tcp://127.0.0.1:5555");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host of the broker's client-facing (ROUTER) socket.
    pub broker_host: String,
    /// Port of the broker's client-facing (ROUTER) socket.
    pub port_in: u16,
    /// How long to wait for a reply before giving up.
    ///
    /// Neither the broker nor the worker has a deadline of its own, so
    /// without one a client whose request was lost would wait forever.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(broker_host: impl Into<String>, port_in: u16) -> Self {
        Self {
            broker_host: broker_host.into(),
            port_in,
            ..Self::default()
        }
    }

    /// ZeroMQ endpoint the REQ socket connects to.
    pub fn endpoint(&self) -> String {
        format!("tcp://{}:{}", self.broker_host, self.port_in)
    }
}

impl Default for ClientConfig {
    /// | Field           | Default       |
    /// |-----------------|---------------|
    /// | broker_host     | `127.0.0.1`   |
    /// | port_in         | `5555`        |
    /// | request_timeout | 30 seconds    |
    fn default() -> Self {
        Self {
            broker_host: "127.0.0.1".to_string(),
            port_in: 5555,
            request_timeout: Duration::from_secs(30),
        }
    }
}
