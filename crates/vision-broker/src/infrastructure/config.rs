//! Broker configuration.
//!
//! [`BrokerConfig`] is a plain struct populated by `main.rs` from the command
//! line.  Tests build it directly, usually with port `0` so the OS picks a
//! free port.

/// Ports and interface the broker binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Host part of both bind endpoints.  `0.0.0.0` listens on every
    /// interface (ZeroMQ's `*`).
    pub bind_host: String,
    /// Client-facing ROUTER port.
    pub frontend_port: u16,
    /// Worker-facing DEALER port.
    pub backend_port: u16,
}

impl BrokerConfig {
    /// Builds a config listening on every interface.
    pub fn new(frontend_port: u16, backend_port: u16) -> Self {
        Self {
            frontend_port,
            backend_port,
            ..Self::default()
        }
    }

    /// `tcp://<host>:<frontend_port>`
    pub fn frontend_endpoint(&self) -> String {
        tcp_endpoint(&self.bind_host, self.frontend_port)
    }

    /// `tcp://<host>:<backend_port>`
    pub fn backend_endpoint(&self) -> String {
        tcp_endpoint(&self.bind_host, self.backend_port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            frontend_port: 5555,
            backend_port: 5556,
        }
    }
}

fn tcp_endpoint(host: &str, port: u16) -> String {
    format!("tcp://{host}:{port}")
}
