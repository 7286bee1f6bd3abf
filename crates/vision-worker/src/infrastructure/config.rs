//! Worker runtime configuration.
//!
//! Built from command-line flags in `main.rs`.  There is no configuration
//! file for the worker itself; the model directory carries its own
//! `model.toml`.

use crate::infrastructure::classifier::ModelSpec;

/// Host the worker connects to.  The broker is expected on the same machine.
pub const DEFAULT_BROKER_HOST: &str = "127.0.0.1";

/// Everything the worker needs to start serving.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Host of the broker's worker-facing (DEALER) socket.
    pub broker_host: String,
    /// Port of the broker's worker-facing (DEALER) socket.
    pub port_out: u16,
    /// Model location and target device.
    pub model: ModelSpec,
}

impl WorkerConfig {
    /// Creates a config that connects to the broker on loopback.
    pub fn new(port_out: u16, model: ModelSpec) -> Self {
        Self {
            broker_host: DEFAULT_BROKER_HOST.to_string(),
            port_out,
            model,
        }
    }

    /// ZeroMQ endpoint the REP socket connects to.
    pub fn broker_endpoint(&self) -> String {
        format!("tcp://{}:{}", self.broker_host, self.port_out)
    }
}

impl Default for WorkerConfig {
    /// Loopback broker on the conventional worker port `5556`, default model.
    fn default() -> Self {
        Self::new(5556, ModelSpec::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_conventional_port() {
        assert_eq!(WorkerConfig::default().broker_endpoint(), "tcp://127.0.0.1:5556");
    }

    #[test]
    fn test_new_connects_to_loopback() {
        let config = WorkerConfig::new(5556, ModelSpec::default());
        assert_eq!(config.broker_host, "127.0.0.1");
        assert_eq!(config.broker_endpoint(), "tcp://127.0.0.1:5556");
    }

    #[test]
    fn test_broker_endpoint_uses_custom_host() {
        let mut config = WorkerConfig::new(7001, ModelSpec::default());
        config.broker_host = "broker.internal".to_string();
        assert_eq!(config.broker_endpoint(), "tcp://broker.internal:7001");
    }
}
