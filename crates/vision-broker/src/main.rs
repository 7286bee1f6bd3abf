//! Vision-Dispatch broker entry point.
//!
//! Binds a client-facing ROUTER socket and a worker-facing DEALER socket and
//! relays messages between them forever.
//!
//! # Usage
//!
//! ```text
//! vision-broker --port-in <PORT> --port-out <PORT>
//!
//! Options:
//!   --port-in  <PORT>   Port for client connections (ROUTER)  [env: VISION_BROKER_PORT_IN]
//!   --port-out <PORT>   Port for worker connections (DEALER)  [env: VISION_BROKER_PORT_OUT]
//! ```
//!
//! Both sockets bind on every interface.  Log verbosity follows `RUST_LOG`
//! (default `info`; `debug` logs every forwarded message).
//!
//! The process has no graceful shutdown: Ctrl-C terminates it immediately.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vision_broker::infrastructure::{Broker, BrokerConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// ROUTER/DEALER proxy between classification clients and workers.
#[derive(Debug, Parser)]
#[command(
    name = "vision-broker",
    about = "Forwards classification requests from clients to workers",
    version
)]
struct Cli {
    /// Port for incoming client connections (ROUTER socket).
    #[arg(long, env = "VISION_BROKER_PORT_IN")]
    port_in: u16,

    /// Port for outgoing worker connections (DEALER socket).
    #[arg(long, env = "VISION_BROKER_PORT_OUT")]
    port_out: u16,
}

impl Cli {
    fn into_broker_config(self) -> BrokerConfig {
        BrokerConfig::new(self.port_in, self.port_out)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_broker_config();

    let broker = Broker::bind(&config)
        .await
        .context("failed to bind broker sockets")?;

    info!(
        "proxy initialized: ROUTER bound to port {}, DEALER bound to port {}",
        config.frontend_port, config.backend_port
    );

    // `run` only comes back with an error; there is no `Ok` to handle.
    match broker.run().await.context("broker stopped")? {}
}

// ── Tests ─────────────────────────────────────────────────────────────────────
