//! Vision-Dispatch client entry point.
//!
//! Reads a raw pixel buffer from disk, sends it through the broker, and
//! prints the predictions, one `label<TAB>score` line per row.
//!
//! # Usage
//!
//! ```text
//! vision-client --port-in <PORT> --image <FILE> --shape <H_W_C> [--host <HOST>]
//!
//! Options:
//!   --port-in <PORT>   Broker ROUTER port                 [env: VISION_CLIENT_PORT_IN]
//!   --host    <HOST>   Broker host                        [default: 127.0.0.1]
//!   --image   <FILE>   Raw row-major HWC, 8 bits/channel
//!   --shape   <H_W_C>  Image dimensions, e.g. 480_640_3
//!   --timeout <SECS>   Reply deadline in seconds          [default: 30]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vision_client::{
    application::{render_table, ClassifyRequest},
    domain::ClientConfig,
    infrastructure::ClassifyClient,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Sends one image to a Vision-Dispatch broker and prints the predictions.
#[derive(Debug, Parser)]
#[command(
    name = "vision-client",
    about = "Classifies one raw image through a Vision-Dispatch broker",
    version
)]
struct Cli {
    /// Broker port for client connections (the broker's --port-in).
    #[arg(long, env = "VISION_CLIENT_PORT_IN")]
    port_in: u16,

    /// Broker host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// File holding the raw pixel buffer.
    #[arg(long)]
    image: PathBuf,

    /// Image shape as <height>_<width>_<channels>.
    #[arg(long)]
    shape: String,

    /// Seconds to wait for the reply.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            broker_host: self.host.clone(),
            port_in: self.port_in,
            request_timeout: Duration::from_secs(self.timeout),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.client_config();

    let image = std::fs::read(&cli.image)
        .with_context(|| format!("failed to read image {}", cli.image.display()))?;
    let request =
        ClassifyRequest::from_descriptor(image, &cli.shape).context("refusing to send request")?;
    info!("sending {} frame to {}", request.shape(), config.endpoint());

    let mut client = ClassifyClient::connect(&config)
        .await
        .context("failed to connect to broker")?;
    let table = client.classify(request).await.context("request failed")?;

    print!("{}", render_table(&table));
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_required_flags_with_defaults() {
        let cli = Cli::parse_from([
            "vision-client",
            "--port-in",
            "5555",
            "--image",
            "frame.raw",
            "--shape",
            "2_2_3",
        ]);
        let config = cli.client_config();
        assert_eq!(config.endpoint(), "tcp://127.0.0.1:5555");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(cli.shape, "2_2_3");
    }

    #[test]
    fn test_cli_accepts_host_and_timeout() {
        let cli = Cli::parse_from([
            "vision-client",
            "--port-in",
            "6000",
            "--host",
            "gpu-box",
            "--image",
            "x.raw",
            "--shape",
            "1_1_1",
            "--timeout",
            "5",
        ]);
        let config = cli.client_config();
        assert_eq!(config.endpoint(), "tcp://gpu-box:6000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cli_requires_image_and_shape() {
        assert!(Cli::try_parse_from(["vision-client", "--port-in", "1", "--shape", "1_1_1"]).is_err());
        assert!(Cli::try_parse_from(["vision-client", "--port-in", "1", "--image", "a"]).is_err());
    }
}
