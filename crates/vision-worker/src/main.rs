//! Vision-Dispatch worker entry point.
//!
//! Loads the classification model, connects a REP socket to the broker's
//! worker-facing port, and serves requests until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! vision-worker --port-out <PORT> [--model-path <DIR>] [--device-name <NAME>] [--device-id <N>]
//!
//! Options:
//!   --port-out    <PORT>  Broker DEALER port to connect to   [env: VISION_WORKER_PORT_OUT]
//!   --model-path  <DIR>   Model directory or manifest file    [default: /home/src/mmdeploy_model]
//!   --device-name <NAME>  cpu | cuda                          [default: cuda]
//!   --device-id   <N>     Device ordinal                      [default: 0]
//! ```
//!
//! Startup order matters: a model that fails to load stops the process
//! before it ever connects, so the broker never routes to a worker that
//! cannot answer.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vision_worker::{
    application::ServeRequestsUseCase,
    infrastructure::{
        classifier::{DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, DEFAULT_MODEL_PATH},
        load_classifier, ModelSpec, RepChannel, WorkerConfig,
    },
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Classification worker attached to a Vision-Dispatch broker.
#[derive(Debug, Parser)]
#[command(
    name = "vision-worker",
    about = "Serves image classification requests from a broker",
    version
)]
struct Cli {
    /// Broker port for worker connections (the broker's --port-out).
    #[arg(long, env = "VISION_WORKER_PORT_OUT")]
    port_out: u16,

    /// Model directory (containing model.toml) or manifest path.
    #[arg(long, env = "VISION_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Compute device: cpu or cuda.
    #[arg(long, env = "VISION_DEVICE_NAME", default_value = DEFAULT_DEVICE_NAME)]
    device_name: String,

    /// Device ordinal.
    #[arg(long, env = "VISION_DEVICE_ID", default_value_t = DEFAULT_DEVICE_ID)]
    device_id: u32,
}

impl Cli {
    fn into_worker_config(self) -> WorkerConfig {
        WorkerConfig::new(
            self.port_out,
            ModelSpec {
                model_path: self.model_path,
                device_name: self.device_name,
                device_id: self.device_id,
            },
        )
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

    let config = Cli::parse().into_worker_config();

    info!(
        "loading model from {} on {}:{}",
        config.model.model_path.display(),
        config.model.device_name,
        config.model.device_id
    );
    let classifier = load_classifier(&config.model).context("error loading model")?;
    info!("model loaded successfully");

    let endpoint = config.broker_endpoint();
    let mut channel = RepChannel::connect(&endpoint)
        .await
        .context("failed to connect to broker")?;
    info!("worker connected to {}", channel.endpoint());
    info!("classifier deployment server started");

    let mut use_case = ServeRequestsUseCase::new(classifier);
    use_case.run_until(&mut channel, interrupted()).await;

    let stats = use_case.stats();
    info!(
        requests = stats.requests,
        inferences = stats.inferences,
        empty_replies = stats.empty_replies,
        decode_failures = stats.decode_failures,
        classifier_failures = stats.classifier_failures,
        "worker stopped"
    );
    Ok(())
}

/// Completes on Ctrl-C.  If the handler cannot be installed, never completes.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_for_model_and_device() {
        let cli = Cli::parse_from(["vision-worker", "--port-out", "5556"]);
        assert_eq!(cli.port_out, 5556);
        assert_eq!(cli.model_path, PathBuf::from("/home/src/mmdeploy_model"));
        assert_eq!(cli.device_name, "cuda");
        assert_eq!(cli.device_id, 0);
    }

    #[test]
    fn test_cli_accepts_all_flags() {
        let cli = Cli::parse_from([
            "vision-worker",
            "--port-out",
            "6000",
            "--model-path",
            "/models/resnet",
            "--device-name",
            "cpu",
            "--device-id",
            "2",
        ]);
        assert_eq!(cli.model_path, PathBuf::from("/models/resnet"));
        assert_eq!(cli.device_name, "cpu");
        assert_eq!(cli.device_id, 2);
    }

    #[test]
    fn test_cli_requires_port_out() {
        let result = Cli::try_parse_from(["vision-worker"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_worker_config_targets_loopback_broker() {
        let cli = Cli::parse_from(["vision-worker", "--port-out", "5556", "--device-id", "1"]);
        let config = cli.into_worker_config();
        assert_eq!(config.broker_endpoint(), "tcp://127.0.0.1:5556");
        assert_eq!(config.model.device_id, 1);
    }
}
