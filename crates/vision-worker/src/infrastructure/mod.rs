//! Infrastructure layer for the worker.
//!
//! - **`classifier`** – model backends behind the
//!   [`Classifier`](crate::application::Classifier) trait, plus the loader
//!   that picks one from the command line.
//! - **`config`** – where the worker connects and which model it loads.
//! - **`network`** – the ZeroMQ REP socket adapter.

pub mod classifier;
pub mod config;
pub mod network;

pub use classifier::{load_classifier, Device, DeviceKind, ModelLoadError, ModelSpec};
pub use config::WorkerConfig;
pub use network::{NetworkError, RepChannel};
