//! Classifier backends and the startup loader.
//!
//! The worker is told *where* the model lives (`--model-path`) and *which*
//! device to run it on (`--device-name`, `--device-id`).  [`load_classifier`]
//! turns that into a ready [`Classifier`] or a [`ModelLoadError`], which the
//! entry point treats as fatal: a worker without a model never connects.
//!
//! Backends:
//!
//! - [`prototype::PrototypeClassifier`] – nearest-prototype classifier read
//!   from `<model-path>/model.toml`.
//! - [`mock::FakeClassifier`] – scripted results for tests.

pub mod mock;
pub mod prototype;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::application::serve_requests::Classifier;
use prototype::PrototypeClassifier;

pub const DEFAULT_MODEL_PATH: &str = "/home/src/mmdeploy_model";
pub const DEFAULT_DEVICE_NAME: &str = "cuda";
pub const DEFAULT_DEVICE_ID: u32 = 0;

/// Errors that prevent a model from being loaded.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("unsupported device '{0}' (expected 'cpu' or 'cuda')")]
    UnsupportedDevice(String),

    #[error("model not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error reading model at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid model manifest: {0}")]
    Invalid(String),
}

// ── Device selection ──────────────────────────────────────────────────────────

/// Kind of compute device requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Cuda,
}

impl FromStr for DeviceKind {
    type Err = ModelLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            _ => Err(ModelLoadError::UnsupportedDevice(s.to_string())),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda => f.write_str("cuda"),
        }
    }
}

/// A device kind plus its ordinal, e.g. `cuda:0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub kind: DeviceKind,
    pub id: u32,
}

impl Device {
    /// Parses a device name and pairs it with `id`.
    ///
    /// # Errors
    ///
    /// [`ModelLoadError::UnsupportedDevice`] for anything other than `cpu` or
    /// `cuda` (case-insensitive).
    pub fn parse(name: &str, id: u32) -> Result<Self, ModelLoadError> {
        Ok(Self {
            kind: name.parse()?,
            id,
        })
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ── Model spec and loader ─────────────────────────────────────────────────────

/// Where to find the model and which device to put it on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model_path: PathBuf,
    pub device_name: String,
    pub device_id: u32,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            device_id: DEFAULT_DEVICE_ID,
        }
    }
}

/// Loads the classifier described by `spec`.
///
/// # Errors
///
/// Any [`ModelLoadError`]: unknown device, missing or unreadable model,
/// malformed manifest.
pub fn load_classifier(spec: &ModelSpec) -> Result<Arc<dyn Classifier>, ModelLoadError> {
    let device = Device::parse(&spec.device_name, spec.device_id)?;
    let classifier = PrototypeClassifier::load(&spec.model_path, device)?;
    Ok(Arc::new(classifier))
}
