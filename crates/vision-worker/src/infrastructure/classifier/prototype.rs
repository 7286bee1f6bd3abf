//! Nearest-prototype classifier loaded from a TOML manifest.
//!
//! # How it classifies (for beginners)
//!
//! Each class is described by a *prototype*: the average value of every
//! colour channel for a typical image of that class.  To classify a frame:
//!
//! 1. Average each channel over all pixels → one number per channel.
//! 2. Measure the Euclidean distance from that vector to every prototype.
//! 3. Turn distances into scores with a softmax over `-distance /
//!    temperature`.  Closer prototypes get higher scores; scores sum to 1.
//! 4. Sort by score, highest first, and keep the best `top_k`.
//!
//! # Manifest format
//!
//! `--model-path` may point at the manifest file itself or at a directory
//! containing `model.toml`:
//!
//! ```toml
//! top_k = 5            # optional, default 5
//! temperature = 32.0   # optional, default 32.0
//!
//! [[classes]]
//! label = 3
//! prototype = [200.0, 40.0, 40.0]
//!
//! [[classes]]
//! label = 7
//! prototype = [40.0, 200.0, 40.0]
//! ```
//!
//! Every prototype must have the same length, and incoming frames must have
//! that many channels.

use std::fs;
use std::path::Path;

use ndarray::Axis;
use serde::Deserialize;
use tracing::info;

use vision_core::{Frame, ResultRow, ResultSet};

use super::{Device, DeviceKind, ModelLoadError};
use crate::application::serve_requests::{ClassifyError, Classifier};

/// File name looked up when `--model-path` is a directory.
pub const MANIFEST_FILE: &str = "model.toml";

fn default_top_k() -> usize {
    5
}

fn default_temperature() -> f64 {
    32.0
}

// ── Manifest schema ───────────────────────────────────────────────────────────

/// Parsed `model.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelManifest {
    /// Maximum number of rows returned per frame.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Softmax temperature, in channel-value units.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub classes: Vec<ClassPrototype>,
}

/// One class and its per-channel mean.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClassPrototype {
    pub label: i64,
    pub prototype: Vec<f64>,
}

impl ModelManifest {
    /// Parses and validates manifest text.
    pub fn from_toml_str(text: &str) -> Result<Self, ModelLoadError> {
        let manifest: Self = toml::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Number of channels every prototype (and every frame) must have.
    pub fn channels(&self) -> usize {
        self.classes.first().map_or(0, |c| c.prototype.len())
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.classes.is_empty() {
            return Err(ModelLoadError::Invalid("no classes defined".to_string()));
        }
        if self.top_k == 0 {
            return Err(ModelLoadError::Invalid("top_k must be at least 1".to_string()));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(ModelLoadError::Invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }

        let channels = self.channels();
        if channels == 0 {
            return Err(ModelLoadError::Invalid("prototypes must not be empty".to_string()));
        }
        if let Some(class) = self.classes.iter().find(|c| c.prototype.len() != channels) {
            return Err(ModelLoadError::Invalid(format!(
                "class {} has {} prototype values, expected {channels}",
                class.label,
                class.prototype.len()
            )));
        }
        Ok(())
    }
}

// ── Classifier ────────────────────────────────────────────────────────────────

/// Scores frames against per-class channel-mean prototypes.
#[derive(Debug, Clone)]
pub struct PrototypeClassifier {
    manifest: ModelManifest,
    device: Device,
}

impl PrototypeClassifier {
    /// Builds a classifier from an already parsed manifest.
    pub fn new(manifest: ModelManifest, device: Device) -> Result<Self, ModelLoadError> {
        manifest.validate()?;
        Ok(Self { manifest, device })
    }

    /// Reads the manifest at `path` (a file, or a directory holding
    /// [`MANIFEST_FILE`]).
    pub fn load(path: &Path, device: Device) -> Result<Self, ModelLoadError> {
        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        if !manifest_path.is_file() {
            return Err(ModelLoadError::NotFound(manifest_path));
        }

        let text = fs::read_to_string(&manifest_path).map_err(|source| ModelLoadError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest = ModelManifest::from_toml_str(&text)?;

        if device.kind == DeviceKind::Cuda {
            info!("prototype backend computes on the host; {device} is not used");
        }
        info!(
            "loaded {} classes ({} channels, top_k={}) from {}",
            manifest.classes.len(),
            manifest.channels(),
            manifest.top_k,
            manifest_path.display()
        );

        Self::new(manifest, device)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }
}

impl Classifier for PrototypeClassifier {
    fn classify(&self, frame: &Frame) -> Result<ResultSet, ClassifyError> {
        let channels = self.manifest.channels();
        if frame.channels() != channels {
            return Err(ClassifyError::IncompatibleFrame(format!(
                "expected {channels} channels, got {}",
                frame.channels()
            )));
        }

        let means = channel_means(frame);
        let logits: Vec<f64> = self
            .manifest
            .classes
            .iter()
            .map(|class| -euclidean(&means, &class.prototype) / self.manifest.temperature)
            .collect();
        let scores = softmax(&logits);

        let mut ranked: Vec<ResultRow> = self
            .manifest
            .classes
            .iter()
            .zip(scores)
            .map(|(class, score)| ResultRow::new(class.label, score))
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.manifest.top_k);

        Ok(ranked.into())
    }
}

/// Mean value of each channel over all pixels.
fn channel_means(frame: &Frame) -> Vec<f64> {
    let area = (frame.height() * frame.width()) as f64;
    frame
        .pixels()
        .mapv(f64::from)
        .sum_axis(Axis(0))
        .sum_axis(Axis(0))
        .iter()
        .map(|sum| sum / area)
        .collect()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
