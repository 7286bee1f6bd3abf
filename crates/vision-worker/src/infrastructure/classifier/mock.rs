//! Scripted classifier for tests.
//!
//! # Why a fake classifier?
//!
//! A real model needs weight files, maybe a GPU, and produces scores that
//! are awkward to assert on.  `FakeClassifier` returns exactly what the test
//! tells it to and records the shape of every frame it was asked about, so
//! tests can check both *what* the worker replied and *whether* inference
//! ran at all.
//!
//! # Usage in tests
//!
//! ```ignore
//! let classifier = Arc::new(FakeClassifier::returning([(3, 0.91), (7, 0.05)]));
//! let mut use_case = ServeRequestsUseCase::new(classifier.clone());
//!
//! use_case.handle_request(&segments);
//!
//! assert_eq!(classifier.call_count(), 1);
//! ```

use std::sync::{Mutex, PoisonError};

use vision_core::{Frame, ResultSet, ShapeDescriptor};

use crate::application::serve_requests::{ClassifyError, Classifier};

/// What the fake does when called.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Return these rows for every frame.
    Return(ResultSet),
    /// Fail every frame with [`ClassifyError::Inference`].
    Fail(String),
    /// Panic with this message.
    Panic(String),
}

/// A classifier that follows a script and records its inputs.
#[derive(Debug)]
pub struct FakeClassifier {
    behavior: FakeBehavior,
    /// Shape of every frame passed to `classify`, in call order.
    pub calls: Mutex<Vec<ShapeDescriptor>>,
}

impl FakeClassifier {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always returns `rows`, in the given order.
    pub fn returning<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        Self::new(FakeBehavior::Return(rows.into_iter().collect()))
    }

    /// Always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(FakeBehavior::Fail(message.into()))
    }

    /// Always panics with `message`.
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::new(FakeBehavior::Panic(message.into()))
    }

    /// Number of frames classified so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Classifier for FakeClassifier {
    fn classify(&self, frame: &Frame) -> Result<ResultSet, ClassifyError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.shape());

        match &self.behavior {
            FakeBehavior::Return(results) => Ok(results.clone()),
            FakeBehavior::Fail(message) => Err(ClassifyError::Inference(message.clone())),
            FakeBehavior::Panic(message) => panic!("{message}"),
        }
    }
}
