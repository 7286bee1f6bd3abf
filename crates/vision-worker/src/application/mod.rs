//! Application layer use cases for the worker.
//!
//! - **`serve_requests`** – The Worker Loop.  Receives a request through a
//!   [`serve_requests::RequestChannel`], decodes it, calls the injected
//!   [`serve_requests::Classifier`], and replies exactly once.  Both seams
//!   are traits, so the whole state machine runs in tests without a socket
//!   or a model.

pub mod serve_requests;

pub use serve_requests::{
    ClassifyError, Classifier, RequestChannel, ServeRequestsUseCase, TransportError, WorkerState,
    WorkerStats,
};
