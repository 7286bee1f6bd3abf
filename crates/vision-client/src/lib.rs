//! vision-client library crate.
//!
//! A thin request/reply client for the Vision-Dispatch broker.
//!
//! # Architecture
//!
//! ```text
//! vision-client CLI / tests
//!         ↓
//! [vision-client]
//!   ├── domain/           ClientConfig
//!   ├── application/      request preparation, result rendering
//!   └── infrastructure/   ClassifyClient (ZeroMQ REQ socket)
//!         ↓
//! broker ROUTER → DEALER → worker REP
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `vision-core` only.
//! - `infrastructure` owns the socket.

/// Domain layer: plain configuration types.
pub mod domain;

/// Application layer: request validation and output formatting.
pub mod application;

/// Infrastructure layer: the REQ socket client.
pub mod infrastructure;
