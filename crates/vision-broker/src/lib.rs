//! vision-broker library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the broker do? (for beginners)
//!
//! Clients and workers never know each other's addresses.  Both sides know
//! only the broker:
//!
//! - Clients connect REQ sockets to the broker's **ROUTER** (client-facing)
//!   endpoint.  The ROUTER tags every incoming request with an identity frame
//!   so the reply can find its way back.
//! - Workers connect REP sockets to the broker's **DEALER** (worker-facing)
//!   endpoint.  The DEALER hands requests out to connected workers in turn.
//!
//! The broker copies every message it receives on one socket to the other
//! socket, byte for byte, and that is all it does.  It never decodes an
//! image or a result.

/// Application layer: forwarding bookkeeping.
pub mod application;

/// Infrastructure layer: configuration and the ZeroMQ forwarder.
pub mod infrastructure;
