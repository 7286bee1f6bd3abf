//! vision-worker library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the worker do? (for beginners)
//!
//! A worker is a long-running process that:
//!
//! 1. Loads a classification model once at startup (and refuses to start if
//!    that fails).
//! 2. Connects a REP socket to the broker's worker-facing endpoint.
//! 3. Waits for a request, decodes the image, runs the model, and sends back
//!    a table of `(label, score)` rows.
//! 4. Goes back to waiting.  Forever, or until Ctrl-C.
//!
//! A REP socket insists on strict receive → send → receive → send
//! alternation.  Skipping a reply, or sending two, wedges the socket and the
//! client waiting on the other end.  So every request gets exactly one reply,
//! even when decoding or inference fails: failures become an empty table.

/// Application layer: the request-handling state machine.
pub mod application;

/// Infrastructure layer: ZeroMQ transport, classifier backends, config.
pub mod infrastructure;
