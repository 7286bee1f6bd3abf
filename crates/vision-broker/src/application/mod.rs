//! Application layer for the broker.
//!
//! - **`forward`** – The direction of each relayed message and the running
//!   counters the forwarder logs.  Kept free of sockets so it can be tested
//!   without a network.

pub mod forward;

pub use forward::{Direction, ForwardStats};
