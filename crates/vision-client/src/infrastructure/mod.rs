//! Infrastructure layer for the client.
//!
//! - **`connection`** – [`ClassifyClient`], a ZeroMQ REQ socket connected to
//!   the broker's client-facing port.

pub mod connection;

pub use connection::{ClassifyClient, ClientError};
