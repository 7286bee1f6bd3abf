//! Infrastructure layer for the broker.
//!
//! - **`config`** – [`config::BrokerConfig`]: which ports to bind and on which
//!   interface.
//! - **`proxy`** – [`proxy::Broker`]: binds the ROUTER and DEALER sockets and
//!   relays messages between them until the process dies.

pub mod config;
pub mod proxy;

pub use config::BrokerConfig;
pub use proxy::{Broker, BrokerError};
