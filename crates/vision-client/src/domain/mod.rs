//! Domain types for the client.

pub mod config;

pub use config::ClientConfig;
