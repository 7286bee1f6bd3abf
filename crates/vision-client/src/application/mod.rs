//! Application layer for the client.
//!
//! - **`prepare`** – validates an image buffer against its declared shape
//!   and renders decoded result tables for humans.

pub mod prepare;

pub use prepare::{render_table, ClassifyRequest, RequestError};
