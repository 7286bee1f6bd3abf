//! Domain types shared by every Vision-Dispatch process.
//!
//! - **`frame`** – [`frame::ShapeDescriptor`], the dense [`frame::Frame`]
//!   buffer, and the [`frame::DecodedFrame`] sentinel for "nothing to
//!   classify".
//! - **`results`** – classifier output: [`results::ResultRow`],
//!   [`results::ResultSet`], and the client-side [`results::ResultTable`].

pub mod frame;
pub mod results;
