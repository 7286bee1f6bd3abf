//! # vision-core
//!
//! Shared library for Vision-Dispatch containing the request/response wire
//! codec and the domain types that travel through it.
//!
//! This crate is used by the worker and the client.  The broker does not
//! depend on it at all: it forwards frames without ever looking inside them.
//! It has zero dependencies on sockets, async runtimes, or model runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! Vision-Dispatch spreads image-classification requests from many clients
//! across one or more worker processes.  A client never talks to a worker
//! directly; it talks to a *broker* that hands each request to the next free
//! worker and routes the reply back to whoever asked.
//!
//! ```text
//! client (REQ) ─▶ broker ROUTER │ broker DEALER ─▶ worker (REP)
//!              ◀─               │               ◀─
//! ```
//!
//! This crate (`vision-core`) is the shared vocabulary.  It defines:
//!
//! - **`domain`** – The things being exchanged: a decoded image [`Frame`]
//!   with its [`ShapeDescriptor`], and the [`ResultSet`] of `(label, score)`
//!   rows a classifier produces.
//!
//! - **`protocol`** – How those things become bytes.  A request is two
//!   segments (raw pixels + a `"<h>_<w>_<c>"` shape string); a reply is one
//!   segment holding a two-column numeric table.

pub mod domain;
pub mod protocol;

pub use domain::frame::{DecodedFrame, Frame, FrameError, ShapeDescriptor};
pub use domain::results::{ResultRow, ResultSet, ResultTable};
pub use protocol::codec::{
    decode_frame, decode_request, decode_result_table, encode_request, encode_result_set,
    DecodeError, TableError,
};
