//! Protocol module containing wire constants and the frame/table codec.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_frame, decode_request, decode_result_table, encode_request, encode_result_set,
    format_shape_descriptor, parse_shape_descriptor, DecodeError, TableError,
};
pub use messages::*;
