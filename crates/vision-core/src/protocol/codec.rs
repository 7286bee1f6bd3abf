//! Codec for Vision-Dispatch requests and replies.
//!
//! Request (client → worker), two segments:
//! ```text
//! [image_bytes: H*W*C bytes] ["<H>_<W>_<C>" as UTF-8]
//! ```
//!
//! Reply (worker → client), one segment:
//! ```text
//! [rows:u32 LE][cols:u32 LE = 2][rows*2 × f64 LE]
//! ```
//!
//! A reply with zero rows is exactly the 8-byte header and means
//! "no prediction".  It is never an absent payload.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::trace;

use crate::domain::frame::{DecodedFrame, Frame, FrameError, ShapeDescriptor};
use crate::domain::results::{ResultSet, ResultTable};
use crate::protocol::messages::{
    IMAGE_SEGMENT_INDEX, REQUEST_SEGMENT_COUNT, SHAPE_DELIMITER, SHAPE_DIMENSIONS,
    SHAPE_SEGMENT_INDEX, TABLE_CELL_SIZE, TABLE_COLUMNS, TABLE_HEADER_SIZE,
};

/// Errors raised while decoding a request into a [`DecodedFrame`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The request did not carry exactly two segments.
    #[error("expected {expected} segments, got {found}")]
    SegmentCount { expected: usize, found: usize },

    /// The shape descriptor is not valid UTF-8.
    #[error("shape descriptor is not valid UTF-8")]
    InvalidUtf8,

    /// The shape descriptor did not split into three components.
    #[error("shape descriptor has {found} component(s), expected 3")]
    ComponentCount { found: usize },

    /// A component is not an integer.
    #[error("shape component {0:?} is not an integer")]
    InvalidDimension(String),

    /// A component is a negative integer.
    #[error("shape component {0} is negative")]
    NegativeDimension(i64),

    /// The pixel buffer does not match the declared shape.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Errors raised while decoding a reply into a [`ResultTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// Fewer bytes than the table header.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The header declares a column count other than 2.
    #[error("unexpected column count: {0}")]
    UnexpectedColumns(u32),

    /// The body length does not match `rows * cols * 8`.
    #[error("table body length mismatch: header implies {declared} bytes, got {available}")]
    LengthMismatch { declared: usize, available: usize },
}

// ── Shape descriptor ──────────────────────────────────────────────────────────

/// Parses `"<height>_<width>_<channels>"`.
///
/// Surrounding ASCII whitespace and a leading `+` are accepted on each
/// component.  Negative components are rejected.
///
/// # Errors
///
/// Returns [`DecodeError`] for non-UTF-8 input, a component count other than
/// three, a non-integer component, or a negative component.
///
/// # Examples
///
/// ```rust
/// use vision_core::protocol::parse_shape_descriptor;
/// use vision_core::ShapeDescriptor;
///
/// let shape = parse_shape_descriptor(b"480_640_3").unwrap();
/// assert_eq!(shape, ShapeDescriptor::new(480, 640, 3));
/// ```
pub fn parse_shape_descriptor(raw: &[u8]) -> Result<ShapeDescriptor, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;

    let components: Vec<&str> = text.split(SHAPE_DELIMITER).collect();
    if components.len() != SHAPE_DIMENSIONS {
        return Err(DecodeError::ComponentCount {
            found: components.len(),
        });
    }

    let mut dims = [0usize; SHAPE_DIMENSIONS];
    for (slot, component) in dims.iter_mut().zip(&components) {
        *slot = parse_dimension(component)?;
    }

    Ok(ShapeDescriptor::new(dims[0], dims[1], dims[2]))
}

/// Formats a shape as `"<height>_<width>_<channels>"`.
pub fn format_shape_descriptor(shape: &ShapeDescriptor) -> String {
    format!(
        "{h}{d}{w}{d}{c}",
        h = shape.height,
        w = shape.width,
        c = shape.channels,
        d = SHAPE_DELIMITER
    )
}

fn parse_dimension(component: &str) -> Result<usize, DecodeError> {
    let trimmed = component.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| DecodeError::InvalidDimension(component.to_string()))?;
    if value < 0 {
        return Err(DecodeError::NegativeDimension(value));
    }
    usize::try_from(value).map_err(|_| DecodeError::InvalidDimension(component.to_string()))
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Decodes the two request segments into a frame.
///
/// Returns [`DecodedFrame::Empty`] when `height * width == 0`, whatever the
/// pixel segment contains.
///
/// # Errors
///
/// Returns [`DecodeError`] if the descriptor is malformed or the buffer
/// length does not match it.  No partially built frame is ever returned.
///
/// # Examples
///
/// ```rust
/// use vision_core::{decode_frame, DecodedFrame};
///
/// let decoded = decode_frame(&[0u8; 12], b"2_2_3").unwrap();
/// assert!(matches!(decoded, DecodedFrame::Image(_)));
///
/// assert_eq!(decode_frame(b"", b"0_0_3").unwrap(), DecodedFrame::Empty);
/// ```
pub fn decode_frame(image_bytes: &[u8], shape_descriptor: &[u8]) -> Result<DecodedFrame, DecodeError> {
    let shape = parse_shape_descriptor(shape_descriptor)?;
    if shape.is_empty_frame() {
        trace!("empty frame signal ({shape})");
        return Ok(DecodedFrame::Empty);
    }
    let frame = Frame::from_raw(shape, image_bytes.to_vec())?;
    Ok(DecodedFrame::Image(frame))
}

/// Decodes a full request: checks the segment count, then [`decode_frame`].
///
/// # Errors
///
/// Returns [`DecodeError::SegmentCount`] unless exactly two segments are
/// given, otherwise whatever [`decode_frame`] returns.
pub fn decode_request<S: AsRef<[u8]>>(segments: &[S]) -> Result<DecodedFrame, DecodeError> {
    if segments.len() != REQUEST_SEGMENT_COUNT {
        return Err(DecodeError::SegmentCount {
            expected: REQUEST_SEGMENT_COUNT,
            found: segments.len(),
        });
    }
    decode_frame(
        segments[IMAGE_SEGMENT_INDEX].as_ref(),
        segments[SHAPE_SEGMENT_INDEX].as_ref(),
    )
}

/// Builds the two request segments for an image of the given shape.
///
/// The pixel buffer is not checked against the shape; a client is free to
/// send a mismatched request and the worker will answer with an empty table.
pub fn encode_request(image_bytes: impl Into<Bytes>, shape: &ShapeDescriptor) -> [Bytes; REQUEST_SEGMENT_COUNT] {
    [
        image_bytes.into(),
        Bytes::from(format_shape_descriptor(shape)),
    ]
}

// ── Replies ───────────────────────────────────────────────────────────────────

/// Encodes a result set as a `rows × 2` table of `f64`.
///
/// # Examples
///
/// ```rust
/// use vision_core::{decode_result_table, encode_result_set, ResultSet};
///
/// let bytes = encode_result_set(&ResultSet::empty());
/// assert_eq!(bytes.len(), 8);
/// assert!(decode_result_table(&bytes).unwrap().is_empty());
/// ```
pub fn encode_result_set(results: &ResultSet) -> Bytes {
    let body_len = results.len() * TABLE_COLUMNS * TABLE_CELL_SIZE;
    let mut buf = BytesMut::with_capacity(TABLE_HEADER_SIZE + body_len);

    buf.put_u32_le(results.len() as u32);
    buf.put_u32_le(TABLE_COLUMNS as u32);
    for row in results {
        buf.put_f64_le(row.label as f64);
        buf.put_f64_le(row.score);
    }
    buf.freeze()
}

/// Decodes a reply table.
///
/// # Errors
///
/// Returns [`TableError`] if the header is truncated, declares a column
/// count other than 2, or the body length disagrees with the row count.
pub fn decode_result_table(bytes: &[u8]) -> Result<ResultTable, TableError> {
    if bytes.len() < TABLE_HEADER_SIZE {
        return Err(TableError::InsufficientData {
            needed: TABLE_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let rows = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let cols = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if cols as usize != TABLE_COLUMNS {
        return Err(TableError::UnexpectedColumns(cols));
    }

    let body = &bytes[TABLE_HEADER_SIZE..];
    let declared = rows
        .checked_mul(TABLE_COLUMNS * TABLE_CELL_SIZE)
        .ok_or(TableError::LengthMismatch {
            declared: usize::MAX,
            available: body.len(),
        })?;
    if body.len() != declared {
        return Err(TableError::LengthMismatch {
            declared,
            available: body.len(),
        });
    }

    let table = body
        .chunks_exact(TABLE_COLUMNS * TABLE_CELL_SIZE)
        .map(|row| [read_f64_le(row, 0), read_f64_le(row, TABLE_CELL_SIZE)])
        .collect();
    Ok(ResultTable::new(table))
}

fn read_f64_le(buf: &[u8], offset: usize) -> f64 {
    let mut cell = [0u8; TABLE_CELL_SIZE];
    cell.copy_from_slice(&buf[offset..offset + TABLE_CELL_SIZE]);
    f64::from_le_bytes(cell)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::results::ResultRow;

    // ── Shape descriptor ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_shape_descriptor_valid() {
        assert_eq!(
            parse_shape_descriptor(b"2_4_3"),
            Ok(ShapeDescriptor::new(2, 4, 3))
        );
    }

    #[test]
    fn test_parse_shape_descriptor_tolerates_whitespace_and_plus() {
        assert_eq!(
            parse_shape_descriptor(b" 2_+4_3\n"),
            Ok(ShapeDescriptor::new(2, 4, 3))
        );
    }

    #[test]
    fn test_parse_shape_descriptor_rejects_garbage() {
        assert_eq!(
            parse_shape_descriptor(b"abc"),
            Err(DecodeError::ComponentCount { found: 1 })
        );
    }

    #[test]
    fn test_parse_shape_descriptor_rejects_four_components() {
        assert_eq!(
            parse_shape_descriptor(b"1_2_3_4"),
            Err(DecodeError::ComponentCount { found: 4 })
        );
    }

    #[test]
    fn test_parse_shape_descriptor_rejects_non_integer_component() {
        assert_eq!(
            parse_shape_descriptor(b"2_x_3"),
            Err(DecodeError::InvalidDimension("x".to_string()))
        );
    }

    #[test]
    fn test_parse_shape_descriptor_rejects_empty_component() {
        assert!(matches!(
            parse_shape_descriptor(b"2__3"),
            Err(DecodeError::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_parse_shape_descriptor_rejects_negative_dimension() {
        assert_eq!(
            parse_shape_descriptor(b"2_-4_3"),
            Err(DecodeError::NegativeDimension(-4))
        );
    }

    #[test]
    fn test_parse_shape_descriptor_rejects_invalid_utf8() {
        assert_eq!(
            parse_shape_descriptor(&[0xFF, 0xFE, b'_']),
            Err(DecodeError::InvalidUtf8)
        );
    }

    #[test]
    fn test_format_shape_descriptor_uses_underscore() {
        assert_eq!(
            format_shape_descriptor(&ShapeDescriptor::new(480, 640, 3)),
            "480_640_3"
        );
    }

    // ── decode_frame ─────────────────────────────────────────────────────────

    #[test]
    fn test_decode_frame_builds_dense_buffer() {
        // Arrange
        let bytes: Vec<u8> = (0..12).collect();

        // Act
        let decoded = decode_frame(&bytes, b"2_2_3").unwrap();

        // Assert
        let frame = decoded.into_frame().expect("non-empty frame");
        assert_eq!(frame.shape(), ShapeDescriptor::new(2, 2, 3));
        assert_eq!(frame.to_bytes(), bytes);
    }

    #[test]
    fn test_decode_frame_zero_height_is_empty_signal() {
        assert_eq!(decode_frame(b"", b"0_0_3"), Ok(DecodedFrame::Empty));
    }

    #[test]
    fn test_decode_frame_empty_signal_ignores_buffer_content() {
        assert_eq!(
            decode_frame(b"leftover bytes", b"0_640_3"),
            Ok(DecodedFrame::Empty)
        );
    }

    #[test]
    fn test_decode_frame_length_mismatch_is_error() {
        let result = decode_frame(&[0u8; 10], b"2_2_3");
        assert!(matches!(
            result,
            Err(DecodeError::Frame(FrameError::LengthMismatch {
                expected: 12,
                actual: 10,
                ..
            }))
        ));
    }

    #[test]
    fn test_decode_frame_bad_descriptor_is_error() {
        assert!(decode_frame(&[0u8; 12], b"abc").is_err());
    }

    // ── decode_request ───────────────────────────────────────────────────────

    #[test]
    fn test_decode_request_rejects_single_segment() {
        let segments = [Bytes::from_static(b"only one")];
        assert_eq!(
            decode_request(&segments),
            Err(DecodeError::SegmentCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_decode_request_rejects_three_segments() {
        let segments = [Bytes::new(), Bytes::from_static(b"0_0_3"), Bytes::new()];
        assert!(matches!(
            decode_request(&segments),
            Err(DecodeError::SegmentCount { found: 3, .. })
        ));
    }

    #[test]
    fn test_decode_request_accepts_encode_request_output() {
        let shape = ShapeDescriptor::new(1, 2, 1);
        let segments = encode_request(vec![10u8, 20], &shape);
        let frame = decode_request(&segments).unwrap().into_frame().unwrap();
        assert_eq!(frame.to_bytes(), vec![10, 20]);
    }

    // ── Result table ─────────────────────────────────────────────────────────

    #[test]
    fn test_encode_empty_result_set_is_header_only() {
        let bytes = encode_result_set(&ResultSet::empty());
        assert_eq!(&bytes[..], &[0, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn test_encode_result_set_lays_out_label_then_score() {
        // Arrange
        let set = ResultSet::from(vec![ResultRow::new(3, 0.91)]);

        // Act
        let bytes = encode_result_set(&set);

        // Assert
        assert_eq!(bytes.len(), TABLE_HEADER_SIZE + 16);
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &3.0f64.to_le_bytes());
        assert_eq!(&bytes[16..24], &0.91f64.to_le_bytes());
    }

    #[test]
    fn test_decode_result_table_reads_rows_in_order() {
        let set = ResultSet::from(vec![ResultRow::new(3, 0.91), ResultRow::new(7, 0.05)]);
        let table = decode_result_table(&encode_result_set(&set)).unwrap();
        assert_eq!(table.rows(), &[[3.0, 0.91], [7.0, 0.05]]);
    }

    #[test]
    fn test_decode_result_table_truncated_header() {
        assert_eq!(
            decode_result_table(&[0, 0, 0]),
            Err(TableError::InsufficientData {
                needed: 8,
                available: 3
            })
        );
    }

    #[test]
    fn test_decode_result_table_wrong_column_count() {
        let mut bytes = vec![0u8; 8];
        bytes[4] = 3;
        assert_eq!(
            decode_result_table(&bytes),
            Err(TableError::UnexpectedColumns(3))
        );
    }

    #[test]
    fn test_decode_result_table_body_shorter_than_declared() {
        let mut bytes = encode_result_set(&ResultSet::from(vec![ResultRow::new(1, 0.5)])).to_vec();
        bytes.truncate(bytes.len() - 1);
        assert_eq!(
            decode_result_table(&bytes),
            Err(TableError::LengthMismatch {
                declared: 16,
                available: 15
            })
        );
    }
}
