//! Request preparation and result rendering.
//!
//! The worker answers a malformed request with an empty table, exactly as it
//! answers an image it could not classify.  From the client's side those
//! are indistinguishable, so [`ClassifyRequest`] catches the mistakes it
//! can (unparseable shape, wrong buffer length) *before* anything is sent.

use bytes::Bytes;
use thiserror::Error;

use vision_core::protocol::parse_shape_descriptor;
use vision_core::{encode_request, DecodeError, FrameError, ResultTable, ShapeDescriptor};

/// Why a request was refused locally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid shape: {0}")]
    Shape(#[from] DecodeError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A validated image plus its shape, ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyRequest {
    image: Bytes,
    shape: ShapeDescriptor,
}

impl ClassifyRequest {
    /// Pairs `image` with `shape`.
    ///
    /// Zero-area shapes are accepted with any buffer: they are the protocol's
    /// "nothing to classify" signal.
    ///
    /// # Errors
    ///
    /// [`RequestError::Frame`] when the buffer length does not match the
    /// shape.
    pub fn new(image: impl Into<Bytes>, shape: ShapeDescriptor) -> Result<Self, RequestError> {
        let image = image.into();
        if !shape.is_empty_frame() {
            let expected = shape.byte_len().ok_or(FrameError::TooLarge(shape))?;
            if image.len() != expected {
                return Err(FrameError::LengthMismatch {
                    shape,
                    expected,
                    actual: image.len(),
                }
                .into());
            }
        }
        Ok(Self { image, shape })
    }

    /// Like [`new`](Self::new) but takes the textual `"<h>_<w>_<c>"` form.
    pub fn from_descriptor(
        image: impl Into<Bytes>,
        descriptor: &str,
    ) -> Result<Self, RequestError> {
        let shape = parse_shape_descriptor(descriptor.as_bytes())?;
        Self::new(image, shape)
    }

    pub fn shape(&self) -> ShapeDescriptor {
        self.shape
    }

    /// The two request segments: `[image_bytes, shape_descriptor]`.
    pub fn into_segments(self) -> [Bytes; 2] {
        encode_request(self.image, &self.shape)
    }
}

/// Formats a table as one `label<TAB>score` line per row.
pub fn render_table(table: &ResultTable) -> String {
    if table.is_empty() {
        return "no predictions\n".to_string();
    }

    // Labels travel as f64 but are integer-valued.
    table
        .rows()
        .iter()
        .map(|[label, score]| format!("{}\t{score:.6}\n", *label as i64))
        .collect()
}
