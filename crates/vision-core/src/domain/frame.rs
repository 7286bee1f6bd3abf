//! Image frame types.
//!
//! A client sends pixels as a flat byte buffer together with a tiny text
//! header describing how to fold that buffer back into rows, columns and
//! channels.  This module holds the folded result.
//!
//! # Memory layout (for beginners)
//!
//! Pixels are stored *row-major, channel-last* ("HWC"), one byte per channel.
//! For a 2×2 RGB image the 12 bytes are laid out as:
//!
//! ```text
//! index:  0  1  2 | 3  4  5 | 6  7  8 | 9 10 11
//! pixel:  (0,0)   | (0,1)   | (1,0)   | (1,1)
//!         R  G  B | R  G  B | R  G  B | R  G  B
//! ```
//!
//! This is the same layout OpenCV and NumPy use for `uint8` images, so a
//! client can send `image.tobytes()` without any conversion.

use std::fmt;

use ndarray::{Array3, ArrayView3};
use thiserror::Error;

/// Errors raised while folding a byte buffer into a [`Frame`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer does not hold exactly `height * width * channels` bytes.
    #[error("buffer holds {actual} bytes but shape {shape} needs {expected}")]
    LengthMismatch {
        shape: ShapeDescriptor,
        expected: usize,
        actual: usize,
    },

    /// `height * width * channels` does not fit in `usize`.
    #[error("shape {0} is too large to address")]
    TooLarge(ShapeDescriptor),
}

/// The three dimensions of an image as declared by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeDescriptor {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ShapeDescriptor {
    /// Creates a descriptor from its three dimensions.
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Returns `true` when the descriptor announces an empty frame.
    ///
    /// Only `height` and `width` are considered: `0_0_3` and `0_640_0` are
    /// both empty, whatever the channel count says.
    pub fn is_empty_frame(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Number of bytes a buffer of this shape must contain, or `None` on
    /// overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.height
            .checked_mul(self.width)?
            .checked_mul(self.channels)
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// A dense `(height, width, channels)` array of 8-bit pixels.
///
/// A `Frame` can only be built from a buffer whose length matches its shape
/// exactly, so holding one is proof that the sender's header was honest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    /// Folds `bytes` into a frame of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::LengthMismatch`] if `bytes.len()` differs from
    /// `shape.byte_len()`, or [`FrameError::TooLarge`] if that product
    /// overflows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vision_core::{Frame, ShapeDescriptor};
    ///
    /// let frame = Frame::from_raw(ShapeDescriptor::new(2, 2, 3), vec![0u8; 12]).unwrap();
    /// assert_eq!(frame.shape(), ShapeDescriptor::new(2, 2, 3));
    /// ```
    pub fn from_raw(shape: ShapeDescriptor, bytes: Vec<u8>) -> Result<Self, FrameError> {
        let expected = shape.byte_len().ok_or(FrameError::TooLarge(shape))?;
        if bytes.len() != expected {
            return Err(FrameError::LengthMismatch {
                shape,
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = Array3::from_shape_vec((shape.height, shape.width, shape.channels), bytes)
            .map_err(|_| FrameError::TooLarge(shape))?;
        Ok(Self { pixels })
    }

    /// The frame's dimensions.
    pub fn shape(&self) -> ShapeDescriptor {
        let (height, width, channels) = self.pixels.dim();
        ShapeDescriptor::new(height, width, channels)
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    /// Borrowed view indexed as `[row, column, channel]`.
    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Copies the pixels back out in row-major HWC order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }
}

/// Outcome of decoding a request: either an image to classify or the
/// "empty frame" signal that tells the worker to skip inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// The sender declared `height * width == 0`.  Not an error.
    Empty,
    /// A fully materialised image.
    Image(Frame),
}

impl DecodedFrame {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the frame, or `None` for the empty sentinel.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Self::Empty => None,
            Self::Image(frame) => Some(frame),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
