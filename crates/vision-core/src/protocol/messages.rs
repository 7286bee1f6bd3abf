//! Wire-level constants shared by clients and workers.
//!
//! # Request layout
//!
//! ```text
//! segment 0: raw pixel bytes (HWC, u8)
//! segment 1: UTF-8 "<height>_<width>_<channels>"
//! ```
//!
//! # Reply layout
//!
//! ```text
//! [rows:u32][cols:u32][rows*cols f64, row-major]
//! ```
//!
//! All multi-byte numbers are little-endian so a NumPy client can read the
//! body with `np.frombuffer(reply[8:], "<f8").reshape(rows, cols)`.

/// Number of segments in a well-formed request.
pub const REQUEST_SEGMENT_COUNT: usize = 2;

/// Index of the raw pixel segment within a request.
pub const IMAGE_SEGMENT_INDEX: usize = 0;

/// Index of the shape descriptor segment within a request.
pub const SHAPE_SEGMENT_INDEX: usize = 1;

/// Separator between the three dimensions of a shape descriptor.
pub const SHAPE_DELIMITER: char = '_';

/// Number of dimensions carried by a shape descriptor.
pub const SHAPE_DIMENSIONS: usize = 3;

/// Columns in every result table: `label`, `score`.
pub const TABLE_COLUMNS: usize = 2;

/// Size of the `[rows][cols]` table header in bytes.
pub const TABLE_HEADER_SIZE: usize = 8;

/// Size of one table cell in bytes.
pub const TABLE_CELL_SIZE: usize = 8;
