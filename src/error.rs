//! Error types for the pagecraft engine.
//!
//! Input errors (undecodable images, invalid text encodings, missing
//! required fields) surface immediately and are never retried. Malformed
//! markup is *not* an error: the optimizer repairs it and reports
//! diagnostics alongside a successful result.

use thiserror::Error;

/// Result type alias for pagecraft operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while preparing content for rendering.
#[derive(Error, Debug)]
pub enum Error {
    /// The input buffer could not be decoded as an image.
    #[error("image analysis failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A slice could not be re-encoded for embedding.
    #[error("image slice encoding failed: {0}")]
    ImageEncode(image::ImageError),

    /// Slice extraction bounds exceed the source dimensions. This indicates
    /// a logic defect in the analyzer, not bad input.
    #[error("slice {index} bounds exceed source: offset {offset} + height {height} > {source_height}")]
    SliceBounds {
        index: u32,
        offset: u32,
        height: u32,
        source_height: u32,
    },

    /// The requested margins leave no printable content area, so no image
    /// can be placed or paginated.
    #[error("margins leave a degenerate content area ({width}x{height} px)")]
    EmptyContentArea { width: u32, height: u32 },

    /// Uploaded markup is not valid UTF-8.
    #[error("markup input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// A batch conversion was requested with no inputs.
    #[error("image batch is empty")]
    EmptyBatch,
}
