//! # pagecraft – content analysis and pagination for print-ready A4 output
//!
//! This crate prepares heterogeneous inputs (raw markup, uploaded markup
//! files, single images, image batches) for a fixed-page rendering backend.
//! The pipeline stages are:
//!
//! 1. **Classify** – assign a content category and complexity tier ([`classify`])
//! 2. **Optimize** – derive layout parameters, repair and rewrite markup ([`optimize`])
//! 3. **Analyze** – fit raster dimensions to the page content area ([`raster`])
//! 4. **Slice** – partition tall images into ordered vertical bands ([`raster`])
//! 5. **Emit** – assemble the final render directive ([`emit`])
//!
//! The engine is stateless: each request runs through a fresh pipeline with
//! no shared mutable state. Rasterization itself is the job of an external
//! rendering backend, which consumes the emitted directive verbatim.

pub mod classify;
pub mod emit;
pub mod error;
pub mod geometry;
pub mod optimize;
pub mod pipeline;
pub mod raster;
pub mod templates;

// Re-exports for convenience
pub use emit::{RenderDirective, RenderOptions};
pub use error::{Error, Result};
pub use optimize::Overrides;
pub use pipeline::{convert_html, convert_html_bytes, convert_image, convert_image_batch};
