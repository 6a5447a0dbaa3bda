//! Page geometry – fixed A4 dimensions and conversions between physical
//! millimetres and CSS pixel space at 96 DPI.
//!
//! All downstream stages (image analysis, slicing, style injection, render
//! options) measure against one immutable [`PageGeometry`] per request.

use serde::{Deserialize, Serialize};

/// CSS pixels per millimetre at 96 DPI (96 / 25.4).
pub const PX_PER_MM: f64 = 96.0 / 25.4;

/// A4 physical width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;

/// A4 physical height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Page margins in CSS pixels. Each side is independently zero-able.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        top: 0,
        right: 0,
        bottom: 0,
        left: 0,
    };

    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

impl Default for Margins {
    /// Default print margins: 20px top/bottom, no left/right margin.
    fn default() -> Self {
        Margins::new(20, 0, 20, 0)
    }
}

/// Physical page dimensions plus margins, frozen for a given target format.
///
/// The content area is the printable region: page dimensions minus margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margins: Margins,
}

impl PageGeometry {
    /// A4 portrait: 210mm × 297mm, 20px top/bottom margins.
    pub fn a4() -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            margins: Margins::default(),
        }
    }

    /// Same format with replacement margins (caller override).
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Full page width in pixels, rounded (A4 → 794).
    pub fn width_px(&self) -> u32 {
        (self.width_mm * PX_PER_MM).round() as u32
    }

    /// Full page height in pixels, rounded (A4 → 1123).
    pub fn height_px(&self) -> u32 {
        (self.height_mm * PX_PER_MM).round() as u32
    }

    /// Printable width: page width minus left and right margins.
    pub fn content_width_px(&self) -> u32 {
        self.width_px()
            .saturating_sub(self.margins.left + self.margins.right)
    }

    /// Printable height: page height minus top and bottom margins.
    pub fn content_height_px(&self) -> u32 {
        self.height_px()
            .saturating_sub(self.margins.top + self.margins.bottom)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}
