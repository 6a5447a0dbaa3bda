//! Raster analysis and slicing – decides how an image maps onto fixed pages
//! and partitions tall images into ordered vertical bands.
//!
//! The analyzer fits the image inside the page content area without ever
//! upscaling; pagination is needed exactly when the scaled height exceeds
//! the content-area height. The slicer then cuts the *original* (unscaled)
//! image into `pages_needed` bands. The page count comes from the scaled
//! height while band heights come from the original height; collapsing the
//! two stages into one scale changes the band boundaries, so both are kept.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::geometry::PageGeometry;
use crate::optimize::OutputFormat;

/// Result of analyzing one raster image against a page geometry.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterAnalysis {
    /// Source dimensions in pixels.
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// Fit-inside display dimensions, rounded.
    pub display_width: u32,
    pub display_height: u32,
    /// Fit-to-width scale, `min(content_w / w, 1)` – never upscales.
    pub scale: f64,
    pub needs_paging: bool,
    /// Number of pages the scaled image spans; 1 when no paging is needed.
    pub pages_needed: u32,
}

/// One ordered vertical band of a source image.
#[derive(Debug, Clone)]
pub struct ImageSlice {
    /// Zero-based band index, top to bottom.
    pub index: u32,
    pub total: u32,
    /// Pixel offset of the band within the source image.
    pub offset_y: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub mime: &'static str,
}

/// Orientation advice derived from the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutHint {
    /// Wide image (aspect > 1.5); landscape output would fit better.
    WideLandscape,
    /// Tall image (aspect < 0.5); will be paginated.
    TallPaginated,
    /// Ordinary proportions; standard portrait layout.
    Standard,
}

/// Decode an image buffer and compute its pagination analysis.
///
/// Fails with a decode error when the buffer is not a recognizable image;
/// the error is propagated, never retried.
pub fn analyze_image(data: &[u8], geometry: &PageGeometry) -> Result<RasterAnalysis> {
    let format = image::guess_format(data)?;
    let img = image::load_from_memory(data)?;
    let analysis = analyze_dimensions(img.width(), img.height(), format, geometry)?;
    log::debug!(
        "analyzed {}x{} {:?}: scale {:.3}, paging {}, {} page(s)",
        analysis.width,
        analysis.height,
        analysis.format,
        analysis.scale,
        analysis.needs_paging,
        analysis.pages_needed
    );
    Ok(analysis)
}

/// Pure dimension arithmetic behind [`analyze_image`].
///
/// Rejects geometry whose margins consume the whole page: dividing by a
/// zero content height would otherwise blow the page count up.
pub fn analyze_dimensions(
    width: u32,
    height: u32,
    format: ImageFormat,
    geometry: &PageGeometry,
) -> Result<RasterAnalysis> {
    if geometry.content_width_px() == 0 || geometry.content_height_px() == 0 {
        return Err(Error::EmptyContentArea {
            width: geometry.content_width_px(),
            height: geometry.content_height_px(),
        });
    }

    let content_w = geometry.content_width_px() as f64;
    let content_h = geometry.content_height_px() as f64;

    // Fit-to-width, never upscale. Vertical overflow is resolved by
    // pagination rather than by shrinking to the page height, so the
    // vertical ratio does not cap the scale.
    let scale = (content_w / width as f64).min(1.0);

    let display_height = height as f64 * scale;
    let needs_paging = display_height > content_h;
    let pages_needed = if needs_paging {
        (display_height / content_h).ceil() as u32
    } else {
        1
    };

    Ok(RasterAnalysis {
        width,
        height,
        format,
        display_width: (width as f64 * scale).round() as u32,
        display_height: display_height.round() as u32,
        scale,
        needs_paging,
        pages_needed,
    })
}

/// Convert input formats the embedding path cannot use directly.
///
/// An animated GIF is reduced to its first frame and re-encoded as PNG,
/// with a diagnostic. Other buffers pass through untouched, including
/// unrecognizable ones; those fail later in [`analyze_image`].
pub fn normalize_input(data: &[u8], diagnostics: &mut Vec<String>) -> Result<Vec<u8>> {
    match image::guess_format(data) {
        Ok(ImageFormat::Gif) => {
            let first_frame = image::load_from_memory(data)?;
            diagnostics.push("gif input converted to png, first frame only".to_string());
            log::debug!(
                "gif input {}x{} converted to png",
                first_frame.width(),
                first_frame.height()
            );
            encode_png(&first_frame)
        }
        _ => Ok(data.to_vec()),
    }
}

/// The output format that keeps a buffer in its own encoding, for quality
/// adjustments that should not change the format.
pub fn source_output_format(data: &[u8]) -> OutputFormat {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => OutputFormat::Jpeg,
        Ok(ImageFormat::Png) => OutputFormat::Png,
        _ => OutputFormat::Original,
    }
}

/// Partition a source image into ordered top-to-bottom bands per its
/// analysis.
///
/// Without paging this returns the original buffer as a single band. With
/// paging, all bands share `floor(height / pages)` except the last, which
/// absorbs the division remainder so the bands cover the source exactly.
pub fn create_slices(data: &[u8], analysis: &RasterAnalysis) -> Result<Vec<ImageSlice>> {
    if !analysis.needs_paging {
        return Ok(vec![ImageSlice {
            index: 0,
            total: 1,
            offset_y: 0,
            height: analysis.height,
            data: data.to_vec(),
            mime: analysis.format.to_mime_type(),
        }]);
    }

    let img = image::load_from_memory(data)?;
    let pages = analysis.pages_needed;
    let band_height = analysis.height / pages;
    let mut slices = Vec::with_capacity(pages as usize);

    for i in 0..pages {
        let offset_y = i * band_height;
        let height = if i == pages - 1 {
            analysis.height - offset_y
        } else {
            band_height
        };

        if offset_y + height > img.height() {
            return Err(Error::SliceBounds {
                index: i,
                offset: offset_y,
                height,
                source_height: img.height(),
            });
        }

        let band = img.crop_imm(0, offset_y, analysis.width, height);
        slices.push(ImageSlice {
            index: i,
            total: pages,
            offset_y,
            height,
            data: encode_png(&band)?,
            mime: "image/png",
        });
    }

    log::debug!("sliced image into {} band(s)", slices.len());
    Ok(slices)
}

/// Re-encode an image per the caller's output-format preference and quality
/// (0–100). `Original` passes the buffer through untouched. Images wider
/// than `max_width` are downscaled to it first; height is left to the
/// pagination analyzer, which slices rather than shrinks. A failed
/// re-encode degrades to the original bytes with a warning rather than
/// failing the request.
pub fn reencode(
    data: &[u8],
    format: OutputFormat,
    quality: u8,
    max_width: u32,
    diagnostics: &mut Vec<String>,
) -> (Vec<u8>, Option<&'static str>) {
    if format == OutputFormat::Original {
        return (data.to_vec(), None);
    }

    match try_reencode(data, format, quality, max_width) {
        Ok((bytes, mime)) => {
            log::debug!(
                "re-encoded image as {mime}: {} -> {} bytes",
                data.len(),
                bytes.len()
            );
            (bytes, Some(mime))
        }
        Err(e) => {
            log::warn!("image re-encode failed, keeping original: {e}");
            diagnostics.push(format!("image re-encode failed, original kept: {e}"));
            (data.to_vec(), None)
        }
    }
}

fn try_reencode(
    data: &[u8],
    format: OutputFormat,
    quality: u8,
    max_width: u32,
) -> Result<(Vec<u8>, &'static str)> {
    let mut img = image::load_from_memory(data)?;
    if img.width() > max_width {
        log::debug!("downscaling {}px-wide image to {}px", img.width(), max_width);
        img = img.resize(max_width, u32::MAX, image::imageops::FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut out,
                quality.min(100),
            );
            // JPEG has no alpha channel.
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(Error::ImageEncode)?;
            Ok((out, "image/jpeg"))
        }
        OutputFormat::Png => {
            // PNG is lossless; quality selects the compression effort.
            let compression = if quality >= 75 {
                image::codecs::png::CompressionType::Best
            } else {
                image::codecs::png::CompressionType::Fast
            };
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut out,
                compression,
                image::codecs::png::FilterType::Adaptive,
            );
            img.write_with_encoder(encoder).map_err(Error::ImageEncode)?;
            Ok((out, "image/png"))
        }
        OutputFormat::Original => unreachable!("handled by caller"),
    }
}

/// Advise on page orientation from the source aspect ratio.
pub fn suggested_layout(analysis: &RasterAnalysis) -> LayoutHint {
    let aspect = analysis.width as f64 / analysis.height as f64;
    if aspect > 1.5 {
        LayoutHint::WideLandscape
    } else if aspect < 0.5 {
        LayoutHint::TallPaginated
    } else {
        LayoutHint::Standard
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(Error::ImageEncode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Margins;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([180, 180, 180, 255]),
        ));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
        let frame = image::Frame::new(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([20, 40, 60, 255]),
        ));
        let mut out = Vec::new();
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut out);
        encoder.encode_frame(frame).unwrap();
        drop(encoder);
        out
    }

    #[test]
    fn scale_never_exceeds_one() {
        let geom = PageGeometry::a4();
        let small = analyze_dimensions(100, 50, ImageFormat::Png, &geom).unwrap();
        assert_eq!(small.scale, 1.0);
        assert_eq!(small.display_width, 100);
        assert!(!small.needs_paging);
        assert_eq!(small.pages_needed, 1);
    }

    #[test]
    fn scale_fits_width() {
        let geom = PageGeometry::a4().with_margins(Margins::ZERO);
        let a = analyze_dimensions(1588, 1123, ImageFormat::Png, &geom).unwrap();
        assert!((a.scale - 0.5).abs() < 1e-9);
        assert_eq!(a.display_width, 794);
        assert!(!a.needs_paging);
    }

    #[test]
    fn tall_png_pages_match_scaled_height() {
        // 1000x3000 against a zero-margin A4: content area 794x1123.
        let geom = PageGeometry::a4().with_margins(Margins::ZERO);
        let a = analyze_dimensions(1000, 3000, ImageFormat::Png, &geom).unwrap();
        let scale = 794.0_f64 / 1000.0;
        assert!((a.scale - scale).abs() < 1e-9);
        assert!(a.needs_paging);
        assert_eq!(a.pages_needed, (3000.0 * scale / 1123.0).ceil() as u32);
        assert_eq!(a.pages_needed, 3);
    }

    #[test]
    fn analyze_rejects_undecodable_input() {
        let err = analyze_image(b"definitely not an image", &PageGeometry::a4());
        assert!(matches!(err, Err(Error::ImageDecode(_))));
    }

    #[test]
    fn margins_consuming_the_page_are_rejected() {
        // 600 + 600 > 1123: the content height saturates to zero.
        let geom = PageGeometry::a4().with_margins(Margins::new(600, 0, 600, 0));
        let err = analyze_dimensions(100, 50, ImageFormat::Png, &geom);
        assert!(matches!(
            err,
            Err(Error::EmptyContentArea { width: 794, height: 0 })
        ));

        let geom = PageGeometry::a4().with_margins(Margins::new(0, 400, 0, 400));
        let err = analyze_dimensions(100, 50, ImageFormat::Png, &geom);
        assert!(matches!(err, Err(Error::EmptyContentArea { width: 0, .. })));
    }

    #[test]
    fn slices_cover_source_height_exactly() {
        let geom = PageGeometry::a4().with_margins(Margins::ZERO);
        let data = png_bytes(100, 2995);
        let analysis = analyze_image(&data, &geom).unwrap();
        assert!(analysis.needs_paging);

        let slices = create_slices(&data, &analysis).unwrap();
        assert_eq!(slices.len(), analysis.pages_needed as usize);

        // Contiguous, non-overlapping, full coverage.
        let mut expected_offset = 0;
        for slice in &slices {
            assert_eq!(slice.offset_y, expected_offset);
            expected_offset += slice.height;
        }
        assert_eq!(expected_offset, 2995);

        // All but the last share the floor height; the last takes the rest.
        let band = 2995 / analysis.pages_needed;
        for slice in &slices[..slices.len() - 1] {
            assert_eq!(slice.height, band);
        }

        // Bands decode back to the declared dimensions.
        let first = image::load_from_memory(&slices[0].data).unwrap();
        assert_eq!(first.width(), 100);
        assert_eq!(first.height(), band);
    }

    #[test]
    fn unpaged_image_returns_original_buffer() {
        let data = png_bytes(200, 100);
        let analysis = analyze_image(&data, &PageGeometry::a4()).unwrap();
        assert!(!analysis.needs_paging);

        let slices = create_slices(&data, &analysis).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].data, data);
        assert_eq!(slices[0].mime, "image/png");
        assert_eq!(slices[0].height, 100);
    }

    #[test]
    fn reencode_jpeg_applies_quality() {
        let data = png_bytes(64, 64);
        let mut diags = Vec::new();
        let (bytes, mime) = reencode(&data, OutputFormat::Jpeg, 70, 794, &mut diags);
        assert_eq!(mime, Some("image/jpeg"));
        assert!(diags.is_empty());
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        // A different quality produces different bytes: the setting is live.
        let (coarse, _) = reencode(&data, OutputFormat::Jpeg, 10, 794, &mut diags);
        assert_ne!(bytes, coarse);
    }

    #[test]
    fn reencode_downscales_oversized_width() {
        let data = png_bytes(1588, 400);
        let mut diags = Vec::new();
        let (bytes, _) = reencode(&data, OutputFormat::Png, 90, 794, &mut diags);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 794);
        assert_eq!(img.height(), 200);

        // Narrow images are never enlarged.
        let data = png_bytes(64, 64);
        let (bytes, _) = reencode(&data, OutputFormat::Png, 90, 794, &mut diags);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 64);
    }

    #[test]
    fn reencode_degrades_on_bad_input() {
        let mut diags = Vec::new();
        let (bytes, mime) = reencode(b"garbage", OutputFormat::Png, 90, 794, &mut diags);
        assert_eq!(bytes, b"garbage");
        assert_eq!(mime, None);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn gif_input_normalizes_to_first_frame_png() {
        let data = gif_bytes(40, 30);
        let mut diags = Vec::new();
        let converted = normalize_input(&data, &mut diags).unwrap();
        assert_eq!(image::guess_format(&converted).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&converted).unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn non_gif_input_passes_through_normalization() {
        let data = png_bytes(10, 10);
        let mut diags = Vec::new();
        let same = normalize_input(&data, &mut diags).unwrap();
        assert_eq!(same, data);
        assert!(diags.is_empty());
        assert_eq!(source_output_format(&data), OutputFormat::Png);
    }

    #[test]
    fn layout_hints_follow_aspect_ratio() {
        let geom = PageGeometry::a4();
        let wide = analyze_dimensions(300, 100, ImageFormat::Png, &geom).unwrap();
        let tall = analyze_dimensions(100, 300, ImageFormat::Png, &geom).unwrap();
        let square = analyze_dimensions(100, 100, ImageFormat::Png, &geom).unwrap();
        assert_eq!(suggested_layout(&wide), LayoutHint::WideLandscape);
        assert_eq!(suggested_layout(&tall), LayoutHint::TallPaginated);
        assert_eq!(suggested_layout(&square), LayoutHint::Standard);
    }
}
