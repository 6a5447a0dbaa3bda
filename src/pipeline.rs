//! Pipeline – ties classification, optimization, raster analysis, slicing,
//! and directive emission into per-request entry points.
//!
//! Every conversion builds its own scanner/rewriter and data structures, so
//! independent requests share no mutable state and may run concurrently.

use crate::classify::Scanner;
use crate::emit::{image_document, ImagePage, RenderDirective, RenderOptions};
use crate::error::{Error, Result};
use crate::geometry::PageGeometry;
use crate::optimize::{derive_parameters, LayoutParameters, Overrides, Rewriter};
use crate::raster::{
    analyze_image, create_slices, normalize_input, reencode, source_output_format,
    suggested_layout, LayoutHint,
};

/// One named image in a batch conversion.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub name: String,
    pub data: Vec<u8>,
}

/// Convert raw markup into a render directive.
///
/// Never fails for valid text input: malformed structure is repaired and
/// reported through diagnostics.
pub fn convert_html(markup: &str, overrides: &Overrides) -> Result<RenderDirective> {
    log::info!("converting markup input, {} chars", markup.len());

    let profile = Scanner::new().classify(markup);
    log::info!(
        "content profile: {:?} / {:?}, features {:?}",
        profile.category,
        profile.complexity,
        profile.feature_tags()
    );

    let params = derive_parameters(&profile, overrides);
    let geometry = request_geometry(overrides);
    let (html, diagnostics) = Rewriter::new().optimize_document(markup, &params, &geometry);

    log::info!("markup optimized, {} chars out", html.len());
    Ok(RenderDirective {
        html,
        options: RenderOptions::for_geometry(&geometry),
        diagnostics,
    })
}

/// Convert an uploaded markup file. The buffer must be UTF-8.
pub fn convert_html_bytes(data: &[u8], name: &str, overrides: &Overrides) -> Result<RenderDirective> {
    log::info!("converting markup file '{}', {} bytes", name, data.len());
    let markup = std::str::from_utf8(data)?;
    convert_html(markup, overrides)
}

/// Convert a single image into a render directive, paginating tall images
/// across multiple pages.
pub fn convert_image(data: &[u8], overrides: &Overrides) -> Result<RenderDirective> {
    log::info!("converting image input, {} bytes", data.len());

    let mut diagnostics = Vec::new();
    let geometry = request_geometry(overrides);
    let data = prepare_raster(data, &geometry, overrides, &mut diagnostics)?;

    let analysis = analyze_image(&data, &geometry)?;
    log::info!(
        "image {}x{}, paging {}, {} page(s)",
        analysis.width,
        analysis.height,
        analysis.needs_paging,
        analysis.pages_needed
    );
    if suggested_layout(&analysis) == LayoutHint::WideLandscape {
        diagnostics.push("wide image: landscape output would fit better".to_string());
    }

    let slices = create_slices(&data, &analysis)?;
    let pages: Vec<ImagePage> = slices
        .into_iter()
        .map(|slice| ImagePage {
            data: slice.data,
            mime: slice.mime.to_string(),
            image_index: 1,
            total_images: 1,
            slice_index: slice.index + 1,
            total_slices: slice.total,
        })
        .collect();

    let params = image_parameters(overrides);
    Ok(RenderDirective {
        html: image_document(&pages, &params),
        options: RenderOptions::for_geometry(&geometry),
        diagnostics,
    })
}

/// Convert a batch of images into one directive. Page numbering runs
/// sequentially across the whole batch; per-image slice positions are kept.
pub fn convert_image_batch(inputs: &[ImageInput], overrides: &Overrides) -> Result<RenderDirective> {
    if inputs.is_empty() {
        return Err(Error::EmptyBatch);
    }
    log::info!("converting batch of {} image(s)", inputs.len());

    let geometry = request_geometry(overrides);
    let mut diagnostics = Vec::new();
    let mut pages = Vec::new();

    for (i, input) in inputs.iter().enumerate() {
        log::debug!("batch image {}/{}: '{}'", i + 1, inputs.len(), input.name);
        let data = prepare_raster(&input.data, &geometry, overrides, &mut diagnostics)?;
        let analysis = analyze_image(&data, &geometry)?;
        let slices = create_slices(&data, &analysis)?;
        for slice in slices {
            pages.push(ImagePage {
                data: slice.data,
                mime: slice.mime.to_string(),
                image_index: i + 1,
                total_images: inputs.len(),
                slice_index: slice.index + 1,
                total_slices: slice.total,
            });
        }
    }

    log::info!("batch produced {} page(s)", pages.len());
    let params = image_parameters(overrides);
    Ok(RenderDirective {
        html: image_document(&pages, &params),
        options: RenderOptions::for_geometry(&geometry),
        diagnostics,
    })
}

/// A4 geometry with the caller's margin override applied, if any.
fn request_geometry(overrides: &Overrides) -> PageGeometry {
    match overrides.margin {
        Some(margins) => PageGeometry::a4().with_margins(margins),
        None => PageGeometry::a4(),
    }
}

/// Image-path layout parameters: only the presentation overrides apply.
fn image_parameters(overrides: &Overrides) -> LayoutParameters {
    let mut params = LayoutParameters::default();
    if let Some(v) = overrides.fit_mode {
        params.fit_mode = v;
    }
    if let Some(v) = &overrides.background_color {
        params.background_color = v.clone();
    }
    params
}

/// Normalize the input format, then apply the caller's quality /
/// output-format preference before analysis.
///
/// A quality override without an explicit output format re-encodes in the
/// buffer's own format, so the knob takes effect on its own.
fn prepare_raster(
    data: &[u8],
    geometry: &PageGeometry,
    overrides: &Overrides,
    diagnostics: &mut Vec<String>,
) -> Result<Vec<u8>> {
    let data = normalize_input(data, diagnostics)?;
    let format = match (overrides.output_format, overrides.quality) {
        (Some(format), _) => format,
        (None, Some(_)) => source_output_format(&data),
        (None, None) => return Ok(data),
    };
    let quality = overrides.quality.unwrap_or(90);
    let (bytes, _) = reencode(&data, format, quality, geometry.width_px(), diagnostics);
    Ok(bytes)
}
