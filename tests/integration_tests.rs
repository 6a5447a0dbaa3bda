//! Integration tests for the pagecraft pipeline.
//!
//! These tests validate:
//! - Classification categories and priority ordering
//! - Layout parameter derivation and override precedence
//! - Image analysis, slicing coverage, and pagination scenarios
//! - Markup repair, resource flagging, and idempotence
//! - Directive assembly for documents, single images, and batches

use std::io::Cursor;

use pagecraft::classify::{Category, Scanner};
use pagecraft::geometry::{Margins, PageGeometry};
use pagecraft::optimize::{derive_parameters, LayoutParameters, Overrides, Rewriter};
use pagecraft::pipeline::{
    convert_html, convert_image, convert_image_batch, ImageInput,
};
use pagecraft::raster::{analyze_dimensions, analyze_image, create_slices};
use pagecraft::templates;

// =====================================================================
// Helpers
// =====================================================================

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([64, 128, 192, 255]),
    ));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn bare_a4() -> PageGeometry {
    PageGeometry::a4().with_margins(Margins::ZERO)
}

// =====================================================================
// Classification
// =====================================================================

#[test]
fn table_without_code_or_forms_is_a_report() {
    let profile = Scanner::new().classify("<table><tr><td>x</td></tr></table><p>summary</p>");
    assert_eq!(profile.category, Category::Report);
    assert!(profile.features.tables);
}

#[test]
fn headings_plus_code_classify_as_technical() {
    let profile = Scanner::new().classify("<h1>Title</h1><pre>let x = 1;</pre>");
    assert_eq!(profile.category, Category::Technical);
}

#[test]
fn all_templates_round_trip_through_the_pipeline() {
    for markup in [
        templates::plain_fragment(),
        templates::article_template(),
        templates::report_template(),
        templates::technical_template(),
        templates::form_template(),
        templates::full_document_template(),
    ] {
        let directive = convert_html(markup, &Overrides::default()).unwrap();
        assert!(directive.html.contains("pagecraft print styles"));
    }
}

// =====================================================================
// Image analysis and slicing
// =====================================================================

#[test]
fn tall_png_scenario_pages_and_coverage() {
    // 1000x3000 against a 794x1123 content area.
    let data = png_bytes(1000, 3000);
    let analysis = analyze_image(&data, &bare_a4()).unwrap();

    let scale = (794.0_f64 / 1000.0).min(1.0);
    assert!((analysis.scale - scale).abs() < 1e-9);
    assert!(analysis.needs_paging);
    assert_eq!(
        analysis.pages_needed,
        (3000.0 * scale / 1123.0).ceil() as u32
    );

    let slices = create_slices(&data, &analysis).unwrap();
    assert_eq!(slices.len(), analysis.pages_needed as usize);
    let total: u32 = slices.iter().map(|s| s.height).sum();
    assert_eq!(total, 3000);
}

#[test]
fn slice_heights_always_sum_to_source_height() {
    // Coverage invariant across awkward height/page-count combinations.
    for height in [1124_u32, 1500, 2245, 2247, 3001, 5399, 10000] {
        let analysis =
            analyze_dimensions(600, height, image::ImageFormat::Png, &bare_a4()).unwrap();
        if !analysis.needs_paging {
            continue;
        }
        let pages = analysis.pages_needed;
        let band = height / pages;
        let last = height - (pages - 1) * band;
        assert_eq!((pages - 1) * band + last, height, "height {height}");
        assert!(last >= band, "last slice absorbs the remainder");
    }
}

#[test]
fn analyzer_never_upscales() {
    for (w, h) in [(10_u32, 10_u32), (794, 1123), (200, 1000)] {
        let analysis = analyze_dimensions(w, h, image::ImageFormat::Png, &bare_a4()).unwrap();
        assert!(analysis.scale <= 1.0);
        assert!(analysis.display_width <= w);
    }
}

// =====================================================================
// Markup repair and rewriting
// =====================================================================

#[test]
fn missing_wrapper_and_charset_emit_two_diagnostics() {
    let directive = convert_html("<p>just a fragment</p>", &Overrides::default()).unwrap();
    assert_eq!(directive.diagnostics.len(), 2);
    assert!(directive.html.contains("<html>"));
    assert!(directive.html.contains("charset=\"utf-8\""));
}

#[test]
fn relative_image_reference_is_marked_in_place() {
    let directive = convert_html(r#"<p>pic</p><img src="img.png">"#, &Overrides::default())
        .unwrap();
    let warnings: Vec<_> = directive
        .diagnostics
        .iter()
        .filter(|d| d.contains("img.png"))
        .collect();
    assert_eq!(warnings.len(), 1);
    // Marker immediately precedes the (self-closed) reference.
    assert!(directive
        .html
        .contains(r#"<!-- unresolved relative image: img.png --><img src="img.png"/>"#));
}

#[test]
fn reoptimizing_output_produces_no_duplicates() {
    let rewriter = Rewriter::new();
    let params = LayoutParameters::default();
    let geometry = PageGeometry::a4();
    let (once, _) = rewriter.optimize_document(
        "<h1>A</h1><table><tr><td>1</td></tr></table><img src=\"rel.png\">",
        &params,
        &geometry,
    );
    let (twice, diags) = rewriter.optimize_document(&once, &params, &geometry);
    assert_eq!(once, twice);
    assert!(diags.is_empty());
}

// =====================================================================
// Parameter derivation
// =====================================================================

#[test]
fn overrides_always_beat_derived_defaults() {
    let profile = Scanner::new().classify(templates::report_template());
    let overrides = Overrides {
        font_size: Some(18.0),
        margin: Some(Margins::new(1, 2, 3, 4)),
        ..Overrides::default()
    };
    let params = derive_parameters(&profile, &overrides);
    assert_eq!(params.font_size, 18.0);
    assert_eq!(params.margin, Margins::new(1, 2, 3, 4));
    // Derived line height for reports survives untouched.
    assert_eq!(params.line_height, 1.3);
}

#[test]
fn margin_override_reaches_backend_options() {
    let overrides = Overrides {
        margin: Some(Margins::new(5, 6, 7, 8)),
        ..Overrides::default()
    };
    let directive = convert_html("<p>x</p>", &overrides).unwrap();
    let json = serde_json::to_value(&directive.options).unwrap();
    assert_eq!(json["margin"]["top"], "5px");
    assert_eq!(json["margin"]["right"], "6px");
    assert_eq!(json["margin"]["bottom"], "7px");
    assert_eq!(json["margin"]["left"], "8px");
}

// =====================================================================
// Directive assembly
// =====================================================================

#[test]
fn single_image_directive_embeds_data_uri() {
    let directive = convert_image(&png_bytes(120, 90), &Overrides::default()).unwrap();
    assert!(directive.html.contains("data:image/png;base64,"));
    assert!(directive.html.contains("<!DOCTYPE html>"));
}

#[test]
fn sliced_image_directive_has_one_page_per_slice() {
    let data = png_bytes(794, 4000);
    let directive = convert_image(&data, &Overrides::default()).unwrap();
    let analysis = analyze_image(&data, &PageGeometry::a4()).unwrap();
    assert_eq!(
        directive.html.matches("<div class=\"page\"").count(),
        analysis.pages_needed as usize
    );
    // Every page but the first forces a break before itself.
    assert_eq!(
        directive.html.matches("page-break-before: always").count(),
        analysis.pages_needed as usize - 1
    );
}

#[test]
fn batch_keeps_global_numbering_and_slice_positions() {
    let inputs = vec![
        ImageInput {
            name: "tall.png".to_string(),
            data: png_bytes(794, 3000),
        },
        ImageInput {
            name: "small.png".to_string(),
            data: png_bytes(200, 100),
        },
    ];
    let directive = convert_image_batch(&inputs, &Overrides::default()).unwrap();

    let analysis = analyze_image(&inputs[0].data, &PageGeometry::a4()).unwrap();
    let total = analysis.pages_needed as usize + 1;
    assert!(directive.html.contains(&format!("Page 1 of {total}")));
    assert!(directive.html.contains(&format!("Page {total} of {total}")));
    assert!(directive
        .html
        .contains(&format!("Image 1 (part 1 of {})", analysis.pages_needed)));
    assert!(directive.html.contains("Image 2</div>"));
}
