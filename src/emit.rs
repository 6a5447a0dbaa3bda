//! Render directive emitter – assembles the final self-contained page markup
//! plus the resolved backend options. Pure assembly, no I/O.
//!
//! Each logical page (an image slice or one source image) becomes a `.page`
//! block; every page but the first forces a page break before itself. For
//! batches, page numbering runs sequentially across the whole batch while
//! per-image slice positions ("part 2 of 3") are preserved alongside.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde::Serialize;

use crate::geometry::PageGeometry;
use crate::optimize::LayoutParameters;

/// One logical page of image content, ready for embedding.
#[derive(Debug, Clone)]
pub struct ImagePage {
    pub data: Vec<u8>,
    pub mime: String,
    /// 1-based position of the source image within the batch.
    pub image_index: usize,
    pub total_images: usize,
    /// 1-based slice position within the source image.
    pub slice_index: u32,
    pub total_slices: u32,
}

/// Resolved options for the external rendering backend, applied verbatim.
/// Serializes to the camelCase shape the backend expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Page format identifier.
    pub format: String,
    pub print_background: bool,
    pub margin: MarginPx,
    #[serde(rename = "preferCSSPageSize")]
    pub prefer_css_page_size: bool,
    pub display_header_footer: bool,
}

/// Margin quadruple as pixel strings, the unit the backend consumes.
#[derive(Debug, Clone, Serialize)]
pub struct MarginPx {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl RenderOptions {
    pub fn for_geometry(geometry: &PageGeometry) -> Self {
        let m = &geometry.margins;
        Self {
            format: "A4".to_string(),
            print_background: true,
            margin: MarginPx {
                top: format!("{}px", m.top),
                right: format!("{}px", m.right),
                bottom: format!("{}px", m.bottom),
                left: format!("{}px", m.left),
            },
            prefer_css_page_size: false,
            display_header_footer: false,
        }
    }
}

/// Terminal artifact of the engine: self-contained markup, resolved backend
/// options, and the diagnostics collected while preparing the content.
#[derive(Debug, Clone)]
pub struct RenderDirective {
    pub html: String,
    pub options: RenderOptions,
    pub diagnostics: Vec<String>,
}

/// Assemble a self-contained document from prepared image pages.
pub fn image_document(pages: &[ImagePage], params: &LayoutParameters) -> String {
    let total_pages = pages.len();
    let mut body = String::new();

    for (page_index, page) in pages.iter().enumerate() {
        let encoded = BASE64_STD.encode(&page.data);
        let break_attr = if page_index > 0 {
            " style=\"page-break-before: always;\""
        } else {
            ""
        };

        let mut label = format!("Image {}", page.image_index);
        if page.total_slices > 1 {
            label.push_str(&format!(
                " (part {} of {})",
                page.slice_index, page.total_slices
            ));
        }
        // Single unsliced image: no overlay at all, matching the plain
        // one-page case.
        let info = if total_pages > 1 {
            format!(
                "<div class=\"image-info\">\
                 <div class=\"image-name\">{label}</div>\
                 <div class=\"page-number\">Page {} of {}</div>\
                 </div>",
                page_index + 1,
                total_pages
            )
        } else {
            String::new()
        };

        body.push_str(&format!(
            "<div class=\"page\"{break_attr}>\
             <div class=\"image-container\">\
             <img src=\"data:{};base64,{}\" alt=\"{label}\" class=\"responsive-image\"/>\
             {info}\
             </div></div>",
            page.mime, encoded
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n<style>\n\
         * {{ margin: 0; padding: 0; box-sizing: border-box; }}\n\
         html, body {{ width: 100%; height: 100%; background: {bg}; font-family: Arial, sans-serif; }}\n\
         .page {{\n\
           width: 100%; height: 100%;\n\
           display: flex; flex-direction: column;\n\
           justify-content: center; align-items: center;\n\
           position: relative; background: white;\n\
           page-break-after: always;\n\
         }}\n\
         .page:last-child {{ page-break-after: avoid; }}\n\
         .image-container {{\n\
           width: 100%; height: 100%;\n\
           display: flex; justify-content: center; align-items: center;\n\
           padding: 20px; position: relative;\n\
         }}\n\
         .responsive-image {{\n\
           max-width: 100%; max-height: 100%;\n\
           width: auto; height: auto;\n\
           object-fit: {fit}; display: block;\n\
         }}\n\
         .image-info {{\n\
           position: absolute; bottom: 10px; left: 10px; right: 10px;\n\
           display: flex; justify-content: space-between; align-items: center;\n\
           font-size: 10px; color: #666;\n\
           background: rgba(255, 255, 255, 0.9);\n\
           padding: 5px 10px; border-radius: 3px;\n\
         }}\n\
         .image-name {{ font-weight: bold; }}\n\
         .page-number {{ color: #888; }}\n\
         </style>\n</head>\n<body>\n{body}\n</body>\n</html>",
        bg = params.background_color,
        fit = params.fit_mode.css_value(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(image_index: usize, total_images: usize, slice: u32, slices: u32) -> ImagePage {
        ImagePage {
            data: vec![1, 2, 3],
            mime: "image/png".to_string(),
            image_index,
            total_images,
            slice_index: slice,
            total_slices: slices,
        }
    }

    #[test]
    fn single_page_has_no_break_or_overlay() {
        let html = image_document(&[page(1, 1, 1, 1)], &LayoutParameters::default());
        assert!(!html.contains("page-break-before"));
        assert!(!html.contains("image-info\">"));
        assert!(html.contains("data:image/png;base64,AQID"));
    }

    #[test]
    fn later_pages_force_break_before() {
        let pages = vec![page(1, 1, 1, 2), page(1, 1, 2, 2)];
        let html = image_document(&pages, &LayoutParameters::default());
        assert_eq!(html.matches("page-break-before: always").count(), 1);
        assert!(html.contains("Image 1 (part 1 of 2)"));
        assert!(html.contains("Image 1 (part 2 of 2)"));
    }

    #[test]
    fn batch_numbering_is_sequential_across_images() {
        // Image 1 splits into two slices, image 2 is whole: 3 pages total.
        let pages = vec![
            page(1, 2, 1, 2),
            page(1, 2, 2, 2),
            page(2, 2, 1, 1),
        ];
        let html = image_document(&pages, &LayoutParameters::default());
        assert!(html.contains("Page 1 of 3"));
        assert!(html.contains("Page 2 of 3"));
        assert!(html.contains("Page 3 of 3"));
        assert!(html.contains("Image 1 (part 2 of 2)"));
        // Whole images carry no part annotation.
        assert!(html.contains("Image 2</div>"));
    }

    #[test]
    fn fit_mode_and_background_reach_the_stylesheet() {
        let params = LayoutParameters {
            fit_mode: crate::optimize::FitMode::Cover,
            background_color: "#eee".to_string(),
            ..LayoutParameters::default()
        };
        let html = image_document(&[page(1, 1, 1, 1)], &params);
        assert!(html.contains("object-fit: cover"));
        assert!(html.contains("background: #eee"));
    }

    #[test]
    fn render_options_serialize_in_backend_shape() {
        let options = RenderOptions::for_geometry(&PageGeometry::a4());
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["format"], "A4");
        assert_eq!(json["printBackground"], true);
        assert_eq!(json["displayHeaderFooter"], false);
        assert_eq!(json["preferCSSPageSize"], false);
        assert_eq!(json["margin"]["top"], "20px");
        assert_eq!(json["margin"]["left"], "0px");
    }
}
