//! Layout optimizer – derives concrete style parameters from a
//! [`ContentProfile`] merged with caller overrides, and rewrites the markup
//! so it prints cleanly on A4 pages.
//!
//! Rewriting covers:
//! - structural repair (missing wrapper / charset declaration)
//! - removal of unsafe executable/embeddable elements
//! - self-closing normalization of void elements
//! - flagging of relative external-resource references
//! - page-break marker insertion
//!
//! Every rewrite is idempotent: running the optimizer over its own output
//! produces no duplicate wrappers or markers.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::classify::{Category, ContentProfile};
use crate::geometry::{Margins, PageGeometry};

/// Marker embedded in the injected stylesheet; its presence means the
/// document has already been prepared.
const STYLE_MARKER: &str = "/* pagecraft print styles */";

/// Element types stripped during sanitization.
const UNSAFE_ELEMENTS: [&str; 4] = ["script", "iframe", "object", "embed"];

/// How an image is fitted into the page content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Contain,
    Cover,
}

impl FitMode {
    pub fn css_value(&self) -> &'static str {
        match self {
            FitMode::Contain => "contain",
            FitMode::Cover => "cover",
        }
    }
}

/// Output format preference for raster re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the source format.
    #[default]
    Original,
    Png,
    Jpeg,
}

/// Caller-supplied overrides. Every field is optional; set fields always win
/// over profile-derived defaults. `margin` replaces the whole quadruple as a
/// unit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Overrides {
    pub add_page_breaks: Option<bool>,
    /// Font size in CSS pixels.
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
    pub margin: Option<Margins>,
    pub fit_mode: Option<FitMode>,
    pub background_color: Option<String>,
    pub output_format: Option<OutputFormat>,
    /// Re-encode quality, 0–100.
    pub quality: Option<u8>,
}

/// Concrete style parameters for one request. Derived defaults come from the
/// content profile; overrides take precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParameters {
    pub font_size: f32,
    pub line_height: f32,
    pub margin: Margins,
    pub add_page_breaks: bool,
    pub break_before_headings: bool,
    pub break_after_sections: bool,
    pub avoid_break_in_tables: bool,
    pub preserve_code: bool,
    pub fit_mode: FitMode,
    pub background_color: String,
}

impl Default for LayoutParameters {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height: 1.4,
            margin: Margins::new(20, 15, 20, 15),
            add_page_breaks: true,
            break_before_headings: true,
            break_after_sections: true,
            avoid_break_in_tables: true,
            preserve_code: false,
            fit_mode: FitMode::Contain,
            background_color: "white".to_string(),
        }
    }
}

/// Derive layout parameters from a profile, then apply caller overrides.
pub fn derive_parameters(profile: &ContentProfile, overrides: &Overrides) -> LayoutParameters {
    let mut params = LayoutParameters::default();

    match profile.category {
        Category::Article => {
            params.font_size = 13.0;
            params.line_height = 1.5;
        }
        Category::Report => {
            params.font_size = 11.0;
            params.line_height = 1.3;
            params.margin = Margins::new(15, 10, 15, 10);
        }
        Category::Technical => {
            params.font_size = 10.0;
            params.line_height = 1.2;
            params.preserve_code = true;
        }
        Category::Form => {
            // Interactive forms are not assumed paginable.
            params.add_page_breaks = false;
        }
        Category::Plain | Category::Unknown => {}
    }

    if let Some(v) = overrides.add_page_breaks {
        params.add_page_breaks = v;
    }
    if let Some(v) = overrides.font_size {
        params.font_size = v;
    }
    if let Some(v) = overrides.line_height {
        params.line_height = v;
    }
    if let Some(v) = overrides.margin {
        params.margin = v;
    }
    if let Some(v) = overrides.fit_mode {
        params.fit_mode = v;
    }
    if let Some(v) = &overrides.background_color {
        params.background_color = v.clone();
    }

    params
}

/// Compiled rewrite patterns, built once and reused across documents.
pub struct Rewriter {
    unsafe_blocks: Vec<(&'static str, Regex)>,
    void_tags: Regex,
    img_refs: Regex,
    link_refs: Regex,
    heading_breaks: Regex,
    section_breaks: Regex,
    table_wrap: Regex,
    html_tag: Regex,
    head_tag: Regex,
    head_close: Regex,
    body_tag: Regex,
    charset_meta: Regex,
}

impl Rewriter {
    pub fn new() -> Self {
        let unsafe_blocks = UNSAFE_ELEMENTS
            .iter()
            .map(|tag| {
                let pattern = format!(r"(?is)<{tag}[^>]*>.*?</{tag}>");
                (*tag, Regex::new(&pattern).unwrap())
            })
            .collect();

        Self {
            unsafe_blocks,
            void_tags: Regex::new(r"(?i)<(br|hr|img|input|meta|link)((?:\s[^>]*)?)>").unwrap(),
            img_refs: Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap(),
            link_refs: Regex::new(r#"(?i)<link[^>]+href\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap(),
            heading_breaks: Regex::new(r#"(?i)(<div class="page-break"></div>\s*)?(<h[12][^>]*>)"#)
                .unwrap(),
            section_breaks: Regex::new(
                r#"(?i)(</section>)(\s*<div class="page-break-suggestion"></div>)?"#,
            )
            .unwrap(),
            table_wrap: Regex::new(
                r#"(?is)(<div class="avoid-break">\s*)?(<table[^>]*>.*?</table>)(\s*</div>)?"#,
            )
            .unwrap(),
            html_tag: Regex::new(r"(?i)<html[^>]*>").unwrap(),
            head_tag: Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap(),
            head_close: Regex::new(r"(?i)</head>").unwrap(),
            body_tag: Regex::new(r"(?i)<body[^>]*>").unwrap(),
            charset_meta: Regex::new(r"(?i)<meta[^>]+charset").unwrap(),
        }
    }

    /// Full document path: sanitize, flag external references, insert page
    /// breaks, then repair structure and inject print styles. Returns the
    /// rewritten markup plus all diagnostics collected along the way.
    pub fn optimize_document(
        &self,
        markup: &str,
        params: &LayoutParameters,
        geometry: &PageGeometry,
    ) -> (String, Vec<String>) {
        let mut diagnostics = Vec::new();
        let mut html = self.sanitize(markup, &mut diagnostics);
        html = self.flag_external_resources(&html, &mut diagnostics);
        if params.add_page_breaks {
            html = self.insert_page_breaks(&html, params);
        }
        html = self.apply_print_styles(&html, params, geometry, &mut diagnostics);
        if !diagnostics.is_empty() {
            log::info!("document optimization raised {} diagnostics", diagnostics.len());
        }
        (html, diagnostics)
    }

    /// Strip unsafe elements and normalize void elements to self-closed form.
    pub fn sanitize(&self, markup: &str, diagnostics: &mut Vec<String>) -> String {
        let mut html = markup.to_string();

        for (tag, pattern) in &self.unsafe_blocks {
            let removed = pattern.find_iter(&html).count();
            if removed > 0 {
                let marker = format!("<!-- removed {tag} element for print compatibility -->");
                html = pattern.replace_all(&html, marker.as_str()).into_owned();
                for _ in 0..removed {
                    diagnostics.push(format!("removed {tag} element"));
                }
                log::warn!("stripped {removed} {tag} element(s) from input markup");
            }
        }

        self.void_tags
            .replace_all(&html, |caps: &Captures| {
                let tag = &caps[1];
                let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                if attrs.trim_end().ends_with('/') {
                    caps[0].to_string()
                } else {
                    format!("<{tag}{attrs}/>")
                }
            })
            .into_owned()
    }

    /// Insert a marker comment before every image or stylesheet reference
    /// that is neither absolute-URL, data-URI, nor root-relative. The
    /// reference itself is left unmodified.
    pub fn flag_external_resources(
        &self,
        markup: &str,
        diagnostics: &mut Vec<String>,
    ) -> String {
        let html = self.flag_refs(markup, &self.img_refs, "image", diagnostics);
        self.flag_refs(&html, &self.link_refs, "stylesheet", diagnostics)
    }

    fn flag_refs(
        &self,
        markup: &str,
        pattern: &Regex,
        kind: &str,
        diagnostics: &mut Vec<String>,
    ) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut last = 0;
        for caps in pattern.captures_iter(markup) {
            let whole = caps.get(0).expect("match always has a whole group");
            let target = &caps[1];
            out.push_str(&markup[last..whole.start()]);
            if is_relative_reference(target) {
                let marker = format!("<!-- unresolved relative {kind}: {target} -->");
                // Skip references that already carry the marker.
                if !out.ends_with(&marker) {
                    out.push_str(&marker);
                    diagnostics.push(format!("relative {kind} reference may not resolve: {target}"));
                }
            }
            out.push_str(whole.as_str());
            last = whole.end();
        }
        out.push_str(&markup[last..]);
        out
    }

    /// Insert page-break markers: a break before top-level headings, a break
    /// suggestion after sections, and a break-avoidance wrapper around
    /// tables. Existing markers are normalized, never duplicated.
    pub fn insert_page_breaks(&self, markup: &str, params: &LayoutParameters) -> String {
        let mut html = markup.to_string();

        if params.break_before_headings {
            html = self
                .heading_breaks
                .replace_all(&html, r#"<div class="page-break"></div>$2"#)
                .into_owned();
        }

        if params.break_after_sections {
            html = self
                .section_breaks
                .replace_all(&html, r#"$1<div class="page-break-suggestion"></div>"#)
                .into_owned();
        }

        if params.avoid_break_in_tables {
            html = self
                .table_wrap
                .replace_all(&html, |caps: &Captures| {
                    let table = &caps[2];
                    let trailing = caps.get(3).map(|m| m.as_str()).unwrap_or("");
                    if caps.get(1).is_some() {
                        // Already wrapped; keep the existing closer if present.
                        if trailing.is_empty() {
                            format!(r#"<div class="avoid-break">{table}</div>"#)
                        } else {
                            caps[0].to_string()
                        }
                    } else {
                        // A trailing </div> here belongs to the surrounding
                        // markup and must be preserved outside the wrapper.
                        format!(r#"<div class="avoid-break">{table}</div>{trailing}"#)
                    }
                })
                .into_owned();
        }

        html
    }

    /// Repair document structure and inject the A4 print stylesheet.
    ///
    /// A document that already carries the injected stylesheet is returned
    /// unchanged. A complete document gets the stylesheet (and a charset
    /// declaration if missing) injected into its head; a fragment is wrapped
    /// in a synthesized document.
    pub fn apply_print_styles(
        &self,
        markup: &str,
        params: &LayoutParameters,
        geometry: &PageGeometry,
        diagnostics: &mut Vec<String>,
    ) -> String {
        if markup.contains(STYLE_MARKER) {
            return markup.to_string();
        }

        let has_html = self.html_tag.is_match(markup);
        let has_head = self.head_tag.is_match(markup);
        let has_body = self.body_tag.is_match(markup);
        let has_charset = self.charset_meta.is_match(markup);

        if has_html && has_head && has_body {
            let mut injection = String::new();
            if !has_charset {
                diagnostics.push("missing charset declaration, injected utf-8".to_string());
                injection.push_str("<meta charset=\"utf-8\"/>");
            }
            injection.push_str(&print_stylesheet(params, geometry));
            return if self.head_close.is_match(markup) {
                self.head_close
                    .replace(markup, format!("{injection}</head>").as_str())
                    .into_owned()
            } else {
                // Head never closed; inject right after the opening tag.
                let head_end = self
                    .head_tag
                    .find(markup)
                    .map(|m| m.end())
                    .unwrap_or_default();
                format!("{}{}{}", &markup[..head_end], injection, &markup[head_end..])
            };
        }

        diagnostics.push("missing document structure, wrapper synthesized".to_string());
        if !has_charset {
            diagnostics.push("missing charset declaration, injected utf-8".to_string());
        }

        let body = if has_body {
            markup.to_string()
        } else {
            format!("<body>{markup}</body>")
        };

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"/>\n\
             {}\n</head>\n{}\n</html>",
            print_stylesheet(params, geometry),
            body
        )
    }
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_relative_reference(target: &str) -> bool {
    !(target.starts_with("http") || target.starts_with("data:") || target.starts_with('/'))
}

/// The injected stylesheet: A4 page rule, body metrics from the resolved
/// layout parameters, element print rules, and break helper classes.
fn print_stylesheet(params: &LayoutParameters, geometry: &PageGeometry) -> String {
    let m = &params.margin;
    let code_whitespace = if params.preserve_code {
        "pre"
    } else {
        "pre-wrap"
    };
    let break_classes = if params.add_page_breaks {
        "\n.page-break { page-break-before: always; }\n\
         .page-break-suggestion { page-break-after: auto; }\n\
         .avoid-break { page-break-inside: avoid; }"
    } else {
        ""
    };

    format!(
        "<style>\n{marker}\n\
         * {{ box-sizing: border-box; }}\n\
         @page {{ size: A4; margin: {mt}px {mr}px {mb}px {ml}px; }}\n\
         html, body {{ margin: 0; padding: 0; background: white; }}\n\
         body {{\n\
           font-family: Arial, sans-serif;\n\
           font-size: {font}px;\n\
           line-height: {lh};\n\
           width: {width}mm;\n\
           max-width: 100%;\n\
           margin: 0 auto;\n\
           padding: {mt}px {mr}px {mb}px {ml}px;\n\
         }}\n\
         table {{ width: 100%; border-collapse: collapse; margin-bottom: 1em; page-break-inside: avoid; }}\n\
         th, td {{ padding: 8px; text-align: left; border: 1px solid #ddd; word-wrap: break-word; }}\n\
         th {{ background-color: #f5f5f5; font-weight: bold; }}\n\
         img {{ max-width: 100%; height: auto; display: block; margin: 0 auto; page-break-inside: avoid; }}\n\
         h1, h2, h3, h4, h5, h6 {{ page-break-after: avoid; margin-top: 1.5em; margin-bottom: 0.5em; }}\n\
         p {{ margin-bottom: 1em; text-align: justify; word-wrap: break-word; }}\n\
         ul, ol {{ margin-bottom: 1em; padding-left: 2em; }}\n\
         pre, code {{ font-family: 'Courier New', monospace; background-color: #f8f8f8; border: 1px solid #ddd; border-radius: 3px; }}\n\
         pre {{ padding: 10px; overflow-x: auto; white-space: {ws}; word-wrap: break-word; page-break-inside: avoid; }}\n\
         code {{ padding: 2px 4px; }}{breaks}\n\
         @media print {{ body {{ padding: 0; }} .no-print {{ display: none; }} }}\n\
         </style>",
        marker = STYLE_MARKER,
        mt = m.top,
        mr = m.right,
        mb = m.bottom,
        ml = m.left,
        font = params.font_size,
        lh = params.line_height,
        width = geometry.width_mm,
        ws = code_whitespace,
        breaks = break_classes,
    )
}
