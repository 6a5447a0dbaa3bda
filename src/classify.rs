//! Markup classifier – inspects structural content and assigns a content
//! category plus a complexity tier, which the optimizer uses to pick layout
//! parameters.
//!
//! Detection is a single structural-feature scan followed by an explicit
//! ordered rule list. Later rules override earlier ones, so a document with
//! both headings and a code block classifies as `Technical`, and interactive
//! controls win over everything else.

use regex::Regex;

/// Characters of visible text budgeted per page when estimating page count.
const CHARS_PER_PAGE: usize = 1000;

/// Complexity thresholds: (tag count, style count, visible-text length).
const HIGH_BOUNDS: (usize, usize, usize) = (100, 20, 5000);
const MEDIUM_BOUNDS: (usize, usize, usize) = (30, 5, 2000);

/// Content category of a markup document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Text with no structural signals.
    Plain,
    /// Heading-driven prose.
    Article,
    /// Tabular content.
    Report,
    /// Contains code or preformatted blocks.
    Technical,
    /// Contains interactive form controls.
    Form,
    /// Empty or unrecognizable input.
    Unknown,
}

/// Complexity tier, from three independent thresholds evaluated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Structural signals detected by one scan over the raw markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Features {
    pub headings: bool,
    pub tables: bool,
    pub lists: bool,
    pub images: bool,
    pub code: bool,
    pub forms: bool,
}

/// Classification of one markup document. Immutable once created.
#[derive(Debug, Clone)]
pub struct ContentProfile {
    pub category: Category,
    pub complexity: Complexity,
    pub features: Features,
    /// Visible-text length with tags stripped.
    pub text_length: usize,
    /// `ceil(text_length / CHARS_PER_PAGE)`, minimum 1.
    pub estimated_pages: usize,
}

impl ContentProfile {
    /// Names of the detected structural features, in scan order.
    pub fn feature_tags(&self) -> Vec<&'static str> {
        let f = &self.features;
        let all = [
            (f.headings, "headings"),
            (f.tables, "tables"),
            (f.lists, "lists"),
            (f.images, "images"),
            (f.code, "code"),
            (f.forms, "forms"),
        ];
        all.iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Compiled structural patterns, built once and reused across documents.
pub struct Scanner {
    headings: Regex,
    tables: Regex,
    lists: Regex,
    images: Regex,
    code: Regex,
    forms: Regex,
    any_tag: Regex,
    styles: Regex,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            headings: Regex::new(r"(?i)<h[1-3][\s>]").unwrap(),
            tables: Regex::new(r"(?i)<table[\s>]").unwrap(),
            lists: Regex::new(r"(?i)<(ul|ol|li)[\s>]").unwrap(),
            images: Regex::new(r"(?i)<img[\s>]").unwrap(),
            code: Regex::new(r"(?i)<(pre|code)[\s>]").unwrap(),
            forms: Regex::new(r"(?i)<(form|input|button|select|textarea)[\s>]").unwrap(),
            any_tag: Regex::new(r"<[^>]+>").unwrap(),
            styles: Regex::new(r"(?i)style\s*=|<style").unwrap(),
        }
    }

    /// Classify one document. Pure function of the input; never fails.
    pub fn classify(&self, markup: &str) -> ContentProfile {
        let features = Features {
            headings: self.headings.is_match(markup),
            tables: self.tables.is_match(markup),
            lists: self.lists.is_match(markup),
            images: self.images.is_match(markup),
            code: self.code.is_match(markup),
            forms: self.forms.is_match(markup),
        };

        let text_length = self
            .any_tag
            .replace_all(markup, "")
            .trim()
            .chars()
            .count();
        let tag_count = self.any_tag.find_iter(markup).count();
        let style_count = self.styles.find_iter(markup).count();

        let category = categorize(&features, text_length, tag_count);
        let complexity = complexity_tier(tag_count, style_count, text_length);
        let estimated_pages = text_length.div_ceil(CHARS_PER_PAGE).max(1);

        log::debug!(
            "classified markup: category {:?}, complexity {:?}, {} chars, ~{} pages",
            category,
            complexity,
            text_length,
            estimated_pages
        );

        ContentProfile {
            category,
            complexity,
            features,
            text_length,
            estimated_pages,
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered rule list. Rules are evaluated top to bottom and later matches
/// override earlier ones; the order is the priority contract.
fn categorize(features: &Features, text_length: usize, tag_count: usize) -> Category {
    if text_length == 0 && tag_count == 0 {
        return Category::Unknown;
    }

    let rules: [(bool, Category); 4] = [
        (features.headings, Category::Article),
        (features.tables, Category::Report),
        (features.code, Category::Technical),
        (features.forms, Category::Form),
    ];

    let mut category = Category::Plain;
    for (matched, rule_category) in rules {
        if matched {
            category = rule_category;
        }
    }
    category
}

fn complexity_tier(tag_count: usize, style_count: usize, text_length: usize) -> Complexity {
    let exceeds = |bounds: (usize, usize, usize)| {
        tag_count > bounds.0 || style_count > bounds.1 || text_length > bounds.2
    };
    if exceeds(HIGH_BOUNDS) {
        Complexity::High
    } else if exceeds(MEDIUM_BOUNDS) {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}
