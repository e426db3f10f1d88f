//! Layout-preserving text cleanup.
//!
//! Extracted document text arrives with page markers, ragged spacing and
//! long runs of blank lines. [`TextNormalizer`] removes the markers, folds
//! horizontal whitespace to single spaces, keeps line breaks (headings and
//! paragraphs are line-based downstream), and caps blank runs at one blank
//! line.

use crate::utils::toml_config::{compile_patterns, ConfigError, NormalizeConfig};
use regex::Regex;
use std::sync::LazyLock;

static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static DEFAULT_PAGE_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NormalizeConfig::default()
        .page_marker_patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// Pure text cleanup stage.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    page_markers: Vec<Regex>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_MARKERS.clone())
    }
}

impl TextNormalizer {
    /// Create a normalizer that strips the given page-marker patterns.
    pub fn new(page_markers: Vec<Regex>) -> Self {
        Self { page_markers }
    }

    /// Compile page-marker patterns and build a normalizer from them.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        Ok(Self::new(compile_patterns(patterns)?))
    }

    /// Build a normalizer from the `[normalize]` config section.
    pub fn from_config(config: &NormalizeConfig) -> Result<Self, ConfigError> {
        Self::from_patterns(&config.page_marker_patterns)
    }

    /// Normalize raw extracted text.
    ///
    /// Total over any input; the empty string maps to itself and
    /// `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");

        // Removing a marker can splice together a new one (or new blank
        // runs), so repeat until nothing changes.
        loop {
            let next = self.pass(&text);
            if next == text {
                return next;
            }
            text = next;
        }
    }

    fn pass(&self, text: &str) -> String {
        let mut out = text.to_string();
        for marker in &self.page_markers {
            out = marker.replace_all(&out, "").into_owned();
        }
        let out = HORIZONTAL_WHITESPACE.replace_all(&out, " ");
        let out = BLANK_LINE_RUNS.replace_all(&out, "\n\n");
        out.trim().to_string()
    }
}
