//! Finds absolute http(s) URLs embedded in free text.
//!
//! Matching is deliberately loose: anything after `http://` or `https://` up
//! to the next whitespace is taken, trailing punctuation included. No
//! validation or deduplication happens here; candidates are checked later by
//! the preview extractor.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("URL pattern is valid"));

/// A URL match with byte offsets into the scanned text, so that
/// `&text[start_index..end_index] == url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedUrl {
    pub url: String,
    pub start_index: usize,
    pub end_index: usize,
}

/// Scan `text` left to right for non-overlapping URL matches.
///
/// Each call gets its own match cursor; the compiled pattern holds no scan
/// state, so scanning the same text twice yields the same matches.
pub fn detect_urls(text: &str) -> impl Iterator<Item = DetectedUrl> + '_ {
    URL_PATTERN.find_iter(text).map(|m| DetectedUrl {
        url: m.as_str().to_string(),
        start_index: m.start(),
        end_index: m.end(),
    })
}

pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
