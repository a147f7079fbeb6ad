//! HTML text extraction using readability
//!
//! Isolates the main article content of a web page and collapses it to
//! plain text, discarding navigation, ads, and boilerplate.

use super::NormalizeError;
use std::io::Cursor;
use url::Url;

/// Readability-based HTML normalizer
pub struct HtmlNormalizer;

impl HtmlNormalizer {
    /// Extract the readable plain-text body from an HTML document.
    ///
    /// The URL helps readability resolve relative links; a placeholder is
    /// used when none is available.
    pub fn extract(html: &str, url: Option<&str>) -> Result<String, NormalizeError> {
        let parsed_url = url
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| Url::parse("http://localhost/").unwrap());

        let mut cursor = Cursor::new(html.as_bytes());
        let product = readability::extractor::extract(&mut cursor, &parsed_url)
            .map_err(|e| NormalizeError::Html(e.to_string()))?;

        let text = collapse_whitespace(&product.text);
        if text.is_empty() {
            return Err(NormalizeError::EmptyContent);
        }
        Ok(text)
    }
}

/// Join text runs with single spaces so downstream tokenization is stable.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
