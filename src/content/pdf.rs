//! PDF text extraction
//!
//! Extracts page text from PDF bytes using pdf-extract. Pages without
//! extractable text contribute nothing; a document where no page yields
//! text is a normalization failure, not an empty success.

use super::NormalizeError;

/// PDF text normalizer
pub struct PdfNormalizer;

impl PdfNormalizer {
    /// Extract the concatenated page text from PDF bytes.
    pub fn extract(bytes: &[u8]) -> Result<String, NormalizeError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| NormalizeError::Pdf(e.to_string()))?;

        let cleaned = Self::clean_text(&text);
        if cleaned.is_empty() {
            // Encrypted or image-only PDFs land here
            return Err(NormalizeError::EmptyContent);
        }
        Ok(cleaned)
    }

    /// Strip per-line padding and collapse runs of blank lines, keeping
    /// single blank lines as paragraph breaks.
    fn clean_text(text: &str) -> String {
        text.lines()
            .map(|l| l.trim())
            .fold(Vec::new(), |mut acc, line| {
                if line.is_empty() {
                    if acc.last().map(|l: &String| !l.is_empty()).unwrap_or(false) {
                        acc.push(String::new());
                    }
                } else {
                    acc.push(line.to_string());
                }
                acc
            })
            .join("\n")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        let dirty = "  Threat Report  \n\n\n  Section 1  \n  \n  Details  ";
        assert_eq!(
            PdfNormalizer::clean_text(dirty),
            "Threat Report\n\nSection 1\n\nDetails"
        );
    }

    #[test]
    fn test_clean_text_all_blank() {
        assert_eq!(PdfNormalizer::clean_text("  \n \n\t\n"), "");
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        let result = PdfNormalizer::extract(b"not a pdf at all");
        assert!(result.is_err());
    }
}
