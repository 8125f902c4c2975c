//! Vendor name recognition.

use super::patterns::{DOCUMENT_LABEL_LINE, LABELED_VENDOR, SYMBOLIC_LINE};
use super::{lines_with_offsets, push_unless_overlapping, Recognizer, ScanContext};
use crate::models::token::{CandidateToken, TokenKind, TokenValue};

/// Vendor names outside this length range (in characters) are noise.
const MIN_VENDOR_CHARS: usize = 3;
const MAX_VENDOR_CHARS: usize = 79;

/// Vendor name recognizer.
///
/// An explicit "Vendor:"/"From:" line wins; otherwise the first plausible
/// line in the document header is taken, since letterheads lead with the
/// issuer's name.
pub struct VendorRecognizer;

impl VendorRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VendorRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn plausible_length(s: &str) -> bool {
    (MIN_VENDOR_CHARS..=MAX_VENDOR_CHARS).contains(&s.chars().count())
}

impl Recognizer for VendorRecognizer {
    fn kind(&self) -> TokenKind {
        TokenKind::VendorName
    }

    fn name(&self) -> &'static str {
        "vendor"
    }

    fn recognize(&self, text: &str, ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
        let mut tokens = Vec::new();

        for caps in LABELED_VENDOR.captures_iter(text) {
            let Some(name) = caps.get(1) else { continue };
            if !plausible_length(name.as_str()) {
                continue;
            }
            push_unless_overlapping(
                &mut tokens,
                CandidateToken::new(
                    TokenKind::VendorName,
                    name.as_str(),
                    TokenValue::Text(name.as_str().to_string()),
                    name.start(),
                    0.9,
                ),
            );
        }

        let header = lines_with_offsets(text)
            .map(|(offset, line)| {
                let lead = line.len() - line.trim_start().len();
                (offset + lead, line.trim())
            })
            .filter(|(_, line)| !line.is_empty())
            .take(ctx.config.vendor_scan_lines);

        for (offset, line) in header {
            if SYMBOLIC_LINE.is_match(line)
                || DOCUMENT_LABEL_LINE.is_match(line)
                || LABELED_VENDOR.is_match(line)
                || !plausible_length(line)
            {
                continue;
            }
            push_unless_overlapping(
                &mut tokens,
                CandidateToken::new(
                    TokenKind::VendorName,
                    line,
                    TokenValue::Text(line.to_string()),
                    offset,
                    0.6,
                ),
            );
            break;
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExtractionConfig;

    fn vendors(text: &str) -> Vec<(String, f32)> {
        let config = ExtractionConfig::default();
        VendorRecognizer::new()
            .recognize(text, &ScanContext::new(&config))
            .into_iter()
            .map(|t| (t.raw_text, t.confidence))
            .collect()
    }

    #[test]
    fn test_first_header_line() {
        assert_eq!(
            vendors("\n    Coffee Shop\n    Receipt\n    Total: 5.50\n"),
            vec![("Coffee Shop".to_string(), 0.6)]
        );
    }

    #[test]
    fn test_skips_labels_and_numbers() {
        assert_eq!(
            vendors("INVOICE\n2024-01-15\nNorthwind Traders\n"),
            vec![("Northwind Traders".to_string(), 0.6)]
        );
    }

    #[test]
    fn test_labeled_vendor() {
        let found = vendors("Receipt\nSold By: Corner Market\nTotal 4.00");
        assert_eq!(found[0], ("Corner Market".to_string(), 0.9));
    }

    #[test]
    fn test_scan_window_is_bounded() {
        let text = "1\n2\n3\n4\n5\nLate Name Ltd\n";
        assert!(vendors(text).is_empty());
    }
}
