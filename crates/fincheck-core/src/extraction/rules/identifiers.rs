//! Invoice and receipt number recognition.

use super::patterns::{LABELED_IDENTIFIER, STANDALONE_IDENTIFIER};
use super::{push_unless_overlapping, Recognizer, ScanContext};
use crate::models::token::{CandidateToken, TokenKind, TokenValue};

/// Letter prefixes that make a standalone "ABC 1234" an amount or label, not an id.
const NON_IDENTIFIER_PREFIXES: &[&str] = &[
    "USD", "EUR", "GBP", "INR", "PLN", "CAD", "AUD", "CHF", "JPY", "VAT", "GST", "TAX",
];

/// Identifier field recognizer.
pub struct IdentifierRecognizer;

impl IdentifierRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IdentifierRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for IdentifierRecognizer {
    fn kind(&self) -> TokenKind {
        TokenKind::Identifier
    }

    fn name(&self) -> &'static str {
        "identifier"
    }

    fn recognize(&self, text: &str, _ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
        let mut tokens = Vec::new();

        // Labeled: "Invoice #INV-1001", "Invoice No. 123"
        for caps in LABELED_IDENTIFIER.captures_iter(text) {
            let Some(value) = caps.get(1) else { continue };
            if !value.as_str().chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            push_unless_overlapping(
                &mut tokens,
                CandidateToken::new(
                    TokenKind::Identifier,
                    value.as_str(),
                    TokenValue::Text(value.as_str().to_string()),
                    value.start(),
                    0.9,
                ),
            );
        }

        // Standalone: "INV-20250001"
        for caps in STANDALONE_IDENTIFIER.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if NON_IDENTIFIER_PREFIXES.contains(&&caps[1]) {
                continue;
            }
            push_unless_overlapping(
                &mut tokens,
                CandidateToken::new(
                    TokenKind::Identifier,
                    m.as_str(),
                    TokenValue::Text(m.as_str().to_string()),
                    m.start(),
                    0.6,
                ),
            );
        }

        tokens
    }
}
