//! Currency recognition.

use super::patterns::{CURRENCY_CODE, CURRENCY_SYMBOL};
use super::{push_unless_overlapping, Recognizer, ScanContext};
use crate::models::token::{CandidateToken, TokenKind, TokenValue};

/// Currency field recognizer. ISO codes are trusted over symbols.
pub struct CurrencyRecognizer;

impl CurrencyRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrencyRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for CurrencyRecognizer {
    fn kind(&self) -> TokenKind {
        TokenKind::Currency
    }

    fn name(&self) -> &'static str {
        "currency"
    }

    fn recognize(&self, text: &str, _ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
        let mut tokens = Vec::new();

        for m in CURRENCY_CODE.find_iter(text) {
            push_unless_overlapping(
                &mut tokens,
                CandidateToken::new(
                    TokenKind::Currency,
                    m.as_str(),
                    TokenValue::Currency(m.as_str().to_string()),
                    m.start(),
                    0.9,
                ),
            );
        }

        for m in CURRENCY_SYMBOL.find_iter(text) {
            if let Some(code) = symbol_to_code(m.as_str()) {
                push_unless_overlapping(
                    &mut tokens,
                    CandidateToken::new(
                        TokenKind::Currency,
                        m.as_str(),
                        TokenValue::Currency(code.to_string()),
                        m.start(),
                        0.7,
                    ),
                );
            }
        }

        tokens
    }
}

/// Map a currency symbol to its ISO-4217 code.
pub fn symbol_to_code(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        "₹" => Some("INR"),
        "zł" => Some("PLN"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExtractionConfig;

    #[test]
    fn test_symbols_and_codes() {
        let config = ExtractionConfig::default();
        let tokens =
            CurrencyRecognizer::new().recognize("Total: €12.00 (EUR)\nTip $1", &ScanContext::new(&config));

        let codes: Vec<(&str, f32)> = tokens
            .iter()
            .map(|t| (t.text().unwrap_or_default(), t.confidence))
            .collect();
        assert_eq!(codes, vec![("EUR", 0.9), ("EUR", 0.7), ("USD", 0.7)]);
    }
}
