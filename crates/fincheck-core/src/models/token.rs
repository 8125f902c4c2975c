//! Candidate tokens produced by the tokenizer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of financial field a token is a candidate for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Amount,
    Date,
    Identifier,
    Currency,
    VendorName,
    LineItem,
}

/// Which summary amount a labeled amount token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountRole {
    Subtotal,
    Tax,
    Total,
}

/// Parsed value carried by a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum TokenValue {
    /// A monetary amount, optionally tied to a summary label.
    Amount {
        value: Decimal,
        role: Option<AmountRole>,
    },
    /// A valid calendar date.
    Date(NaiveDate),
    /// Date-shaped text that is not a valid calendar date in any accepted order.
    MalformedDate,
    /// ISO-4217 currency code.
    Currency(String),
    /// Free text (identifiers, vendor names, line item descriptions).
    Text(String),
}

/// A span of source text recognized as a candidate for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateToken {
    /// Field kind.
    pub kind: TokenKind,
    /// Matched source text.
    pub raw_text: String,
    /// Normalized value.
    pub parsed_value: TokenValue,
    /// Byte offset of `raw_text` in the document.
    pub source_offset: usize,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl CandidateToken {
    pub fn new(
        kind: TokenKind,
        raw_text: impl Into<String>,
        parsed_value: TokenValue,
        source_offset: usize,
        confidence: f32,
    ) -> Self {
        Self {
            kind,
            raw_text: raw_text.into(),
            parsed_value,
            source_offset,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Byte offset one past the end of the matched text.
    pub fn end_offset(&self) -> usize {
        self.source_offset + self.raw_text.len()
    }

    /// Whether this token's span intersects `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.source_offset < end && start < self.end_offset()
    }

    /// Amount value and role, if this is an amount token.
    pub fn amount(&self) -> Option<(Decimal, Option<AmountRole>)> {
        match self.parsed_value {
            TokenValue::Amount { value, role } => Some((value, role)),
            _ => None,
        }
    }

    /// Text payload, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.parsed_value {
            TokenValue::Text(s) | TokenValue::Currency(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_half_open() {
        let token = CandidateToken::new(
            TokenKind::Identifier,
            "INV-1",
            TokenValue::Text("INV-1".into()),
            10,
            0.9,
        );
        assert_eq!(token.end_offset(), 15);
        assert!(token.overlaps(14, 20));
        assert!(!token.overlaps(15, 20));
        assert!(!token.overlaps(0, 10));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let token = CandidateToken::new(
            TokenKind::Currency,
            "$",
            TokenValue::Currency("USD".into()),
            0,
            1.7,
        );
        assert_eq!(token.confidence, 1.0);
    }
}
